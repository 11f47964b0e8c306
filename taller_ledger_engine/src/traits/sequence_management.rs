use thiserror::Error;

use crate::{db_types::SequenceKey, traits::AllocatedNumber};

#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid sequence request: {0}")]
    ValidationError(String),
    #[error("The allocation lost a race against a concurrent writer and can be retried: {0}")]
    TransientConflict(String),
}

impl From<sqlx::Error> for SequenceError {
    fn from(e: sqlx::Error) -> Self {
        if super::is_transient(&e) {
            SequenceError::TransientConflict(e.to_string())
        } else {
            SequenceError::DatabaseError(e.to_string())
        }
    }
}

impl SequenceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SequenceError::TransientConflict(_))
    }
}

/// The `SequenceAllocation` trait defines behaviour for handing out document numbers.
///
/// A counter is created lazily the first time its key is seen, starting at 1, and is only ever
/// mutated by incrementing. Backends must guarantee that two concurrent allocations for the same
/// key never return the same value, and that values are issued strictly increasing with no
/// re-issued lower number after a higher one has been observed.
#[allow(async_fn_in_trait)]
pub trait SequenceAllocation {
    /// Draws the next value from the series identified by `key` and formats it for display.
    ///
    /// When `prefix` is given, the formatted number uses the internal `PREFIX-EST-...` form
    /// instead of the fiscal `EST-EMISSION-...` form. The prefix has no effect on which counter
    /// is used; it only changes the rendering.
    ///
    /// The allocation commits on its own. If the caller's follow-on work fails, the drawn value
    /// stays consumed and the series shows a gap; a value is never re-issued.
    async fn allocate_number(&self, key: &SequenceKey, prefix: Option<&str>) -> Result<AllocatedNumber, SequenceError>;

    /// Returns the most recently issued value for the series, or `None` if the counter has not
    /// been created yet. This is a read-only peek; it never creates or increments the counter.
    async fn current_value(&self, key: &SequenceKey) -> Result<Option<i64>, SequenceError>;
}
