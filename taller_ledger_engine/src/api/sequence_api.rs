//! Unified API for allocating document numbers.

use std::fmt::Debug;

use log::trace;

use crate::{
    api::with_retry,
    db_types::SequenceKey,
    traits::{AllocatedNumber, SequenceAllocation, SequenceError},
};

/// The `SequenceApi` hands out document numbers from per-tenant series.
pub struct SequenceApi<B> {
    db: B,
}

impl<B: Debug> Debug for SequenceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SequenceApi ({:?})", self.db)
    }
}

impl<B> SequenceApi<B>
where B: SequenceAllocation
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Draws the next number from the series identified by `key`.
    ///
    /// Validation failures are reported before the backend is touched; transient allocation
    /// conflicts are retried a bounded number of times before being surfaced.
    pub async fn allocate(&self, key: &SequenceKey, prefix: Option<&str>) -> Result<AllocatedNumber, SequenceError> {
        key.validate().map_err(SequenceError::ValidationError)?;
        if matches!(prefix, Some(p) if p.trim().is_empty()) {
            return Err(SequenceError::ValidationError("prefix must not be empty when supplied".to_string()));
        }
        let allocated =
            with_retry("Sequence allocation", SequenceError::is_transient, || self.db.allocate_number(key, prefix))
                .await?;
        trace!("🔄️#️⃣️ Issued [{}] for sequence {key}", allocated.formatted);
        Ok(allocated)
    }

    /// Returns the most recently issued value for the series without allocating, or `None` if
    /// the series has never been drawn from.
    pub async fn current_value(&self, key: &SequenceKey) -> Result<Option<i64>, SequenceError> {
        key.validate().map_err(SequenceError::ValidationError)?;
        self.db.current_value(key).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
