use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::SequenceKey, traits::SequenceError};

/// Draws the next value from the series identified by `key`, creating the counter at 1 on first
/// use.
///
/// The insert-or-increment runs as a single statement, so two callers racing on a brand-new key
/// cannot both create it: one insert wins and the other lands on the update arm. On a pooled
/// connection the draw commits immediately; callers that need it to live or die with their own
/// writes pass a transaction connection instead, and a rollback then returns the value to the
/// series.
pub async fn next_value(key: &SequenceKey, conn: &mut SqliteConnection) -> Result<i64, SequenceError> {
    let value: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO document_sequences (tenant_id, doc_type, establishment, emission_point, current_value)
            VALUES ($1, $2, $3, $4, 1)
            ON CONFLICT (tenant_id, doc_type, establishment, emission_point)
            DO UPDATE SET current_value = current_value + 1, updated_at = CURRENT_TIMESTAMP
            RETURNING current_value;
        "#,
    )
    .bind(key.tenant_id.as_str())
    .bind(key.doc_type.to_string())
    .bind(key.establishment.as_str())
    .bind(key.emission_point.as_str())
    .fetch_one(conn)
    .await?;
    trace!("#️⃣️ Sequence {key} issued value {value}");
    Ok(value)
}

/// Returns the last issued value for the series, or `None` if no allocation has happened yet.
pub async fn current_value(key: &SequenceKey, conn: &mut SqliteConnection) -> Result<Option<i64>, SequenceError> {
    let value = sqlx::query_scalar(
        r#"
            SELECT current_value FROM document_sequences
            WHERE tenant_id = $1 AND doc_type = $2 AND establishment = $3 AND emission_point = $4
        "#,
    )
    .bind(key.tenant_id.as_str())
    .bind(key.doc_type.to_string())
    .bind(key.establishment.as_str())
    .bind(key.emission_point.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(value)
}
