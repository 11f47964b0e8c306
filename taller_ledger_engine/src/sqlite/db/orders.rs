use log::debug;
use sqlx::SqliteConnection;
use tlr_common::Money;

use crate::{
    db_types::{Order, PaymentStatus, TenantId},
    traits::LedgerError,
};

/// Inserts a new order carrying an already-allocated document number. Callers allocate the
/// number in the same transaction, so an aborted insert rolls the draw back along with the row
/// and the number returns to the series.
pub async fn insert_order(
    tenant_id: TenantId,
    order_number: String,
    final_cost: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (tenant_id, order_number, final_cost)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(tenant_id)
    .bind(order_number)
    .bind(final_cost.value())
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn fetch_order(
    tenant_id: &TenantId,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND tenant_id = $2")
        .bind(order_id)
        .bind(tenant_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Persists a recomputed payment status. Scoped by tenant so a caller can never move another
/// tenant's order.
pub async fn update_payment_status(
    tenant_id: &TenantId,
    order_id: i64,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND tenant_id = $3
            RETURNING *;
        "#,
    )
    .bind(status.to_string())
    .bind(order_id)
    .bind(tenant_id.as_str())
    .fetch_optional(conn)
    .await?;
    match order {
        Some(o) => {
            debug!("📝️ Order [{}] payment status set to {}", o.order_number, o.payment_status);
            Ok(o)
        },
        None => Err(LedgerError::OrderNotFound(order_id)),
    }
}
