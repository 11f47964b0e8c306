use log::debug;
use sqlx::SqliteConnection;
use tlr_common::Money;

use crate::{
    db_types::{NewPayment, Payment, TenantId},
    traits::LedgerError,
};

/// Inserts a new payment row. This is not atomic on its own. Reconciliation embeds this call
/// inside a transaction together with the movement insert and the status recompute, passing
/// `&mut *tx` as the connection argument.
pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, LedgerError> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (tenant_id, order_id, amount, method, reference, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(payment.tenant_id)
    .bind(payment.order_id)
    .bind(payment.amount.value())
    .bind(payment.method.to_string())
    .bind(payment.reference)
    .bind(payment.recorded_by)
    .fetch_one(conn)
    .await?;
    debug!("💰️ Payment #{} of {} recorded against order id {}", payment.id, payment.amount, payment.order_id);
    Ok(payment)
}

/// Points the payment at the cash movement it produced. Set at most once, in the same
/// transaction that created both rows.
pub async fn link_movement(
    payment_id: i64,
    movement_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Payment, LedgerError> {
    let payment = sqlx::query_as("UPDATE payments SET movement_id = $1 WHERE id = $2 RETURNING *;")
        .bind(movement_id)
        .bind(payment_id)
        .fetch_one(conn)
        .await?;
    Ok(payment)
}

/// The sum of every payment recorded against the order. Always recomputed from the rows rather
/// than patched incrementally, so concurrent writers cannot make the total drift.
pub async fn total_paid_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Money, LedgerError> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(Money::from(total))
}

pub async fn fetch_payments_for_order(
    tenant_id: &TenantId,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, LedgerError> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 AND tenant_id = $2 ORDER BY id")
        .bind(order_id)
        .bind(tenant_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(payments)
}
