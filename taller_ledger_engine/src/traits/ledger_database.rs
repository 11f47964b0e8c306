use thiserror::Error;

use tlr_common::Money;

use crate::{
    db_types::{NewOrder, NewPayment, Order, Payment, PaymentStatus, TenantId},
    traits::{CashRegisterError, CashRegisterManagement, RecordedPayment, SequenceAllocation, SequenceError},
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid payment request: {0}")]
    ValidationError(String),
    #[error("The requested order (internal id {0}) does not exist for this tenant")]
    OrderNotFound(i64),
    #[error("{0}")]
    SequenceError(#[from] SequenceError),
    #[error("{0}")]
    CashRegisterError(#[from] CashRegisterError),
    #[error("The unit of work lost a race against a concurrent writer and can be retried: {0}")]
    TransientConflict(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        if super::is_transient(&e) {
            LedgerError::TransientConflict(e.to_string())
        } else {
            LedgerError::DatabaseError(e.to_string())
        }
    }
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::TransientConflict(_) => true,
            LedgerError::SequenceError(e) => e.is_transient(),
            LedgerError::CashRegisterError(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// This trait defines the highest level of behaviour for backends supporting the ledger engine.
///
/// This behaviour includes:
/// * Creating orders with freshly allocated document numbers
/// * Reconciling incoming payments against orders in a single atomic unit of work
/// * Keeping the cash register consistent with the payments that pass through it
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + SequenceAllocation + CashRegisterManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Creates a new order, drawing the next number from the tenant's order series in the same
    /// transaction as the insert, so an aborted creation returns the number to the series
    /// instead of burning it.
    async fn create_order(&self, order: NewOrder) -> Result<Order, LedgerError>;

    /// Fetches an order by internal id. Returns `None` if it does not exist for this tenant.
    async fn fetch_order(&self, tenant_id: &TenantId, order_id: i64) -> Result<Option<Order>, LedgerError>;

    /// Takes a new payment, and in a single atomic transaction,
    /// * stores the payment against its order,
    /// * if the payment is cash and its operator has an open session for the tenant, records the
    ///   matching drawer inflow and links the payment to it,
    /// * recomputes the order's payment status from the full sum of its payments.
    ///
    /// Either every one of those writes lands, or none of them do. Over-payment is recorded, not
    /// rejected. A cash payment with no open session is stored without a movement.
    async fn record_payment(&self, payment: NewPayment) -> Result<RecordedPayment, LedgerError>;

    /// Returns all payments recorded against the order, in insertion order.
    async fn fetch_payments_for_order(&self, tenant_id: &TenantId, order_id: i64)
        -> Result<Vec<Payment>, LedgerError>;

    /// Returns the sum of all payments recorded against the order.
    async fn order_total_paid(&self, tenant_id: &TenantId, order_id: i64) -> Result<Money, LedgerError>;

    /// Overrides the payment status of an order directly, bypassing the derivation. Reserved for
    /// administrative corrections; `record_payment` always recomputes from the payment sum.
    async fn set_payment_status(
        &self,
        tenant_id: &TenantId,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError>;
}
