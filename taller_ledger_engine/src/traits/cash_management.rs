use thiserror::Error;

use tlr_common::Money;

use crate::db_types::{CashMovement, CashSession, MovementKind, NewCashSession, TenantId};

#[derive(Debug, Clone, Error)]
pub enum CashRegisterError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid cash register request: {0}")]
    ValidationError(String),
    #[error("Operator {0} already has an open cash session for this tenant")]
    SessionAlreadyOpen(String),
    #[error("Cash session {0} is not open")]
    SessionNotOpen(i64),
    #[error("Cash session {0} does not exist for this tenant")]
    SessionNotFound(i64),
    #[error("The operation lost a race against a concurrent writer and can be retried: {0}")]
    TransientConflict(String),
}

impl From<sqlx::Error> for CashRegisterError {
    fn from(e: sqlx::Error) -> Self {
        if super::is_transient(&e) {
            CashRegisterError::TransientConflict(e.to_string())
        } else {
            CashRegisterError::DatabaseError(e.to_string())
        }
    }
}

impl CashRegisterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CashRegisterError::TransientConflict(_))
    }
}

/// The `CashRegisterManagement` trait defines behaviour for the cash drawer lifecycle.
///
/// A session belongs to one operator within one tenant. Backends enforce that an operator has at
/// most one open session per tenant; attempts to open a second one fail with
/// [`CashRegisterError::SessionAlreadyOpen`] rather than silently reusing the existing session.
/// Movements can only ever be attached to a session while it is open.
#[allow(async_fn_in_trait)]
pub trait CashRegisterManagement {
    /// Opens a new session for the operator with the given starting float.
    async fn open_session(&self, session: NewCashSession) -> Result<CashSession, CashRegisterError>;

    /// Records a drawer movement against an open session. Fails with
    /// [`CashRegisterError::SessionNotOpen`] if the session has been closed in the meantime.
    async fn record_movement(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        kind: MovementKind,
        amount: Money,
        memo: Option<String>,
    ) -> Result<CashMovement, CashRegisterError>;

    /// Closes the session, storing the operator's counted balance verbatim. The stored value is
    /// deliberately not reconciled against the expected balance; discrepancies are a reporting
    /// concern, not a storage one.
    async fn close_session(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        closing_balance: Money,
    ) -> Result<CashSession, CashRegisterError>;

    /// Computes the expected balance of the session: opening balance plus inflows minus outflows.
    async fn session_balance(&self, tenant_id: &TenantId, session_id: i64) -> Result<Money, CashRegisterError>;

    /// Fetches a session by id. Returns `None` if it does not exist for this tenant.
    async fn fetch_session(&self, tenant_id: &TenantId, session_id: i64)
        -> Result<Option<CashSession>, CashRegisterError>;

    /// Returns the operator's currently open session for the tenant, if there is one.
    async fn open_session_for_operator(
        &self,
        tenant_id: &TenantId,
        operator_id: &str,
    ) -> Result<Option<CashSession>, CashRegisterError>;

    /// Returns all movements recorded against the session, in insertion order.
    async fn fetch_movements(&self, tenant_id: &TenantId, session_id: i64)
        -> Result<Vec<CashMovement>, CashRegisterError>;
}
