//! Unified API for the cash drawer lifecycle.

use std::fmt::Debug;

use log::debug;
use tlr_common::Money;

use crate::{
    api::with_retry,
    db_types::{CashMovement, CashSession, MovementKind, NewCashSession, TenantId},
    traits::{CashRegisterError, CashRegisterManagement},
};

/// The `CashRegisterApi` manages cash sessions and the movements recorded against them.
pub struct CashRegisterApi<B> {
    db: B,
}

impl<B: Debug> Debug for CashRegisterApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CashRegisterApi ({:?})", self.db)
    }
}

impl<B> CashRegisterApi<B>
where B: CashRegisterManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Opens a new session for an operator. At most one session per operator per tenant can be
    /// open; a second open attempt fails with [`CashRegisterError::SessionAlreadyOpen`], whether
    /// the requests arrive in sequence or race each other.
    pub async fn open_session(&self, session: NewCashSession) -> Result<CashSession, CashRegisterError> {
        if session.operator_id.trim().is_empty() {
            return Err(CashRegisterError::ValidationError("operator id must not be empty".to_string()));
        }
        if session.opening_balance.value() < 0 {
            return Err(CashRegisterError::ValidationError(format!(
                "opening balance must not be negative, got {}",
                session.opening_balance
            )));
        }
        let session =
            with_retry("Cash session open", CashRegisterError::is_transient, || self.db.open_session(session.clone()))
                .await?;
        debug!("🔄️💵️ Cash session #{} opened for operator {}", session.id, session.operator_id);
        Ok(session)
    }

    /// Records a manual drawer movement against an open session. Amounts are always positive;
    /// use [`MovementKind::Outflow`] to take money out.
    pub async fn record_movement(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        kind: MovementKind,
        amount: Money,
        memo: Option<String>,
    ) -> Result<CashMovement, CashRegisterError> {
        if !amount.is_positive() {
            return Err(CashRegisterError::ValidationError(format!(
                "movement amount must be positive, got {amount}"
            )));
        }
        let movement = with_retry("Cash movement", CashRegisterError::is_transient, || {
            self.db.record_movement(tenant_id, session_id, kind, amount, memo.clone())
        })
        .await?;
        debug!("🔄️💵️ {} of {} recorded against session #{}", movement.kind, movement.amount, session_id);
        Ok(movement)
    }

    /// Closes the session with the balance the operator counted. The counted value is stored
    /// verbatim; compare it against [`Self::balance`] to surface discrepancies.
    pub async fn close_session(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        closing_balance: Money,
    ) -> Result<CashSession, CashRegisterError> {
        if closing_balance.value() < 0 {
            return Err(CashRegisterError::ValidationError(format!(
                "closing balance must not be negative, got {closing_balance}"
            )));
        }
        let session = with_retry("Cash session close", CashRegisterError::is_transient, || {
            self.db.close_session(tenant_id, session_id, closing_balance)
        })
        .await?;
        debug!("🔄️💵️ Cash session #{} closed", session.id);
        Ok(session)
    }

    /// The expected balance of the session: opening float plus inflows minus outflows.
    pub async fn balance(&self, tenant_id: &TenantId, session_id: i64) -> Result<Money, CashRegisterError> {
        self.db.session_balance(tenant_id, session_id).await
    }

    /// Fetches a session by id, or `None` if it does not exist for this tenant.
    pub async fn session(&self, tenant_id: &TenantId, session_id: i64)
        -> Result<Option<CashSession>, CashRegisterError> {
        self.db.fetch_session(tenant_id, session_id).await
    }

    /// Returns the operator's currently open session, if any.
    pub async fn open_session_for_operator(
        &self,
        tenant_id: &TenantId,
        operator_id: &str,
    ) -> Result<Option<CashSession>, CashRegisterError> {
        self.db.open_session_for_operator(tenant_id, operator_id).await
    }

    /// Returns all movements recorded against the session, oldest first.
    pub async fn movements(&self, tenant_id: &TenantId, session_id: i64)
        -> Result<Vec<CashMovement>, CashRegisterError> {
        self.db.fetch_movements(tenant_id, session_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
