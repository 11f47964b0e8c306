use log::debug;
use sqlx::SqliteConnection;
use tlr_common::Money;

use crate::{
    db_types::{CashMovement, CashSession, MovementKind, NewCashSession, TenantId},
    traits::CashRegisterError,
};

/// Opens a new cash session. The partial unique index on `(tenant_id, operator_id)` for open
/// sessions turns a double-open into a constraint violation, which is reported as
/// [`CashRegisterError::SessionAlreadyOpen`] no matter how the two requests interleave.
pub async fn insert_session(
    session: NewCashSession,
    conn: &mut SqliteConnection,
) -> Result<CashSession, CashRegisterError> {
    let operator = session.operator_id.clone();
    let session: CashSession = sqlx::query_as(
        r#"
            INSERT INTO cash_sessions (tenant_id, operator_id, opening_balance)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(session.tenant_id)
    .bind(session.operator_id)
    .bind(session.opening_balance.value())
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(de) if de.is_unique_violation() => CashRegisterError::SessionAlreadyOpen(operator),
        _ => CashRegisterError::from(e),
    })?;
    debug!("💵️ Operator {} opened cash session #{}", session.operator_id, session.id);
    Ok(session)
}

/// Records a movement against the session, but only while the session is open. The status check
/// and the insert are a single statement, so a session closed by a concurrent writer cannot
/// receive a late movement.
pub async fn insert_movement(
    tenant_id: &TenantId,
    session_id: i64,
    kind: MovementKind,
    amount: Money,
    memo: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<CashMovement, CashRegisterError> {
    let movement: Option<CashMovement> = sqlx::query_as(
        r#"
            INSERT INTO cash_movements (session_id, kind, amount, memo)
            SELECT id, $3, $4, $5 FROM cash_sessions
            WHERE id = $1 AND tenant_id = $2 AND status = 'Open'
            RETURNING *;
        "#,
    )
    .bind(session_id)
    .bind(tenant_id.as_str())
    .bind(kind.to_string())
    .bind(amount.value())
    .bind(memo)
    .fetch_optional(&mut *conn)
    .await?;
    match movement {
        Some(m) => Ok(m),
        None => match fetch_session(tenant_id, session_id, conn).await? {
            Some(_) => Err(CashRegisterError::SessionNotOpen(session_id)),
            None => Err(CashRegisterError::SessionNotFound(session_id)),
        },
    }
}

/// Closes the session, storing the operator's counted balance as-is. Returns the updated row, or
/// an error describing why the session could not be closed.
pub async fn close_session(
    tenant_id: &TenantId,
    session_id: i64,
    closing_balance: Money,
    conn: &mut SqliteConnection,
) -> Result<CashSession, CashRegisterError> {
    let session: Option<CashSession> = sqlx::query_as(
        r#"
            UPDATE cash_sessions
            SET status = 'Closed', closing_balance = $3, closed_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND tenant_id = $2 AND status = 'Open'
            RETURNING *;
        "#,
    )
    .bind(session_id)
    .bind(tenant_id.as_str())
    .bind(closing_balance.value())
    .fetch_optional(&mut *conn)
    .await?;
    match session {
        Some(s) => {
            debug!("💵️ Cash session #{} closed with a counted balance of {}", s.id, closing_balance);
            Ok(s)
        },
        None => match fetch_session(tenant_id, session_id, conn).await? {
            Some(_) => Err(CashRegisterError::SessionNotOpen(session_id)),
            None => Err(CashRegisterError::SessionNotFound(session_id)),
        },
    }
}

pub async fn fetch_session(
    tenant_id: &TenantId,
    session_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CashSession>, CashRegisterError> {
    let session = sqlx::query_as("SELECT * FROM cash_sessions WHERE id = $1 AND tenant_id = $2")
        .bind(session_id)
        .bind(tenant_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(session)
}

/// Returns the operator's open session for the tenant, if any. The partial unique index
/// guarantees there is at most one.
pub async fn open_session_for_operator(
    tenant_id: &TenantId,
    operator_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<CashSession>, CashRegisterError> {
    let session =
        sqlx::query_as("SELECT * FROM cash_sessions WHERE tenant_id = $1 AND operator_id = $2 AND status = 'Open'")
            .bind(tenant_id.as_str())
            .bind(operator_id)
            .fetch_optional(conn)
            .await?;
    Ok(session)
}

/// The net effect of all movements on the drawer: inflows minus outflows.
pub async fn movement_total(session_id: i64, conn: &mut SqliteConnection) -> Result<Money, CashRegisterError> {
    let total: i64 = sqlx::query_scalar(
        r#"
            SELECT COALESCE(SUM(CASE kind WHEN 'Inflow' THEN amount ELSE -amount END), 0)
            FROM cash_movements WHERE session_id = $1
        "#,
    )
    .bind(session_id)
    .fetch_one(conn)
    .await?;
    Ok(Money::from(total))
}

pub async fn fetch_movements(
    tenant_id: &TenantId,
    session_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<CashMovement>, CashRegisterError> {
    let movements = sqlx::query_as(
        r#"
            SELECT cash_movements.* FROM cash_movements
            JOIN cash_sessions ON cash_sessions.id = cash_movements.session_id
            WHERE cash_movements.session_id = $1 AND cash_sessions.tenant_id = $2
            ORDER BY cash_movements.id
        "#,
    )
    .bind(session_id)
    .bind(tenant_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(movements)
}
