//! `SqliteDatabase` is a concrete implementation of a Taller ledger engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;
use tlr_common::Money;

use super::db::{cash_register, db_url, new_pool, orders, payments, sequences};
use crate::{
    db_types::{
        CashMovement,
        CashSession,
        DocumentType,
        MovementKind,
        NewCashSession,
        NewOrder,
        NewPayment,
        Order,
        Payment,
        PaymentMethod,
        PaymentStatus,
        SequenceKey,
        TenantId,
    },
    helpers::{document_number, fiscal_number},
    traits::{
        AllocatedNumber,
        CashRegisterError,
        CashRegisterManagement,
        LedgerDatabase,
        LedgerError,
        RecordedPayment,
        SequenceAllocation,
        SequenceError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SequenceAllocation for SqliteDatabase {
    async fn allocate_number(&self, key: &SequenceKey, prefix: Option<&str>) -> Result<AllocatedNumber, SequenceError> {
        let mut conn = self.pool.acquire().await?;
        let value = sequences::next_value(key, &mut conn).await?;
        let formatted = document_number(prefix, &key.establishment, &key.emission_point, value);
        trace!("#️⃣️ Allocated number [{formatted}] for sequence {key}");
        Ok(AllocatedNumber::new(value, formatted))
    }

    async fn current_value(&self, key: &SequenceKey) -> Result<Option<i64>, SequenceError> {
        let mut conn = self.pool.acquire().await?;
        sequences::current_value(key, &mut conn).await
    }
}

impl CashRegisterManagement for SqliteDatabase {
    async fn open_session(&self, session: NewCashSession) -> Result<CashSession, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::insert_session(session, &mut conn).await
    }

    async fn record_movement(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        kind: MovementKind,
        amount: Money,
        memo: Option<String>,
    ) -> Result<CashMovement, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::insert_movement(tenant_id, session_id, kind, amount, memo, &mut conn).await
    }

    async fn close_session(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
        closing_balance: Money,
    ) -> Result<CashSession, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::close_session(tenant_id, session_id, closing_balance, &mut conn).await
    }

    async fn session_balance(&self, tenant_id: &TenantId, session_id: i64) -> Result<Money, CashRegisterError> {
        let mut tx = self.pool.begin().await?;
        let session = cash_register::fetch_session(tenant_id, session_id, &mut tx)
            .await?
            .ok_or(CashRegisterError::SessionNotFound(session_id))?;
        let total = cash_register::movement_total(session_id, &mut tx).await?;
        tx.commit().await?;
        Ok(session.opening_balance + total)
    }

    async fn fetch_session(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
    ) -> Result<Option<CashSession>, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::fetch_session(tenant_id, session_id, &mut conn).await
    }

    async fn open_session_for_operator(
        &self,
        tenant_id: &TenantId,
        operator_id: &str,
    ) -> Result<Option<CashSession>, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::open_session_for_operator(tenant_id, operator_id, &mut conn).await
    }

    async fn fetch_movements(
        &self,
        tenant_id: &TenantId,
        session_id: i64,
    ) -> Result<Vec<CashMovement>, CashRegisterError> {
        let mut conn = self.pool.acquire().await?;
        cash_register::fetch_movements(tenant_id, session_id, &mut conn).await
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let key =
            SequenceKey::new(order.tenant_id.clone(), DocumentType::Order, &order.establishment, &order.emission_point);
        let value = sequences::next_value(&key, &mut tx).await?;
        let number = fiscal_number(&order.establishment, &order.emission_point, value);
        let order = orders::insert_order(order.tenant_id, number, order.final_cost, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] created with id {}", order.order_number, order.id);
        Ok(order)
    }

    async fn fetch_order(&self, tenant_id: &TenantId, order_id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(tenant_id, order_id, &mut conn).await
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<RecordedPayment, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(&payment.tenant_id, payment.order_id, &mut tx)
            .await?
            .ok_or(LedgerError::OrderNotFound(payment.order_id))?;
        let is_cash = payment.method == PaymentMethod::Cash;
        let operator = payment.recorded_by.clone();
        let mut paid = payments::insert_payment(payment, &mut tx).await?;
        if is_cash {
            if let Some(operator_id) = operator {
                match cash_register::open_session_for_operator(&order.tenant_id, &operator_id, &mut tx).await? {
                    Some(session) => {
                        let memo = format!("Payment for order {}", order.order_number);
                        let movement = cash_register::insert_movement(
                            &order.tenant_id,
                            session.id,
                            MovementKind::Inflow,
                            paid.amount,
                            Some(memo),
                            &mut tx,
                        )
                        .await?;
                        paid = payments::link_movement(paid.id, movement.id, &mut tx).await?;
                        trace!(
                            "🗃️ Payment #{} entered the drawer of session #{} as movement #{}",
                            paid.id,
                            session.id,
                            movement.id
                        );
                    },
                    None => {
                        debug!(
                            "🗃️ No open cash session for operator {operator_id}; payment #{} recorded without a \
                             drawer movement",
                            paid.id
                        );
                    },
                }
            }
        }
        let total_paid = payments::total_paid_for_order(paid.order_id, &mut tx).await?;
        let new_status = PaymentStatus::derive(total_paid, order.final_cost);
        let order = if new_status == order.payment_status {
            order
        } else {
            orders::update_payment_status(&order.tenant_id, order.id, new_status, &mut tx).await?
        };
        tx.commit().await?;
        debug!(
            "🗃️ Payment #{} reconciled. Order [{}] has {} paid and is {}",
            paid.id, order.order_number, total_paid, order.payment_status
        );
        Ok(RecordedPayment { payment: paid, order, total_paid })
    }

    async fn fetch_payments_for_order(
        &self,
        tenant_id: &TenantId,
        order_id: i64,
    ) -> Result<Vec<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_payments_for_order(tenant_id, order_id, &mut conn).await
    }

    async fn order_total_paid(&self, tenant_id: &TenantId, order_id: i64) -> Result<Money, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let _order = orders::fetch_order(tenant_id, order_id, &mut tx)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))?;
        let total = payments::total_paid_for_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(total)
    }

    async fn set_payment_status(
        &self,
        tenant_id: &TenantId,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_payment_status(tenant_id, order_id, status, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sqlite::db::run_migrations;

    async fn memory_db() -> SqliteDatabase {
        let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating database");
        run_migrations(db.pool()).await.expect("Error running migrations");
        db
    }

    #[tokio::test]
    async fn aborted_reconciliation_leaves_no_trace() {
        let _ = env_logger::try_init();
        let db = memory_db().await;
        let tenant = TenantId::from("shop-a");
        let (session, order) = {
            let mut conn = db.pool().acquire().await.unwrap();
            let session = cash_register::insert_session(
                NewCashSession::new(tenant.clone(), "carla", Money::from_whole(50)),
                &mut conn,
            )
            .await
            .unwrap();
            let order = orders::insert_order(
                tenant.clone(),
                "001-001-000000001".to_string(),
                Money::from_whole(25),
                &mut conn,
            )
            .await
            .unwrap();
            (session, order)
        };

        // Run every write of the reconciliation unit of work, then abort instead of committing
        let mut tx = db.pool().begin().await.unwrap();
        let payment = payments::insert_payment(
            NewPayment::new(tenant.clone(), order.id, Money::from_whole(25), PaymentMethod::Cash),
            &mut tx,
        )
        .await
        .unwrap();
        let movement = cash_register::insert_movement(
            &tenant,
            session.id,
            MovementKind::Inflow,
            Money::from_whole(25),
            None,
            &mut tx,
        )
        .await
        .unwrap();
        payments::link_movement(payment.id, movement.id, &mut tx).await.unwrap();
        orders::update_payment_status(&tenant, order.id, PaymentStatus::Paid, &mut tx).await.unwrap();
        tx.rollback().await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(payments::fetch_payments_for_order(&tenant, order.id, &mut conn).await.unwrap().is_empty());
        assert_eq!(cash_register::movement_total(session.id, &mut conn).await.unwrap(), Money::from(0));
        let order = orders::fetch_order(&tenant, order.id, &mut conn).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn aborted_order_creation_returns_the_number_to_the_series() {
        let db = memory_db().await;
        let key = SequenceKey::new("shop-a", DocumentType::Order, "001", "001");
        let mut tx = db.pool().begin().await.unwrap();
        let value = sequences::next_value(&key, &mut tx).await.unwrap();
        assert_eq!(value, 1);
        tx.rollback().await.unwrap();

        // The increment rolled back with the transaction, so nothing was burned
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(sequences::current_value(&key, &mut conn).await.unwrap(), None);
        assert_eq!(sequences::next_value(&key, &mut conn).await.unwrap(), 1);
    }
}
