//! The primary API for recording payments against orders.

use std::fmt::Debug;

use log::*;
use tlr_common::Money;

use crate::{
    api::with_retry,
    db_types::{NewOrder, NewPayment, Order, Payment, PaymentStatus, TenantId},
    events::{EventProducers, OrderPaidEvent, PaymentRecordedEvent},
    traits::{LedgerDatabase, LedgerError, RecordedPayment},
};

/// `ReconciliationApi` is the primary API for handling payment flows.
///
/// Recording a payment is one atomic unit of work: the payment row, the cash drawer movement
/// (when one applies) and the recomputed order status land together or not at all. After the
/// unit of work commits, subscribed event hooks are notified.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerDatabase
{
    /// Creates a new order, drawing its display number from the tenant's order series.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        if order.final_cost.value() < 0 {
            return Err(LedgerError::ValidationError(format!(
                "order final cost must not be negative, got {}",
                order.final_cost
            )));
        }
        if order.establishment.trim().is_empty() || order.emission_point.trim().is_empty() {
            return Err(LedgerError::ValidationError(
                "establishment and emission point codes must not be empty".to_string(),
            ));
        }
        let order =
            with_retry("Order creation", LedgerError::is_transient, || self.db.create_order(order.clone())).await?;
        debug!("🔄️📝️ Order [{}] created for tenant {}", order.order_number, order.tenant_id);
        Ok(order)
    }

    /// Records a payment against an order and reconciles everything that hangs off it.
    ///
    /// The rules, all applied within a single transaction:
    /// * the order must exist and belong to the payment's tenant;
    /// * the amount must be positive, but over-payment of an already-paid order is recorded, not
    ///   rejected;
    /// * a cash payment whose operator has an open session produces a drawer inflow, and the
    ///   payment is linked to it; without an open session the payment is recorded on its own;
    /// * the order's payment status is recomputed from the full sum of its payments.
    ///
    /// Subscribers are notified after the transaction commits: every success fires
    /// [`PaymentRecordedEvent`], and a payment that tips the order into fully paid also fires
    /// [`OrderPaidEvent`].
    pub async fn record_payment(&self, payment: NewPayment) -> Result<RecordedPayment, LedgerError> {
        if !payment.amount.is_positive() {
            return Err(LedgerError::ValidationError(format!(
                "payment amount must be positive, got {}",
                payment.amount
            )));
        }
        let recorded =
            with_retry("Payment reconciliation", LedgerError::is_transient, || self.db.record_payment(payment.clone()))
                .await?;
        self.call_payment_recorded_hook(&recorded).await;
        if recorded.settled() && recorded.previous_status() != PaymentStatus::Paid {
            self.call_order_paid_hook(&recorded.order).await;
        }
        debug!(
            "🔄️💰️ Payment #{} for order [{}] reconciled. The order is now {}",
            recorded.payment.id, recorded.order.order_number, recorded.order.payment_status
        );
        Ok(recorded)
    }

    async fn call_payment_recorded_hook(&self, recorded: &RecordedPayment) {
        for emitter in &self.producers.payment_recorded_producer {
            trace!("🔄️💰️ Notifying payment recorded hook subscribers");
            let event = PaymentRecordedEvent::new(
                recorded.payment.clone(),
                recorded.order.clone(),
                recorded.total_paid,
            );
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️💰️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Fetches an order by internal id, or `None` if it does not exist for this tenant.
    pub async fn fetch_order(&self, tenant_id: &TenantId, order_id: i64) -> Result<Option<Order>, LedgerError> {
        self.db.fetch_order(tenant_id, order_id).await
    }

    /// Returns all payments recorded against the order, oldest first.
    pub async fn payments_for_order(&self, tenant_id: &TenantId, order_id: i64)
        -> Result<Vec<Payment>, LedgerError> {
        self.db.fetch_payments_for_order(tenant_id, order_id).await
    }

    /// Returns the sum of all payments recorded against the order.
    pub async fn total_paid(&self, tenant_id: &TenantId, order_id: i64) -> Result<Money, LedgerError> {
        self.db.order_total_paid(tenant_id, order_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
