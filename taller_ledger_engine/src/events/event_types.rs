use serde::{Deserialize, Serialize};
use tlr_common::Money;

use crate::db_types::{Order, Payment};

/// Fired after every successful payment reconciliation, whether or not the order became fully
/// paid as a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecordedEvent {
    pub payment: Payment,
    pub order: Order,
    pub total_paid: Money,
}

impl PaymentRecordedEvent {
    pub fn new(payment: Payment, order: Order, total_paid: Money) -> Self {
        Self { payment, order, total_paid }
    }
}

/// Fired when a payment tips an order over into fully paid. Emitted at most once per order per
/// transition; later over-payments do not fire it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
