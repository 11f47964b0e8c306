use serde::{Deserialize, Serialize};
use tlr_common::Money;

use crate::db_types::{Order, Payment, PaymentStatus};

/// The result of a sequence allocation: the raw counter value and the display form consumers
/// embed in their documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedNumber {
    pub value: i64,
    /// E.g. "001-001-000000123", or "VTA-001-000000123" for a prefixed series
    pub formatted: String,
}

impl AllocatedNumber {
    pub fn new(value: i64, formatted: String) -> Self {
        Self { value, formatted }
    }
}

/// Everything that came out of one payment-reconciliation unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedPayment {
    /// The payment row as persisted, including the cash movement link if one was made
    pub payment: Payment,
    /// The order after its payment status was recomputed
    pub order: Order,
    /// The sum of all payments against the order, including this one
    pub total_paid: Money,
}

impl RecordedPayment {
    /// True when the payment produced a cash drawer movement.
    pub fn entered_cash_drawer(&self) -> bool {
        self.payment.movement_id.is_some()
    }

    /// True when the order is fully paid after this payment.
    pub fn settled(&self) -> bool {
        self.order.payment_status == PaymentStatus::Paid
    }

    /// The status the order carried before this payment was applied, reconstructed from the
    /// running total. Used to detect the pending/partial -> paid transition.
    pub fn previous_status(&self) -> PaymentStatus {
        PaymentStatus::derive(self.total_paid - self.payment.amount, self.order.final_cost)
    }
}
