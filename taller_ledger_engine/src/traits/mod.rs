//! # Database management and control.
//!
//! This module provides the interfaces that define the interface contracts of the ledger engine database *backends*.
//!
//! ## Sequences
//! A sequence is a per-tenant counter keyed by document type, establishment and emission point. The
//! [`SequenceAllocation`] trait hands out the next value in a series atomically, so that concurrent callers
//! never see a duplicate and never see a value re-issued below one they have already observed.
//!
//! ## Cash register
//! The [`CashRegisterManagement`] trait covers the lifetime of an operator's cash drawer: opening a session,
//! recording inflows and outflows against it, and closing it with a counted balance. A tenant allows at most
//! one open session per operator at any time.
//!
//! ## Reconciliation
//! [`LedgerDatabase`] is the top-level contract. Its `record_payment` method performs the whole
//! payment-reconciliation unit of work atomically: the payment row, its optional cash movement, and the
//! recomputed order status all land together or not at all.
//!
//! All three error types distinguish transient storage conflicts (lock contention, pool exhaustion) from
//! real failures, so that callers can retry the former without inspecting message strings.
mod cash_management;
mod ledger_database;
mod sequence_management;

mod data_objects;

pub use cash_management::{CashRegisterError, CashRegisterManagement};
pub use data_objects::{AllocatedNumber, RecordedPayment};
pub use ledger_database::{LedgerDatabase, LedgerError};
pub use sequence_management::{SequenceAllocation, SequenceError};

/// Returns true when the error reflects contention that a retry can be expected to clear,
/// rather than a broken query or a constraint violation. SQLite reports lock contention as
/// `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6), plus their extended codes.
pub(crate) fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5" | "6" | "261" | "517")) || db.message().contains("locked")
        },
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
