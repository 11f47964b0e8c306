//! Taller Ledger Engine
//!
//! The Taller Ledger Engine is the transactional core of the Taller workshop platform. It hands out gapless-enough
//! document numbers, reconciles payments against orders, and keeps each operator's cash drawer honest. It is
//! front-end agnostic; invoicing, sales and order screens all drive it through the same API.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the ledger engine:
//!    sequence allocation, cash register management and payment reconciliation. Specific backends need to implement
//!    the traits in the [`mod@traits`] module in order to act as a backend for the engine.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when a payment fully settles an order, an `OrderPaidEvent` is emitted.
//! A simple Actor framework is used so that you can easily hook into these events and perform custom actions.
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::db::run_migrations;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use api::{cash_register_api::CashRegisterApi, reconciliation_api::ReconciliationApi, sequence_api::SequenceApi};
pub use traits::{
    AllocatedNumber,
    CashRegisterError,
    CashRegisterManagement,
    LedgerDatabase,
    LedgerError,
    RecordedPayment,
    SequenceAllocation,
    SequenceError,
};
