//! # Taller ledger engine public API
//!
//! The `api` module exposes the programmatic API for the ledger engine.
//! The API is modular, so that clients can pick and choose the functionality they want. A billing
//! service might only need the [`sequence_api`], while a point-of-sale screen uses the
//! [`cash_register_api`] and [`reconciliation_api`] together.
//!
//! * [`sequence_api`] hands out document numbers from per-tenant series.
//! * [`cash_register_api`] manages the cash drawer lifecycle: opening sessions, recording movements, and closing with
//!   a counted balance.
//! * [`reconciliation_api`] is the primary API for recording payments against orders and keeping order payment status
//!   and the cash drawer consistent with each other.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to allocate an invoice number:
//!
//! ```rust,ignore
//! use taller_ledger_engine::{db_types::{DocumentType, SequenceKey}, SequenceApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements SequenceAllocation
//! let api = SequenceApi::new(db);
//! let number = api.allocate(&SequenceKey::new("shop-a", DocumentType::Invoice, "001", "001"), None).await?;
//! ```
//!
//! All mutating API calls retry automatically when the backend reports a transient storage
//! conflict, up to a small bounded number of attempts. Callers only ever see a
//! `TransientConflict` error once the retry budget is spent.

pub mod cash_register_api;
pub mod reconciliation_api;
pub mod sequence_api;

mod retry;

pub(crate) use retry::with_retry;
