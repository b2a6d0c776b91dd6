//! Persistence for riverboat: chip balances and hand histories.
//!
//! Two tables, one discipline: every balance change happens inside a
//! serializable transaction holding row locks in ascending id order, and a
//! hand's deltas commit together with its history row or not at all.
//!
//! - [`Ledger`] — the PostgreSQL implementation (also the production
//!   [`Bank`](rvb_table::Bank))
//! - [`Schema`] — compile-time DDL for [`User`] and [`HandHistory`]
//! - [`plan`] — pure delta validation, shared by every write path
mod ledger;
mod schema;

pub use ledger::Ledger;
pub use ledger::LedgerError;
pub use ledger::plan;
pub use schema::HandHistory;
pub use schema::Schema;
pub use schema::User;
pub use schema::HANDS;
pub use schema::USERS;
