//! Async runtime for live tables.
//!
//! Each table runs as its own task: one [`Runner`] owning one
//! [`Machine`](rvb_gameplay::Machine), fed by one command queue. Client
//! messages, timer expirations, and settlement results all arrive as
//! [`Command`]s, so intra-table ordering needs no locks at all.
//!
//! - [`Runner`] / [`Handle`] — the actor and its address
//! - [`Command`] — everything the loop can be asked to do
//! - [`Bank`] — the persistence seam ([`MemBank`] for tests)
//! - [`SocialHub`] — the high-frequency channel, batched per tick
mod bank;
mod command;
mod runner;
mod social;

pub use bank::Bank;
pub use bank::BankError;
pub use bank::MemBank;
pub use command::Command;
pub use command::Summary;
pub use runner::Handle;
pub use runner::Runner;
pub use social::SocialHub;
