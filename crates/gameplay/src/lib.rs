//! Authoritative hold'em rules for the riverboat server.
//!
//! Everything in this crate is synchronous and deterministic given the
//! injected RNG: the async table runner owns a [`Machine`] and feeds it
//! [`Input`]s one at a time, observing [`Effect`]s and re-projecting
//! sanitized [`view`]s after each step.
//!
//! - [`Machine`] — the per-table state machine (seating, blinds, betting,
//!   showdown, payout)
//! - [`Pots`] — contribution tracking, side pots, deterministic distribution
//! - [`view`] — per-recipient snapshots, deltas, and the sanitization check
//! - [`protocol`] — wire events and the closed error-code set
//! - [`HandRecord`] — the append-only hand history document
mod action;
mod machine;
mod phase;
mod pot;
mod record;
mod seat;

pub mod protocol;
pub mod view;

pub use action::Action;
pub use machine::Config;
pub use machine::Effect;
pub use machine::Input;
pub use machine::Machine;
pub use machine::TimerKind;
pub use phase::Phase;
pub use pot::Pot;
pub use pot::Pots;
pub use record::ActionRecord;
pub use record::HandRecord;
pub use record::SeatRecord;
pub use seat::Seat;
