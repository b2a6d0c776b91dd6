//! Card primitives for the riverboat server.
//!
//! - [`Card`], [`Rank`], [`Suit`] — value types with string and integer isomorphisms
//! - [`Deck`] — one shuffled permutation per hand, dealt sequentially
//! - [`Evaluator`], [`Strength`] — seven-card showdown evaluation with a total order
mod card;
mod deck;
mod evaluator;
mod kicks;
mod rank;
mod ranking;
mod strength;
mod suit;

pub use card::Card;
pub use deck::Deck;
pub use deck::Exhausted;
pub use evaluator::Evaluator;
pub use kicks::Kickers;
pub use rank::Rank;
pub use ranking::Ranking;
pub use strength::Strength;
pub use suit::Suit;
