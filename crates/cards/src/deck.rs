use super::card::Card;
use rand::Rng;

/// Attempt to deal past the end of the deck. The state machine treats this
/// as a programming error: a 6-max hand consumes at most 3 + 5 + 12 cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted {
    pub needed: usize,
    pub left: usize,
}

impl std::fmt::Display for Exhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deck exhausted: needed {}, {} left", self.needed, self.left)
    }
}
impl std::error::Error for Exhausted {}

/// One shuffled permutation of the 52-card universe with a cursor to the
/// next undealt card. Built fresh at the start of every hand.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    next: usize,
}

impl Deck {
    /// The canonical 52-card sequence, permuted uniformly at random by an
    /// in-place Fisher-Yates pass over the supplied generator.
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut cards = (0..52u8).map(Card::from).collect::<Vec<Card>>();
        for i in (1..cards.len()).rev() {
            let j = rng.random_range(0..=i);
            cards.swap(i, j);
        }
        Self { cards, next: 0 }
    }
    /// Next k cards in deal order, advancing the cursor.
    pub fn deal(&mut self, k: usize) -> Result<Vec<Card>, Exhausted> {
        if self.remaining() < k {
            Err(Exhausted {
                needed: k,
                left: self.remaining(),
            })
        } else {
            let dealt = self.cards[self.next..self.next + k].to_vec();
            self.next += k;
            Ok(dealt)
        }
    }
    /// Discard the next card face-down.
    pub fn burn(&mut self) -> Result<(), Exhausted> {
        self.deal(1).map(std::mem::drop)
    }
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut deck = Deck::shuffled(&mut rng);
        let cards = deck.deal(52).unwrap();
        let unique = cards.iter().copied().collect::<HashSet<Card>>();
        assert_eq!(unique.len(), 52);
        assert_eq!(deck.remaining(), 0);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let mut x = Deck::shuffled(&mut a);
        let mut y = Deck::shuffled(&mut b);
        assert_eq!(x.deal(52).unwrap(), y.deal(52).unwrap());
    }

    #[test]
    fn deal_and_burn_advance_together() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = Deck::shuffled(&mut rng);
        deck.burn().unwrap();
        let flop = deck.deal(3).unwrap();
        assert_eq!(flop.len(), 3);
        assert_eq!(deck.remaining(), 48);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut deck = Deck::shuffled(&mut rng);
        deck.deal(50).unwrap();
        let err = deck.deal(3).unwrap_err();
        assert_eq!(err, Exhausted { needed: 3, left: 2 });
        assert!(deck.burn().is_ok());
        assert!(deck.burn().is_ok());
        assert!(deck.burn().is_err());
    }
}
