use super::rank::Rank;

/// Hand category with its defining ranks.
///
/// Variant order is strength order, so the derived `Ord` agrees with poker:
/// any flush beats any straight, etc. Ties within a category fall through
/// to [`Kickers`](super::kicks::Kickers) at the [`Strength`](super::strength::Strength) level.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ranking {
    HighCard(Rank),
    OnePair(Rank),
    TwoPair(Rank, Rank),
    ThreeOAK(Rank),
    Straight(Rank),
    Flush(Rank),
    FullHouse(Rank, Rank),
    FourOAK(Rank),
    StraightFlush(Rank),
    RoyalFlush,
}

impl Ranking {
    /// Category ordinal, high card 0 through royal flush 9.
    pub const fn ordinal(&self) -> u8 {
        match self {
            Ranking::HighCard(_) => 0,
            Ranking::OnePair(_) => 1,
            Ranking::TwoPair(_, _) => 2,
            Ranking::ThreeOAK(_) => 3,
            Ranking::Straight(_) => 4,
            Ranking::Flush(_) => 5,
            Ranking::FullHouse(_, _) => 6,
            Ranking::FourOAK(_) => 7,
            Ranking::StraightFlush(_) => 8,
            Ranking::RoyalFlush => 9,
        }
    }
    /// Primary tie-break rank (quads rank, higher pair, straight high card).
    pub fn primary(&self) -> Option<Rank> {
        match *self {
            Ranking::HighCard(r)
            | Ranking::OnePair(r)
            | Ranking::ThreeOAK(r)
            | Ranking::Straight(r)
            | Ranking::Flush(r)
            | Ranking::FourOAK(r)
            | Ranking::StraightFlush(r) => Some(r),
            Ranking::TwoPair(hi, _) | Ranking::FullHouse(hi, _) => Some(hi),
            Ranking::RoyalFlush => None,
        }
    }
    /// Secondary tie-break rank (lower pair, full-house fill).
    pub fn secondary(&self) -> Option<Rank> {
        match *self {
            Ranking::TwoPair(_, lo) | Ranking::FullHouse(_, lo) => Some(lo),
            _ => None,
        }
    }
    /// Human-readable label for hand results.
    pub const fn label(&self) -> &'static str {
        match self {
            Ranking::HighCard(_) => "High Card",
            Ranking::OnePair(_) => "Pair",
            Ranking::TwoPair(_, _) => "Two Pair",
            Ranking::ThreeOAK(_) => "Three of a Kind",
            Ranking::Straight(_) => "Straight",
            Ranking::Flush(_) => "Flush",
            Ranking::FullHouse(_, _) => "Full House",
            Ranking::FourOAK(_) => "Four of a Kind",
            Ranking::StraightFlush(_) => "Straight Flush",
            Ranking::RoyalFlush => "Royal Flush",
        }
    }
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Ranking::RoyalFlush => write!(f, "{}", self.label()),
            Ranking::TwoPair(hi, lo) | Ranking::FullHouse(hi, lo) => {
                write!(f, "{} {}{}", self.label(), hi, lo)
            }
            _ => match self.primary() {
                Some(r) => write!(f, "{} {}", self.label(), r),
                None => write!(f, "{}", self.label()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order() {
        assert!(Ranking::OnePair(Rank::Two) > Ranking::HighCard(Rank::Ace));
        assert!(Ranking::Flush(Rank::Seven) > Ranking::Straight(Rank::Ace));
        assert!(Ranking::RoyalFlush > Ranking::StraightFlush(Rank::King));
    }

    #[test]
    fn rank_order_within_category() {
        assert!(Ranking::TwoPair(Rank::Ace, Rank::Two) > Ranking::TwoPair(Rank::King, Rank::Queen));
        assert!(Ranking::Straight(Rank::Six) > Ranking::Straight(Rank::Five));
    }
}
