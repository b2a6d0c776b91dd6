use super::card::Card;
use super::evaluator::Evaluator;
use super::kicks::Kickers;
use super::ranking::Ranking;

/// A fully-evaluated hand strength.
///
/// Combines the [`Ranking`] with [`Kickers`] and the five cards that realize
/// it. Comparison goes through [`score`](Self::score), a packed integer that
/// is strictly greater for the stronger hand and equal only on a true split
/// tie; the witness never participates.
#[derive(Debug, Clone, Copy)]
pub struct Strength {
    ranking: Ranking,
    kicks: Kickers,
    witness: [Card; 5],
}

impl From<(Ranking, Kickers, [Card; 5])> for Strength {
    fn from((ranking, kicks, witness): (Ranking, Kickers, [Card; 5])) -> Self {
        Self {
            ranking,
            kicks,
            witness,
        }
    }
}

impl From<Evaluator> for Strength {
    fn from(e: Evaluator) -> Self {
        let ranking = e.ranking();
        let kicks = e.kickers(ranking);
        let witness = e.witness(ranking);
        Self::from((ranking, kicks, witness))
    }
}

impl From<[Card; 7]> for Strength {
    fn from(cards: [Card; 7]) -> Self {
        Self::from(Evaluator::from(cards))
    }
}

impl Strength {
    pub fn ranking(&self) -> Ranking {
        self.ranking
    }
    pub fn kickers(&self) -> Kickers {
        self.kicks
    }
    pub fn witness(&self) -> [Card; 5] {
        self.witness
    }
    pub fn label(&self) -> &'static str {
        self.ranking.label()
    }
    /// Packed total order:
    /// category (bits 21..25) | primary (17..21) | secondary (13..17) | kickers (0..13).
    pub fn score(&self) -> u32 {
        let ord = self.ranking.ordinal() as u32;
        let hi = self.ranking.primary().map(|r| r as u32).unwrap_or(0);
        let lo = self.ranking.secondary().map(|r| r as u32).unwrap_or(0);
        let kicks = u16::from(self.kicks) as u32;
        (ord << 21) | (hi << 17) | (lo << 13) | kicks
    }
}

impl PartialEq for Strength {
    fn eq(&self, other: &Self) -> bool {
        self.score() == other.score()
    }
}
impl Eq for Strength {}
impl PartialOrd for Strength {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Strength {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score().cmp(&other.score())
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:<18}{:>5}", self.ranking, self.kicks)
    }
}
