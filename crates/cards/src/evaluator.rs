use super::card::Card;
use super::kicks::Kickers;
use super::rank::Rank;
use super::ranking::Ranking;
use super::suit::Suit;

/// Evaluates a showdown hand: two hole cards plus five community cards.
///
/// Works over rank and suit bitmasks, searching categories from strongest
/// to weakest. The first match wins; with seven cards no two categories
/// the search order could confuse can coexist.
pub struct Evaluator {
    cards: [Card; 7],
}

impl From<[Card; 7]> for Evaluator {
    fn from(cards: [Card; 7]) -> Self {
        Self { cards }
    }
}

/// Callers must pass exactly seven cards; anything else is a bug upstream.
impl From<&[Card]> for Evaluator {
    fn from(cards: &[Card]) -> Self {
        assert!(cards.len() == 7, "evaluator requires exactly 7 cards");
        let mut seven = [cards[0]; 7];
        seven.copy_from_slice(cards);
        Self { cards: seven }
    }
}

impl Evaluator {
    pub fn ranking(&self) -> Ranking {
        None.or_else(|| self.find_straight_flush())
            .or_else(|| self.find_4_oak())
            .or_else(|| self.find_full_house())
            .or_else(|| self.find_flush())
            .or_else(|| self.find_straight())
            .or_else(|| self.find_3_oak())
            .or_else(|| self.find_2_oak_2_oak())
            .or_else(|| self.find_2_oak())
            .unwrap_or_else(|| Ranking::HighCard(Rank::from(self.rank_mask())))
    }
    pub fn kickers(&self, ranking: Ranking) -> Kickers {
        let n = match ranking {
            Ranking::FourOAK(_) | Ranking::TwoPair(_, _) => 1,
            Ranking::ThreeOAK(_) => 2,
            Ranking::OnePair(_) => 3,
            Ranking::HighCard(_) | Ranking::Flush(_) => 4,
            _ => return Kickers::default(),
        };
        let used = ranking
            .primary()
            .map(u16::from)
            .into_iter()
            .chain(ranking.secondary().map(u16::from))
            .fold(0u16, |acc, bit| acc | bit);
        let pool = match ranking {
            Ranking::Flush(_) => {
                let suit = self.flush_suit().expect("flush ranking implies a flush suit");
                Self::top_n(self.suit_masks()[suit as usize], 5)
            }
            _ => self.rank_mask(),
        };
        Kickers::from(Self::top_n(pool & !used, n))
    }
    /// The five cards realizing the ranking, strongest grouping first.
    pub fn witness(&self, ranking: Ranking) -> [Card; 5] {
        let five = match ranking {
            Ranking::RoyalFlush => self.run_cards(Rank::Ace, self.flush_suit()),
            Ranking::StraightFlush(hi) => self.run_cards(hi, self.flush_suit()),
            Ranking::Straight(hi) => self.run_cards(hi, None),
            Ranking::Flush(_) => {
                let suit = self.flush_suit().expect("flush ranking implies a flush suit");
                let mut of_suit = self
                    .sorted()
                    .into_iter()
                    .filter(|c| c.suit() == suit)
                    .collect::<Vec<Card>>();
                of_suit.truncate(5);
                of_suit
            }
            Ranking::FourOAK(r) => self.grouped(&[(r, 4)]),
            Ranking::FullHouse(t, p) => self.grouped(&[(t, 3), (p, 2)]),
            Ranking::ThreeOAK(r) => self.grouped(&[(r, 3)]),
            Ranking::TwoPair(hi, lo) => self.grouped(&[(hi, 2), (lo, 2)]),
            Ranking::OnePair(r) => self.grouped(&[(r, 2)]),
            Ranking::HighCard(_) => self.sorted().into_iter().take(5).collect(),
        };
        five.try_into().expect("five witness cards")
    }

    //

    fn find_straight_flush(&self) -> Option<Ranking> {
        self.flush_suit()
            .and_then(|suit| Self::straight_high(self.suit_masks()[suit as usize]))
            .map(|hi| match hi {
                Rank::Ace => Ranking::RoyalFlush,
                hi => Ranking::StraightFlush(hi),
            })
    }
    fn find_4_oak(&self) -> Option<Ranking> {
        self.rank_of_count(4, None).map(Ranking::FourOAK)
    }
    fn find_full_house(&self) -> Option<Ranking> {
        self.rank_of_count(3, None).and_then(|trips| {
            self.rank_of_count(2, Some(trips))
                .map(|fill| Ranking::FullHouse(trips, fill))
        })
    }
    fn find_flush(&self) -> Option<Ranking> {
        self.flush_suit()
            .map(|suit| Ranking::Flush(Rank::from(self.suit_masks()[suit as usize])))
    }
    fn find_straight(&self) -> Option<Ranking> {
        Self::straight_high(self.rank_mask()).map(Ranking::Straight)
    }
    fn find_3_oak(&self) -> Option<Ranking> {
        self.rank_of_count(3, None).map(Ranking::ThreeOAK)
    }
    fn find_2_oak_2_oak(&self) -> Option<Ranking> {
        self.rank_of_count(2, None).and_then(|hi| {
            self.rank_of_count(2, Some(hi))
                .map(|lo| Ranking::TwoPair(hi, lo))
        })
    }
    fn find_2_oak(&self) -> Option<Ranking> {
        self.rank_of_count(2, None).map(Ranking::OnePair)
    }

    //

    /// Highest rank held at least n times, strictly below `under` if given.
    fn rank_of_count(&self, n: u8, under: Option<Rank>) -> Option<Rank> {
        let counts = self.rank_counts();
        (0..13u8)
            .rev()
            .filter(|&i| under.map(|u| i != u8::from(u)).unwrap_or(true))
            .find(|&i| counts[i as usize] >= n)
            .map(Rank::from)
    }
    /// High card of a five-in-a-row run within the mask, wheel included.
    fn straight_high(mask: u16) -> Option<Rank> {
        const WHEEL: u16 = 0b1_0000_0000_1111;
        let mut bits = mask;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        bits &= bits << 1;
        if bits & 0x1FFF > 0 {
            Some(Rank::from(bits))
        } else if WHEEL == WHEEL & mask {
            Some(Rank::Five)
        } else {
            None
        }
    }
    /// Keep only the n highest bits of the mask.
    fn top_n(mask: u16, n: u32) -> u16 {
        let mut bits = mask;
        while bits.count_ones() > n {
            bits &= !(1 << bits.trailing_zeros());
        }
        bits
    }

    //

    fn rank_counts(&self) -> [u8; 13] {
        self.cards.iter().fold([0u8; 13], |mut counts, c| {
            counts[u8::from(c.rank()) as usize] += 1;
            counts
        })
    }
    fn rank_mask(&self) -> u16 {
        self.cards
            .iter()
            .map(|c| u16::from(c.rank()))
            .fold(0, |acc, r| acc | r)
    }
    fn suit_masks(&self) -> [u16; 4] {
        self.cards.iter().fold([0u16; 4], |mut suits, c| {
            suits[u8::from(c.suit()) as usize] |= u16::from(c.rank());
            suits
        })
    }
    fn flush_suit(&self) -> Option<Suit> {
        let counts = self.cards.iter().fold([0u8; 4], |mut counts, c| {
            counts[u8::from(c.suit()) as usize] += 1;
            counts
        });
        counts.iter().position(|&n| n >= 5).map(|i| Suit::from(i as u8))
    }

    //

    /// Cards in descending rank order.
    fn sorted(&self) -> Vec<Card> {
        let mut cards = self.cards.to_vec();
        cards.sort_by(|a, b| b.rank().cmp(&a.rank()));
        cards
    }
    /// n cards of each listed rank, then the best remaining cards up to five.
    fn grouped(&self, groups: &[(Rank, u8)]) -> Vec<Card> {
        let mut five = Vec::with_capacity(5);
        for &(rank, n) in groups {
            five.extend(
                self.cards
                    .iter()
                    .filter(|c| c.rank() == rank)
                    .take(n as usize),
            );
        }
        for card in self.sorted() {
            if five.len() == 5 {
                break;
            }
            if groups.iter().all(|&(rank, _)| card.rank() != rank) {
                five.push(card);
            }
        }
        five
    }
    /// One card per rank of the run ending at `hi`, within a suit if given.
    fn run_cards(&self, hi: Rank, suit: Option<Suit>) -> Vec<Card> {
        Self::run(hi)
            .iter()
            .map(|&rank| {
                self.cards
                    .iter()
                    .find(|c| c.rank() == rank && suit.map(|s| c.suit() == s).unwrap_or(true))
                    .copied()
                    .expect("run card present")
            })
            .collect()
    }
    /// Ranks of a straight from its high card down; the wheel wraps to Ace.
    fn run(hi: Rank) -> [Rank; 5] {
        match hi {
            Rank::Five => [Rank::Five, Rank::Four, Rank::Three, Rank::Two, Rank::Ace],
            hi => {
                let top = u8::from(hi);
                [
                    Rank::from(top),
                    Rank::from(top - 1),
                    Rank::from(top - 2),
                    Rank::from(top - 3),
                    Rank::from(top - 4),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven(s: &str) -> Evaluator {
        let cards = s
            .split_whitespace()
            .map(|c| Card::try_from(c).unwrap())
            .collect::<Vec<Card>>();
        Evaluator::from(cards.as_slice())
    }

    #[test]
    fn high_card() {
        let e = seven("Ah Kd Qc Js 9h 7d 4c");
        assert_eq!(e.ranking(), Ranking::HighCard(Rank::Ace));
    }

    #[test]
    fn one_pair() {
        let e = seven("Ah Ad Qc Js 9h 7d 4c");
        assert_eq!(e.ranking(), Ranking::OnePair(Rank::Ace));
    }

    #[test]
    fn two_pair_takes_highest_two_of_three() {
        let e = seven("Ah Ad Kc Ks Qh Qd 4c");
        assert_eq!(e.ranking(), Ranking::TwoPair(Rank::Ace, Rank::King));
        // third pair's rank is still the best kicker
        assert_eq!(e.kickers(e.ranking()).ranks(), vec![Rank::Queen]);
    }

    #[test]
    fn three_oak() {
        let e = seven("Ah Ad Ac Js 9h 7d 4c");
        assert_eq!(e.ranking(), Ranking::ThreeOAK(Rank::Ace));
        assert_eq!(e.kickers(e.ranking()).ranks(), vec![Rank::Jack, Rank::Nine]);
    }

    #[test]
    fn straight_ace_high() {
        let e = seven("Ah Kd Qc Js Th 7d 4c");
        assert_eq!(e.ranking(), Ranking::Straight(Rank::Ace));
    }

    #[test]
    fn wheel_high_card_is_five() {
        let e = seven("Ah 2d 3c 4s 5h Kd 9c");
        assert_eq!(e.ranking(), Ranking::Straight(Rank::Five));
    }

    #[test]
    fn six_high_beats_wheel() {
        let e = seven("Ah 2d 3c 4s 5h 6d 9c");
        assert_eq!(e.ranking(), Ranking::Straight(Rank::Six));
    }

    #[test]
    fn flush_over_straight() {
        let e = seven("4h 6h 7h 8h 9h Ts 2c");
        assert_eq!(e.ranking(), Ranking::Flush(Rank::Nine));
    }

    #[test]
    fn full_house_from_two_trips() {
        let e = seven("Ah Ad Ac Ks Kh Kd Qc");
        assert_eq!(e.ranking(), Ranking::FullHouse(Rank::Ace, Rank::King));
    }

    #[test]
    fn four_oak() {
        let e = seven("Ah Ad Ac As Kh Kd Qc");
        assert_eq!(e.ranking(), Ranking::FourOAK(Rank::Ace));
        assert_eq!(e.kickers(e.ranking()).ranks(), vec![Rank::King]);
    }

    #[test]
    fn straight_flush_over_four_oak_search_order() {
        let e = seven("5h 6h 7h 8h 9h 9d 9c");
        assert_eq!(e.ranking(), Ranking::StraightFlush(Rank::Nine));
    }

    #[test]
    fn royal_flush() {
        let e = seven("Th Jh Qh Kh Ah 2d 3c");
        assert_eq!(e.ranking(), Ranking::RoyalFlush);
    }

    #[test]
    fn wheel_straight_flush_is_not_royal() {
        let e = seven("Ah 2h 3h 4h 5h Kd 9c");
        assert_eq!(e.ranking(), Ranking::StraightFlush(Rank::Five));
    }

    #[test]
    fn witness_has_five_cards_of_the_category() {
        let e = seven("Ah Ad Ac Ks Kh 7d 4c");
        let witness = e.witness(e.ranking());
        assert_eq!(witness.len(), 5);
        assert_eq!(witness.iter().filter(|c| c.rank() == Rank::Ace).count(), 3);
        assert_eq!(witness.iter().filter(|c| c.rank() == Rank::King).count(), 2);
    }

    #[test]
    fn witness_of_wheel_ends_on_ace() {
        let e = seven("Ah 2d 3c 4s 5h Kd 9c");
        let witness = e.witness(e.ranking());
        assert_eq!(witness[0].rank(), Rank::Five);
        assert_eq!(witness[4].rank(), Rank::Ace);
    }

    #[test]
    #[should_panic]
    fn wrong_cardinality_panics() {
        let cards = [Card::try_from("Ah").unwrap(); 3];
        let _ = Evaluator::from(&cards[..]);
    }
}
