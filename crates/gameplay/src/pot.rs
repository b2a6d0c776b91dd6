use rvb_core::Chips;
use rvb_core::PlayerId;
use std::collections::BTreeMap;

/// One pot: an amount and the players eligible to win it. Main pot first in
/// any pot list; later entries are side pots from all-in shortfalls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
}

/// Per-hand wager aggregation and side-pot arithmetic.
///
/// Contributions accumulate across the whole hand, current-round wagers
/// included, so `total()` is always the live pot. At showdown the pool is
/// partitioned by the distinct contribution levels of the players still in:
/// everyone in for at least level `L_i` funds `L_i − L_{i-1}` of pot `i` and
/// is eligible for it. Folded money fills the same levels bottom-up without
/// eligibility; whatever exceeds the top level sinks into the last pot.
#[derive(Debug, Clone, Default)]
pub struct Pots {
    paid: BTreeMap<PlayerId, Chips>,
}

impl Pots {
    pub fn add(&mut self, player: PlayerId, amount: Chips) {
        assert!(amount >= 0);
        *self.paid.entry(player).or_insert(0) += amount;
    }
    pub fn total(&self) -> Chips {
        self.paid.values().sum()
    }
    pub fn contribution(&self, player: PlayerId) -> Chips {
        self.paid.get(&player).copied().unwrap_or(0)
    }
    pub fn reset(&mut self) {
        self.paid.clear();
    }

    /// Partition the pool into main + side pots for the given live players.
    pub fn pots(&self, still_in: &[PlayerId]) -> Vec<Pot> {
        let mut levels = still_in
            .iter()
            .map(|p| self.contribution(*p))
            .filter(|&c| c > 0)
            .collect::<Vec<Chips>>();
        levels.sort_unstable();
        levels.dedup();
        let mut pots = levels
            .iter()
            .scan(0 as Chips, |floor, &level| {
                let span = level - *floor;
                *floor = level;
                let eligible = still_in
                    .iter()
                    .filter(|p| self.contribution(**p) >= level)
                    .copied()
                    .collect::<Vec<PlayerId>>();
                let amount = span * eligible.len() as Chips;
                Some(Pot { amount, eligible })
            })
            .collect::<Vec<Pot>>();
        // dead money from folded players fills the same levels bottom-up
        for (&player, &paid) in self.paid.iter() {
            if still_in.contains(&player) {
                continue;
            }
            let mut floor = 0 as Chips;
            let mut rest = paid;
            for (i, &level) in levels.iter().enumerate() {
                let into = rest.min(level - floor);
                pots[i].amount += into;
                rest -= into;
                floor = level;
            }
            if rest > 0 {
                if let Some(last) = pots.last_mut() {
                    last.amount += rest;
                }
            }
        }
        pots
    }

    /// Award each pot to its best-scoring eligible players. Splits take the
    /// integer floor; leftover chips go one apiece to winners in `order`,
    /// which lists players clockwise starting left of the dealer.
    pub fn distribute(
        pots: &[Pot],
        scores: &BTreeMap<PlayerId, u32>,
        order: &[PlayerId],
    ) -> BTreeMap<PlayerId, Chips> {
        let mut payouts = BTreeMap::new();
        for pot in pots {
            let best = pot
                .eligible
                .iter()
                .filter_map(|p| scores.get(p))
                .max()
                .copied();
            let winners = pot
                .eligible
                .iter()
                .filter(|p| scores.get(p).copied() == best)
                .copied()
                .collect::<Vec<PlayerId>>();
            if winners.is_empty() {
                continue;
            }
            let share = pot.amount / winners.len() as Chips;
            let mut rest = pot.amount % winners.len() as Chips;
            for winner in winners.iter() {
                *payouts.entry(*winner).or_insert(0) += share;
            }
            for player in order.iter().filter(|p| winners.contains(p)) {
                if rest == 0 {
                    break;
                }
                *payouts.entry(*player).or_insert(0) += 1;
                rest -= 1;
            }
        }
        payouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PlayerId {
        PlayerId::from(n)
    }

    #[test]
    fn single_level_single_pot() {
        let mut pots = Pots::default();
        pots.add(p(1), 100);
        pots.add(p(2), 100);
        pots.add(p(3), 100);
        let out = pots.pots(&[p(1), p(2), p(3)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 300);
        assert_eq!(out[0].eligible.len(), 3);
    }

    #[test]
    fn layered_all_ins_split_into_side_pots() {
        // 100 / 200 / 300 all-in preflop
        let mut pots = Pots::default();
        pots.add(p(1), 100);
        pots.add(p(2), 200);
        pots.add(p(3), 300);
        let out = pots.pots(&[p(1), p(2), p(3)]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].amount, 300);
        assert_eq!(out[0].eligible, vec![p(1), p(2), p(3)]);
        assert_eq!(out[1].amount, 200);
        assert_eq!(out[1].eligible, vec![p(2), p(3)]);
        assert_eq!(out[2].amount, 100);
        assert_eq!(out[2].eligible, vec![p(3)]);
    }

    #[test]
    fn folded_money_funds_pots_without_eligibility() {
        let mut pots = Pots::default();
        pots.add(p(1), 50); // folds
        pots.add(p(2), 100);
        pots.add(p(3), 100);
        let out = pots.pots(&[p(2), p(3)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].amount, 250);
        assert!(!out[0].eligible.contains(&p(1)));
    }

    #[test]
    fn folded_excess_sinks_into_last_pot() {
        let mut pots = Pots::default();
        pots.add(p(1), 300); // folds after covering everyone
        pots.add(p(2), 100); // all-in
        pots.add(p(3), 200); // all-in
        let out = pots.pots(&[p(2), p(3)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].amount, 300); // 100 each from p2, p3, p1
        assert_eq!(out[1].amount, 300); // 100 from p3, 100 from p1, 100 excess
        assert_eq!(out.iter().map(|p| p.amount).sum::<Chips>(), pots.total());
    }

    #[test]
    fn distribution_conserves_chips() {
        let mut pots = Pots::default();
        pots.add(p(1), 100);
        pots.add(p(2), 200);
        pots.add(p(3), 300);
        let out = pots.pots(&[p(1), p(2), p(3)]);
        let scores = BTreeMap::from([(p(1), 900u32), (p(2), 500), (p(3), 100)]);
        let payouts = Pots::distribute(&out, &scores, &[p(2), p(3), p(1)]);
        // p1 wins the main, p2 the first side, p3 the leftover
        assert_eq!(payouts.get(&p(1)), Some(&300));
        assert_eq!(payouts.get(&p(2)), Some(&200));
        assert_eq!(payouts.get(&p(3)), Some(&100));
        assert_eq!(payouts.values().sum::<Chips>(), pots.total());
    }

    #[test]
    fn odd_chip_goes_clockwise_of_dealer() {
        let mut pots = Pots::default();
        pots.add(p(1), 33);
        pots.add(p(2), 33);
        pots.add(p(3), 35);
        let out = pots.pots(&[p(1), p(2), p(3)]);
        let scores = BTreeMap::from([(p(1), 700u32), (p(2), 700), (p(3), 100)]);
        // dealer is p1's seat, so order starts at p2
        let payouts = Pots::distribute(&out, &scores, &[p(2), p(3), p(1)]);
        let total = pots.total();
        assert_eq!(payouts.values().sum::<Chips>(), total);
        assert_eq!(payouts.get(&p(2)).unwrap(), &(payouts.get(&p(1)).unwrap() + 1));
    }

    #[test]
    fn contribution_and_reset() {
        let mut pots = Pots::default();
        pots.add(p(1), 10);
        pots.add(p(1), 20);
        assert_eq!(pots.contribution(p(1)), 30);
        pots.reset();
        assert_eq!(pots.total(), 0);
    }
}
