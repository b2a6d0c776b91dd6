use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_gameplay::HandRecord;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Why a settlement could not be persisted.
#[derive(Debug)]
pub enum BankError {
    /// A delta would push a balance negative.
    Insufficient(PlayerId),
    /// Storage was unreachable or timed out.
    Unavailable(String),
}

impl std::fmt::Display for BankError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insufficient(player) => write!(f, "insufficient chips for {}", player),
            Self::Unavailable(reason) => write!(f, "bank unavailable: {}", reason),
        }
    }
}
impl std::error::Error for BankError {}

/// The table loop's one seam to persistence: commit the hand's stack deltas
/// and its history record as a single unit of work. Implementations must be
/// atomic: either both land or neither does.
#[async_trait::async_trait]
pub trait Bank: Send + Sync {
    async fn settle(
        &self,
        deltas: &[(PlayerId, Chips)],
        record: &HandRecord,
    ) -> Result<(), BankError>;
}

/// In-memory bank for tests and offline tables.
#[derive(Default)]
pub struct MemBank {
    balances: Mutex<BTreeMap<PlayerId, Chips>>,
    hands: Mutex<Vec<HandRecord>>,
}

impl MemBank {
    pub fn seed(&self, player: PlayerId, chips: Chips) {
        self.balances.lock().expect("bank lock").insert(player, chips);
    }
    pub fn balance(&self, player: PlayerId) -> Option<Chips> {
        self.balances.lock().expect("bank lock").get(&player).copied()
    }
    pub fn hands(&self) -> usize {
        self.hands.lock().expect("bank lock").len()
    }
}

#[async_trait::async_trait]
impl Bank for MemBank {
    async fn settle(
        &self,
        deltas: &[(PlayerId, Chips)],
        record: &HandRecord,
    ) -> Result<(), BankError> {
        let mut balances = self.balances.lock().expect("bank lock");
        for &(player, delta) in deltas {
            let balance = balances.get(&player).copied().unwrap_or(0);
            if balance + delta < 0 {
                return Err(BankError::Insufficient(player));
            }
        }
        for &(player, delta) in deltas {
            *balances.entry(player).or_insert(0) += delta;
        }
        self.hands.lock().expect("bank lock").push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> HandRecord {
        HandRecord {
            table_id: rvb_core::ID::default(),
            hand_no: 1,
            started_ms: 0,
            ended_ms: 0,
            community: vec![],
            seats: vec![],
            actions: vec![],
            pots: vec![],
            winners: vec![],
        }
    }

    #[tokio::test]
    async fn membank_applies_deltas_atomically() {
        let bank = MemBank::default();
        let a = PlayerId::from(1);
        let b = PlayerId::from(2);
        bank.seed(a, 1000);
        bank.seed(b, 1000);
        bank.settle(&[(a, 500), (b, -500)], &record()).await.unwrap();
        assert_eq!(bank.balance(a), Some(1500));
        assert_eq!(bank.balance(b), Some(500));
        assert_eq!(bank.hands(), 1);
        // an overdraft rejects the whole batch
        let err = bank.settle(&[(a, 10), (b, -2000)], &record()).await;
        assert!(matches!(err, Err(BankError::Insufficient(p)) if p == b));
        assert_eq!(bank.balance(a), Some(1500));
        assert_eq!(bank.hands(), 1);
    }
}
