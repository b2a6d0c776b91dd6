use super::schema::HandHistory;
use super::schema::Schema;
use super::schema::User;
use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_gameplay::HandRecord;
use rvb_table::Bank;
use rvb_table::BankError;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::Client;
use tokio_postgres::IsolationLevel;

/// Ledger failures. Insufficient chips is a domain outcome; the rest are
/// infrastructure.
#[derive(Debug)]
pub enum LedgerError {
    InsufficientChips(PlayerId),
    MissingUser(PlayerId),
    Timeout,
    Pg(tokio_postgres::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientChips(player) => write!(f, "insufficient chips for {}", player),
            Self::MissingUser(player) => write!(f, "no such user {}", player),
            Self::Timeout => write!(f, "ledger call timed out"),
            Self::Pg(e) => write!(f, "database error: {}", e),
        }
    }
}
impl std::error::Error for LedgerError {}

impl From<tokio_postgres::Error> for LedgerError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Pg(e)
    }
}

/// Validate a delta batch against known balances: merge duplicates, order
/// deterministically by id, and refuse any delta that would go negative.
/// Pure so the hairy arithmetic is testable without a database.
pub fn plan(
    balances: &BTreeMap<PlayerId, Chips>,
    deltas: &[(PlayerId, Chips)],
) -> Result<Vec<(PlayerId, Chips)>, LedgerError> {
    let mut merged = BTreeMap::new();
    for &(player, delta) in deltas {
        *merged.entry(player).or_insert(0) += delta;
    }
    merged
        .into_iter()
        .map(|(player, delta)| {
            let balance = balances
                .get(&player)
                .copied()
                .ok_or(LedgerError::MissingUser(player))?;
            match balance + delta {
                next if next >= 0 => Ok((player, next)),
                _ => Err(LedgerError::InsufficientChips(player)),
            }
        })
        .collect()
}

/// The chip ledger: strongly-typed balances plus the append-only hand log.
///
/// All mutation happens inside serializable transactions holding row locks
/// in ascending id order, so concurrent settlements from different tables
/// cannot deadlock or double-spend. Every call is bounded by a timeout.
pub struct Ledger {
    client: Mutex<Client>,
    timeout: Duration,
    starting_balance: Chips,
}

impl Ledger {
    /// Connect and spawn the connection driver.
    pub async fn connect(url: &str, starting_balance: Chips) -> Result<Self, LedgerError> {
        log::info!("[ledger] connecting");
        let (client, connection) = tokio_postgres::connect(url, tokio_postgres::tls::NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("[ledger] connection lost: {}", e);
            }
        });
        Ok(Self {
            client: Mutex::new(client),
            timeout: Duration::from_millis(rvb_core::LEDGER_TIMEOUT_MS),
            starting_balance,
        })
    }

    /// Create both tables and their indices if absent.
    pub async fn ensure(&self) -> Result<(), LedgerError> {
        let client = self.client.lock().await;
        client.batch_execute(User::creates()).await?;
        client.batch_execute(HandHistory::creates()).await?;
        client.batch_execute(HandHistory::indices()).await?;
        log::info!("[ledger] schema ready");
        Ok(())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    /// Round-trip liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        self.bounded(async {
            self.client.lock().await.execute("SELECT 1", &[]).await?;
            Ok(())
        })
        .await
    }

    /// Fetch the user, inserting a fresh row at the starting balance on
    /// first sight; refreshes the display name either way.
    pub async fn find_or_create(&self, id: PlayerId, name: &str) -> Result<User, LedgerError> {
        self.bounded(async {
            let client = self.client.lock().await;
            let row = client
                .query_one(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        super::schema::USERS,
                        " (id, display_name, chips) VALUES ($1, $2, $3)
                         ON CONFLICT (id) DO UPDATE
                         SET display_name = EXCLUDED.display_name, updated_at = now()
                         RETURNING id, display_name, chips"
                    ),
                    &[&(id.inner() as i64), &name, &self.starting_balance],
                )
                .await?;
            Ok(User {
                id: PlayerId::from(row.get::<_, i64>(0) as u64),
                name: row.get(1),
                chips: row.get(2),
            })
        })
        .await
    }

    /// Current balance, or none for an unknown id.
    pub async fn balance(&self, id: PlayerId) -> Result<Option<Chips>, LedgerError> {
        self.bounded(async {
            let client = self.client.lock().await;
            let row = client
                .query_opt(
                    const_format::concatcp!(
                        "SELECT chips FROM ",
                        super::schema::USERS,
                        " WHERE id = $1"
                    ),
                    &[&(id.inner() as i64)],
                )
                .await?;
            Ok(row.map(|r| r.get(0)))
        })
        .await
    }

    /// Adjust one balance under a row lock; refuses to go negative.
    pub async fn adjust(&self, id: PlayerId, delta: Chips) -> Result<Chips, LedgerError> {
        self.adjust_many(&[(id, delta)]).await.map(|mut next| {
            next.remove(&id).expect("adjusted id present")
        })
    }

    /// Adjust a batch of balances in one serializable transaction. Rows are
    /// locked in ascending id order; the whole batch validates before any
    /// row changes, so a refusal leaves every balance untouched.
    pub async fn adjust_many(
        &self,
        deltas: &[(PlayerId, Chips)],
    ) -> Result<BTreeMap<PlayerId, Chips>, LedgerError> {
        self.bounded(async {
            let mut client = self.client.lock().await;
            let tx = client
                .build_transaction()
                .isolation_level(IsolationLevel::Serializable)
                .start()
                .await?;
            let applied = Self::adjust_in(&tx, deltas).await?;
            tx.commit().await?;
            Ok(applied)
        })
        .await
    }

    async fn adjust_in(
        tx: &tokio_postgres::Transaction<'_>,
        deltas: &[(PlayerId, Chips)],
    ) -> Result<BTreeMap<PlayerId, Chips>, LedgerError> {
        let mut ids = deltas.iter().map(|&(id, _)| id).collect::<Vec<PlayerId>>();
        ids.sort_unstable();
        ids.dedup();
        let mut balances = BTreeMap::new();
        for id in ids {
            let row = tx
                .query_opt(
                    const_format::concatcp!(
                        "SELECT chips FROM ",
                        super::schema::USERS,
                        " WHERE id = $1 FOR UPDATE"
                    ),
                    &[&(id.inner() as i64)],
                )
                .await?;
            let chips = row.ok_or(LedgerError::MissingUser(id))?.get(0);
            balances.insert(id, chips);
        }
        let next = plan(&balances, deltas)?;
        for &(id, chips) in next.iter() {
            tx.execute(
                const_format::concatcp!(
                    "UPDATE ",
                    super::schema::USERS,
                    " SET chips = $2, updated_at = now() WHERE id = $1"
                ),
                &[&(id.inner() as i64), &chips],
            )
            .await?;
        }
        Ok(next.into_iter().collect())
    }

    /// Append one hand-history row; returns the assigned id.
    pub async fn save_hand(&self, record: &HandRecord) -> Result<i64, LedgerError> {
        self.bounded(async {
            let client = self.client.lock().await;
            let params = Self::hand_params(record);
            let row = client
                .query_one(
                    Self::INSERT_HAND,
                    &[&params.0, &params.1, &params.2, &params.3],
                )
                .await?;
            Ok(row.get(0))
        })
        .await
    }

    const INSERT_HAND: &'static str = const_format::concatcp!(
        "INSERT INTO ",
        super::schema::HANDS,
        " (table_id, record, winners, pot_total) VALUES ($1, $2, $3, $4) RETURNING id"
    );

    fn hand_params(record: &HandRecord) -> (uuid::Uuid, serde_json::Value, Vec<i64>, Chips) {
        (
            record.table_id.inner(),
            record.to_json(),
            record
                .winner_ids()
                .into_iter()
                .map(|w| w.inner() as i64)
                .collect(),
            record.pot_total(),
        )
    }

    /// Commit a hand's deltas and its history row as one transaction: the
    /// state machine's unit of work at hand end.
    pub async fn settle_hand(
        &self,
        deltas: &[(PlayerId, Chips)],
        record: &HandRecord,
    ) -> Result<(), LedgerError> {
        self.bounded(async {
            let mut client = self.client.lock().await;
            let tx = client
                .build_transaction()
                .isolation_level(IsolationLevel::Serializable)
                .start()
                .await?;
            Self::adjust_in(&tx, deltas).await?;
            let params = Self::hand_params(record);
            tx.query_one(
                Self::INSERT_HAND,
                &[&params.0, &params.1, &params.2, &params.3],
            )
            .await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl Bank for Ledger {
    async fn settle(
        &self,
        deltas: &[(PlayerId, Chips)],
        record: &HandRecord,
    ) -> Result<(), BankError> {
        self.settle_hand(deltas, record).await.map_err(|e| match e {
            LedgerError::InsufficientChips(player) => BankError::Insufficient(player),
            other => BankError::Unavailable(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PlayerId {
        PlayerId::from(n)
    }

    #[test]
    fn plan_merges_and_orders_deltas() {
        let balances = BTreeMap::from([(p(2), 100), (p(1), 50)]);
        let next = plan(&balances, &[(p(2), -30), (p(1), 20), (p(2), 10)]).unwrap();
        assert_eq!(next, vec![(p(1), 70), (p(2), 80)]);
    }

    #[test]
    fn plan_refuses_overdrafts_without_applying_anything() {
        let balances = BTreeMap::from([(p(1), 1500)]);
        let err = plan(&balances, &[(p(1), -2000)]).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientChips(player) if player == p(1)));
    }

    #[test]
    fn plan_requires_known_users() {
        let balances = BTreeMap::new();
        let err = plan(&balances, &[(p(9), 10)]).unwrap_err();
        assert!(matches!(err, LedgerError::MissingUser(player) if player == p(9)));
    }

    #[test]
    fn zero_sum_batches_conserve_total() {
        let balances = BTreeMap::from([(p(1), 1000), (p(2), 1000), (p(3), 1000)]);
        let deltas = [(p(1), 500), (p(2), -300), (p(3), -200)];
        let next = plan(&balances, &deltas).unwrap();
        let total = next.iter().map(|(_, chips)| chips).sum::<Chips>();
        assert_eq!(total, 3000);
    }
}
