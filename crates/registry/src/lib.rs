//! Directory of live tables.
//!
//! Owns the table map and the player→table binding (one table per player,
//! ever). Transport handlers resolve identities through the session layer
//! and hand commands here; the registry routes them onto the right table's
//! queue. Lookups are frequent and writes are rare, so both maps sit behind
//! reader-writer locks.
use rand::SeedableRng;
use rand::rngs::StdRng;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Table;
use rvb_gameplay::Config;
use rvb_gameplay::protocol::ErrorCode;
use rvb_gameplay::protocol::ServerMessage;
use rvb_session::SessionManager;
use rvb_table::Bank;
use rvb_table::Command;
use rvb_table::Handle;
use rvb_table::Runner;
use rvb_table::Summary;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

pub struct Registry {
    sessions: Arc<SessionManager>,
    bank: Arc<dyn Bank>,
    config: Config,
    tick_hz: u64,
    tables: RwLock<HashMap<ID<Table>, Handle>>,
    players: RwLock<HashMap<PlayerId, ID<Table>>>,
}

impl Registry {
    pub fn new(
        sessions: Arc<SessionManager>,
        bank: Arc<dyn Bank>,
        config: Config,
        tick_hz: u64,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            bank,
            config,
            tick_hz,
            tables: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
        })
    }

    /// Spawn a fresh table with the registry's default config.
    pub async fn create(&self) -> ID<Table> {
        let id = ID::default();
        let handle = Runner::spawn(
            id,
            self.config,
            self.bank.clone(),
            StdRng::from_os_rng(),
            self.tick_hz,
        );
        self.tables.write().await.insert(id, handle);
        log::info!("[registry] created table {}", id);
        id
    }

    /// Public lobby listing.
    pub async fn list(&self) -> Vec<Summary> {
        self.tables
            .read()
            .await
            .values()
            .map(|handle| handle.summary.borrow().clone())
            .collect()
    }

    pub async fn exists(&self, table: ID<Table>) -> bool {
        self.tables.read().await.contains_key(&table)
    }

    /// Stop a table's loop and unbind everyone who was on it.
    pub async fn destroy(&self, table: ID<Table>) -> anyhow::Result<()> {
        let handle = self
            .tables
            .write()
            .await
            .remove(&table)
            .ok_or_else(|| anyhow::anyhow!("table not found"))?;
        let mut players = self.players.write().await;
        let bound = players
            .iter()
            .filter(|&(_, &t)| t == table)
            .map(|(&p, _)| p)
            .collect::<Vec<PlayerId>>();
        for player in bound {
            let _ = handle.tx.send(Command::Leave { player });
            players.remove(&player);
            self.sessions.bind_table(player, None).await;
        }
        let _ = handle.tx.send(Command::Shutdown);
        log::info!("[registry] destroyed table {}", table);
        Ok(())
    }

    /// Bind a verified player to a table's channel and attach their outbox.
    /// A player occupies at most one table at a time.
    pub async fn join(
        &self,
        player: PlayerId,
        name: String,
        table: ID<Table>,
        outbox: UnboundedSender<ServerMessage>,
    ) -> Result<(), ErrorCode> {
        let tables = self.tables.read().await;
        let handle = tables.get(&table).ok_or(ErrorCode::TableNotFound)?;
        {
            let mut players = self.players.write().await;
            match players.get(&player) {
                Some(&bound) if bound != table => return Err(ErrorCode::AlreadyInTable),
                _ => players.insert(player, table),
            };
        }
        self.sessions.bind_table(player, Some(table)).await;
        let _ = handle.tx.send(Command::Join {
            player,
            name,
            outbox,
        });
        Ok(())
    }

    /// Forward a command to the table the player is bound to.
    pub async fn route(&self, player: PlayerId, command: Command) -> Result<(), ErrorCode> {
        let table = self
            .players
            .read()
            .await
            .get(&player)
            .copied()
            .ok_or(ErrorCode::TableNotFound)?;
        let tables = self.tables.read().await;
        let handle = tables.get(&table).ok_or(ErrorCode::TableNotFound)?;
        handle.tx.send(command).map_err(|_| ErrorCode::TableNotFound)
    }

    /// Unseat and unbind a player everywhere.
    pub async fn leave(&self, player: PlayerId) {
        if let Err(code) = self.route(player, Command::Leave { player }).await {
            log::debug!("[registry] leave for unbound {}: {}", player, code);
        }
        self.players.write().await.remove(&player);
        self.sessions.bind_table(player, None).await;
    }

    /// Detach the player's transport from their table without unseating.
    pub async fn disconnect(&self, player: PlayerId) {
        let _ = self.route(player, Command::Disconnect { player }).await;
    }

    /// Drain the session reaper: every id whose grace window lapsed gets
    /// unseated as if they had left.
    pub fn spawn_reaper(self: &Arc<Self>, mut reaped: UnboundedReceiver<PlayerId>) {
        let registry = self.clone();
        tokio::spawn(async move {
            while let Some(player) = reaped.recv().await {
                log::info!("[registry] grace lapsed for {}, unseating", player);
                registry.leave(player).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvb_session::MockIdentity;
    use rvb_table::MemBank;
    use tokio::sync::mpsc::unbounded_channel;

    fn p(n: u64) -> PlayerId {
        PlayerId::from(n)
    }

    fn registry(grace_ms: u64) -> (Arc<Registry>, Arc<SessionManager>) {
        let (sessions, reaped) = SessionManager::new(Arc::new(MockIdentity), grace_ms);
        let bank: Arc<dyn Bank> = Arc::new(MemBank::default());
        let registry = Registry::new(
            sessions.clone(),
            bank,
            Config::default(),
            rvb_core::SOCIAL_TICK_HZ,
        );
        registry.spawn_reaper(reaped);
        (registry, sessions)
    }

    #[tokio::test]
    async fn create_list_destroy() {
        let (registry, _) = registry(60_000);
        let a = registry.create().await;
        let b = registry.create().await;
        assert_eq!(registry.list().await.len(), 2);
        registry.destroy(a).await.unwrap();
        let listing = registry.list().await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].table_id, b);
        assert!(registry.destroy(a).await.is_err());
    }

    #[tokio::test]
    async fn one_table_per_player() {
        let (registry, _) = registry(60_000);
        let a = registry.create().await;
        let b = registry.create().await;
        let (tx, _rx) = unbounded_channel();
        registry.join(p(1), "one".into(), a, tx).await.unwrap();
        let (tx, _rx) = unbounded_channel();
        assert_eq!(
            registry.join(p(1), "one".into(), b, tx).await,
            Err(ErrorCode::AlreadyInTable)
        );
        // rejoining the same table is a reconnect, not a conflict
        let (tx, _rx) = unbounded_channel();
        assert!(registry.join(p(1), "one".into(), a, tx).await.is_ok());
    }

    #[tokio::test]
    async fn joining_a_missing_table_fails() {
        let (registry, _) = registry(60_000);
        let (tx, _rx) = unbounded_channel();
        assert_eq!(
            registry.join(p(1), "one".into(), ID::default(), tx).await,
            Err(ErrorCode::TableNotFound)
        );
    }

    #[tokio::test]
    async fn reaper_unbinds_lapsed_players() {
        let (registry, sessions) = registry(20);
        let table = registry.create().await;
        let (tx, _rx) = unbounded_channel();
        sessions.open("mock:1:one", tx.clone()).await.unwrap();
        registry.join(p(1), "one".into(), table, tx).await.unwrap();
        sessions.close(p(1)).await;
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        assert_eq!(sessions.table_of(p(1)).await, None);
        let (tx, _rx) = unbounded_channel();
        // binding is free again
        assert!(registry.join(p(1), "one".into(), table, tx).await.is_ok());
    }
}
