use super::identity::AuthError;
use super::identity::Identity;
use super::identity::Profile;
use rvb_core::ID;
use rvb_core::PlayerId;
use rvb_core::Seq;
use rvb_core::Table;
use rvb_gameplay::protocol::ServerMessage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Why a session operation failed.
#[derive(Debug)]
pub enum SessionError {
    Auth(AuthError),
    /// No session for that identity, or its grace window already lapsed.
    Expired,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "{}", e),
            Self::Expired => write!(f, "session expired"),
        }
    }
}
impl std::error::Error for SessionError {}

impl From<AuthError> for SessionError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

/// One verified player's connection state. A player identifier has at most
/// one of these at a time; it outlives any single transport by up to the
/// grace window.
#[derive(Debug)]
pub struct Session {
    pub player: PlayerId,
    pub name: String,
    /// Opaque per-session token handed back in AUTH_SUCCESS.
    pub token: String,
    pub table: Option<ID<Table>>,
    pub outbox: Option<UnboundedSender<ServerMessage>>,
    pub last_seq: Seq,
    pub connected: bool,
    pub last_activity_ms: u64,
    /// Bumped on every connect/disconnect so stale grace tasks miss.
    epoch: u64,
}

/// Owns every live session and the disconnect grace policy. When a grace
/// window lapses the player id is pushed to the reaper channel; the registry
/// drains it and unseats them.
pub struct SessionManager {
    identity: Arc<dyn Identity>,
    sessions: RwLock<HashMap<PlayerId, Session>>,
    grace: Duration,
    reaper: UnboundedSender<PlayerId>,
}

impl SessionManager {
    /// Build the manager plus the channel of expired player ids.
    pub fn new(
        identity: Arc<dyn Identity>,
        grace_ms: u64,
    ) -> (Arc<Self>, UnboundedReceiver<PlayerId>) {
        let (reaper, reaped) = unbounded_channel();
        let manager = Arc::new(Self {
            identity,
            sessions: RwLock::new(HashMap::new()),
            grace: Duration::from_millis(grace_ms),
            reaper,
        });
        (manager, reaped)
    }

    /// Verify a ticket and create (or take over) the session for that
    /// identity, attaching the given transport outbox.
    pub async fn open(
        &self,
        ticket: &str,
        outbox: UnboundedSender<ServerMessage>,
    ) -> Result<(Profile, String), SessionError> {
        let profile = self.identity.verify(ticket).await?;
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(profile.id).or_insert_with(|| Session {
            player: profile.id,
            name: profile.name.clone(),
            token: uuid::Uuid::now_v7().to_string(),
            table: None,
            outbox: None,
            last_seq: 0,
            connected: false,
            last_activity_ms: rvb_core::now_ms(),
            epoch: 0,
        });
        session.name = profile.name.clone();
        session.outbox = Some(outbox);
        session.connected = true;
        session.epoch += 1;
        session.last_activity_ms = rvb_core::now_ms();
        log::info!("[sessions] {} ({}) connected", profile.name, profile.id);
        Ok((profile, session.token.clone()))
    }

    /// Attach a new transport to an existing session within its grace
    /// window. Fails if the session is gone.
    pub async fn rebind(
        &self,
        ticket: &str,
        outbox: UnboundedSender<ServerMessage>,
        last_seq: Seq,
    ) -> Result<(Profile, String), SessionError> {
        let profile = self.identity.verify(ticket).await?;
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&profile.id).ok_or(SessionError::Expired)?;
        session.outbox = Some(outbox);
        session.connected = true;
        session.epoch += 1;
        session.last_seq = session.last_seq.max(last_seq);
        session.last_activity_ms = rvb_core::now_ms();
        log::info!("[sessions] {} rebound at seq {}", profile.id, last_seq);
        Ok((profile, session.token.clone()))
    }

    /// Mark the session disconnected and start the grace countdown. If the
    /// player has not rebound when it lapses, the session is destroyed and
    /// the id is handed to the reaper.
    pub async fn close(self: &Arc<Self>, player: PlayerId) {
        let epoch = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(&player) else {
                return;
            };
            session.connected = false;
            session.outbox = None;
            session.epoch += 1;
            session.epoch
        };
        log::info!("[sessions] {} disconnected, grace running", player);
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(manager.grace).await;
            manager.expire(player, epoch).await;
        });
    }

    async fn expire(&self, player: PlayerId, epoch: u64) {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&player) {
            Some(session) if !session.connected && session.epoch == epoch => {
                sessions.remove(&player);
                log::info!("[sessions] {} grace lapsed, unseating", player);
                let _ = self.reaper.send(player);
            }
            _ => {}
        }
    }

    /// Drop a session immediately (failed auth teardown, player leave).
    pub async fn destroy(&self, player: PlayerId) {
        self.sessions.write().await.remove(&player);
    }

    pub async fn bind_table(&self, player: PlayerId, table: Option<ID<Table>>) {
        if let Some(session) = self.sessions.write().await.get_mut(&player) {
            session.table = table;
        }
    }
    pub async fn table_of(&self, player: PlayerId) -> Option<ID<Table>> {
        self.sessions.read().await.get(&player).and_then(|s| s.table)
    }
    pub async fn is_connected(&self, player: PlayerId) -> bool {
        self.sessions
            .read()
            .await
            .get(&player)
            .map(|s| s.connected)
            .unwrap_or(false)
    }
    /// Record the sequence counter of a view delivered to this recipient.
    pub async fn record_delivery(&self, player: PlayerId, seq: Seq) {
        if let Some(session) = self.sessions.write().await.get_mut(&player) {
            session.last_seq = session.last_seq.max(seq);
            session.last_activity_ms = rvb_core::now_ms();
        }
    }
    pub async fn last_delivered(&self, player: PlayerId) -> Option<Seq> {
        self.sessions.read().await.get(&player).map(|s| s.last_seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MockIdentity;

    fn manager(grace_ms: u64) -> (Arc<SessionManager>, UnboundedReceiver<PlayerId>) {
        SessionManager::new(Arc::new(MockIdentity), grace_ms)
    }

    #[tokio::test]
    async fn open_creates_one_session_per_identity() {
        let (manager, _reaped) = manager(60_000);
        let (tx, _rx) = unbounded_channel();
        let (profile, token) = manager.open("mock:7:Bo", tx).await.unwrap();
        assert_eq!(profile.id, PlayerId::from(7));
        let (tx2, _rx2) = unbounded_channel();
        let (_, token2) = manager.open("mock:7:Bo", tx2).await.unwrap();
        // same session, same opaque token
        assert_eq!(token, token2);
    }

    #[tokio::test]
    async fn bad_ticket_is_rejected() {
        let (manager, _reaped) = manager(60_000);
        let (tx, _rx) = unbounded_channel();
        assert!(matches!(
            manager.open("garbage", tx).await,
            Err(SessionError::Auth(AuthError::InvalidTicket))
        ));
    }

    #[tokio::test]
    async fn grace_lapse_reaps_the_player() {
        let (manager, mut reaped) = manager(20);
        let (tx, _rx) = unbounded_channel();
        manager.open("mock:7:Bo", tx).await.unwrap();
        manager.close(PlayerId::from(7)).await;
        let player = tokio::time::timeout(Duration::from_secs(1), reaped.recv())
            .await
            .expect("reaper fires")
            .unwrap();
        assert_eq!(player, PlayerId::from(7));
        // session is gone: rebind now fails
        let (tx, _rx) = unbounded_channel();
        assert!(matches!(
            manager.rebind("mock:7:Bo", tx, 0).await,
            Err(SessionError::Expired)
        ));
    }

    #[tokio::test]
    async fn rebind_within_grace_cancels_expiry() {
        let (manager, mut reaped) = manager(50);
        let (tx, _rx) = unbounded_channel();
        manager.open("mock:7:Bo", tx).await.unwrap();
        manager.close(PlayerId::from(7)).await;
        let (tx, _rx) = unbounded_channel();
        manager.rebind("mock:7:Bo", tx, 5).await.unwrap();
        // the old grace task fires into a newer epoch and does nothing
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(reaped.try_recv().is_err());
        assert!(manager.is_connected(PlayerId::from(7)).await);
        assert_eq!(manager.last_delivered(PlayerId::from(7)).await, Some(5));
    }

    #[tokio::test]
    async fn delivery_counter_is_monotone() {
        let (manager, _reaped) = manager(60_000);
        let (tx, _rx) = unbounded_channel();
        manager.open("mock:7:Bo", tx).await.unwrap();
        let id = PlayerId::from(7);
        manager.record_delivery(id, 10).await;
        manager.record_delivery(id, 4).await;
        assert_eq!(manager.last_delivered(id).await, Some(10));
    }
}
