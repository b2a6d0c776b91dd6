//! Core type aliases, identifiers, and constants for riverboat.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the riverboat workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Chip amounts. Signed 64-bit to match the ledger's BIGINT columns, so no
/// narrowing happens between the engine and storage.
pub type Chips = i64;
/// Seat index around the table.
pub type Position = usize;
/// Per-table monotone sequence counter for view ordering.
pub type Seq = u64;

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Stable external player identity, as reported by the identity provider.
/// Serialized as a string on the wire since 64-bit ids overflow JSON numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(u64);

impl PlayerId {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PlayerId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}
impl From<PlayerId> for u64 {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PlayerId {
    type Err = std::num::ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl serde::Serialize for PlayerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}
impl<'de> serde::Deserialize<'de> for PlayerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

/// Marker type for table identifiers: `ID<Table>` names a live table without
/// dragging the table implementation into leaf crates.
pub struct Table;

// ============================================================================
// TABLE PARAMETERS
// ============================================================================
/// Maximum seats at a table.
pub const MAX_SEATS: usize = 6;
/// Default chip stack granted to a first-time user.
pub const DEFAULT_BUY_IN: Chips = 1000;
/// Default small blind.
pub const DEFAULT_SMALL_BLIND: Chips = 10;
/// Default big blind.
pub const DEFAULT_BIG_BLIND: Chips = 20;

// ============================================================================
// TIMING PARAMETERS (milliseconds)
// ============================================================================
/// How long a player has to act before being auto-folded.
pub const TURN_TIMEOUT_MS: u64 = 30_000;
/// Length of the post-payout social phase.
pub const BANTER_PHASE_MS: u64 = 15_000;
/// Length of the payout animation phase.
pub const PAYOUT_ANIMATION_MS: u64 = 5_000;
/// Countdown between everyone readying up and cards hitting the felt.
pub const COUNTDOWN_MS: u64 = 3_000;
/// Grace window for a disconnected session before it is unseated.
pub const SESSION_GRACE_MS: u64 = 60_000;
/// Social channel flush frequency.
pub const SOCIAL_TICK_HZ: u64 = 10;
/// Bound on any single ledger call.
pub const LEDGER_TIMEOUT_MS: u64 = 2_000;
/// Per-recipient social outbox capacity; oldest entries drop on overflow.
pub const SOCIAL_OUTBOX_CAP: usize = 64;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Milliseconds since the Unix epoch, for timestamping hand records.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_id_round_trips_as_string() {
        let id = PlayerId::from(76561198000000001u64);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"76561198000000001\"");
        let back: PlayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_are_distinct() {
        let a: ID<Table> = ID::default();
        let b: ID<Table> = ID::default();
        assert_ne!(a, b);
        assert_eq!(a, ID::from(a.inner()));
    }
}
