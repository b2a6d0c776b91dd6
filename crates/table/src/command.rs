use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_gameplay::Action;
use rvb_gameplay::Phase;
use rvb_gameplay::TimerKind;
use rvb_gameplay::protocol::ServerMessage;
use rvb_gameplay::protocol::SocialGesture;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Everything a table's run-loop can be asked to do. Commands arrive on one
/// queue and are processed strictly in order; this is the only way the god
/// state ever changes.
#[derive(Debug)]
pub enum Command {
    /// Attach (or re-attach) a player's outbox and send a full snapshot.
    Join {
        player: PlayerId,
        name: String,
        outbox: UnboundedSender<ServerMessage>,
    },
    /// Detach the outbox, leaving the seat bound during the grace window.
    Disconnect { player: PlayerId },
    /// Re-send the current full snapshot.
    Snapshot { player: PlayerId },
    Sit {
        player: PlayerId,
        seat: Position,
        buy_in: Chips,
    },
    Ready { player: PlayerId },
    Act { player: PlayerId, action: Action },
    Social {
        player: PlayerId,
        gesture: SocialGesture,
    },
    Leave { player: PlayerId },
    Timer { kind: TimerKind, token: u64 },
    /// Operator request: retry a halted table (after a ledger outage).
    Resume,
    Shutdown,
}

/// Public lobby listing entry, refreshed by the run-loop after every input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub table_id: rvb_core::ID<rvb_core::Table>,
    pub seats: usize,
    pub occupied: usize,
    pub phase: Phase,
    pub small_blind: Chips,
    pub big_blind: Chips,
}
