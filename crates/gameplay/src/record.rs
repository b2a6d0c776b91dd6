use super::protocol::PotOut;
use super::protocol::WinnerOut;
use rvb_cards::Card;
use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_core::Table;
use rvb_core::ID;
use serde::Deserialize;
use serde::Serialize;

/// One seat's line in the hand history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRecord {
    pub seat: Position,
    pub steam_id: PlayerId,
    pub display_name: String,
    pub start_stack: Chips,
    pub end_stack: Chips,
    /// Present only when the seat reached showdown without folding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole: Option<[Card; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_rank: Option<String>,
}

/// One logged action, blinds included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub seat: Position,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Chips>,
}

/// The append-only hand history: everything needed to replay or audit one
/// hand, persisted as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRecord {
    pub table_id: ID<Table>,
    pub hand_no: u64,
    pub started_ms: u64,
    pub ended_ms: u64,
    pub community: Vec<Card>,
    pub seats: Vec<SeatRecord>,
    pub actions: Vec<ActionRecord>,
    pub pots: Vec<PotOut>,
    pub winners: Vec<WinnerOut>,
}

impl HandRecord {
    pub fn pot_total(&self) -> Chips {
        self.pots.iter().map(|p| p.amount).sum()
    }
    pub fn winner_ids(&self) -> Vec<PlayerId> {
        self.winners.iter().map(|w| w.steam_id).collect()
    }
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("serialize hand record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_json() {
        let record = HandRecord {
            table_id: ID::default(),
            hand_no: 3,
            started_ms: 1000,
            ended_ms: 2000,
            community: vec![Card::try_from("Ah").unwrap()],
            seats: vec![],
            actions: vec![ActionRecord {
                seat: 0,
                action: "RAISE".to_string(),
                amount: Some(100),
            }],
            pots: vec![PotOut {
                amount: 60,
                eligible: vec![PlayerId::from(1)],
            }],
            winners: vec![WinnerOut {
                steam_id: PlayerId::from(1),
                seat: 0,
                cards: None,
                hand_rank: None,
                amount: 60,
            }],
        };
        let json = record.to_json();
        let back: HandRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.hand_no, 3);
        assert_eq!(back.pot_total(), 60);
        assert_eq!(back.winner_ids(), vec![PlayerId::from(1)]);
    }
}
