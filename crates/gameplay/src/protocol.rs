use super::action::Action;
use super::view::Patch;
use super::view::Snapshot;
use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_core::Seq;
use rvb_core::Table;
use rvb_core::ID;
use serde::Deserialize;
use serde::Serialize;

/// The closed set of user-visible error codes. Messages may vary; codes
/// never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AuthFailed,
    InvalidTicket,
    TableFull,
    SeatTaken,
    InvalidAction,
    NotYourTurn,
    InsufficientChips,
    AlreadyInTable,
    TableNotFound,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::InvalidTicket => "INVALID_TICKET",
            ErrorCode::TableFull => "TABLE_FULL",
            ErrorCode::SeatTaken => "SEAT_TAKEN",
            ErrorCode::InvalidAction => "INVALID_ACTION",
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::InsufficientChips => "INSUFFICIENT_CHIPS",
            ErrorCode::AlreadyInTable => "ALREADY_IN_TABLE",
            ErrorCode::TableNotFound => "TABLE_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "AUTH_FAILED" => Ok(ErrorCode::AuthFailed),
            "INVALID_TICKET" => Ok(ErrorCode::InvalidTicket),
            "TABLE_FULL" => Ok(ErrorCode::TableFull),
            "SEAT_TAKEN" => Ok(ErrorCode::SeatTaken),
            "INVALID_ACTION" => Ok(ErrorCode::InvalidAction),
            "NOT_YOUR_TURN" => Ok(ErrorCode::NotYourTurn),
            "INSUFFICIENT_CHIPS" => Ok(ErrorCode::InsufficientChips),
            "ALREADY_IN_TABLE" => Ok(ErrorCode::AlreadyInTable),
            "TABLE_NOT_FOUND" => Ok(ErrorCode::TableNotFound),
            _ => Err(serde::de::Error::custom("unknown error code")),
        }
    }
}

/// Betting-action vocabulary on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

/// RAISE requires an amount (the total new bet to match); everything else
/// ignores it.
impl TryFrom<(ActionKind, Option<Chips>)> for Action {
    type Error = ErrorCode;
    fn try_from((kind, amount): (ActionKind, Option<Chips>)) -> Result<Self, Self::Error> {
        match (kind, amount) {
            (ActionKind::Fold, _) => Ok(Action::Fold),
            (ActionKind::Check, _) => Ok(Action::Check),
            (ActionKind::Call, _) => Ok(Action::Call),
            (ActionKind::AllIn, _) => Ok(Action::AllIn),
            (ActionKind::Raise, Some(total)) if total > 0 => Ok(Action::Raise(total)),
            (ActionKind::Raise, _) => Err(ErrorCode::InvalidAction),
        }
    }
}

/// A social gesture, relayed outside the game state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialGesture {
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_seat: Option<Position>,
}

/// Client → server events. Adjacently tagged: a string event name plus an
/// object payload, e.g. `{"type":"REQ_SIT","payload":{"seatIndex":2,...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    ReqJoin {
        auth_ticket: String,
        table_id: ID<Table>,
    },
    ReqReconnect {
        auth_ticket: String,
        table_id: ID<Table>,
        last_sequence_id: Seq,
    },
    ReqSit {
        seat_index: Position,
        buy_in: Chips,
    },
    ReqReady {},
    ReqAction {
        r#type: ActionKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<Chips>,
    },
    ReqSocial(SocialGesture),
    ReqLeave {},
}

/// A player's cards and rank at hand end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerOut {
    pub steam_id: PlayerId,
    pub seat: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<rvb_cards::Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_rank: Option<String>,
    pub amount: Chips,
}

/// A pot and who could win it, as broadcast with HAND_RESULT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotOut {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
}

/// A relayed social gesture with its originating seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialOut {
    pub seat: Position,
    #[serde(flatten)]
    pub gesture: SocialGesture,
}

/// Server → client events, tagged like [`ClientMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    AuthSuccess {
        steam_id: PlayerId,
        display_name: String,
        session_token: String,
    },
    AuthFailure {
        code: ErrorCode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GameSnapshot(Snapshot),
    StatePatch(Patch),
    PlayerAction {
        steam_id: PlayerId,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<Chips>,
        new_pot: Chips,
    },
    HandResult {
        winners: Vec<WinnerOut>,
        pots: Vec<PotOut>,
    },
    SocialBatch {
        events: Vec<SocialOut>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn req_action_decodes_with_inner_type_field() {
        let json = r#"{"type":"REQ_ACTION","payload":{"type":"RAISE","amount":100}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::ReqAction { r#type, amount } => {
                assert_eq!(r#type, ActionKind::Raise);
                assert_eq!(amount, Some(100));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn req_sit_uses_camel_case_fields() {
        let json = r#"{"type":"REQ_SIT","payload":{"seatIndex":2,"buyIn":1000}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::ReqSit { seat_index, buy_in } => {
                assert_eq!(seat_index, 2);
                assert_eq!(buy_in, 1000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn raise_without_amount_is_invalid() {
        assert_eq!(
            Action::try_from((ActionKind::Raise, None)),
            Err(ErrorCode::InvalidAction)
        );
        assert_eq!(
            Action::try_from((ActionKind::Raise, Some(100))),
            Ok(Action::Raise(100))
        );
    }

    #[test]
    fn error_event_carries_stable_code() {
        let msg = ServerMessage::error(ErrorCode::NotYourTurn, "wait for it");
        let json = msg.to_json();
        assert!(json.contains("\"type\":\"ERROR\""));
        assert!(json.contains("\"code\":\"NOT_YOUR_TURN\""));
    }
}
