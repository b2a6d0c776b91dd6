use super::machine::Machine;
use super::phase::Phase;
use rvb_cards::Card;
use rvb_core::Chips;
use rvb_core::PlayerId;
use rvb_core::Position;
use rvb_core::Seq;
use rvb_core::Table;
use rvb_core::ID;
use serde::Deserialize;
use serde::Serialize;

/// A hole-card slot as one recipient sees it: the viewer's own cards, an
/// explicit `"hidden"` marker for a live opponent, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleView {
    Shown([Card; 2]),
    Hidden,
    Absent,
}

impl Serialize for HoleView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HoleView::Shown(cards) => cards.serialize(serializer),
            HoleView::Hidden => serializer.serialize_str("hidden"),
            HoleView::Absent => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for HoleView {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;
        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = HoleView;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "two cards, \"hidden\", or null")
            }
            fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<HoleView, E> {
                match s {
                    "hidden" => Ok(HoleView::Hidden),
                    _ => Err(E::custom("unexpected hole marker")),
                }
            }
            fn visit_unit<E: serde::de::Error>(self) -> Result<HoleView, E> {
                Ok(HoleView::Absent)
            }
            fn visit_none<E: serde::de::Error>(self) -> Result<HoleView, E> {
                Ok(HoleView::Absent)
            }
            fn visit_seq<A: serde::de::SeqAccess<'de>>(self, mut seq: A) -> Result<HoleView, A::Error> {
                let a = seq
                    .next_element::<Card>()?
                    .ok_or_else(|| serde::de::Error::custom("missing first card"))?;
                let b = seq
                    .next_element::<Card>()?
                    .ok_or_else(|| serde::de::Error::custom("missing second card"))?;
                Ok(HoleView::Shown([a, b]))
            }
        }
        deserializer.deserialize_any(Visitor)
    }
}

/// One player's slice of the public state, plus their hole slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub seat: Position,
    pub steam_id: PlayerId,
    pub display_name: String,
    pub stack: Chips,
    pub wager: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub ready: bool,
    pub hole_cards: HoleView,
}

/// Full sanitized state for one recipient. Never contains the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub table_id: ID<Table>,
    pub sequence_id: Seq,
    pub phase: Phase,
    pub community: Vec<Card>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub dealer: Position,
    #[serde(default)]
    pub acting: Option<Position>,
    pub players: Vec<PlayerView>,
}

/// Incremental update: only the fields that changed since the recipient's
/// last view, always carrying the new sequence counter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub sequence_id: Seq,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<Vec<Card>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pot: Option<Chips>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bet: Option<Chips>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_raise: Option<Chips>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting: Option<Option<Position>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<PlayerView>,
    /// Seats that emptied since the last view.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub departed: Vec<Position>,
}

impl Patch {
    /// True when nothing but the counter moved.
    pub fn is_empty(&self) -> bool {
        self.phase.is_none()
            && self.community.is_none()
            && self.pot.is_none()
            && self.current_bet.is_none()
            && self.min_raise.is_none()
            && self.dealer.is_none()
            && self.acting.is_none()
            && self.players.is_empty()
            && self.departed.is_empty()
    }
}

/// Project the god state into one recipient's sanitized view.
pub fn personal(machine: &Machine, viewer: PlayerId) -> Snapshot {
    let showdown = matches!(
        machine.phase(),
        Phase::ShowdownReveal | Phase::PayoutAnimation | Phase::SocialBanter
    );
    let players = machine
        .seats()
        .iter()
        .flatten()
        .map(|seat| PlayerView {
            seat: seat.index(),
            steam_id: seat.player(),
            display_name: seat.name().to_string(),
            stack: seat.stack(),
            wager: seat.wager(),
            folded: seat.folded(),
            all_in: seat.all_in(),
            ready: seat.ready(),
            hole_cards: match seat.hole() {
                None => HoleView::Absent,
                Some(hole) if seat.player() == viewer => HoleView::Shown(hole),
                // opponents reveal only what showdown made public
                Some(hole) if showdown && !seat.folded() && seat.strength().is_some() => {
                    HoleView::Shown(hole)
                }
                Some(_) => HoleView::Hidden,
            },
        })
        .collect();
    Snapshot {
        table_id: machine.id(),
        sequence_id: machine.seq(),
        phase: machine.phase(),
        community: machine.community().to_vec(),
        pot: machine.pot(),
        current_bet: machine.current_bet(),
        min_raise: machine.min_raise(),
        dealer: machine.dealer(),
        acting: machine.acting(),
        players,
    }
}

/// Diff two consecutive views for the same recipient into a patch.
pub fn delta(old: &Snapshot, new: &Snapshot) -> Patch {
    Patch {
        sequence_id: new.sequence_id,
        phase: (old.phase != new.phase).then_some(new.phase),
        community: (old.community != new.community).then(|| new.community.clone()),
        pot: (old.pot != new.pot).then_some(new.pot),
        current_bet: (old.current_bet != new.current_bet).then_some(new.current_bet),
        min_raise: (old.min_raise != new.min_raise).then_some(new.min_raise),
        dealer: (old.dealer != new.dealer).then_some(new.dealer),
        acting: (old.acting != new.acting).then_some(new.acting),
        players: new
            .players
            .iter()
            .filter(|p| old.players.iter().find(|q| q.seat == p.seat) != Some(*p))
            .cloned()
            .collect(),
        departed: old
            .players
            .iter()
            .filter(|p| new.players.iter().all(|q| q.seat != p.seat))
            .map(|p| p.seat)
            .collect(),
    }
}

/// Check the sanitization invariant: outside showdown, every live opponent's
/// hole slot must read hidden and the viewer must only ever see their own.
pub fn validate(snapshot: &Snapshot, viewer: PlayerId) -> bool {
    let showdown = matches!(
        snapshot.phase,
        Phase::ShowdownReveal | Phase::PayoutAnimation | Phase::SocialBanter
    );
    snapshot
        .players
        .iter()
        .filter(|p| p.steam_id != viewer)
        .all(|p| match p.hole_cards {
            HoleView::Shown(_) => showdown && !p.folded,
            HoleView::Hidden | HoleView::Absent => true,
        })
}
