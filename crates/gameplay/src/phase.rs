use serde::Deserialize;
use serde::Serialize;

/// Table lifecycle phase. The cycle is
/// Waiting → Starting → Dealing → betting streets → ShowdownReveal →
/// PayoutAnimation → SocialBanter → Waiting, with Lobby only before the
/// first player ever sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Waiting,
    Starting,
    Dealing,
    PreFlop,
    Flop,
    Turn,
    River,
    ShowdownReveal,
    PayoutAnimation,
    SocialBanter,
}

impl Phase {
    /// True while a betting round is live.
    pub fn is_betting(&self) -> bool {
        matches!(self, Phase::PreFlop | Phase::Flop | Phase::Turn | Phase::River)
    }
    /// True while a hand is in progress (cards are out).
    pub fn in_hand(&self) -> bool {
        self.is_betting() || matches!(self, Phase::Dealing | Phase::ShowdownReveal)
    }
    /// Phases in which seating changes are accepted.
    pub fn seatable(&self) -> bool {
        matches!(self, Phase::Lobby | Phase::Waiting | Phase::SocialBanter)
    }
    /// Community cards revealed on entry to this street.
    pub fn reveals(&self) -> usize {
        match self {
            Phase::Flop => 3,
            Phase::Turn | Phase::River => 1,
            _ => 0,
        }
    }
    /// The betting street after this one, if any.
    pub fn next_street(&self) -> Option<Phase> {
        match self {
            Phase::PreFlop => Some(Phase::Flop),
            Phase::Flop => Some(Phase::Turn),
            Phase::Turn => Some(Phase::River),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streets_chain_to_river() {
        assert_eq!(Phase::PreFlop.next_street(), Some(Phase::Flop));
        assert_eq!(Phase::Flop.next_street(), Some(Phase::Turn));
        assert_eq!(Phase::Turn.next_street(), Some(Phase::River));
        assert_eq!(Phase::River.next_street(), None);
    }

    #[test]
    fn reveal_counts() {
        assert_eq!(Phase::Flop.reveals(), 3);
        assert_eq!(Phase::Turn.reveals(), 1);
        assert_eq!(Phase::River.reveals(), 1);
        assert_eq!(Phase::PreFlop.reveals(), 0);
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&Phase::ShowdownReveal).unwrap(),
            "\"SHOWDOWN_REVEAL\""
        );
        assert_eq!(serde_json::to_string(&Phase::PreFlop).unwrap(), "\"PRE_FLOP\"");
    }
}
