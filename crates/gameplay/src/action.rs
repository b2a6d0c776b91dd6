use rvb_core::Chips;

/// A betting decision as validated and applied by the table.
///
/// `Raise` carries the player's **total** new wager for the round, not the
/// increment on top of the current bet; the wire protocol uses the same
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise(Chips),
    AllIn,
}

impl Action {
    /// Wire label, matching the REQ_ACTION type vocabulary.
    pub const fn label(&self) -> &'static str {
        match self {
            Action::Fold => "FOLD",
            Action::Check => "CHECK",
            Action::Call => "CALL",
            Action::Raise(_) => "RAISE",
            Action::AllIn => "ALL_IN",
        }
    }
    pub fn amount(&self) -> Option<Chips> {
        match *self {
            Action::Raise(total) => Some(total),
            _ => None,
        }
    }
    pub fn is_aggro(&self) -> bool {
        matches!(self, Action::Raise(_) | Action::AllIn)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Raise(total) => write!(f, "RAISE {}", total),
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Action::AllIn.label(), "ALL_IN");
        assert_eq!(Action::Raise(100).to_string(), "RAISE 100");
        assert_eq!(Action::Raise(100).amount(), Some(100));
        assert_eq!(Action::Call.amount(), None);
    }
}
