//! Table metadata and DDL for the persistent entities.
use tokio_postgres::types::Type;

/// Table for user accounts and chip balances.
pub const USERS: &str = "users";
/// Table for append-only hand-history documents.
pub const HANDS: &str = "hand_histories";

/// Schema metadata for a persistent entity. DDL strings are assembled at
/// compile time so startup migration is a couple of `batch_execute` calls.
pub trait Schema {
    /// Table name in the database.
    fn name() -> &'static str;
    /// `CREATE TABLE IF NOT EXISTS` statement.
    fn creates() -> &'static str;
    /// `CREATE INDEX IF NOT EXISTS` statements, possibly empty.
    fn indices() -> &'static str;
    /// Column types, in declaration order.
    fn columns() -> &'static [Type];
}

/// A registered player with a chip balance. Balances are BIGINT with a
/// non-negative check; the database is the last line of defense against a
/// ledger bug spending chips that do not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: rvb_core::PlayerId,
    pub name: String,
    pub chips: rvb_core::Chips,
}

impl Schema for User {
    fn name() -> &'static str {
        USERS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            USERS,
            " (
                id           BIGINT PRIMARY KEY,
                display_name TEXT NOT NULL,
                chips        BIGINT NOT NULL CHECK (chips >= 0),
                created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
    fn columns() -> &'static [Type] {
        &[
            Type::INT8,
            Type::TEXT,
            Type::INT8,
            Type::TIMESTAMPTZ,
            Type::TIMESTAMPTZ,
        ]
    }
}

/// Marker for the hand-history table. Rows are written once and never
/// updated; the record itself is an opaque JSONB document.
pub struct HandHistory;

impl Schema for HandHistory {
    fn name() -> &'static str {
        HANDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            HANDS,
            " (
                id         BIGSERIAL PRIMARY KEY,
                table_id   UUID NOT NULL,
                record     JSONB NOT NULL,
                winners    BIGINT[] NOT NULL,
                pot_total  BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_hand_histories_table ON ",
            HANDS,
            " (table_id);
             CREATE INDEX IF NOT EXISTS idx_hand_histories_winners ON ",
            HANDS,
            " USING GIN (winners);"
        )
    }
    fn columns() -> &'static [Type] {
        &[
            Type::INT8,
            Type::UUID,
            Type::JSONB,
            Type::INT8_ARRAY,
            Type::INT8,
            Type::TIMESTAMPTZ,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_ddl_enforces_non_negative_chips() {
        assert!(User::creates().contains("CHECK (chips >= 0)"));
        assert!(User::creates().contains("BIGINT PRIMARY KEY"));
    }

    #[test]
    fn hand_histories_are_documents() {
        assert!(HandHistory::creates().contains("JSONB NOT NULL"));
        assert!(HandHistory::indices().contains("idx_hand_histories_table"));
    }

    #[test]
    fn column_layouts_match_the_ddl() {
        assert_eq!(User::columns().len(), 5);
        assert_eq!(HandHistory::columns().len(), 6);
        assert_eq!(User::columns()[2], Type::INT8);
        assert_eq!(HandHistory::columns()[2], Type::JSONB);
    }
}
