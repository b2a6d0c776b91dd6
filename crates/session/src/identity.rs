use rvb_core::PlayerId;
use serde::Deserialize;
use serde::Serialize;

/// What the identity provider vouches for: a stable player id and the name
/// to show at the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: PlayerId,
    pub name: String,
}

/// Ticket verification failures. Both map onto the AUTH_FAILURE wire event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The ticket is malformed or was rejected by the provider.
    InvalidTicket,
    /// The provider could not be reached.
    Unavailable,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTicket => write!(f, "invalid auth ticket"),
            Self::Unavailable => write!(f, "identity provider unavailable"),
        }
    }
}
impl std::error::Error for AuthError {}

/// Adapter to the external identity provider. The production implementation
/// calls out to the platform's ticket-validation endpoint; the core only
/// ever sees this trait.
#[async_trait::async_trait]
pub trait Identity: Send + Sync {
    async fn verify(&self, ticket: &str) -> Result<Profile, AuthError>;
}

/// Development and test provider. Accepts tickets shaped
/// `mock:<id>:<name>` and nothing else.
#[derive(Debug, Default)]
pub struct MockIdentity;

#[async_trait::async_trait]
impl Identity for MockIdentity {
    async fn verify(&self, ticket: &str) -> Result<Profile, AuthError> {
        let mut parts = ticket.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("mock"), Some(id), Some(name)) if !name.is_empty() => Ok(Profile {
                id: id.parse().map_err(|_| AuthError::InvalidTicket)?,
                name: name.to_string(),
            }),
            _ => Err(AuthError::InvalidTicket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_accepts_well_formed_tickets() {
        let identity = MockIdentity;
        let profile = identity.verify("mock:42:Alice").await.unwrap();
        assert_eq!(profile.id, PlayerId::from(42));
        assert_eq!(profile.name, "Alice");
    }

    #[tokio::test]
    async fn mock_rejects_garbage() {
        let identity = MockIdentity;
        assert_eq!(identity.verify("steam:42:x").await, Err(AuthError::InvalidTicket));
        assert_eq!(identity.verify("mock:notanumber:x").await, Err(AuthError::InvalidTicket));
        assert_eq!(identity.verify("mock:42:").await, Err(AuthError::InvalidTicket));
    }
}
