//! Authenticated caller of a core operation.
//!
//! The request layer authenticates the user and hands the core an [`Actor`];
//! the core trusts it completely. Role-dependent behavior matches on the enum
//! so that adding a role is a compile-time-checked change.

use crate::entities::case_update::ActorKind;
use std::fmt;

/// A client or an advocate, carrying the platform user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Actor {
    /// A person seeking legal help
    Client(String),
    /// A practising advocate
    Advocate(String),
}

impl Actor {
    /// Builds a client actor.
    pub fn client(id: impl Into<String>) -> Self {
        Self::Client(id.into())
    }

    /// Builds an advocate actor.
    pub fn advocate(id: impl Into<String>) -> Self {
        Self::Advocate(id.into())
    }

    /// The user id, whatever the role.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Client(id) | Self::Advocate(id) => id,
        }
    }

    /// Role recorded on timeline entries and documents.
    #[must_use]
    pub const fn kind(&self) -> ActorKind {
        match self {
            Self::Client(_) => ActorKind::Client,
            Self::Advocate(_) => ActorKind::Advocate,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(id) => write!(f, "client:{id}"),
            Self::Advocate(id) => write!(f, "advocate:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_accessors() {
        let client = Actor::client("c-1");
        assert_eq!(client.id(), "c-1");
        assert_eq!(client.kind(), ActorKind::Client);
        assert_eq!(client.to_string(), "client:c-1");

        let advocate = Actor::advocate("a-9");
        assert_eq!(advocate.id(), "a-9");
        assert_eq!(advocate.kind(), ActorKind::Advocate);
        assert_ne!(client, advocate);
    }
}
