use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a peer in a co-browsing session.
///
/// The host's privacy classification is authoritative; the guest only
/// mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The role of the other party in the session.
    pub fn peer(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Host => "Host",
            Role::Guest => "Guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Host => "host",
            Role::Guest => "guest",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_is_the_opposite_role() {
        assert_eq!(Role::Host.peer(), Role::Guest);
        assert_eq!(Role::Guest.peer(), Role::Host);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
        let role: Role = serde_json::from_str("\"guest\"").unwrap();
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn display_and_label() {
        assert_eq!(Role::Guest.to_string(), "guest");
        assert_eq!(Role::Host.label(), "Host");
    }
}
