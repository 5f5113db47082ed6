use std::fmt;

use cobrowse_common::{Role, SessionId};

/// Lifecycle of the local attachment to a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Join refused or transport lost. Not retried.
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the session, published on a watch channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: Option<SessionId>,
    pub role: Option<Role>,
    pub status: ConnectionStatus,
    /// Whether the other party is currently attached.
    pub peer_connected: bool,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
