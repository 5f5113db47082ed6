use cobrowse_common::SessionId;

/// Failures reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {0} already has a guest")]
    SessionFull(SessionId),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transport closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no active session")]
    NoSession,

    #[error("sync engine stopped")]
    EngineStopped,
}

impl From<SyncError> for cobrowse_common::CobrowseError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Transport(t) => cobrowse_common::CobrowseError::Transport(t.to_string()),
            other => cobrowse_common::CobrowseError::Session(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display() {
        let id: SessionId = "6f1c1a3e-7b1e-4d59-9a39-0d8f4f6b2c11".parse().unwrap();
        let err = TransportError::SessionNotFound(id);
        assert_eq!(
            err.to_string(),
            "session 6f1c1a3e-7b1e-4d59-9a39-0d8f4f6b2c11 not found"
        );
        assert_eq!(TransportError::Closed.to_string(), "transport closed");
    }

    #[test]
    fn sync_error_wraps_transport() {
        let err: SyncError = TransportError::Connect("refused".into()).into();
        assert_eq!(err.to_string(), "connect failed: refused");
    }

    #[test]
    fn converts_into_common_error() {
        let err: cobrowse_common::CobrowseError = SyncError::NoSession.into();
        assert_eq!(err.to_string(), "session error: no active session");

        let err: cobrowse_common::CobrowseError =
            SyncError::Transport(TransportError::Closed).into();
        assert_eq!(err.to_string(), "transport error: transport closed");
    }
}
