//! Host or join, per the subcommand.

use cobrowse_common::{Result, SessionId};
use cobrowse_sync::EngineHandle;

use crate::cli::Command;

/// Open or join the session `command` asks for and return its id.
pub async fn start_session(engine: &EngineHandle, command: &Command) -> Result<SessionId> {
    match command {
        Command::Host => {
            let id = engine.create_session().await?;
            tracing::info!(session = %id, "Hosting session");
            Ok(id)
        }
        Command::Join { session_id } => {
            let id: SessionId = session_id.parse()?;
            engine.join_session(id.clone()).await?;
            tracing::info!(session = %id, "Joined session");
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobrowse_common::CobrowseError;
    use cobrowse_sync::{EngineConfig, LoopbackHub, MemoryPage, SyncEngine};

    fn engine(hub: &LoopbackHub) -> EngineHandle {
        let (page, rx) = MemoryPage::new("/");
        SyncEngine::spawn(EngineConfig::default(), page, rx, hub.clone())
    }

    #[tokio::test]
    async fn host_then_join_by_printed_id() {
        let hub = LoopbackHub::new();
        let host = engine(&hub);
        let guest = engine(&hub);

        let id = start_session(&host, &Command::Host).await.unwrap();
        let join = Command::Join {
            session_id: format!("  {id}\n"),
        };
        assert_eq!(start_session(&guest, &join).await.unwrap(), id);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_connecting() {
        let hub = LoopbackHub::new();
        let guest = engine(&hub);
        let join = Command::Join {
            session_id: "not-a-session".into(),
        };
        let err = start_session(&guest, &join).await.unwrap_err();
        assert!(matches!(err, CobrowseError::InvalidSessionId(_)));
    }

    #[tokio::test]
    async fn unknown_session_surfaces_as_transport_error() {
        let hub = LoopbackHub::new();
        let guest = engine(&hub);
        let join = Command::Join {
            session_id: SessionId::new().to_string(),
        };
        let err = start_session(&guest, &join).await.unwrap_err();
        assert!(matches!(err, CobrowseError::Transport(ref m) if m.contains("not found")));
    }
}
