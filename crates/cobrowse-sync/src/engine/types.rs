//! Engine configuration and the command enum sent by [`EngineHandle`](super::EngineHandle).

use std::time::Duration;

use tokio::sync::oneshot;

use cobrowse_common::SessionId;

use crate::apply::SettleTimes;
use crate::error::SyncError;
use crate::privacy::PrivacyPolicy;
use crate::protocol::{Envelope, SyncEvent};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window for scroll and pointer coalescing.
    pub coalesce_window: Duration,
    /// Replay guard settle time per event kind.
    pub settle: SettleTimes,
    pub privacy: PrivacyPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_window: Duration::from_millis(50),
            settle: SettleTimes::default(),
            privacy: PrivacyPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) enum EngineCommand {
    CreateSession {
        reply: oneshot::Sender<Result<SessionId, SyncError>>,
    },
    JoinSession {
        id: SessionId,
        reply: oneshot::Sender<Result<(), SyncError>>,
    },
    LeaveSession {
        reply: oneshot::Sender<()>,
    },
    Broadcast {
        event: SyncEvent,
        reply: oneshot::Sender<Option<Envelope>>,
    },
    Shutdown,
}
