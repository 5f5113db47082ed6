//! Public handle for driving a running [`SyncEngine`](super::SyncEngine).

use tokio::sync::{mpsc, oneshot, watch};

use cobrowse_common::SessionId;

use super::types::EngineCommand;
use crate::error::SyncError;
use crate::overlay::OverlayView;
use crate::protocol::{Envelope, SyncEvent};
use crate::session::SessionSnapshot;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to the engine task.
///
/// Commands are answered by the engine; state is observed through watch
/// receivers that always hold the latest value.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    session_rx: watch::Receiver<SessionSnapshot>,
    last_event_rx: watch::Receiver<Option<Envelope>>,
    overlay_rx: watch::Receiver<OverlayView>,
}

impl EngineHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<EngineCommand>,
        session_rx: watch::Receiver<SessionSnapshot>,
        last_event_rx: watch::Receiver<Option<Envelope>>,
        overlay_rx: watch::Receiver<OverlayView>,
    ) -> Self {
        Self {
            command_tx,
            session_rx,
            last_event_rx,
            overlay_rx,
        }
    }

    /// Start hosting a new session. Resolves once the transport has
    /// accepted it.
    pub async fn create_session(&self) -> Result<SessionId, SyncError> {
        self.request(|reply| EngineCommand::CreateSession { reply })
            .await?
    }

    /// Join `id` as guest. An unknown or full session is returned as an
    /// error and leaves the status at `Error`.
    pub async fn join_session(&self, id: SessionId) -> Result<(), SyncError> {
        self.request(|reply| EngineCommand::JoinSession { id, reply })
            .await?
    }

    pub async fn leave_session(&self) -> Result<(), SyncError> {
        self.request(|reply| EngineCommand::LeaveSession { reply })
            .await
    }

    /// Send an event directly, bypassing capture. `None` when not connected.
    pub async fn broadcast(&self, event: SyncEvent) -> Result<Option<Envelope>, SyncError> {
        self.request(|reply| EngineCommand::Broadcast { event, reply })
            .await
    }

    pub fn session(&self) -> watch::Receiver<SessionSnapshot> {
        self.session_rx.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session_rx.borrow().clone()
    }

    /// The most recently received inbound envelope.
    pub fn last_event(&self) -> watch::Receiver<Option<Envelope>> {
        self.last_event_rx.clone()
    }

    pub fn overlay(&self) -> watch::Receiver<OverlayView> {
        self.overlay_rx.clone()
    }

    /// Stop the engine. Any session is left first.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(EngineCommand::Shutdown).await;
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> EngineCommand,
    ) -> Result<R, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(build(reply))
            .await
            .map_err(|_| SyncError::EngineStopped)?;
        rx.await.map_err(|_| SyncError::EngineStopped)
    }
}
