//! Session lifecycle and outbound broadcast.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use cobrowse_common::{Role, SessionId};

use super::types::{ConnectionStatus, SessionSnapshot};
use crate::error::SyncError;
use crate::protocol::{Envelope, SyncEvent};
use crate::transport::{Transport, TransportEvent};

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the session state and the outbound side of the current link.
///
/// Every state change is published to the session watch channel; every
/// inbound envelope recorded with [`receive`](Self::receive) is published
/// as `last_event`.
pub struct SessionCoordinator {
    transport: Arc<dyn Transport>,
    snapshot: SessionSnapshot,
    outbound: Option<mpsc::Sender<Envelope>>,
    session_tx: watch::Sender<SessionSnapshot>,
    last_event_tx: watch::Sender<Option<Envelope>>,
}

impl SessionCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (session_tx, _) = watch::channel(SessionSnapshot::default());
        let (last_event_tx, _) = watch::channel(None);
        Self {
            transport,
            snapshot: SessionSnapshot::default(),
            outbound: None,
            session_tx,
            last_event_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session_tx.subscribe()
    }

    pub fn subscribe_last_event(&self) -> watch::Receiver<Option<Envelope>> {
        self.last_event_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot.role
    }

    pub fn status(&self) -> ConnectionStatus {
        self.snapshot.status
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot.is_connected()
    }

    /// Start a new session as host. Any current session is left first.
    ///
    /// Returns the new session id and the link's inbound events.
    pub async fn create_session(
        &mut self,
    ) -> Result<(SessionId, mpsc::Receiver<TransportEvent>), SyncError> {
        self.leave_session();
        self.update(|s| {
            s.role = Some(Role::Host);
            s.status = ConnectionStatus::Connecting;
        });

        match self.transport.create().await {
            Ok(link) => {
                let id = link.session_id.clone();
                self.outbound = Some(link.outbound);
                self.update(|s| {
                    s.id = Some(id.clone());
                    s.status = ConnectionStatus::Connected;
                });
                info!(session = %id, role = ?Role::Host, "Session created");
                Ok((id, link.inbound))
            }
            Err(e) => {
                warn!(error = %e, "Failed to create session");
                self.update(|s| s.status = ConnectionStatus::Error);
                Err(e.into())
            }
        }
    }

    /// Join an existing session as guest. Any current session is left
    /// first. A refusal is surfaced once as status `Error`.
    pub async fn join_session(
        &mut self,
        id: SessionId,
    ) -> Result<mpsc::Receiver<TransportEvent>, SyncError> {
        self.leave_session();
        self.update(|s| {
            s.id = Some(id.clone());
            s.role = Some(Role::Guest);
            s.status = ConnectionStatus::Connecting;
        });

        match self.transport.join(&id).await {
            Ok(link) => {
                self.outbound = Some(link.outbound);
                self.update(|s| s.status = ConnectionStatus::Connected);
                info!(session = %id, role = ?Role::Guest, "Session joined");
                Ok(link.inbound)
            }
            Err(e) => {
                warn!(session = %id, error = %e, "Failed to join session");
                self.update(|s| s.status = ConnectionStatus::Error);
                Err(e.into())
            }
        }
    }

    /// Tear down the current session, if any. Resets to `Idle`.
    pub fn leave_session(&mut self) {
        if self.snapshot == SessionSnapshot::default() {
            return;
        }
        if let Some(id) = &self.snapshot.id {
            info!(session = %id, "Leaving session");
        }
        self.outbound = None;
        self.update(|s| *s = SessionSnapshot::default());
        self.last_event_tx.send_replace(None);
    }

    /// Wrap `event` in an envelope and hand it to the transport.
    ///
    /// No-op returning `None` unless connected.
    pub fn broadcast(&self, event: SyncEvent) -> Option<Envelope> {
        if !self.is_connected() {
            return None;
        }
        let role = self.snapshot.role?;
        let outbound = self.outbound.as_ref()?;

        let envelope = Envelope::new(role, event);
        match outbound.try_send(envelope.clone()) {
            Ok(()) => {
                tracing::trace!(kind = %envelope.kind(), id = %envelope.id, "Broadcast");
                Some(envelope)
            }
            Err(e) => {
                warn!(kind = %envelope.kind(), error = %e, "Dropping outbound envelope");
                None
            }
        }
    }

    /// Record an inbound envelope as the latest received event.
    pub fn receive(&self, envelope: &Envelope) {
        self.last_event_tx.send_replace(Some(envelope.clone()));
    }

    pub fn set_peer_connected(&mut self, connected: bool) {
        if self.snapshot.peer_connected != connected {
            self.update(|s| s.peer_connected = connected);
        }
    }

    /// The link died under an active session. Identity is kept until the
    /// caller leaves; no reconnect is attempted.
    pub fn mark_disconnected(&mut self) {
        self.outbound = None;
        self.update(|s| {
            s.status = ConnectionStatus::Error;
            s.peer_connected = false;
        });
        warn!(session = ?self.snapshot.id, "Session transport lost");
    }

    fn update(&mut self, f: impl FnOnce(&mut SessionSnapshot)) {
        f(&mut self.snapshot);
        self.session_tx.send_replace(self.snapshot.clone());
    }
}
