//! In-process transport: both peers live in the same runtime.
//!
//! Mirrors the relay's semantics (host creates, guest joins, peer
//! attach/detach notifications, frames dropped while alone) without a
//! socket, so two engines can be wired together in tests or a demo.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use cobrowse_common::{Role, SessionId};

use super::{Link, Transport, TransportEvent, LINK_BUFFER};
use crate::error::TransportError;
use crate::protocol::Envelope;

struct Attached {
    token: u64,
    tx: mpsc::Sender<TransportEvent>,
}

#[derive(Default)]
struct Room {
    host: Option<Attached>,
    guest: Option<Attached>,
}

impl Room {
    fn slot(&mut self, role: Role) -> &mut Option<Attached> {
        match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        }
    }

    fn is_empty(&self) -> bool {
        self.host.is_none() && self.guest.is_none()
    }
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<SessionId, Room>,
    next_token: u64,
}

/// Shared in-memory switchboard. Clones refer to the same hub.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with at least one attached party.
    pub fn session_count(&self) -> usize {
        self.state.lock().rooms.len()
    }

    /// Simulate a transport failure: both parties receive
    /// [`TransportEvent::Closed`] and the session is forgotten.
    pub fn disconnect(&self, id: &SessionId) {
        let Some(room) = self.state.lock().rooms.remove(id) else {
            return;
        };
        tracing::info!(session = %id, "Loopback session dropped");
        for attached in [room.host, room.guest].into_iter().flatten() {
            let _ = attached.tx.try_send(TransportEvent::Closed);
        }
    }

    /// Claim `role`'s slot in one critical section. A host opens the room;
    /// a guest needs an open room with a free guest slot, and both parties
    /// hear [`TransportEvent::PeerConnected`] once it is in.
    fn attach(
        &self,
        id: &SessionId,
        role: Role,
        room_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<u64, TransportError> {
        let mut state = self.state.lock();
        let token = state.next_token;
        let room = match role {
            Role::Host => state.rooms.entry(id.clone()).or_default(),
            Role::Guest => {
                let room = state
                    .rooms
                    .get_mut(id)
                    .ok_or_else(|| TransportError::SessionNotFound(id.clone()))?;
                if room.guest.is_some() {
                    return Err(TransportError::SessionFull(id.clone()));
                }
                room
            }
        };
        *room.slot(role) = Some(Attached { token, tx: room_tx });
        if role == Role::Guest {
            for attached in [&room.host, &room.guest].into_iter().flatten() {
                let _ = attached.tx.try_send(TransportEvent::PeerConnected);
            }
        }
        state.next_token += 1;
        Ok(token)
    }

    /// Forward one party's outbound envelopes to the other until its link
    /// is dropped, then detach it and tell the peer.
    fn spawn_forwarder(
        &self,
        id: SessionId,
        role: Role,
        token: u64,
        mut outbound: mpsc::Receiver<Envelope>,
    ) {
        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(envelope) = outbound.recv().await {
                let peer = state
                    .lock()
                    .rooms
                    .get_mut(&id)
                    .and_then(|room| room.slot(role.peer()).as_ref().map(|a| a.tx.clone()));
                match peer {
                    Some(tx) => {
                        let _ = tx.send(TransportEvent::Envelope(envelope)).await;
                    }
                    None => {
                        tracing::trace!(session = %id, role = ?role, "No peer, dropping envelope");
                    }
                }
            }

            let peer = {
                let mut guard = state.lock();
                let Some(room) = guard.rooms.get_mut(&id) else {
                    return;
                };
                let slot = room.slot(role);
                if slot.as_ref().is_some_and(|a| a.token == token) {
                    *slot = None;
                }
                let peer = room.slot(role.peer()).as_ref().map(|a| a.tx.clone());
                if room.is_empty() {
                    guard.rooms.remove(&id);
                }
                peer
            };
            tracing::debug!(session = %id, role = ?role, "Loopback link detached");
            if let Some(tx) = peer {
                let _ = tx.send(TransportEvent::PeerDisconnected).await;
            }
        });
    }

    fn open_link(&self, id: SessionId, role: Role) -> Result<Link, TransportError> {
        let (in_tx, in_rx) = mpsc::channel(LINK_BUFFER);
        let (out_tx, out_rx) = mpsc::channel(LINK_BUFFER);
        let token = self.attach(&id, role, in_tx)?;
        self.spawn_forwarder(id.clone(), role, token, out_rx);
        Ok(Link {
            session_id: id,
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

#[async_trait]
impl Transport for LoopbackHub {
    async fn create(&self) -> Result<Link, TransportError> {
        let link = self.open_link(SessionId::new(), Role::Host)?;
        tracing::info!(session = %link.session_id, "Loopback session created");
        Ok(link)
    }

    async fn join(&self, id: &SessionId) -> Result<Link, TransportError> {
        let link = self.open_link(id.clone(), Role::Guest)?;
        tracing::info!(session = %id, "Loopback guest joined");
        Ok(link)
    }
}
