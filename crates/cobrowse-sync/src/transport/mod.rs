//! Two-party envelope channel.
//!
//! A [`Transport`] hands out one [`Link`] per session attachment. Delivery
//! is at-most-once: envelopes sent while the peer is absent are dropped,
//! and nothing is buffered across a disconnect.

mod loopback;
mod relay;

pub use loopback::LoopbackHub;
pub use relay::RelayTransport;

use async_trait::async_trait;
use tokio::sync::mpsc;

use cobrowse_common::SessionId;

use crate::error::TransportError;
use crate::protocol::Envelope;

/// Outbound queue depth per link.
pub const LINK_BUFFER: usize = 256;

/// What a link reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Envelope(Envelope),
    PeerConnected,
    PeerDisconnected,
    /// The link itself is gone. No further events follow.
    Closed,
}

/// One side's attachment to a session.
#[derive(Debug)]
pub struct Link {
    pub session_id: SessionId,
    pub outbound: mpsc::Sender<Envelope>,
    pub inbound: mpsc::Receiver<TransportEvent>,
}

impl Link {
    /// Queue an envelope for the peer without waiting.
    pub fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.outbound.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Protocol("outbound queue full".into())
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a new session as its host.
    async fn create(&self) -> Result<Link, TransportError>;

    /// Attach to an existing session as its guest.
    async fn join(&self, id: &SessionId) -> Result<Link, TransportError>;
}
