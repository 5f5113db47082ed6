//! WebSocket client for the `cobrowse-relay` server.
//!
//! Handshake: send `host_hello`/`guest_hello`, wait for `session_ready`.
//! After that every text frame is either a relay control message or an
//! envelope from the peer.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use cobrowse_common::{Role, SessionId};

use super::{Link, Transport, TransportEvent, LINK_BUFFER};
use crate::error::TransportError;
use crate::protocol::Envelope;

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<Ws, Message>;
type WsStream = SplitStream<Ws>;

// ---------------------------------------------------------------------------
// Relay control messages
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ClientHello<'a> {
    #[serde(rename = "host_hello")]
    HostHello { session_id: &'a str },

    #[serde(rename = "guest_hello")]
    GuestHello { session_id: &'a str },
}

impl<'a> ClientHello<'a> {
    fn new(role: Role, id: &'a SessionId) -> Self {
        match role {
            Role::Host => ClientHello::HostHello {
                session_id: id.as_str(),
            },
            Role::Guest => ClientHello::GuestHello {
                session_id: id.as_str(),
            },
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
enum RelayControl {
    #[serde(rename = "session_ready")]
    SessionReady { session_id: String },

    #[serde(rename = "peer_connected")]
    PeerConnected,

    #[serde(rename = "peer_disconnected")]
    PeerDisconnected,

    #[serde(rename = "error")]
    Error { message: String },
}

/// Map a relay `error` message to the matching transport error.
fn relay_error(id: &SessionId, message: &str) -> TransportError {
    match message {
        "session not found" => TransportError::SessionNotFound(id.clone()),
        "guest already connected" => TransportError::SessionFull(id.clone()),
        other => TransportError::Protocol(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Connects each session attachment to a relay over WebSocket.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    url: String,
    hello_timeout: Duration,
}

impl RelayTransport {
    pub fn new(url: impl Into<String>, hello_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            hello_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn attach(&self, id: SessionId, role: Role) -> Result<Link, TransportError> {
        tracing::info!(url = %self.url, session = %id, role = ?role, "Connecting to relay...");

        let (ws, _) = connect_async(&self.url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let (mut sink, mut stream) = ws.split();

        // 1. Hello
        let hello = serde_json::to_string(&ClientHello::new(role, &id))
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        sink.send(Message::Text(hello.into()))
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        // 2. Wait for session_ready
        match read_control(&mut stream, self.hello_timeout).await? {
            RelayControl::SessionReady { session_id } if session_id == id.as_str() => {
                tracing::info!(session = %id, role = ?role, "Relay session ready");
            }
            RelayControl::Error { message } => {
                tracing::warn!(session = %id, error = %message, "Relay refused session");
                return Err(relay_error(&id, &message));
            }
            other => {
                return Err(TransportError::Protocol(format!(
                    "unexpected relay response: {other:?}"
                )));
            }
        }

        // 3. Pump frames in both directions
        let (in_tx, in_rx) = mpsc::channel(LINK_BUFFER);
        let (out_tx, out_rx) = mpsc::channel(LINK_BUFFER);
        tokio::spawn(pump(id.clone(), role, sink, stream, out_rx, in_tx));

        Ok(Link {
            session_id: id,
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn create(&self) -> Result<Link, TransportError> {
        self.attach(SessionId::new(), Role::Host).await
    }

    async fn join(&self, id: &SessionId) -> Result<Link, TransportError> {
        self.attach(id.clone(), Role::Guest).await
    }
}

/// Read one text frame and parse it as a relay control message.
async fn read_control(
    stream: &mut WsStream,
    timeout: Duration,
) -> Result<RelayControl, TransportError> {
    match tokio::time::timeout(timeout, stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => serde_json::from_str(&text)
            .map_err(|e| TransportError::Protocol(format!("bad relay response: {e}"))),
        Ok(Some(Ok(_))) => Err(TransportError::Protocol("expected text frame".into())),
        Ok(Some(Err(e))) => Err(TransportError::Connect(e.to_string())),
        Ok(None) => Err(TransportError::Closed),
        Err(_) => Err(TransportError::Connect("timed out waiting for relay".into())),
    }
}

/// Forward outbound envelopes to the socket and socket frames to the
/// link until either side goes away.
async fn pump(
    id: SessionId,
    role: Role,
    mut sink: WsSink,
    mut stream: WsStream,
    mut outbound: mpsc::Receiver<Envelope>,
    inbound: mpsc::Sender<TransportEvent>,
) {
    loop {
        tokio::select! {
            envelope = outbound.recv() => {
                let Some(envelope) = envelope else {
                    // Link dropped by its owner.
                    let _ = sink.close().await;
                    tracing::debug!(session = %id, "Relay link released");
                    return;
                };
                let json = match envelope.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode envelope");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    tracing::warn!(session = %id, error = %e, "Relay send failed");
                    let _ = inbound.send(TransportEvent::Closed).await;
                    return;
                }
            }

            frame = stream.next() => {
                let event = match frame {
                    Some(Ok(Message::Text(text))) => match parse_frame(&text) {
                        Some(event) => event,
                        None => continue,
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(session = %id, role = ?role, "Relay closed connection");
                        let _ = inbound.send(TransportEvent::Closed).await;
                        return;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(session = %id, error = %e, "Relay connection error");
                        let _ = inbound.send(TransportEvent::Closed).await;
                        return;
                    }
                    _ => continue,
                };
                if inbound.send(event).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Relay control messages take precedence; anything else must be a peer
/// envelope. Unparseable frames are dropped.
fn parse_frame(text: &str) -> Option<TransportEvent> {
    if let Ok(control) = serde_json::from_str::<RelayControl>(text) {
        return match control {
            RelayControl::PeerConnected => Some(TransportEvent::PeerConnected),
            RelayControl::PeerDisconnected => Some(TransportEvent::PeerDisconnected),
            RelayControl::Error { message } => {
                tracing::warn!(error = %message, "Relay error");
                None
            }
            RelayControl::SessionReady { .. } => None,
        };
    }
    match Envelope::from_json(text) {
        Ok(envelope) => Some(TransportEvent::Envelope(envelope)),
        Err(e) => {
            tracing::debug!(error = %e, "Dropping unparseable frame");
            None
        }
    }
}
