//! One relay client: hello handshake, admission, then frame forwarding.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use cobrowse_common::Role;

use crate::protocol::{ClientHello, RelayControl};
use crate::session::{ClientTx, Departure, Eviction, SessionStore};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// Per-client queue depth.
const CLIENT_BUFFER: usize = 256;

/// An admitted client and the slot it occupies.
struct Client {
    addr: SocketAddr,
    session_id: String,
    role: Role,
    tx: ClientTx,
    rx: mpsc::Receiver<String>,
    /// `None` once the store has dropped its end without evicting.
    eviction: Option<Eviction>,
}

/// Drive one WebSocket until either side goes away.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    store: SessionStore,
    hello_timeout: Duration,
) {
    let (mut sink, mut stream) = ws.split();

    let Some(hello) = read_hello(&mut stream, addr, hello_timeout).await else {
        return;
    };
    let Some(mut client) = admit(&store, &mut sink, addr, hello).await else {
        return;
    };

    if let Some(reason) = forward(&store, &mut client, &mut sink, &mut stream).await {
        tracing::info!(peer = %addr, session = %client.session_id, role = %client.role, reason = %reason, "Client evicted");
        let _ = send(&mut sink, &RelayControl::Error { message: reason }).await;
        let _ = sink.close().await;
    }

    match store.leave(&client.session_id, client.role, &client.tx).await {
        Departure::Left { counterpart } => {
            tracing::info!(peer = %addr, session = %client.session_id, role = %client.role, "Client left");
            if let Some(peer) = counterpart {
                let _ = peer.send(RelayControl::PeerDisconnected.to_json()).await;
            }
        }
        Departure::Superseded => {
            tracing::debug!(peer = %addr, session = %client.session_id, "Stale client closed");
        }
    }
}

/// Register the client and answer with `session_ready`, or with `error`
/// when the store refuses it.
async fn admit(
    store: &SessionStore,
    sink: &mut WsSink,
    addr: SocketAddr,
    hello: ClientHello,
) -> Option<Client> {
    let (session_id, role) = hello.into_parts();
    let (tx, rx) = mpsc::channel(CLIENT_BUFFER);

    let admission = match store.admit(&session_id, role, tx.clone()).await {
        Ok(admission) => admission,
        Err(e) => {
            tracing::info!(peer = %addr, session = %session_id, role = %role, error = %e, "Client refused");
            let _ = send(sink, &RelayControl::Error { message: e.to_string() }).await;
            return None;
        }
    };

    let ready = RelayControl::SessionReady { session_id: session_id.clone() };
    if send(sink, &ready).await.is_err() {
        store.leave(&session_id, role, &tx).await;
        return None;
    }
    tracing::info!(peer = %addr, session = %session_id, role = %role, "Client admitted");

    if let Some(peer) = admission.counterpart {
        let _ = send(sink, &RelayControl::PeerConnected).await;
        let _ = peer.send(RelayControl::PeerConnected.to_json()).await;
    }

    Some(Client {
        addr,
        session_id,
        role,
        tx,
        rx,
        eviction: Some(admission.eviction),
    })
}

/// Pass text frames to the counterpart and queued frames to the socket
/// until either side closes. Returns the reason if the relay evicted the
/// client.
///
/// Frames sent while the counterpart is absent are dropped.
async fn forward(
    store: &SessionStore,
    client: &mut Client,
    sink: &mut WsSink,
    stream: &mut WsStream,
) -> Option<String> {
    loop {
        tokio::select! {
            reason = evicted(&mut client.eviction) => return Some(reason),

            Some(queued) = client.rx.recv() => {
                if sink.send(Message::Text(queued.into())).await.is_err() {
                    return None;
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    match store.counterpart(&client.session_id, client.role).await {
                        Some(peer) => {
                            if peer.send(text.to_string()).await.is_err() {
                                tracing::debug!(session = %client.session_id, "Counterpart queue closed");
                            }
                        }
                        None => tracing::trace!(session = %client.session_id, "No counterpart, frame dropped"),
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Err(e)) => {
                    tracing::debug!(peer = %client.addr, error = %e, "Socket error");
                    return None;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn evicted(eviction: &mut Option<Eviction>) -> String {
    let Some(rx) = eviction.as_mut() else {
        return std::future::pending().await;
    };
    match rx.await {
        Ok(reason) => reason,
        Err(_) => {
            *eviction = None;
            std::future::pending().await
        }
    }
}

/// First frame must be a text `ClientHello` within `timeout`.
async fn read_hello(stream: &mut WsStream, addr: SocketAddr, timeout: Duration) -> Option<ClientHello> {
    let text = match tokio::time::timeout(timeout, stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(other))) => {
            tracing::warn!(peer = %addr, frame = ?other, "Hello must be a text frame");
            return None;
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "Socket error before hello");
            return None;
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Closed before hello");
            return None;
        }
        Err(_) => {
            tracing::warn!(peer = %addr, ?timeout, "No hello in time");
            return None;
        }
    };

    serde_json::from_str(&text)
        .map_err(|e| tracing::warn!(peer = %addr, error = %e, "Malformed hello"))
        .ok()
}

async fn send(sink: &mut WsSink, control: &RelayControl) -> Result<(), tungstenite::Error> {
    sink.send(Message::Text(control.to_json().into())).await
}
