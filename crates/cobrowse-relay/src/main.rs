//! cobrowse-relay: WebSocket relay pairing a co-browsing host with its guest.
//!
//! Clients open with a `host_hello` or `guest_hello`; after that the relay
//! forwards text frames between the two peers in order without reading
//! them. Delivery is at-most-once: nothing is buffered for a peer that is
//! not attached.

mod connection;
mod protocol;
mod session;

use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use crate::session::SessionStore;

/// How often the reaper scans for abandoned sessions.
const REAP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "cobrowse-relay", about = "WebSocket relay for co-browsing sessions")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Seconds a session may wait for its guest before it is dropped.
    #[arg(long, default_value_t = 300)]
    session_ttl: u64,

    /// Seconds a new connection has to send its hello.
    #[arg(long, default_value_t = 10)]
    hello_timeout: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cobrowse_relay=info".into()),
        )
        .init();

    if let Err(e) = serve(args).await {
        tracing::error!(error = %e, "Relay stopped");
        std::process::exit(1);
    }
}

async fn serve(args: Args) -> std::io::Result<()> {
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "cobrowse-relay listening");

    let store = SessionStore::new();
    spawn_reaper(store.clone(), Duration::from_secs(args.session_ttl));
    let hello_timeout = Duration::from_secs(args.hello_timeout);

    loop {
        let (tcp, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                continue;
            }
        };
        let store = store.clone();
        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(tcp).await {
                Ok(ws) => connection::handle_connection(ws, peer, store, hello_timeout).await,
                Err(e) => tracing::warn!(peer = %peer, error = %e, "Handshake failed"),
            }
        });
    }
}

fn spawn_reaper(store: SessionStore, ttl: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(REAP_INTERVAL);
        tick.tick().await;
        loop {
            tick.tick().await;
            store.reap_stale(ttl).await;
            let sessions = store.count().await;
            tracing::debug!(sessions, "Reaper pass");
        }
    });
}
