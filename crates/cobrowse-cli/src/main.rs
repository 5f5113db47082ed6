//! cobrowse: a headless co-browsing peer.
//!
//! Hosts or joins a session over the relay with a demo storefront page,
//! plays user interactions read from stdin as JSON lines, and logs what
//! the peer mirrors back.

mod cli;
mod script;
mod settings;
mod start;
mod storefront;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cobrowse_config::CobrowseConfig;
use cobrowse_sync::{EngineHandle, SyncEngine};

use crate::cli::Command;
use crate::script::ScriptStep;
use crate::storefront::Storefront;

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // The config picks the final log level, so load it under a bootstrap
    // subscriber that still reports what the loader warns about.
    let bootstrap_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(settings::bootstrap_directives(args.log_level.as_deref()))
    });
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(bootstrap_filter)
        .finish();
    let config_result = tracing::subscriber::with_default(bootstrap, || match &args.config {
        Some(path) => cobrowse_config::load_config_from(path),
        None => cobrowse_config::load_config(),
    });
    let config_level = config_result
        .as_ref()
        .map(|c| c.logging.level.as_filter())
        .unwrap_or("info");

    let directives = settings::log_directives(config_level, args.log_level.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&directives))
                .unwrap_or_else(|_| EnvFilter::new("cobrowse=info")),
        )
        .init();

    tracing::info!("cobrowse v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = config_result.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        CobrowseConfig::default()
    });
    tracing::debug!(config = %cobrowse_config::config_to_json(&config), "Effective config");

    let (store, interactions) = Storefront::build("/");
    let transport = settings::relay_transport(&config, args.relay.as_deref());
    tracing::info!(relay = %transport.url(), "Using relay");

    let engine = SyncEngine::spawn(
        settings::engine_config(&config),
        store.page.clone(),
        interactions,
        transport,
    );

    match start::start_session(&engine, &args.command).await {
        Ok(id) => {
            if args.command == Command::Host {
                println!("{id}");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not start session");
            engine.shutdown().await;
            std::process::exit(1);
        }
    }

    tokio::spawn(log_remote_activity(engine.clone()));

    tokio::select! {
        _ = play_stdin(&store) => {
            tracing::info!("Script finished, waiting for Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    tracing::info!("Shutting down");
    let _ = engine.leave_session().await;
    engine.shutdown().await;
}

/// Feed stdin lines to the page until EOF.
async fn play_stdin(store: &Storefront) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match ScriptStep::parse(&line) {
                Ok(Some(step)) => {
                    if let Err(e) = step.run(store) {
                        tracing::warn!(error = %e, "Skipping step");
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, line = %line, "Skipping line"),
            },
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                return;
            }
        }
    }
}

/// Log session, overlay and inbound envelope changes until the engine stops.
async fn log_remote_activity(engine: EngineHandle) {
    let mut session = engine.session();
    let mut overlay = engine.overlay();
    let mut last_event = engine.last_event();

    loop {
        tokio::select! {
            changed = session.changed() => {
                if changed.is_err() { return; }
                let snap = session.borrow_and_update().clone();
                tracing::info!(
                    status = %snap.status,
                    role = ?snap.role,
                    peer_connected = snap.peer_connected,
                    "Session updated"
                );
            }
            changed = overlay.changed() => {
                if changed.is_err() { return; }
                let view = overlay.borrow_and_update().clone();
                if view.blocking {
                    tracing::info!("Host is on a private page; view blocked");
                }
                if let Some(dot) = view.pointer {
                    tracing::debug!(x = dot.x, y = dot.y, label = dot.label, "Remote pointer");
                }
            }
            changed = last_event.changed() => {
                if changed.is_err() { return; }
                if let Some(envelope) = last_event.borrow_and_update().clone() {
                    tracing::info!(
                        kind = %envelope.kind(),
                        from = %envelope.role,
                        "Received {}",
                        serde_json::to_string(&envelope.event).unwrap_or_default()
                    );
                }
            }
        }
    }
}
