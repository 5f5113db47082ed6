//! The engine task and its event loop.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cobrowse_common::Role;

use super::handle::EngineHandle;
use super::types::{EngineCommand, EngineConfig};
use crate::apply::{Applier, ApplyOutcome};
use crate::capture::{CaptureContext, CapturePipeline};
use crate::overlay::{OverlayState, OverlayView, RemotePointer};
use crate::page::{Interaction, Page};
use crate::privacy::PrivacyState;
use crate::protocol::SyncEvent;
use crate::session::SessionCoordinator;
use crate::transport::{Transport, TransportEvent};

/// Command queue depth.
const COMMAND_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SyncEngine<P> {
    page: P,
    interactions: mpsc::UnboundedReceiver<Interaction>,
    commands: mpsc::Receiver<EngineCommand>,
    coordinator: SessionCoordinator,
    /// Inbound half of the current link, if any.
    inbound: Option<mpsc::Receiver<TransportEvent>>,
    capture: CapturePipeline,
    applier: Applier,
    overlay: OverlayState,
    overlay_tx: watch::Sender<OverlayView>,
}

impl<P: Page + Send + 'static> SyncEngine<P> {
    /// Start the engine on the current runtime.
    ///
    /// `interactions` must be the receiving end of `page`'s interaction
    /// source. Returns the handle; the task stops on
    /// [`EngineHandle::shutdown`] or when every handle is dropped.
    pub fn spawn<T: Transport>(
        config: EngineConfig,
        page: P,
        interactions: mpsc::UnboundedReceiver<Interaction>,
        transport: T,
    ) -> EngineHandle {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let coordinator = SessionCoordinator::new(Arc::new(transport));
        let (overlay_tx, overlay_rx) = watch::channel(OverlayView::default());

        let handle = EngineHandle::new(
            command_tx,
            coordinator.subscribe(),
            coordinator.subscribe_last_event(),
            overlay_rx,
        );

        let engine = Self {
            page,
            interactions,
            commands,
            coordinator,
            inbound: None,
            capture: CapturePipeline::new(config.privacy, config.coalesce_window),
            applier: Applier::new(config.settle),
            overlay: OverlayState::default(),
            overlay_tx,
        };
        tokio::spawn(engine.run());
        handle
    }

    async fn run(mut self) {
        debug!("Sync engine started");
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },

                Some(interaction) = self.interactions.recv() => {
                    self.on_interaction(interaction);
                }

                event = recv_inbound(&mut self.inbound) => {
                    self.on_transport(event.unwrap_or(TransportEvent::Closed));
                }

                _ = sleep_until(deadline) => self.on_timer(),
            }
        }

        self.teardown();
        self.coordinator.leave_session();
        self.publish();
        debug!("Sync engine stopped");
    }

    // -- commands ----------------------------------------------------------

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::CreateSession { reply } => {
                self.teardown();
                let result = match self.coordinator.create_session().await {
                    Ok((id, inbound)) => {
                        self.inbound = Some(inbound);
                        let is_private = self.capture.prime(&self.page.current_path());
                        self.overlay.privacy = PrivacyState { is_private };
                        Ok(id)
                    }
                    Err(e) => Err(e),
                };
                self.publish();
                let _ = reply.send(result);
            }
            EngineCommand::JoinSession { id, reply } => {
                self.teardown();
                let result = self
                    .coordinator
                    .join_session(id)
                    .await
                    .map(|inbound| self.inbound = Some(inbound));
                self.publish();
                let _ = reply.send(result);
            }
            EngineCommand::LeaveSession { reply } => {
                self.teardown();
                self.coordinator.leave_session();
                self.publish();
                let _ = reply.send(());
            }
            EngineCommand::Broadcast { event, reply } => {
                let _ = reply.send(self.coordinator.broadcast(event));
            }
            EngineCommand::Shutdown => {}
        }
    }

    // -- local interactions ------------------------------------------------

    fn on_interaction(&mut self, interaction: Interaction) {
        let Some(ctx) = self.capture_context(Instant::now()) else {
            return;
        };
        let events = self
            .capture
            .capture(&interaction, ctx, &self.page, Instant::now());

        if ctx.role == Role::Host {
            self.sync_host_privacy();
        }
        self.send_all(events);
        self.publish();
    }

    // -- transport ---------------------------------------------------------

    fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Envelope(envelope) => {
                self.coordinator.receive(&envelope);
                let Some(role) = self.coordinator.role() else {
                    return;
                };
                match self
                    .applier
                    .apply(&envelope, role, &mut self.page, Instant::now())
                {
                    ApplyOutcome::Pointer { x, y } => {
                        self.overlay.pointer = Some(RemotePointer { x, y });
                    }
                    ApplyOutcome::Privacy { is_private } => {
                        if self.overlay.privacy.is_private != is_private {
                            info!(is_private, "Host privacy changed");
                        }
                        self.overlay.privacy = PrivacyState { is_private };
                    }
                    ApplyOutcome::Applied | ApplyOutcome::Skipped | ApplyOutcome::Ignored => {}
                }
            }
            TransportEvent::PeerConnected => {
                info!(session = ?self.coordinator.snapshot().id, "Peer connected");
                self.coordinator.set_peer_connected(true);
                if self.coordinator.role() == Some(Role::Host) {
                    let events = self.capture.announce(&self.page.current_path());
                    self.sync_host_privacy();
                    self.send_all(events);
                }
            }
            TransportEvent::PeerDisconnected => {
                info!(session = ?self.coordinator.snapshot().id, "Peer disconnected");
                self.coordinator.set_peer_connected(false);
                self.overlay.pointer = None;
            }
            TransportEvent::Closed => {
                self.teardown();
                self.coordinator.mark_disconnected();
            }
        }
        self.publish();
    }

    // -- timers ------------------------------------------------------------

    fn on_timer(&mut self) {
        let now = Instant::now();
        if self.applier.expire_guard(now) {
            tracing::trace!("Replay guard settled");
        }
        let Some(ctx) = self.capture_context(now) else {
            self.capture.reset();
            return;
        };
        let events = self.capture.flush_due(ctx, now);
        self.send_all(events);
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.capture.next_deadline(), self.applier.guard_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // -- helpers -----------------------------------------------------------

    /// `None` unless a session is connected.
    fn capture_context(&self, now: Instant) -> Option<CaptureContext> {
        if !self.coordinator.is_connected() {
            return None;
        }
        Some(CaptureContext {
            role: self.coordinator.role()?,
            is_private: self.overlay.privacy.is_private,
            guard_active: self.applier.guard_active(now),
        })
    }

    fn sync_host_privacy(&mut self) {
        if let Some(is_private) = self.capture.host_privacy() {
            self.overlay.privacy = PrivacyState { is_private };
        }
    }

    fn send_all(&mut self, events: Vec<SyncEvent>) {
        for event in events {
            if self.coordinator.broadcast(event).is_none() {
                warn!("Event not sent: session not connected");
            }
        }
    }

    /// Drop everything tied to the current link so late deadlines and
    /// stale frames cannot reach the next session.
    fn teardown(&mut self) {
        self.inbound = None;
        self.capture.reset();
        self.applier.reset();
        self.overlay.pointer = None;
        self.overlay.privacy = PrivacyState::default();
    }

    fn publish(&mut self) {
        self.overlay.session = self.coordinator.snapshot();
        let view = self.overlay.view();
        self.overlay_tx.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

async fn recv_inbound(inbound: &mut Option<mpsc::Receiver<TransportEvent>>) -> Option<TransportEvent> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
