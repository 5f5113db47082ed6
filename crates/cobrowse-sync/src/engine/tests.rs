use std::time::Duration;

use tokio::sync::mpsc;

use cobrowse_common::{Role, SessionId};

use super::{EngineConfig, EngineHandle, SyncEngine};
use crate::error::{SyncError, TransportError};
use crate::overlay::Control;
use crate::page::{Document, Interaction, MemoryPage, NodeId, Page};
use crate::protocol::{Envelope, SyncEvent};
use crate::selector::Selector;
use crate::session::{ConnectionStatus, SessionSnapshot};
use crate::transport::{Link, LoopbackHub, Transport, TransportEvent};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Store {
    page: MemoryPage,
    submit: NodeId,
    search: NodeId,
    password: NodeId,
}

fn store(path: &str) -> (Store, mpsc::UnboundedReceiver<Interaction>) {
    let (page, rx) = MemoryPage::new(path);
    let html = page.append(page.root(), "html", None);
    let body = page.append(html, "body", None);
    let form = page.append(body, "form", Some("checkout-form"));
    let search = page.append_input(form, Some("search"), false);
    let password = page.append_input(form, Some("password"), true);
    let submit = page.append(form, "button", Some("submit-btn"));
    (
        Store {
            page,
            submit,
            search,
            password,
        },
        rx,
    )
}

fn spawn_engine(hub: &LoopbackHub, path: &str) -> (EngineHandle, Store) {
    let (store, rx) = store(path);
    let handle = SyncEngine::spawn(EngineConfig::default(), store.page.clone(), rx, hub.clone());
    (handle, store)
}

/// Let every task run to idle. With paused time this advances the clock
/// by one millisecond, well inside every window.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(link: &mut Link) -> Vec<TransportEvent> {
    let mut out = Vec::new();
    while let Ok(event) = link.inbound.try_recv() {
        out.push(event);
    }
    out
}

fn sent_events(link: &mut Link) -> Vec<SyncEvent> {
    drain(link)
        .into_iter()
        .filter_map(|event| match event {
            TransportEvent::Envelope(envelope) => Some(envelope.event),
            _ => None,
        })
        .collect()
}

/// Host engine on `/products` with a raw guest link attached.
async fn host_with_probe(hub: &LoopbackHub) -> (EngineHandle, Store, Link) {
    let (host, store) = spawn_engine(hub, "/products");
    let id = host.create_session().await.unwrap();
    let mut probe = hub.join(&id).await.unwrap();
    settle().await;
    drain(&mut probe);
    (host, store, probe)
}

/// Guest engine on `/products` joined to a raw host link.
async fn guest_with_probe(hub: &LoopbackHub) -> (EngineHandle, Store, Link) {
    let mut probe = hub.create().await.unwrap();
    let (guest, store) = spawn_engine(hub, "/products");
    guest.join_session(probe.session_id.clone()).await.unwrap();
    settle().await;
    drain(&mut probe);
    (guest, store, probe)
}

fn from_guest(event: SyncEvent) -> Envelope {
    Envelope::new(Role::Guest, event)
}

fn from_host(event: SyncEvent) -> Envelope {
    Envelope::new(Role::Host, event)
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn create_then_join_connects_both_roles() {
    let hub = LoopbackHub::new();
    let (host, host_store) = spawn_engine(&hub, "/products");
    let (guest, guest_store) = spawn_engine(&hub, "/");

    let id = host.create_session().await.unwrap();
    guest.join_session(id.clone()).await.unwrap();
    settle().await;

    let h = host.snapshot();
    assert_eq!(h.status, ConnectionStatus::Connected);
    assert_eq!(h.role, Some(Role::Host));
    assert_eq!(h.id.as_ref(), Some(&id));
    assert!(h.peer_connected);

    let g = guest.snapshot();
    assert_eq!(g.status, ConnectionStatus::Connected);
    assert_eq!(g.role, Some(Role::Guest));
    assert_eq!(g.id, Some(id));
    assert!(g.peer_connected);

    // The host announces its route on attach and the guest follows.
    assert_eq!(guest_store.page.current_path(), host_store.page.current_path());
    assert_eq!(host.overlay().borrow().controls, vec![Control::Leave]);
    assert_eq!(guest.overlay().borrow().controls, vec![Control::Leave]);
}

#[tokio::test(start_paused = true)]
async fn join_unknown_session_reports_error() {
    let hub = LoopbackHub::new();
    let (guest, _store) = spawn_engine(&hub, "/");
    let id = SessionId::new();

    let err = guest.join_session(id.clone()).await.unwrap_err();
    assert_eq!(err, SyncError::Transport(TransportError::SessionNotFound(id)));
    assert_eq!(guest.snapshot().status, ConnectionStatus::Error);
    assert_eq!(
        guest.overlay().borrow().controls,
        vec![Control::Start, Control::Join]
    );
}

#[tokio::test(start_paused = true)]
async fn transport_loss_surfaces_as_error() {
    let hub = LoopbackHub::new();
    let (host, _store, _probe) = host_with_probe(&hub).await;
    let id = host.snapshot().id.unwrap();

    hub.disconnect(&id);
    settle().await;

    let snap = host.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Error);
    assert_eq!(snap.id, Some(id));
    assert!(!snap.peer_connected);
    assert_eq!(
        host.broadcast(SyncEvent::Scroll { y: 1.0 }).await.unwrap(),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn leave_resets_and_detaches() {
    let hub = LoopbackHub::new();
    let (host, _store, mut probe) = host_with_probe(&hub).await;

    host.leave_session().await.unwrap();
    settle().await;

    assert_eq!(host.snapshot(), SessionSnapshot::default());
    assert!(host.last_event().borrow().is_none());
    assert!(drain(&mut probe).contains(&TransportEvent::PeerDisconnected));
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_engine() {
    let hub = LoopbackHub::new();
    let (host, _store) = spawn_engine(&hub, "/");
    host.shutdown().await;
    settle().await;

    assert!(!host.is_running());
    assert_eq!(host.create_session().await, Err(SyncError::EngineStopped));
}

// ---------------------------------------------------------------------------
// Loop prevention
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn inbound_click_is_not_rebroadcast() {
    let hub = LoopbackHub::new();
    let (host, store, mut probe) = host_with_probe(&hub).await;

    let click = from_guest(SyncEvent::Click {
        selector: Selector::from("#submit-btn"),
        x: 10.0,
        y: 20.0,
    });
    probe.send(click.clone()).unwrap();
    settle().await;

    assert_eq!(store.page.clicks(), vec![store.submit]);
    assert_eq!(store.page.ripples(), vec![(10.0, 20.0)]);
    assert_eq!(*host.last_event().borrow(), Some(click));
    assert!(sent_events(&mut probe).is_empty());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(sent_events(&mut probe).is_empty());
}

#[tokio::test(start_paused = true)]
async fn guard_catches_untagged_click_echo() {
    let hub = LoopbackHub::new();
    let (_host, store, mut probe) = host_with_probe(&hub).await;
    store.page.set_echo_tagging(false);

    probe
        .send(from_guest(SyncEvent::Click {
            selector: Selector::from("#submit-btn"),
            x: 1.0,
            y: 1.0,
        }))
        .unwrap();
    settle().await;
    assert_eq!(store.page.clicks().len(), 1);
    assert!(sent_events(&mut probe).is_empty());

    // Once the settle window closes, real clicks flow again.
    tokio::time::sleep(Duration::from_millis(400)).await;
    store.page.user_click(store.submit, 2.0, 3.0);
    settle().await;
    assert_eq!(
        sent_events(&mut probe),
        vec![SyncEvent::Click {
            selector: Selector::from("#submit-btn"),
            x: 2.0,
            y: 3.0
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn inbound_scroll_sets_offset_without_echo() {
    let hub = LoopbackHub::new();
    let (_host, store, mut probe) = host_with_probe(&hub).await;
    store.page.set_echo_tagging(false);

    probe.send(from_guest(SyncEvent::Scroll { y: 450.0 })).unwrap();
    settle().await;
    assert_eq!(store.page.scroll_y(), 450.0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(sent_events(&mut probe).is_empty());
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pointer_moves_coalesce_to_latest() {
    let hub = LoopbackHub::new();
    let (_host, store, mut probe) = host_with_probe(&hub).await;

    store.page.user_pointer(1.0, 1.0);
    store.page.user_pointer(2.0, 2.0);
    store.page.user_pointer(5.0, 6.0);
    settle().await;
    assert!(sent_events(&mut probe).is_empty());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(
        sent_events(&mut probe),
        vec![SyncEvent::CursorMove { x: 5.0, y: 6.0 }]
    );
}

#[tokio::test(start_paused = true)]
async fn password_input_is_never_broadcast() {
    let hub = LoopbackHub::new();

    let (_host, store, mut probe) = host_with_probe(&hub).await;
    for path in ["/products", "/checkout", "/login"] {
        store.page.user_navigate(path);
        store.page.user_type(store.password, "hunter2");
    }
    settle().await;
    let sent = sent_events(&mut probe);
    assert!(!sent.iter().any(|e| matches!(e, SyncEvent::Input { .. })));

    store.page.user_type(store.search, "shoes");
    settle().await;
    assert_eq!(
        sent_events(&mut probe),
        vec![SyncEvent::Input {
            selector: Selector::from("#search"),
            value: "shoes".into()
        }]
    );

    let (_guest, store, mut probe) = guest_with_probe(&hub).await;
    for path in ["/products", "/login"] {
        store.page.user_navigate(path);
        store.page.user_type(store.password, "hunter2");
    }
    settle().await;
    let sent = sent_events(&mut probe);
    assert!(!sent.iter().any(|e| matches!(e, SyncEvent::Input { .. })));
}

// ---------------------------------------------------------------------------
// Privacy
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn privacy_toggle_blocks_guest_until_cleared() {
    let hub = LoopbackHub::new();
    let (host, host_store) = spawn_engine(&hub, "/products");
    let (guest, guest_store) = spawn_engine(&hub, "/");
    let id = host.create_session().await.unwrap();
    guest.join_session(id).await.unwrap();
    settle().await;
    assert!(!guest.overlay().borrow().blocking);

    host_store.page.user_navigate("/account");
    settle().await;
    assert!(guest.overlay().borrow().blocking);
    assert!(!host.overlay().borrow().blocking);
    assert_eq!(guest_store.page.current_path(), "/account");

    // Past every settle window, so only privacy can hold these back.
    tokio::time::sleep(Duration::from_millis(600)).await;
    guest_store.page.user_click(guest_store.submit, 1.0, 1.0);
    guest_store.page.user_scroll(300.0);
    guest_store.page.user_pointer(4.0, 4.0);
    guest_store.page.user_navigate("/products");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(host.last_event().borrow().is_none());

    host_store.page.user_navigate("/products");
    settle().await;
    assert!(!guest.overlay().borrow().blocking);

    tokio::time::sleep(Duration::from_millis(600)).await;
    guest_store.page.user_click(guest_store.submit, 7.0, 8.0);
    settle().await;
    let last = host.last_event().borrow().clone().unwrap();
    assert_eq!(last.role, Role::Guest);
    assert_eq!(
        last.event,
        SyncEvent::Click {
            selector: Selector::from("#submit-btn"),
            x: 7.0,
            y: 8.0
        }
    );
}

#[tokio::test(start_paused = true)]
async fn guest_is_blocked_before_reaching_private_route() {
    let hub = LoopbackHub::new();
    let (_host, host_store, mut host_probe) = host_with_probe(&hub).await;
    host_store.page.user_navigate("/account");
    settle().await;
    let frames: Vec<Envelope> = drain(&mut host_probe)
        .into_iter()
        .filter_map(|event| match event {
            TransportEvent::Envelope(envelope) => Some(envelope),
            _ => None,
        })
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].event, SyncEvent::PrivacyToggle { is_private: true });

    // Delivered one at a time, the guest is blocked from the first frame on.
    let (guest, guest_store, guest_probe) = guest_with_probe(&hub).await;
    for frame in frames {
        guest_probe.send(frame).unwrap();
        settle().await;
        assert!(guest.overlay().borrow().blocking);
    }
    assert_eq!(guest_store.page.current_path(), "/account");
    assert!(guest.overlay().borrow().blocking);
}

#[tokio::test(start_paused = true)]
async fn host_following_guest_reclassifies_route() {
    let hub = LoopbackHub::new();
    let (host, store, mut probe) = host_with_probe(&hub).await;

    probe
        .send(from_guest(SyncEvent::Navigate {
            path: "/checkout".into(),
        }))
        .unwrap();
    settle().await;

    assert_eq!(store.page.current_path(), "/checkout");
    assert_eq!(
        sent_events(&mut probe),
        vec![SyncEvent::PrivacyToggle { is_private: true }]
    );
    assert!(!host.overlay().borrow().blocking);
}

#[tokio::test(start_paused = true)]
async fn late_joiner_converges_on_private_route() {
    let hub = LoopbackHub::new();
    let (host, _host_store) = spawn_engine(&hub, "/wallet");
    let (guest, guest_store) = spawn_engine(&hub, "/");

    let id = host.create_session().await.unwrap();
    guest.join_session(id).await.unwrap();
    settle().await;

    assert_eq!(guest_store.page.current_path(), "/wallet");
    assert!(guest.overlay().borrow().blocking);
}

#[tokio::test(start_paused = true)]
async fn host_ignores_privacy_toggles_from_guest() {
    let hub = LoopbackHub::new();
    let (host, _store, mut probe) = host_with_probe(&hub).await;

    probe
        .send(from_guest(SyncEvent::PrivacyToggle { is_private: true }))
        .unwrap();
    settle().await;

    assert!(!host.overlay().borrow().blocking);
    assert!(sent_events(&mut probe).is_empty());
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn remote_pointer_shows_until_private() {
    let hub = LoopbackHub::new();
    let (guest, _store, probe) = guest_with_probe(&hub).await;

    probe
        .send(from_host(SyncEvent::CursorMove { x: 3.0, y: 4.0 }))
        .unwrap();
    settle().await;
    let dot = guest.overlay().borrow().pointer.clone().unwrap();
    assert_eq!((dot.x, dot.y), (3.0, 4.0));
    assert_eq!(dot.label, "Host");

    probe
        .send(from_host(SyncEvent::PrivacyToggle { is_private: true }))
        .unwrap();
    settle().await;
    let view = guest.overlay().borrow().clone();
    assert!(view.pointer.is_none());
    assert!(view.blocking);
}

#[tokio::test(start_paused = true)]
async fn peer_leaving_clears_pointer() {
    let hub = LoopbackHub::new();
    let (guest, _store, probe) = guest_with_probe(&hub).await;

    probe
        .send(from_host(SyncEvent::CursorMove { x: 3.0, y: 4.0 }))
        .unwrap();
    settle().await;
    assert!(guest.overlay().borrow().pointer.is_some());

    drop(probe);
    settle().await;
    assert!(guest.overlay().borrow().pointer.is_none());
    let snap = guest.snapshot();
    assert_eq!(snap.status, ConnectionStatus::Connected);
    assert!(!snap.peer_connected);
}
