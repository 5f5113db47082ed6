//! In-memory page: element tree, router path, scroll offset and pointer.
//!
//! Programmatic mutations are echoed back as interactions the way a
//! browser dispatches synthetic events to global listeners. The echo keeps
//! the caller's [`Origin`] unless echo tagging is switched off, which
//! models environments where the marker is lost between the mutation and
//! the listener.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Document, Interaction, InteractionKind, NodeId, Origin, Page};

const ROOT: NodeId = NodeId(0);

/// Clicks and ripples kept for inspection; older ones are forgotten.
pub const HISTORY_LIMIT: usize = 32;

fn remember<T>(log: &mut VecDeque<T>, item: T) {
    if log.len() == HISTORY_LIMIT {
        log.pop_front();
    }
    log.push_back(item);
}

struct Element {
    tag: String,
    id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    password: bool,
    value: String,
}

struct PageState {
    nodes: HashMap<NodeId, Element>,
    next_id: u64,
    path: String,
    scroll_y: f64,
    focused: Option<NodeId>,
    clicks: VecDeque<NodeId>,
    ripples: VecDeque<(f64, f64)>,
    tag_echoes: bool,
    events: mpsc::UnboundedSender<Interaction>,
}

impl PageState {
    fn emit(&self, kind: InteractionKind, origin: Origin) {
        let origin = if self.tag_echoes { origin } else { Origin::User };
        let _ = self.events.send(Interaction { kind, origin });
    }
}

/// Cheaply cloneable handle to a shared in-memory page.
#[derive(Clone)]
pub struct MemoryPage {
    state: Arc<Mutex<PageState>>,
}

impl MemoryPage {
    /// Create an empty document at `path`. Returns the page and the
    /// receiving end of its interaction source.
    pub fn new(path: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Interaction>) {
        let (events, rx) = mpsc::unbounded_channel();
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            Element {
                tag: String::new(),
                id: None,
                parent: None,
                children: Vec::new(),
                password: false,
                value: String::new(),
            },
        );
        let page = Self {
            state: Arc::new(Mutex::new(PageState {
                nodes,
                next_id: 1,
                path: path.into(),
                scroll_y: 0.0,
                focused: None,
                clicks: VecDeque::new(),
                ripples: VecDeque::new(),
                tag_echoes: true,
                events,
            })),
        };
        (page, rx)
    }

    /// Append an element under `parent`.
    pub fn append(&self, parent: NodeId, tag: &str, id: Option<&str>) -> NodeId {
        self.insert(parent, tag, id, false)
    }

    /// Append an `<input>` under `parent`.
    pub fn append_input(&self, parent: NodeId, id: Option<&str>, password: bool) -> NodeId {
        self.insert(parent, "input", id, password)
    }

    fn insert(&self, parent: NodeId, tag: &str, id: Option<&str>, password: bool) -> NodeId {
        let mut state = self.state.lock();
        let node = NodeId(state.next_id);
        state.next_id += 1;
        state.nodes.insert(
            node,
            Element {
                tag: tag.to_ascii_lowercase(),
                id: id.filter(|s| !s.is_empty()).map(String::from),
                parent: Some(parent),
                children: Vec::new(),
                password,
                value: String::new(),
            },
        );
        if let Some(p) = state.nodes.get_mut(&parent) {
            p.children.push(node);
        }
        node
    }

    /// When disabled, echoed interactions lose their replay marker.
    pub fn set_echo_tagging(&self, enabled: bool) {
        self.state.lock().tag_echoes = enabled;
    }

    // -- user actions ------------------------------------------------------

    pub fn user_click(&self, node: NodeId, x: f64, y: f64) {
        let mut state = self.state.lock();
        remember(&mut state.clicks, node);
        state.emit(InteractionKind::Click { target: node, x, y }, Origin::User);
    }

    pub fn user_type(&self, node: NodeId, value: &str) {
        let mut state = self.state.lock();
        if let Some(el) = state.nodes.get_mut(&node) {
            el.value = value.to_string();
        }
        state.emit(
            InteractionKind::Input {
                target: node,
                value: value.to_string(),
            },
            Origin::User,
        );
    }

    pub fn user_scroll(&self, y: f64) {
        let mut state = self.state.lock();
        state.scroll_y = y;
        state.emit(InteractionKind::Scroll { y }, Origin::User);
    }

    pub fn user_pointer(&self, x: f64, y: f64) {
        self.state
            .lock()
            .emit(InteractionKind::PointerMove { x, y }, Origin::User);
    }

    pub fn user_navigate(&self, path: &str) {
        let mut state = self.state.lock();
        state.path = path.to_string();
        state.emit(
            InteractionKind::Navigate {
                path: path.to_string(),
            },
            Origin::User,
        );
    }

    // -- inspection --------------------------------------------------------

    pub fn value(&self, node: NodeId) -> Option<String> {
        self.state.lock().nodes.get(&node).map(|el| el.value.clone())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.state.lock().focused
    }

    /// Most recent clicks, oldest first, up to [`HISTORY_LIMIT`].
    pub fn clicks(&self) -> Vec<NodeId> {
        self.state.lock().clicks.iter().copied().collect()
    }

    /// Most recent ripples, oldest first, up to [`HISTORY_LIMIT`].
    pub fn ripples(&self) -> Vec<(f64, f64)> {
        self.state.lock().ripples.iter().copied().collect()
    }
}

impl Document for MemoryPage {
    fn root(&self) -> NodeId {
        ROOT
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.lock().nodes.get(&node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .lock()
            .nodes
            .get(&node)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    fn tag(&self, node: NodeId) -> Option<String> {
        if node == ROOT {
            return None;
        }
        self.state.lock().nodes.get(&node).map(|el| el.tag.clone())
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.state.lock().nodes.get(&node)?.id.clone()
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let state = self.state.lock();
        // Depth-first in document order so duplicates resolve to the first.
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            let el = state.nodes.get(&node)?;
            if el.id.as_deref() == Some(id) {
                return Some(node);
            }
            stack.extend(el.children.iter().rev().copied());
        }
        None
    }
}

impl Page for MemoryPage {
    fn current_path(&self) -> String {
        self.state.lock().path.clone()
    }

    fn navigate(&mut self, path: &str, origin: Origin) {
        let mut state = self.state.lock();
        state.path = path.to_string();
        state.emit(
            InteractionKind::Navigate {
                path: path.to_string(),
            },
            origin,
        );
    }

    fn focus(&mut self, node: NodeId) {
        self.state.lock().focused = Some(node);
    }

    fn click(&mut self, node: NodeId, x: f64, y: f64, origin: Origin) {
        let mut state = self.state.lock();
        remember(&mut state.clicks, node);
        state.emit(InteractionKind::Click { target: node, x, y }, origin);
    }

    fn set_value(&mut self, node: NodeId, value: &str, origin: Origin) {
        let mut state = self.state.lock();
        let Some(el) = state.nodes.get_mut(&node) else {
            return;
        };
        el.value = value.to_string();
        state.emit(
            InteractionKind::Input {
                target: node,
                value: value.to_string(),
            },
            origin,
        );
    }

    fn scroll_to(&mut self, y: f64, origin: Origin) {
        let mut state = self.state.lock();
        state.scroll_y = y;
        state.emit(InteractionKind::Scroll { y }, origin);
    }

    fn scroll_y(&self) -> f64 {
        self.state.lock().scroll_y
    }

    fn show_ripple(&mut self, x: f64, y: f64) {
        remember(&mut self.state.lock().ripples, (x, y));
    }

    fn is_password_field(&self, node: NodeId) -> bool {
        self.state
            .lock()
            .nodes
            .get(&node)
            .is_some_and(|el| el.password)
    }
}
