//! Host-environment seam: the document, the router, and the interaction
//! source.
//!
//! Capture and replay never touch a concrete DOM. A browser binding, a
//! webview bridge, or the in-memory [`MemoryPage`] implements [`Page`] and
//! pushes [`Interaction`]s into the engine's channel.

mod memory;

pub use memory::MemoryPage;

use cobrowse_common::EnvelopeId;

/// Opaque handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

/// Who caused an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A real user action.
    User,
    /// A programmatic mutation made while replaying the given envelope.
    Replay(EnvelopeId),
}

/// Raw interaction reported by the environment.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionKind {
    Click { target: NodeId, x: f64, y: f64 },
    Input { target: NodeId, value: String },
    Scroll { y: f64 },
    PointerMove { x: f64, y: f64 },
    /// The router settled on a new path.
    Navigate { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub origin: Origin,
}

impl Interaction {
    pub fn user(kind: InteractionKind) -> Self {
        Self {
            kind,
            origin: Origin::User,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self.origin, Origin::Replay(_))
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only view of an element tree.
///
/// The root is the document node itself; it is not an element and has no
/// tag. Children are element children in document order.
pub trait Document {
    fn root(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// Lowercase tag name, `None` for the document node or unknown nodes.
    fn tag(&self, node: NodeId) -> Option<String>;
    /// The element's `id` attribute, if set and non-empty.
    fn element_id(&self, node: NodeId) -> Option<String>;
    /// First element in document order carrying `id`.
    fn find_by_id(&self, id: &str) -> Option<NodeId>;
}

/// Mutable page surface used by the replay side, plus the router.
///
/// Every mutating call takes the [`Origin`] to stamp on the interaction the
/// environment echoes back, so capture can tell replays from user input.
pub trait Page: Document {
    fn current_path(&self) -> String;
    fn navigate(&mut self, path: &str, origin: Origin);
    fn focus(&mut self, node: NodeId);
    fn click(&mut self, node: NodeId, x: f64, y: f64, origin: Origin);
    /// Set a field's value and dispatch the change notification.
    fn set_value(&mut self, node: NodeId, value: &str, origin: Origin);
    fn scroll_to(&mut self, y: f64, origin: Origin);
    fn scroll_y(&self) -> f64;
    /// Transient visual feedback at viewport coordinates.
    fn show_ripple(&mut self, x: f64, y: f64);
    fn is_password_field(&self, node: NodeId) -> bool;
}
