//! Envelope types relayed between the two peers of a session.
//!
//! Every replicated interaction is one [`SyncEvent`] variant with its own
//! typed fields, wrapped in an [`Envelope`] that records who sent it and
//! when. Envelopes carry no sequence number: the transport's delivery
//! order is the apply order.

use serde::{Deserialize, Serialize};

use cobrowse_common::{EnvelopeId, Role};

use crate::selector::Selector;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One replicated interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum SyncEvent {
    Navigate { path: String },
    Click { selector: Selector, x: f64, y: f64 },
    Input { selector: Selector, value: String },
    Scroll { y: f64 },
    CursorMove { x: f64, y: f64 },
    PrivacyToggle { is_private: bool },
}

/// Discriminant of a [`SyncEvent`], used for per-kind policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Navigate,
    Click,
    Input,
    Scroll,
    CursorMove,
    PrivacyToggle,
}

impl SyncEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SyncEvent::Navigate { .. } => EventKind::Navigate,
            SyncEvent::Click { .. } => EventKind::Click,
            SyncEvent::Input { .. } => EventKind::Input,
            SyncEvent::Scroll { .. } => EventKind::Scroll,
            SyncEvent::CursorMove { .. } => EventKind::CursorMove,
            SyncEvent::PrivacyToggle { .. } => EventKind::PrivacyToggle,
        }
    }
}

impl EventKind {
    /// Whether replaying this kind mutates the local page and could
    /// therefore be re-captured as a user interaction.
    pub fn mutates_page(self) -> bool {
        matches!(
            self,
            EventKind::Navigate | EventKind::Click | EventKind::Input | EventKind::Scroll
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Navigate => "NAVIGATE",
            EventKind::Click => "CLICK",
            EventKind::Input => "INPUT",
            EventKind::Scroll => "SCROLL",
            EventKind::CursorMove => "CURSOR_MOVE",
            EventKind::PrivacyToggle => "PRIVACY_TOGGLE",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A sent event, tagged with the sender's role and a wall-clock timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EnvelopeId,
    pub role: Role,
    /// Milliseconds since the Unix epoch at construction.
    pub timestamp: i64,
    pub event: SyncEvent,
}

impl Envelope {
    pub fn new(role: Role, event: SyncEvent) -> Self {
        Self {
            id: EnvelopeId::new(),
            role,
            timestamp: chrono::Utc::now().timestamp_millis(),
            event,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
