//! Co-browsing session synchronization.
//!
//! Two peers (a host and a guest) mirror each other's navigation, clicks,
//! text input, scrolling and pointer position over a relay transport.
//! The host's privacy classification decides when the guest must be
//! blocked from seeing the mirrored view.
//!
//! The pieces, leaves first:
//! - [`selector`]: node ↔ selector path resolution over a [`page::Document`]
//! - [`privacy`]: private route classification
//! - [`transport`]: the two-party envelope channel (loopback and relay)
//! - [`session`]: session identity, role and connection status
//! - [`capture`]: local interaction → outbound event pipeline
//! - [`apply`]: inbound envelope replay with loop prevention
//! - [`overlay`]: presence view model
//! - [`engine`]: the single task that owns and drives all of the above

pub mod apply;
pub mod capture;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod page;
pub mod privacy;
pub mod protocol;
pub mod selector;
pub mod session;
pub mod transport;

pub use engine::{EngineConfig, EngineHandle, SyncEngine};
pub use error::{SyncError, TransportError};
pub use overlay::{OverlayView, PointerDot};
pub use page::{Document, Interaction, InteractionKind, MemoryPage, NodeId, Origin, Page};
pub use privacy::{PrivacyPolicy, PrivacyState};
pub use protocol::{Envelope, EventKind, SyncEvent};
pub use selector::Selector;
pub use session::{ConnectionStatus, SessionSnapshot};
pub use transport::{Link, LoopbackHub, RelayTransport, Transport, TransportEvent};
