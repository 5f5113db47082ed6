//! Session identity, role and connection status.
//!
//! One session per engine at a time. The coordinator owns the outbound
//! half of the current link; the inbound half is handed to the engine's
//! event loop.

mod coordinator;
mod types;

pub use coordinator::SessionCoordinator;
pub use types::{ConnectionStatus, SessionSnapshot};
