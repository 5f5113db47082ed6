//! The sync engine: one task owning the session, capture pipeline,
//! applier and overlay state.
//!
//! Inputs (application commands, local page interactions, transport
//! events, and the next timer deadline) are multiplexed by a single
//! `select!` loop, so no state is shared and nothing needs locking.

mod actor;
mod handle;
mod types;

#[cfg(test)]
mod tests;

pub use actor::SyncEngine;
pub use handle::EngineHandle;
pub use types::EngineConfig;
