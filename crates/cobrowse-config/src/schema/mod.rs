//! Configuration schema types for co-browse peers.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod privacy;
mod relay;
mod timing;

pub use logging::*;
pub use privacy::*;
pub use relay::*;
pub use timing::*;

use serde::{Deserialize, Serialize};

/// Root configuration for a co-browse peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CobrowseConfig {
    pub relay: RelayConfig,
    pub privacy: PrivacyConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}
