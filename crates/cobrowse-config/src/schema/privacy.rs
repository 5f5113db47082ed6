//! Privacy route configuration.

use serde::{Deserialize, Serialize};

/// Routes on which the host's view must not be mirrored to the guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Path prefixes classified as private. Matched on `/` boundaries.
    pub private_prefixes: Vec<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            private_prefixes: ["/account", "/checkout", "/wallet", "/orders", "/profile"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
