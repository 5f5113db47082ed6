use serde::{Deserialize, Serialize};

/// Configuration for the relay connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// WebSocket URL of the relay server.
    pub url: String,
    /// Seconds to wait for the relay's `session_ready` reply.
    pub hello_timeout_secs: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080".into(),
            hello_timeout_secs: 10,
        }
    }
}
