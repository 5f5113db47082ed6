//! Timing constants for the capture and replay pipeline.

use serde::{Deserialize, Serialize};

/// Coalescing window and replay settle timeouts, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// At most one scroll / pointer broadcast per window (valid range: 5-1000).
    pub coalesce_window_ms: u32,
    /// Settle timeouts for the replay guard (valid range: 10-5000).
    pub settle_input_ms: u32,
    pub settle_scroll_ms: u32,
    pub settle_click_ms: u32,
    pub settle_navigate_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: 50,
            settle_input_ms: 100,
            settle_scroll_ms: 100,
            settle_click_ms: 300,
            settle_navigate_ms: 500,
        }
    }
}
