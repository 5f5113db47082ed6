//! Config file → runtime settings.

use std::time::Duration;

use cobrowse_config::CobrowseConfig;
use cobrowse_sync::apply::SettleTimes;
use cobrowse_sync::{EngineConfig, PrivacyPolicy, RelayTransport};

fn millis(ms: u32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

pub fn engine_config(config: &CobrowseConfig) -> EngineConfig {
    let t = &config.timing;
    EngineConfig {
        coalesce_window: millis(t.coalesce_window_ms),
        settle: SettleTimes {
            input: millis(t.settle_input_ms),
            scroll: millis(t.settle_scroll_ms),
            click: millis(t.settle_click_ms),
            navigate: millis(t.settle_navigate_ms),
        },
        privacy: PrivacyPolicy::new(&config.privacy.private_prefixes),
    }
}

/// Relay transport, with `--relay` taking precedence over the config.
pub fn relay_transport(config: &CobrowseConfig, url_override: Option<&str>) -> RelayTransport {
    let url = url_override.unwrap_or(&config.relay.url);
    RelayTransport::new(
        url,
        Duration::from_secs(u64::from(config.relay.hello_timeout_secs)),
    )
}

/// Filter directives for the subscriber: `--log-level` wins over config.
pub fn log_directives(config_level: &str, cli_level: Option<&str>) -> String {
    let level = cli_level.unwrap_or(config_level);
    format!("cobrowse={level},cobrowse_sync={level}")
}

/// Filter used while the config itself is loading: loader warnings by
/// default, or whatever `--log-level` asks for.
pub fn bootstrap_directives(cli_level: Option<&str>) -> String {
    format!("cobrowse_config={}", cli_level.unwrap_or("warn"))
}
