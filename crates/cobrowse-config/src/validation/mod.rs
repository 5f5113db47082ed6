//! Full configuration validation.
//!
//! Validates numeric ranges, the relay URL scheme, and the shape of the
//! private route prefixes, collecting every problem into a single
//! `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::CobrowseConfig;
use cobrowse_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CobrowseConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_relay(&mut errors, config);
    validate_privacy(&mut errors, config);
    validate_timing(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_relay(errors: &mut Vec<String>, config: &CobrowseConfig) {
    let url = &config.relay.url;
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(format!("relay.url = {url:?} must use ws:// or wss://"));
    }
    validate_range(
        errors,
        "relay.hello_timeout_secs",
        config.relay.hello_timeout_secs,
        1,
        120,
    );
}

fn validate_privacy(errors: &mut Vec<String>, config: &CobrowseConfig) {
    for prefix in &config.privacy.private_prefixes {
        if !prefix.starts_with('/') {
            errors.push(format!(
                "privacy.private_prefixes entry {prefix:?} must start with '/'"
            ));
        }
    }
}

fn validate_timing(errors: &mut Vec<String>, config: &CobrowseConfig) {
    let t = &config.timing;
    validate_range(errors, "timing.coalesce_window_ms", t.coalesce_window_ms, 5, 1000);
    validate_range(errors, "timing.settle_input_ms", t.settle_input_ms, 10, 5000);
    validate_range(errors, "timing.settle_scroll_ms", t.settle_scroll_ms, 10, 5000);
    validate_range(errors, "timing.settle_click_ms", t.settle_click_ms, 10, 5000);
    validate_range(
        errors,
        "timing.settle_navigate_ms",
        t.settle_navigate_ms,
        10,
        5000,
    );
}
