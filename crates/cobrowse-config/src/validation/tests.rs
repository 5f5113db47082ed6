//! Tests for the full validation pipeline.

use super::*;

#[test]
fn default_config_validates() {
    assert!(validate(&CobrowseConfig::default()).is_ok());
}

#[test]
fn catches_zero_coalesce_window() {
    let mut config = CobrowseConfig::default();
    config.timing.coalesce_window_ms = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("timing.coalesce_window_ms"));
}

#[test]
fn catches_huge_settle_timeout() {
    let mut config = CobrowseConfig::default();
    config.timing.settle_navigate_ms = 60_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("timing.settle_navigate_ms"));
}

#[test]
fn catches_http_relay_url() {
    let mut config = CobrowseConfig::default();
    config.relay.url = "http://relay.example.com".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("relay.url"));
}

#[test]
fn catches_relative_private_prefix() {
    let mut config = CobrowseConfig::default();
    config.privacy.private_prefixes.push("checkout".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("\"checkout\""));
}

#[test]
fn collects_multiple_errors() {
    let mut config = CobrowseConfig::default();
    config.relay.hello_timeout_secs = 0;
    config.timing.settle_click_ms = 1;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("relay.hello_timeout_secs"));
    assert!(err.contains("timing.settle_click_ms"));
    assert!(err.contains("; "));
}
