//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Co-browse Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[relay]
# url = "ws://127.0.0.1:8080"
# hello_timeout_secs = 10       # 1-120

[privacy]
# Routes the guest must never see mirrored. Matched on "/" boundaries,
# so "/account" covers "/account/orders" but not "/accounts".
private_prefixes = ["/account", "/checkout", "/wallet", "/orders", "/profile"]

[timing]
# coalesce_window_ms = 50       # 5-1000, scroll and pointer coalescing
# settle_input_ms = 100         # 10-5000, replay guard after INPUT
# settle_scroll_ms = 100        # 10-5000, replay guard after SCROLL
# settle_click_ms = 300         # 10-5000, replay guard after CLICK
# settle_navigate_ms = 500      # 10-5000, replay guard after NAVIGATE

[logging]
# level = "info"                # trace, debug, info, warn, error
"##
    .to_string()
}
