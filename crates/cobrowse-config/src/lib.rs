//! Co-browse configuration system.
//!
//! TOML-based configuration for the relay endpoint, the privacy route
//! list, and the timing constants of the capture/replay pipeline. All
//! sections use serde defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::CobrowseConfig;

use std::path::Path;

use cobrowse_common::ConfigError;

/// Load config from the platform default path, creating it if missing,
/// and validate the result.
pub fn load_config() -> Result<CobrowseConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path (the `--config` override) and
/// validate the result.
pub fn load_config_from(path: &Path) -> Result<CobrowseConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &CobrowseConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
