//! Reading and parsing the config file.

use std::io::ErrorKind;
use std::path::Path;

use cobrowse_common::ConfigError;
use tracing::{debug, info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::CobrowseConfig;
use crate::validation;

/// Parse the TOML file at `path`, filling absent fields from defaults.
///
/// Out-of-range values are only logged; `crate::load_config_from`
/// rejects them.
pub fn load_from_path(path: &Path) -> Result<CobrowseConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!("cannot read {}: {e}", path.display())));
        }
    };

    let config = parse(&content)?;
    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "{e}");
    }
    debug!(path = %path.display(), "Config loaded");
    Ok(config)
}

/// Load `<config dir>/cobrowse/config.toml`, writing the commented
/// template there first if the file does not exist yet.
pub fn load_default() -> Result<CobrowseConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            info!(path = %path.display(), "Wrote default config");
            Ok(CobrowseConfig::default())
        }
        other => other,
    }
}

fn parse(content: &str) -> Result<CobrowseConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("invalid TOML: {e}")))
}
