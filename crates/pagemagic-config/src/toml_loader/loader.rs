//! Read the config from a path or the platform default.

use std::io::ErrorKind;
use std::path::Path;

use pagemagic_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::PageMagicConfig;
use crate::validation;

/// Load config from a specific TOML file.
///
/// Missing fields take their serde defaults. Validation problems are logged
/// here and reported by [`crate::load_config`].
pub fn load_from_path(path: &Path) -> Result<PageMagicConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config: PageMagicConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), "config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform default path, writing a commented default
/// file on first run.
///
/// On Linux: `~/.config/pagemagic/config.toml`
/// On macOS: `~/Library/Application Support/pagemagic/config.toml`
pub fn load_default() -> Result<PageMagicConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(PageMagicConfig::default())
        }
        Err(e) => Err(e),
    }
}
