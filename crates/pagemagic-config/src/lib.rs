//! PageMagic configuration.
//!
//! Two kinds of configuration live here:
//! - the application config file (`config.toml`): API endpoint, request
//!   limits, storage location and log level. Every section has defaults so
//!   partial files work.
//! - the user settings kept in the sync storage area: the OpenRouter API
//!   key and the selected model.

pub mod schema;
pub mod settings;
pub mod toml_loader;
pub mod validation;

use std::path::Path;

pub use schema::{ApiConfig, LogLevel, LoggingConfig, PageMagicConfig, StorageConfig};
pub use settings::{validate_api_key, Settings, SettingsStore, API_KEY_PREFIX};

use pagemagic_common::ConfigError;

/// Load the config from `path` when given, else from the platform default
/// location (creating it on first run), then validate it.
pub fn load_config(path: Option<&Path>) -> Result<PageMagicConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}
