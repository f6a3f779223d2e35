//! Configuration management for relay-server.
//!
//! Settings are layered:
//! 1. Default values
//! 2. Config file (`~/.relay/config.toml`)
//! 3. `OLLAMA_*` environment variables
//! 4. Command-line flags

mod schema;

pub use schema::{AppConfig, ConfigIssue, IssueLevel, RelayConfig, ServerConfig};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relay")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from the default path.
pub async fn load_config() -> ConfigResult<AppConfig> {
    load_config_from(&config_path()).await
}

/// Load configuration from a specific path.
///
/// A missing file is not an error: defaults are returned instead.
pub async fn load_config_from(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: AppConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Render a configuration as TOML.
pub fn to_toml(config: &AppConfig) -> ConfigResult<String> {
    Ok(toml::to_string_pretty(config)?)
}
