// Hideout Config Loader
// Reads the process configuration from `config.json` in the platform config
// directory, applies environment overrides and validates the result.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform;
use crate::services::url_resolver::is_http_url;
use crate::types::config::AppConfig;
use crate::types::errors::ConfigError;

pub const ENV_PROXY_ENDPOINT: &str = "HIDEOUT_PROXY_ENDPOINT";
pub const ENV_SYNC_ENDPOINT: &str = "HIDEOUT_SYNC_ENDPOINT";
pub const ENV_DATA_DIR: &str = "HIDEOUT_DATA_DIR";

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "hideout.db";

/// Loads [`AppConfig`] from disk.
pub struct ConfigLoader {
    config_path: String,
}

impl ConfigLoader {
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `config.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("config.json")
                .to_string_lossy()
                .to_string(),
        };
        Self { config_path }
    }

    pub fn get_config_path(&self) -> &str {
        &self.config_path
    }

    /// Reads the file (defaults when absent), then applies process environment
    /// overrides and validates.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        validate(&config)?;
        Ok(config)
    }

    /// Reads only the file, without environment overrides or validation.
    pub fn load_file(&self) -> Result<AppConfig, ConfigError> {
        let path = Path::new(&self.config_path);
        if !path.exists() {
            debug!(path = %self.config_path, "No config file, using defaults");
            return Ok(AppConfig::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Overrides endpoints and the data directory from `lookup` (normally the
/// process environment). Blank values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(endpoint) = get(ENV_PROXY_ENDPOINT) {
        config.proxy_endpoint = endpoint;
    }
    if let Some(endpoint) = get(ENV_SYNC_ENDPOINT) {
        config.sync_endpoint = Some(endpoint);
    }
    if let Some(dir) = get(ENV_DATA_DIR) {
        config.data_dir = Some(dir);
    }
}

/// Rejects endpoints that are not http(s) and a zero fetch timeout.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if !is_http_url(&config.proxy_endpoint) {
        return Err(ConfigError::InvalidValue(format!(
            "proxy_endpoint must be an http(s) url: {}",
            config.proxy_endpoint
        )));
    }
    if let Some(sync) = &config.sync_endpoint {
        if !is_http_url(sync) {
            return Err(ConfigError::InvalidValue(format!(
                "sync_endpoint must be an http(s) url: {}",
                sync
            )));
        }
    }
    if config.fetch_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue(
            "fetch_timeout_secs must be positive".to_string(),
        ));
    }
    if config.modifier_key.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "modifier_key cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Where the SQLite database lives for this configuration.
pub fn database_path(config: &AppConfig) -> PathBuf {
    config
        .data_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(platform::get_data_dir)
        .join(DATABASE_FILE)
}
