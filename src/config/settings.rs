//! TOML-based configuration for cubeport.
//!
//! Supports a config file (cubeport.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! base_url = "http://olap.internal:7777"
//! database = "Finance"
//! session = "${CUBEPORT_SESSION}"
//! timeout_secs = 60
//!
//! [connections.local]
//! base_url = "http://localhost:7777"
//! database = "Demo"
//!
//! [export]
//! blocksize = 10000
//! spool_threshold_bytes = 10485760
//! progress_policy = "strict"   # or "assume_complete"
//! sanitize_values = true
//!
//! [cache]
//! reset_on_collect = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::CacheSettings;
use crate::export::ExportOptions;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CUBEPORT_CONFIG";

/// Default timeout for requests, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("No connection configured")]
    NoConnection,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named cube servers.
    pub connections: HashMap<String, ConnectionSettings>,

    /// Defaults for export calls.
    pub export: ExportOptions,

    /// Batch cache behaviour.
    pub cache: CacheSettings,
}

/// One cube server and the database to use on it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Server base URL (supports ${ENV_VAR} expansion).
    pub base_url: String,

    /// Database name on the server.
    pub database: String,

    /// Pre-obtained session id (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub session: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ConnectionSettings {
    /// Get the base URL with environment variables expanded.
    pub fn resolved_base_url(&self) -> Result<String, SettingsError> {
        let url = expand_env_vars(&self.base_url)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingsError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        Ok(url)
    }

    /// Get the session id with environment variables expanded.
    pub fn resolved_session(&self) -> Result<Option<String>, SettingsError> {
        self.session.as_deref().map(expand_env_vars).transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CUBEPORT_CONFIG`
    /// 2. `./cubeport.toml`
    /// 3. `~/.config/cubeport/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("cubeport.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("cubeport").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, else the first by name).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections
            .iter()
            .min_by_key(|(name, _)| name.as_str())
            .map(|(k, v)| (k.as_str(), v))
    }

    /// A named connection, or the default one when no name is given.
    pub fn connection(&self, name: Option<&str>) -> Result<&ConnectionSettings, SettingsError> {
        match name {
            Some(name) => self.get_connection(name),
            None => self
                .default_connection()
                .map(|(_, conn)| conn)
                .ok_or(SettingsError::NoConnection),
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // lone '$'
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
