//! Configuration module for cubeport.
//!
//! Handles server connections, export defaults and environment variables.

mod settings;

pub use settings::{expand_env_vars, ConnectionSettings, Settings, SettingsError, CONFIG_ENV_VAR};
