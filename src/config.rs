//! Application configuration.
//!
//! Settings come from `retro-session/config.json` in the user config
//! directory, then from environment variables:
//!
//! - `RETRO_DATABASE`: path of the SQLite snapshot database
//! - `RETRO_STORAGE_KEY`: key the session snapshot is stored under
//! - `RETRO_LOG`: default tracing filter, still overridden by `RUST_LOG`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_STORAGE_KEY;

const APP_NAME: &str = "retro-session";
const CONFIG_FILE: &str = "config.json";

/// Tracing filter used when neither the config file nor the environment set one.
pub const DEFAULT_LOG_FILTER: &str = "retro_session=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Snapshot database location. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Key the session snapshot is stored under.
    pub storage_key: String,
    /// `EnvFilter` directives for the CLI's log output.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Load the config file from the user's config directory.
    ///
    /// Environment overrides are not applied; see [`apply_env`](Self::apply_env).
    /// This runs before logging is set up, so failures are returned rather
    /// than logged.
    pub fn try_load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Read configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an environment-style lookup. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("RETRO_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(key) = get("RETRO_STORAGE_KEY") {
            self.storage_key = key;
        }
        if let Some(filter) = get("RETRO_LOG") {
            self.log_filter = filter;
        }
    }

    /// Save the current configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
