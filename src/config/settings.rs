//! User settings.
//!
//! Settings are read from `~/.kapeta/kap/config.yml` when it exists and then
//! overridden by environment variables. Every field has a default, so an
//! absent or partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{KapError, Result};

/// Environment variable overriding [`Settings::base_url`].
pub const BASE_URL_ENV: &str = "KAP_BASE_URL";

/// Environment variable overriding [`Settings::client_id`].
pub const CLIENT_ID_ENV: &str = "KAP_CLIENT_ID";

/// Default identity service.
pub const DEFAULT_BASE_URL: &str = "https://auth.kapeta.com";

/// OAuth client id registered for the CLI.
pub const DEFAULT_CLIENT_ID: &str = "63bbeafc39707c0ce0e8e4ff";

/// Tool-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identity service base URL, used when no session pins one.
    pub base_url: String,

    /// OAuth client id, used when no session pins one.
    pub client_id: String,

    /// Prefix used by `kap install <name>` to derive a package reference.
    pub package_prefix: String,

    /// Package manager executable used to fetch commands.
    pub package_manager: String,

    /// Interpreter for script-based command entry points.
    pub script_interpreter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            package_prefix: "@kapeta/kap-".to_string(),
            package_manager: default_package_manager().to_string(),
            script_interpreter: "node".to_string(),
        }
    }
}

fn default_package_manager() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}

impl Settings {
    /// Load settings from `path` (if present) and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::from_file(path)?;
        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a file only, defaulting when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| KapError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(id) = lookup(CLIENT_ID_ENV).filter(|v| !v.is_empty()) {
            self.client_id = id;
        }
    }

    /// Package reference for `kap install <name>` without an explicit command name.
    pub fn default_package_for(&self, command: &str) -> String {
        format!("{}{}", self.package_prefix, command.to_lowercase())
    }
}
