//! Configuration file discovery and TOML loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LOOPFADE_CONFIG` by default)
//! 3. User config file (`~/.config/<app>/config.toml`)
//! 4. System config file (`/etc/<app>/config.toml`, Unix only)
//!
//! A missing config file is not an error at this level: callers fall back to
//! built-in defaults and log a warning.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LOOPFADE_CONFIG";

/// Where a resolved config file path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfig,
    SystemConfig,
}

/// A config file path together with the rule that selected it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfigFile {
    pub path: PathBuf,
    pub source: ConfigSource,
}

/// Locates the TOML config file for one application
#[derive(Debug, Clone)]
pub struct ConfigFileResolver {
    app_name: String,
    env_var: String,
}

impl ConfigFileResolver {
    /// Create a resolver using [`CONFIG_ENV_VAR`] as the environment override
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            env_var: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Use a different environment variable for the explicit override
    pub fn with_env_var(mut self, env_var: &str) -> Self {
        self.env_var = env_var.to_string();
        self
    }

    /// Resolve the config file path.
    ///
    /// Explicit paths (CLI or environment) are returned even when the file does
    /// not exist, so that loading reports the bad path instead of silently
    /// falling back to defaults. Implicit locations are only returned if present.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<ResolvedConfigFile> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(ResolvedConfigFile {
                path: path.to_path_buf(),
                source: ConfigSource::CommandLine,
            });
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.is_empty() {
                return Some(ResolvedConfigFile {
                    path: PathBuf::from(path),
                    source: ConfigSource::Environment,
                });
            }
        }

        // Priority 3: per-user config directory
        if let Some(path) = self.user_config_path() {
            if path.exists() {
                return Some(ResolvedConfigFile {
                    path,
                    source: ConfigSource::UserConfig,
                });
            }
        }

        // Priority 4: system-wide config
        if let Some(path) = self.system_config_path() {
            if path.exists() {
                return Some(ResolvedConfigFile {
                    path,
                    source: ConfigSource::SystemConfig,
                });
            }
        }

        debug!("No config file found for {}", self.app_name);
        None
    }

    /// `~/.config/<app>/config.toml` (or the platform equivalent)
    pub fn user_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(&self.app_name).join("config.toml"))
    }

    fn system_config_path(&self) -> Option<PathBuf> {
        if cfg!(unix) {
            Some(PathBuf::from("/etc").join(&self.app_name).join("config.toml"))
        } else {
            None
        }
    }
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))
}
