//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::Backend;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory under the platform config dir holding our config file.
const CONFIG_DIR_NAME: &str = "rollcall";

/// Default table file for the CSV backend, relative to the working directory.
const CSV_FILE_NAME: &str = "attendance.csv";

/// Default database file for the `SQLite` backend.
const DATABASE_FILE_NAME: &str = "attendance.db";

/// Default public-address echo service.
pub const DEFAULT_LOOKUP_URL: &str = "https://api.ipify.org";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "ROLLCALL_";

/// Env key (after the prefix) for the instructor secret.
const SECRET_ENV_KEY: &str = "GATE__TEACHER_SECRET";

/// Shown in place of the instructor secret.
const REDACTED: &str = "<redacted>";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, `__` between sections)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Access gate configuration.
    pub gate: GateConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend holds the table.
    pub backend: Backend,
    /// Path to the table file.
    /// Defaults to `attendance.csv` or `attendance.db` in the working directory.
    pub data_file_path: Option<PathBuf>,
}

/// Access-gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// The one address students may check in from.
    /// When unset, check-ins are not location-gated.
    pub allowed_origin_address: Option<IpAddr>,
    /// Service that echoes the caller's public address as plain text.
    pub origin_lookup_url: String,
    /// Upper bound on the origin lookup, in milliseconds.
    pub lookup_timeout_ms: u64,
    /// Shared instructor secret. When unset, the instructor view is locked.
    pub teacher_secret: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            allowed_origin_address: None,
            origin_lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            lookup_timeout_ms: 3000,
            teacher_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLCALL_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let config: Config = Self::layered(&config_file, ENV_PREFIX).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the TOML file, then `<prefix>`-ed environment variables.
    ///
    /// Env values are type-guessed by figment, so the secret is read verbatim
    /// instead: `123456` or `0042` must stay strings.
    fn layered(config_file: &Path, env_prefix: &str) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(
                Env::prefixed(env_prefix)
                    .ignore(&[SECRET_ENV_KEY])
                    .split("__"),
            );

        if let Ok(secret) = std::env::var(format!("{env_prefix}{SECRET_ENV_KEY}")) {
            figment = figment.merge(Serialized::default("gate.teacher_secret", secret));
        }
        figment
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.gate.lookup_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "lookup_timeout_ms must be greater than 0".to_string(),
            });
        }

        let url = &self.gate.origin_lookup_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("origin_lookup_url must be an http(s) URL: {url}"),
            });
        }

        if self
            .gate
            .teacher_secret
            .as_deref()
            .is_some_and(|secret| secret.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "teacher_secret must not be empty when set".to_string(),
            });
        }

        Ok(())
    }

    /// Get the table path, resolving the backend's default if not set.
    #[must_use]
    pub fn data_file_path(&self) -> PathBuf {
        self.storage.data_file_path.clone().unwrap_or_else(|| {
            PathBuf::from(match self.storage.backend {
                Backend::Csv => CSV_FILE_NAME,
                Backend::Sqlite => DATABASE_FILE_NAME,
            })
        })
    }

    /// Get the origin lookup bound as a Duration.
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.gate.lookup_timeout_ms)
    }

    /// A copy safe to print, with the instructor secret masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.gate.teacher_secret.is_some() {
            shown.gate.teacher_secret = Some(REDACTED.to_string());
        }
        shown
    }
}
