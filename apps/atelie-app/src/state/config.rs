//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ATELIE_ACCOUNT_ID=conta-123                                        │
//! │     ATELIE_DB_PATH=/srv/atelie/atelie.db                               │
//! │     ATELIE_STORE_NAME="Ateliê da Ana"                                  │
//! │     ATELIE_PAGE_SIZE=50                                                │
//! │     ATELIE_POOL_SIZE=4                                                 │
//! │     ATELIE_CONNECT_TIMEOUT_SECS=10                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     path given as the first CLI argument, otherwise                    │
//! │     ~/.config/atelie/atelie.toml (Linux)                               │
//! │     ~/Library/Application Support/com.atelie.app/atelie.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! account_id = "conta-123"
//! store_name = "Ateliê da Ana"
//! database_path = "/srv/atelie/atelie.db"
//! page_size = 20
//! currency_symbol = "R$"
//! pool_size = 5
//! connect_timeout_secs = 30
//! ```
//!
//! Read-only after startup, so no lock.

use std::path::{Path, PathBuf};
use std::time::Duration;

use atelie_core::money::to_currency_display;
use atelie_core::{AccountId, Money, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use atelie_db::DbConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StartupError;

const CONFIG_FILE: &str = "atelie.toml";
const DATABASE_FILE: &str = "atelie.db";
const MAX_POOL_SIZE: u32 = 32;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Acting account. The host refuses to start without one.
    pub account_id: Option<String>,

    /// Store name shown by the front-end.
    pub store_name: String,

    /// Database file. Default: `atelie.db` in the platform data dir.
    pub database_path: Option<PathBuf>,

    /// Default list page size (1..=100).
    pub page_size: i64,

    /// Currency symbol for display strings.
    pub currency_symbol: String,

    /// Pooled database connections (1..=32).
    pub pool_size: u32,

    /// Seconds a command waits for a free connection.
    pub connect_timeout_secs: u64,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            account_id: None,
            store_name: "Ateliê".to_string(),
            database_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            currency_symbol: "R$".to_string(),
            pool_size: 5,
            connect_timeout_secs: 30,
        }
    }
}

impl ConfigState {
    /// Loads the file (if any), then environment overrides, then validates.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, StartupError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(StartupError::InvalidConfig(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if !(1..=MAX_POOL_SIZE).contains(&self.pool_size) {
            return Err(StartupError::InvalidConfig(format!(
                "pool_size must be between 1 and {}, got {}",
                MAX_POOL_SIZE, self.pool_size
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(StartupError::InvalidConfig(
                "connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies `ATELIE_*` overrides from `lookup` (the process
    /// environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("ATELIE_ACCOUNT_ID") {
            debug!(account_id = %id, "Overriding account from environment");
            self.account_id = Some(id);
        }

        if let Some(path) = lookup("ATELIE_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("ATELIE_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(size) = lookup("ATELIE_PAGE_SIZE") {
            match size.parse::<i64>() {
                Ok(n) => self.page_size = n,
                Err(_) => warn!(value = %size, "Ignoring non-numeric ATELIE_PAGE_SIZE"),
            }
        }

        if let Some(size) = lookup("ATELIE_POOL_SIZE") {
            match size.parse::<u32>() {
                Ok(n) => self.pool_size = n,
                Err(_) => warn!(value = %size, "Ignoring non-numeric ATELIE_POOL_SIZE"),
            }
        }

        if let Some(secs) = lookup("ATELIE_CONNECT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(n) => self.connect_timeout_secs = n,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric ATELIE_CONNECT_TIMEOUT_SECS"),
            }
        }
    }

    /// The configured account, validated.
    pub fn account(&self) -> Result<AccountId, StartupError> {
        self.account_id
            .as_deref()
            .and_then(|id| AccountId::new(id).ok())
            .ok_or(StartupError::MissingAccount)
    }

    /// Database file path, creating the platform data dir if needed.
    pub fn resolve_database_path(&self) -> Result<PathBuf, StartupError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(StartupError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(DATABASE_FILE))
    }

    /// Pool settings for the database at `path`.
    pub fn db_config(&self, path: PathBuf) -> DbConfig {
        DbConfig::new(path)
            .max_connections(self.pool_size)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Formats an amount with the configured symbol.
    pub fn format_money(&self, amount: Option<Money>) -> String {
        let display = to_currency_display(amount);
        match display.strip_prefix("R$") {
            Some(rest) if self.currency_symbol != "R$" => format!("{}{}", self.currency_symbol, rest),
            _ => display,
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "atelie", "app")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
