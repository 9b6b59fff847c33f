//! Application configuration.
//!
//! Loaded from TOML, then environment overrides, then CLI overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use triarb_core::ReplayMode;
use triarb_detector::{DecisionConfig, SpreadConfig};
use triarb_executor::ExecutionConfig;
use triarb_feed::FeedConfig;
use triarb_persistence::PersistenceConfig;
use triarb_risk::{AccountConfig, RiskMonitorConfig};

use crate::error::{AppError, AppResult};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
/// Env var naming the config file.
pub const CONFIG_ENV: &str = "TRIARB_CONFIG";
/// Env var overriding `feed.data_file`.
pub const DATA_FILE_ENV: &str = "TRIARB_DATA_FILE";
/// Env var overriding `persistence.output_dir`.
pub const OUTPUT_DIR_ENV: &str = "TRIARB_OUTPUT_DIR";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub spread: SpreadConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub risk: RiskMonitorConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Command-line overrides. `None` leaves the loaded value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub replay_mode: Option<ReplayMode>,
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Resolve and load configuration.
    ///
    /// Path: `explicit` > `TRIARB_CONFIG` > `config/default.toml`. An explicit
    /// or env-named file must exist; a missing default file falls back to
    /// built-in defaults.
    pub fn load(explicit: Option<&str>) -> AppResult<Self> {
        let named = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV).ok());

        let mut config = match named {
            Some(path) => {
                tracing::info!(config_path = %path, "Loading configuration");
                Self::from_file(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                tracing::info!(config_path = DEFAULT_CONFIG_PATH, "Loading configuration");
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                tracing::warn!(
                    path = DEFAULT_CONFIG_PATH,
                    "Config file not found, using defaults"
                );
                Self::default()
            }
        };

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DATA_FILE_ENV).filter(|v| !v.is_empty()) {
            self.feed.data_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(OUTPUT_DIR_ENV).filter(|v| !v.is_empty()) {
            self.persistence.output_dir = PathBuf::from(path);
        }
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.data_file {
            self.feed.data_file = path.clone();
        }
        if let Some(path) = &overrides.output_dir {
            self.persistence.output_dir = path.clone();
        }
        if let Some(mode) = overrides.replay_mode {
            self.feed.replay_mode = mode;
        }
        if let Some(seed) = overrides.seed {
            self.execution.seed = Some(seed);
        }
    }

    /// Validate every section. Fails before any stage is started.
    pub fn validate(&self) -> AppResult<()> {
        let checks: [(&str, Result<(), String>); 6] = [
            ("feed", self.feed.validate()),
            ("spread", self.spread.validate()),
            ("execution", self.execution.validate()),
            ("account", self.account.validate()),
            ("risk", self.risk.validate()),
            ("persistence", self.persistence.validate()),
        ];
        for (section, result) in checks {
            result.map_err(|e| AppError::Config(format!("[{section}] {e}")))?;
        }
        Ok(())
    }
}
