//! Replay tool configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! owner = "0190c3a2-7d4e-7b1c-9a55-2f1e0c9d8b7a"
//! start_time_ms = 1700000000000
//! clock_step_ms = 1000
//! rejecting_recipients = ["0190c3a2-7d4e-7b1c-9a55-000000000bad"]
//! snapshot_path = "custody-snapshot.json"
//! ```
//!
//! Only `owner` is required.

use custody_types::ids::AccountId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

fn default_clock_step_ms() -> i64 {
    1_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Owner of the custody instance
    pub owner: AccountId,

    /// Clock value for the first call; wall clock when absent
    #[serde(default)]
    pub start_time_ms: Option<i64>,

    /// How far the clock advances after each call
    #[serde(default = "default_clock_step_ms")]
    pub clock_step_ms: i64,

    /// Recipients whose incoming transfers the in-memory host refuses
    #[serde(default)]
    pub rejecting_recipients: Vec<AccountId>,

    /// Where to write the final snapshot, if anywhere
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl ReplayConfig {
    /// Load and validate configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ReplayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_nil() {
            return Err(ConfigError::Invalid("owner must not be the null account".into()));
        }
        if self.clock_step_ms < 0 {
            return Err(ConfigError::Invalid(format!(
                "clock_step_ms must not be negative, got {}",
                self.clock_step_ms
            )));
        }
        Ok(())
    }
}
