//! Configuration file support for the rehab tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/rehab/config.toml`.

use crate::{Error, Recurrence, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Schedule generation parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,

    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Extra or replacement recurrence rows, keyed by exercise id
    #[serde(default)]
    pub frequency_overrides: BTreeMap<String, Recurrence>,
}

/// Longest schedule horizon, about ten years
pub const MAX_HORIZON_DAYS: u32 = 3660;

/// Longest gap between two sessions of one day
pub const MAX_SLOT_MINUTES: u32 = 24 * 60;

impl ScheduleConfig {
    /// Check the bounds that keep slot times and horizon dates representable
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(Error::Config(format!(
                "schedule.horizon_days must be within 1..={}",
                MAX_HORIZON_DAYS
            )));
        }
        if self.day_start_hour > 23 {
            return Err(Error::Config("schedule.day_start_hour must be within 0..=23".into()));
        }
        if !(1..=MAX_SLOT_MINUTES).contains(&self.slot_minutes) {
            return Err(Error::Config(format!(
                "schedule.slot_minutes must be within 1..={}",
                MAX_SLOT_MINUTES
            )));
        }
        for (id, recurrence) in &self.frequency_overrides {
            if recurrence.times_per_day == 0 || recurrence.days_per_week > 7 {
                return Err(Error::Config(format!(
                    "frequency override for '{}' is out of range",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            day_start_hour: default_day_start_hour(),
            slot_minutes: default_slot_minutes(),
            frequency_overrides: BTreeMap::new(),
        }
    }
}

/// Credential hashing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("rehab")
}

fn default_horizon_days() -> u32 {
    84
}

fn default_day_start_hour() -> u32 {
    9
}

fn default_slot_minutes() -> u32 {
    30
}

fn default_bcrypt_cost() -> u32 {
    // Debug builds (tests, local runs) hash with the minimum cost
    if cfg!(debug_assertions) {
        4
    } else {
        bcrypt::DEFAULT_COST
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("rehab").join("config.toml")
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(Error::Config("auth.bcrypt_cost must be within 4..=31".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Path of the record store snapshot inside the data directory
    pub fn store_path(&self) -> PathBuf {
        self.data.data_dir.join("rehab.json")
    }
}
