//! Engine Configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides:
//!
//! ```json
//! { "round_wait_seconds": 3, "growth": { "rate": 0.5 }, "rng_seed": 7 }
//! ```

use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::game::growth::{GrowthParams, MIN_GROWTH_EXPONENT, MIN_GROWTH_RATE};
use crate::game::history::HISTORY_CAPACITY;
use crate::game::round::{CrashParams, MAX_CRASH_VALUE};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema.
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Player balance at startup.
    pub starting_balance: f64,
    /// Countdown length between rounds (seconds).
    pub round_wait_seconds: u32,
    /// How long a crashed round stays on display (milliseconds).
    pub settle_delay_ms: u64,
    /// Growth tick period while running (milliseconds, ~one display frame).
    pub frame_interval_ms: u64,
    /// Initial growth tunables.
    pub growth: GrowthParams,
    /// Crash-value distribution.
    pub crash: CrashParams,
    /// Rounds kept in the history.
    pub history_capacity: usize,
    /// Simulated opponents per round.
    pub simulated_bettors: usize,
    /// Fixed RNG seed; seeded from the clock when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance: 3000.0,
            round_wait_seconds: 6,
            settle_delay_ms: 5000,
            frame_interval_ms: 16, // ~60 Hz
            growth: GrowthParams::default(),
            crash: CrashParams::default(),
            history_capacity: HISTORY_CAPACITY,
            simulated_bettors: 30,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a JSON config string.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_balance.is_finite() || self.starting_balance < 0.0 {
            return Err(ConfigError::Invalid("starting_balance must be a non-negative number".into()));
        }
        if self.round_wait_seconds == 0 {
            return Err(ConfigError::Invalid("round_wait_seconds must be at least 1".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be at least 1".into()));
        }
        if !self.growth.rate.is_finite() || self.growth.rate < MIN_GROWTH_RATE {
            return Err(ConfigError::Invalid(format!("growth.rate must be >= {}", MIN_GROWTH_RATE)));
        }
        if !self.growth.exponent.is_finite() || self.growth.exponent < MIN_GROWTH_EXPONENT {
            return Err(ConfigError::Invalid(format!(
                "growth.exponent must be >= {}",
                MIN_GROWTH_EXPONENT
            )));
        }
        let crash = &self.crash;
        if !crash.exponent.is_finite() || !crash.offset.is_finite() || !crash.max_value.is_finite() {
            return Err(ConfigError::Invalid("crash parameters must be finite".into()));
        }
        if !(1.0..=MAX_CRASH_VALUE).contains(&crash.max_value) {
            return Err(ConfigError::Invalid(format!(
                "crash.max_value must be between 1.0 and {}",
                MAX_CRASH_VALUE
            )));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Settle display delay.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Growth tick period.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}
