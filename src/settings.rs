//! Game settings
//!
//! Timing and sizing knobs for the game loop. Every field falls back to the
//! stock value in [`crate::consts`] when missing from the JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Delay between spawn ticks (ms)
    pub spawn_interval_ms: u64,
    /// Side of a bug's square sprite and hit box (px)
    pub bug_size: f32,

    // === Motion time per kind (ms) ===
    pub normal_duration_ms: u64,
    pub bonus_duration_ms: u64,
    pub poison_duration_ms: u64,

    /// Fixed RNG seed (None = pick one at startup)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spawn_interval_ms: SPAWN_INTERVAL_MS,
            bug_size: DEFAULT_BUG_SIZE,
            normal_duration_ms: NORMAL_DURATION_MS,
            bonus_duration_ms: BONUS_DURATION_MS,
            poison_duration_ms: POISON_DURATION_MS,
            seed: None,
        }
    }
}

impl Settings {
    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "spawn_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if !self.bug_size.is_finite() || self.bug_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "bug_size",
                reason: "must be a positive number",
            });
        }
        for (field, value) in [
            ("normal_duration_ms", self.normal_duration_ms),
            ("bonus_duration_ms", self.bonus_duration_ms),
            ("poison_duration_ms", self.poison_duration_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
