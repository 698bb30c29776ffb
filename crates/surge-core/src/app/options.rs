//! SurgeOptions - 並列度の設定
//!
//! JSON（`maxSpawn` / `initialSpawn`）から読める。欠けているフィールドはデフォルト。

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Concurrency settings of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurgeOptions {
    /// Ceiling for the increment (batch size). Default 5.
    pub max_spawn: usize,

    /// Increment of the first batch. Default 1.
    pub initial_spawn: usize,
}

impl Default for SurgeOptions {
    fn default() -> Self {
        Self {
            max_spawn: 5,
            initial_spawn: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("maxSpawn must be at least 1")]
    ZeroMaxSpawn,

    #[error("initialSpawn must be at least 1")]
    ZeroInitialSpawn,

    #[error("initialSpawn ({initial}) exceeds maxSpawn ({max})")]
    InitialExceedsMax { initial: usize, max: usize },

    #[error("could not read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid options json: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurgeOptions {
    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        let options: SurgeOptions = serde_json::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check `1 <= initial_spawn <= max_spawn`.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_spawn == 0 {
            return Err(OptionsError::ZeroMaxSpawn);
        }
        if self.initial_spawn == 0 {
            return Err(OptionsError::ZeroInitialSpawn);
        }
        if self.initial_spawn > self.max_spawn {
            return Err(OptionsError::InitialExceedsMax {
                initial: self.initial_spawn,
                max: self.max_spawn,
            });
        }
        Ok(())
    }
}
