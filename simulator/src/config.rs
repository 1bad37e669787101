use fruitwheel_execution::{Profile, RoundTiming};
use fruitwheel_types::wheel::{DEFAULT_NICKNAME, STARTING_COIN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest any single phase (or the retry pause) may be configured to last.
pub const MAX_PHASE_SECS: u64 = 24 * 60 * 60;

/// Game settings applied to every new connection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_coin: u64,
    pub nickname: String,
    pub avatar: String,
    pub timing: RoundTiming,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_coin: STARTING_COIN,
            nickname: DEFAULT_NICKNAME.to_string(),
            avatar: String::new(),
            timing: RoundTiming::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} must be at most {max}")]
    TooLong { field: &'static str, max: u64 },
}

impl GameConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.timing;
        if timing.bet_secs == 0 {
            return Err(ConfigError::Zero {
                field: "timing.bet_secs",
            });
        }
        for (field, secs) in [
            ("timing.bet_secs", timing.bet_secs),
            ("timing.spin_secs", timing.spin_secs),
            ("timing.finish_secs", timing.finish_secs),
            ("timing.idle_secs", timing.idle_secs),
        ] {
            if secs > MAX_PHASE_SECS {
                return Err(ConfigError::TooLong {
                    field,
                    max: MAX_PHASE_SECS,
                });
            }
        }
        if timing.retry_pause_ms > MAX_PHASE_SECS * 1_000 {
            return Err(ConfigError::TooLong {
                field: "timing.retry_pause_ms",
                max: MAX_PHASE_SECS * 1_000,
            });
        }
        Ok(())
    }

    pub fn profile(&self) -> Profile {
        Profile {
            starting_coin: self.starting_coin,
            nickname: self.nickname.clone(),
            avatar: self.avatar.clone(),
        }
    }
}
