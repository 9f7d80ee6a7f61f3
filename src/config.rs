//! Application configuration.
//!
//! Every section has defaults matching the interactive demo: one forecast
//! horizon of 5 ticks, a 60-value display window, 30 ticks per second and a
//! four-direction alphabet.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::EventCodec;
use crate::model::{MarkovParams, ModelOptions, MAX_ORDER};
use crate::pipeline::LoopConfig;
use crate::source::SteeringConfig;

/// Top-level configuration, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Predicted field and forecast horizons.
    pub model: ModelOptions,
    /// Reference learner parameters.
    pub markov: MarkovParams,
    /// History window and displayed horizon.
    pub pipeline: LoopConfig,
    /// Tick pacing and playfield for interactive runs.
    pub steering: SteeringConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelOptions::default(),
            markov: MarkovParams {
                order: 1,
                alphabet: Some(EventCodec.alphabet().into_iter().collect::<BTreeSet<u32>>()),
            },
            pipeline: LoopConfig::default(),
            steering: SteeringConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses and validates a JSON document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` on malformed JSON, `ConfigError::Invalid` when
    /// validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::parse(json, Path::new("<inline>"))
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// `from_json_str`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json, path)
    }

    fn parse(json: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Cross-section checks.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        if self.markov.order == 0 || self.markov.order > MAX_ORDER {
            return Err(ConfigError::Invalid {
                reason: format!("markov.order must be between 1 and {MAX_ORDER}"),
            });
        }
        if self.pipeline.window == 0 {
            return Err(ConfigError::Invalid {
                reason: "pipeline.window must be positive".to_string(),
            });
        }
        if let Some(h) = self.pipeline.display_horizon {
            if !self.model.horizons.contains(&h) {
                return Err(ConfigError::Invalid {
                    reason: format!("pipeline.display_horizon {h} is not one of model.horizons"),
                });
            }
        }
        if let Some(field) = &self.steering.playfield {
            if !field.contains(field.start_x, field.start_y) {
                return Err(ConfigError::Invalid {
                    reason: "steering.playfield start is outside the field".to_string(),
                });
            }
        }
        Ok(())
    }
}
