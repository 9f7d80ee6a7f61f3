use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Horizon used when nothing else is configured.
pub const DEFAULT_HORIZON: u32 = 5;

/// Options passed to `PredictiveModel::configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Name of the value being forecast.
    pub predicted_field: String,

    /// Step counts ahead to predict. All must be positive.
    pub horizons: BTreeSet<u32>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self::single("event", DEFAULT_HORIZON)
    }
}

impl ModelOptions {
    /// Options predicting `field` at one horizon.
    #[must_use]
    pub fn single(field: impl Into<String>, horizon: u32) -> Self {
        Self {
            predicted_field: field.into(),
            horizons: BTreeSet::from([horizon]),
        }
    }

    /// Options predicting `field` at each of `horizons`.
    #[must_use]
    pub fn with_horizons(
        field: impl Into<String>,
        horizons: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            predicted_field: field.into(),
            horizons: horizons.into_iter().collect(),
        }
    }

    /// Checks the options before a model accepts them.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidOptions` if the field name is blank, no horizon is
    /// given, or a horizon is zero.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.predicted_field.trim().is_empty() {
            return Err(ModelError::InvalidOptions {
                reason: "predicted_field cannot be empty".to_string(),
            });
        }
        if self.horizons.is_empty() {
            return Err(ModelError::InvalidOptions {
                reason: "at least one horizon is required".to_string(),
            });
        }
        if self.horizons.contains(&0) {
            return Err(ModelError::InvalidOptions {
                reason: "horizons must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Largest configured horizon.
    #[must_use]
    pub fn max_horizon(&self) -> Option<u32> {
        self.horizons.last().copied()
    }

    /// Smallest configured horizon.
    #[must_use]
    pub fn min_horizon(&self) -> Option<u32> {
        self.horizons.first().copied()
    }
}
