//! Online predictive model contract.
//!
//! The pipeline treats the learner as an opaque capability: one event in,
//! a set of horizon-keyed predictions out. `MarkovModel` is the reference
//! implementation shipped with the crate.

mod markov;
mod options;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::event::Event;

pub use markov::{MarkovModel, MarkovParams, MAX_ORDER};
pub use options::ModelOptions;

/// Predictions for the current tick's future, keyed by horizon.
///
/// A `None` value means the model does not have enough data yet to predict
/// that horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrediction {
    by_horizon: BTreeMap<u32, Option<Event>>,
}

impl RawPrediction {
    /// An empty prediction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, horizon: u32, value: Option<Event>) -> Self {
        self.insert(horizon, value);
        self
    }

    /// Sets the prediction for `horizon`, replacing any earlier one.
    pub fn insert(&mut self, horizon: u32, value: Option<Event>) {
        self.by_horizon.insert(horizon, value);
    }

    /// The prediction for `horizon`, if the model made one.
    #[must_use]
    pub fn get(&self, horizon: u32) -> Option<Event> {
        self.by_horizon.get(&horizon).copied().flatten()
    }

    /// All `(horizon, prediction)` pairs in ascending horizon order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<Event>)> + '_ {
        self.by_horizon.iter().map(|(h, v)| (*h, *v))
    }

    /// Number of horizons covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_horizon.len()
    }

    /// True when no horizon is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_horizon.is_empty()
    }
}

impl FromIterator<(u32, Option<Event>)> for RawPrediction {
    fn from_iter<I: IntoIterator<Item = (u32, Option<Event>)>>(iter: I) -> Self {
        Self {
            by_horizon: iter.into_iter().collect(),
        }
    }
}

/// An online sequence learner.
///
/// Implementations must be configured exactly once before the first `run`.
/// Each `run` consumes one event and mutates the model; there is no reset.
pub trait PredictiveModel {
    /// One-time setup.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidOptions` when `options` fail validation and
    /// `ModelError::AlreadyConfigured` on a second call.
    fn configure(&mut self, options: ModelOptions) -> Result<(), ModelError>;

    /// Consume one event and return predictions for every configured horizon.
    ///
    /// # Errors
    ///
    /// `ModelError::Unconfigured` before `configure`, and
    /// `ModelError::MalformedEvent` for events outside the model's domain.
    fn run(&mut self, event: Event) -> Result<RawPrediction, ModelError>;

    /// The active configuration, once configured.
    fn options(&self) -> Option<&ModelOptions>;
}

impl<M: PredictiveModel + ?Sized> PredictiveModel for Box<M> {
    fn configure(&mut self, options: ModelOptions) -> Result<(), ModelError> {
        (**self).configure(options)
    }

    fn run(&mut self, event: Event) -> Result<RawPrediction, ModelError> {
        (**self).run(event)
    }

    fn options(&self) -> Option<&ModelOptions> {
        (**self).options()
    }
}
