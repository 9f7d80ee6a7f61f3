//! Reference online learner: a multi-step Markov classifier.
//!
//! For every configured horizon `h` the model counts which event followed a
//! context `h` ticks later, and predicts the most frequent successor of the
//! current context. Learning is incremental and never forgets.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::event::Event;

use super::{ModelOptions, PredictiveModel, RawPrediction};

/// Learner parameters, kept apart from the generic `ModelOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovParams {
    /// Number of trailing events forming a context. Must be at least 1.
    pub order: usize,

    /// Accepted event codes. `None` accepts every code.
    pub alphabet: Option<BTreeSet<u32>>,
}

impl Default for MarkovParams {
    fn default() -> Self {
        Self {
            order: 1,
            alphabet: None,
        }
    }
}

/// Longest context the learner accepts.
pub const MAX_ORDER: usize = 64;

type Context = Box<[Event]>;

/// Online multi-step Markov classifier.
#[derive(Debug, Default)]
pub struct MarkovModel {
    params: MarkovParams,
    options: Option<ModelOptions>,
    recent: VecDeque<Event>,
    recent_capacity: usize,
    successors: HashMap<(Context, u32), BTreeMap<Event, u64>>,
    observed: u64,
}

impl MarkovModel {
    /// An unconfigured model.
    #[must_use]
    pub fn new(params: MarkovParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Parameters the model was built with.
    #[must_use]
    pub const fn params(&self) -> &MarkovParams {
        &self.params
    }

    /// Events consumed so far.
    #[must_use]
    pub const fn observed(&self) -> u64 {
        self.observed
    }

    /// Number of distinct `(context, horizon)` pairs learned.
    #[must_use]
    pub fn learned_contexts(&self) -> usize {
        self.successors.len()
    }

    fn check_domain(&self, event: Event) -> Result<(), ModelError> {
        match &self.params.alphabet {
            Some(alphabet) if !alphabet.contains(&event.code()) => Err(ModelError::MalformedEvent {
                event: event.code(),
                reason: format!("expected one of {alphabet:?}"),
            }),
            _ => Ok(()),
        }
    }

    /// Credits `event` as the outcome `h` ticks after each available context.
    fn learn(&mut self, horizons: &BTreeSet<u32>, event: Event) {
        let order = self.params.order;
        let len = self.recent.len();
        for &h in horizons {
            let h = h as usize;
            // The context ends at tick t-h, i.e. index len-h of `recent`.
            if len + 1 < h.saturating_add(order) {
                continue;
            }
            let end = len + 1 - h;
            let context: Context = self.recent.range(end - order..end).copied().collect();
            *self
                .successors
                .entry((context, h as u32))
                .or_default()
                .entry(event)
                .or_insert(0) += 1;
        }
    }

    fn predict(&self, horizons: &BTreeSet<u32>) -> RawPrediction {
        let order = self.params.order;
        if self.recent.len() < order {
            return horizons.iter().map(|h| (*h, None)).collect();
        }
        let start = self.recent.len() - order;
        let context: Context = self.recent.range(start..).copied().collect();

        horizons
            .iter()
            .map(|&h| {
                // BTreeMap order makes ties go to the smallest code.
                let best = self.successors.get(&(context.clone(), h)).and_then(|counts| {
                    counts
                        .iter()
                        .fold(None::<(Event, u64)>, |best, (event, count)| match best {
                            Some((_, c)) if c >= *count => best,
                            _ => Some((*event, *count)),
                        })
                        .map(|(event, _)| event)
                });
                if best.is_none() {
                    tracing::trace!(horizon = h, "no successor observed for context yet");
                }
                (h, best)
            })
            .collect()
    }
}

impl PredictiveModel for MarkovModel {
    fn configure(&mut self, options: ModelOptions) -> Result<(), ModelError> {
        if self.options.is_some() {
            return Err(ModelError::AlreadyConfigured);
        }
        options.validate()?;
        if self.params.order == 0 || self.params.order > MAX_ORDER {
            return Err(ModelError::InvalidOptions {
                reason: format!("markov order must be between 1 and {MAX_ORDER}"),
            });
        }

        let max_horizon = options.max_horizon().unwrap_or(1) as usize;
        self.recent_capacity = max_horizon
            .checked_add(self.params.order)
            .ok_or_else(|| ModelError::InvalidOptions {
                reason: "horizon plus markov order overflows".to_string(),
            })?;
        // Grows with the events seen; `run` caps it at `recent_capacity`.
        self.recent = VecDeque::new();
        tracing::debug!(
            field = %options.predicted_field,
            horizons = ?options.horizons,
            order = self.params.order,
            "markov model configured"
        );
        self.options = Some(options);
        Ok(())
    }

    fn run(&mut self, event: Event) -> Result<RawPrediction, ModelError> {
        let horizons = match &self.options {
            Some(options) => options.horizons.clone(),
            None => return Err(ModelError::Unconfigured),
        };
        self.check_domain(event)?;

        self.learn(&horizons, event);

        if self.recent.len() == self.recent_capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
        self.observed += 1;

        Ok(self.predict(&horizons))
    }

    fn options(&self) -> Option<&ModelOptions> {
        self.options.as_ref()
    }
}
