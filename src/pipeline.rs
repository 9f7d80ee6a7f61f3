//! The prediction loop.
//!
//! One tick pulls an event, runs the model, parks the new forecasts in the
//! shifter, resolves the forecasts that target this tick and records the
//! aligned pair. The loop exclusively owns the model, the shifter and the
//! history; nothing here is shared or locked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EventcastResult, LoopError};
use crate::event::{Event, RunId, Tick};
use crate::history::{HistoryWindow, DEFAULT_WINDOW};
use crate::model::{PredictiveModel, RawPrediction};
use crate::shifter::{ForecastShifter, Resolution};
use crate::sink::VisualizationSink;
use crate::source::{EventSource, SourceSignal};

/// Lifecycle of a `PredictionLoop`.
///
/// `Idle -> Running -> Terminated`. Termination is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopState {
    /// Built, not yet started.
    Idle,
    /// Accepting ticks.
    Running,
    /// Stopped for good.
    Terminated,
}

/// Loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Capacity of each history series.
    pub window: usize,
    /// Horizon whose forecasts are recorded. `None` records the nearest.
    pub display_horizon: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            display_horizon: None,
        }
    }
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Tick this outcome belongs to.
    pub tick: Tick,
    /// Event observed at `tick`.
    pub event: Event,
    /// What the model predicted this tick for future ticks.
    pub prediction: RawPrediction,
    /// Forecasts made earlier that target this tick.
    pub resolution: Option<Resolution>,
    /// The `(actual, predicted)` pair pushed into the history, if any.
    pub recorded: Option<(f64, f64)>,
}

/// Totals reported when a run ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Loop instance the run belongs to.
    pub run_id: RunId,
    /// Ticks completed.
    pub ticks: u64,
    /// Ticks that recorded an aligned pair.
    pub resolved: u64,
    /// When the loop entered `Running`.
    pub started_at: DateTime<Utc>,
    /// When the summary was taken.
    pub finished_at: DateTime<Utc>,
}

/// Drives the model, shifter and history one tick at a time.
///
/// The model must be configured by the caller; running an unconfigured
/// model terminates the loop with `ModelError::Unconfigured`.
#[derive(Debug)]
pub struct PredictionLoop<M> {
    run_id: RunId,
    config: LoopConfig,
    model: M,
    shifter: ForecastShifter,
    history: HistoryWindow,
    state: LoopState,
    tick: Tick,
    resolved: u64,
    started_at: Option<DateTime<Utc>>,
}

impl<M: PredictiveModel> PredictionLoop<M> {
    /// Creates an idle loop at tick 0.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` if the window is zero, the display horizon
    /// is zero, or the model is configured without the display horizon.
    pub fn new(model: M, config: LoopConfig) -> Result<Self, ConfigError> {
        if let Some(horizon) = config.display_horizon {
            if horizon == 0 {
                return Err(ConfigError::Invalid {
                    reason: "display_horizon must be positive".to_string(),
                });
            }
            if let Some(options) = model.options() {
                if !options.horizons.contains(&horizon) {
                    return Err(ConfigError::Invalid {
                        reason: format!(
                            "display_horizon {horizon} is not one of the model horizons {:?}",
                            options.horizons
                        ),
                    });
                }
            }
        }
        let history = HistoryWindow::new(config.window)?;
        Ok(Self {
            run_id: RunId::new(),
            config,
            model,
            shifter: ForecastShifter::new(),
            history,
            state: LoopState::Idle,
            tick: Tick::ZERO,
            resolved: 0,
            started_at: None,
        })
    }

    /// Identifier recorded in this loop's tracing span.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The settings the loop was built with.
    #[must_use]
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// The tick the next `step` will run at.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// The aligned actual/predicted window.
    #[must_use]
    pub const fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Forecasts still waiting for their target tick.
    #[must_use]
    pub const fn shifter(&self) -> &ForecastShifter {
        &self.shifter
    }

    /// The model being fed.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Consumes the loop and hands back the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Moves an idle loop to `Running`. Starting a running loop is a no-op.
    ///
    /// # Errors
    ///
    /// `LoopError::Terminated` once the loop has terminated.
    pub fn start(&mut self) -> Result<(), LoopError> {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                self.started_at = Some(Utc::now());
                tracing::info!(
                    run_id = %self.run_id,
                    window = self.config.window,
                    "prediction loop started"
                );
                Ok(())
            }
            LoopState::Running => Ok(()),
            LoopState::Terminated => Err(LoopError::Terminated),
        }
    }

    /// Terminates the loop. Pending forecasts are discarded with it.
    pub fn stop(&mut self) {
        if self.state != LoopState::Terminated {
            tracing::info!(
                run_id = %self.run_id,
                ticks = self.tick.index(),
                pending = self.shifter.pending_len(),
                "prediction loop terminated"
            );
        }
        self.state = LoopState::Terminated;
    }

    /// Runs one tick for `event`.
    ///
    /// # Errors
    ///
    /// `LoopError::NotRunning` outside the `Running` state. A model error
    /// terminates the loop and is returned unchanged.
    pub fn step(&mut self, event: Event) -> EventcastResult<TickOutcome> {
        if self.state != LoopState::Running {
            return Err(LoopError::NotRunning { state: self.state }.into());
        }

        let tick = self.tick;
        let prediction = match self.model.run(event) {
            Ok(prediction) => prediction,
            Err(err) => {
                tracing::error!(%tick, %event, error = %err, "model rejected event");
                self.stop();
                return Err(err.into());
            }
        };

        self.shifter.accept(tick, &prediction);
        let resolution = self.shifter.resolve(tick);

        let recorded = resolution
            .as_ref()
            .and_then(|r| self.displayed(r))
            .map(|forecast| {
                let pair = (event.as_f64(), forecast.as_f64());
                self.history.record(pair.0, pair.1);
                self.resolved += 1;
                pair
            });

        tracing::debug!(%tick, %event, ?prediction, ?recorded, "tick");
        self.tick = tick.next();

        Ok(TickOutcome {
            tick,
            event,
            prediction,
            resolution,
            recorded,
        })
    }

    /// Pulls events from `source` until it asks to quit, handing the
    /// history to `sink` after every tick.
    ///
    /// # Errors
    ///
    /// Source and model errors terminate the loop and are propagated.
    /// `LoopError::Terminated` if the loop already terminated.
    pub fn run<S, V>(&mut self, source: &mut S, sink: &mut V) -> EventcastResult<RunSummary>
    where
        S: EventSource + ?Sized,
        V: VisualizationSink + ?Sized,
    {
        self.start()?;
        let span = tracing::info_span!("prediction_loop", run_id = %self.run_id);
        let _guard = span.enter();

        loop {
            let signal = match source.next_signal() {
                Ok(signal) => signal,
                Err(err) => {
                    tracing::error!(error = %err, "event source failed");
                    self.stop();
                    return Err(err.into());
                }
            };

            match signal {
                SourceSignal::Quit => {
                    self.stop();
                    break;
                }
                SourceSignal::Event(event) => {
                    let outcome = self.step(event)?;
                    sink.render(&self.history.snapshot(outcome.tick, outcome.recorded.is_some()));
                }
            }
        }

        let summary = self.summary();
        tracing::info!(ticks = summary.ticks, resolved = summary.resolved, "run finished");
        Ok(summary)
    }

    /// Totals so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let finished_at = Utc::now();
        RunSummary {
            run_id: self.run_id,
            ticks: self.tick.index(),
            resolved: self.resolved,
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        }
    }

    fn displayed(&self, resolution: &Resolution) -> Option<Event> {
        match self.config.display_horizon {
            Some(horizon) => resolution.get(horizon),
            None => resolution.nearest(),
        }
    }
}
