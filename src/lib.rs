//! # eventcast - real-time forecasting of a discrete control signal
//!
//! eventcast turns a live control signal (a steering direction) into a
//! stream of event codes, feeds each code to an online sequence model and
//! lines every multi-step forecast up with the actual value it predicted.
//!
//! ## Core Concepts
//!
//! - **Event**: one discrete observation per tick
//! - **PredictiveModel**: an online learner producing horizon-keyed predictions
//! - **ForecastShifter**: parks a forecast until the tick it describes arrives
//! - **HistoryWindow**: the last W aligned `(actual, predicted)` pairs
//! - **PredictionLoop**: runs source → model → shifter → history → sink
//!
//! ## Usage
//!
//! ```rust
//! use eventcast::{
//!     Event, LoopConfig, MarkovModel, ModelOptions, NullSink, PredictionLoop,
//!     PredictiveModel, ScriptedSource,
//! };
//!
//! let mut model = MarkovModel::default();
//! model.configure(ModelOptions::single("event", 1))?;
//!
//! let mut pipeline = PredictionLoop::new(model, LoopConfig::default())?;
//! let mut source = ScriptedSource::new([1, 2, 1, 2, 1, 2].map(Event::new));
//! let summary = pipeline.run(&mut source, &mut NullSink)?;
//!
//! assert_eq!(summary.ticks, 6);
//! # Ok::<(), eventcast::EventcastError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod event;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod shifter;
pub mod sink;
pub mod source;

// Re-export primary types at crate root for convenience
pub use config::AppConfig;
pub use error::{ConfigError, EventcastError, EventcastResult, LoopError, ModelError, SourceError};
pub use event::{Direction, Event, EventCodec, RunId, Tick};
pub use history::{HistorySnapshot, HistoryWindow, RingBuffer};
pub use model::{MarkovModel, MarkovParams, ModelOptions, PredictiveModel, RawPrediction};
pub use pipeline::{LoopConfig, LoopState, PredictionLoop, RunSummary, TickOutcome};
pub use shifter::{ForecastShifter, Resolution};
pub use sink::{NullSink, TracingSink, VisualizationSink};
pub use source::{
	steering_channel, EventSource, Playfield, ScriptedSource, SourceSignal, SteeringConfig,
	SteeringInput, SteeringSource,
};
