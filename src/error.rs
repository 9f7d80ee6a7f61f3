//! Error types for eventcast.
//!
//! All errors are strongly typed using thiserror. Nothing in the pipeline
//! retries: an online model cannot replay a tick without corrupting the
//! order of its observations, so every error below is fatal to the loop
//! that raised it.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::LoopState;

/// Errors raised by a `PredictiveModel`.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model was run before it was configured")]
    Unconfigured,

    #[error("Model is already configured")]
    AlreadyConfigured,

    #[error("Malformed event {event}: {reason}")]
    MalformedEvent {
        event: u32,
        reason: String,
    },

    #[error("Invalid model options: {reason}")]
    InvalidOptions {
        reason: String,
    },
}

/// Errors raised while pulling events from an `EventSource`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read replay file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid replay input: {reason}")]
    Replay {
        reason: String,
    },
}

/// Errors raised by the prediction loop state machine.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Prediction loop is not running (state: {state:?})")]
    NotRunning {
        state: LoopState,
    },

    #[error("Prediction loop has terminated and cannot be restarted")]
    Terminated,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Invalid {
        reason: String,
    },
}

/// Top-level error type for eventcast.
#[derive(Debug, Error)]
pub enum EventcastError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Loop error: {0}")]
    Loop(#[from] LoopError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl EventcastError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a model error.
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Returns true if this is an event source error.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if this is a loop state error.
    #[must_use]
    pub const fn is_loop(&self) -> bool {
        matches!(self, Self::Loop(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the model was run before `configure`.
    #[must_use]
    pub const fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Model(ModelError::Unconfigured))
    }
}

/// Result type alias for eventcast operations.
pub type EventcastResult<T> = Result<T, EventcastError>;
