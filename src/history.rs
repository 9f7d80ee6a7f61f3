//! Bounded display history.
//!
//! `HistoryWindow` keeps the last W actual and predicted values, index
//! aligned, for whatever draws them. Both buffers start full of the
//! sentinel `0.0` so their length never changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::Tick;

/// Window capacity used when nothing else is configured.
pub const DEFAULT_WINDOW: usize = 60;

/// Value the buffers are pre-filled with.
pub const SENTINEL: f64 = 0.0;

/// Fixed-capacity ring buffer that is always full.
///
/// Pushing overwrites the oldest slot and returns what was there.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Box<[T]>,
    /// Index of the oldest element.
    head: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Creates a buffer of `capacity` copies of `fill`.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` when `capacity` is zero.
    pub fn filled(capacity: usize, fill: T) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "ring buffer capacity must be positive".to_string(),
            });
        }
        Ok(Self::full(capacity, fill))
    }

    /// Caller guarantees `capacity > 0`.
    fn full(capacity: usize, fill: T) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: vec![fill; capacity].into_boxed_slice(),
            head: 0,
        }
    }

    /// Inserts `value` as the newest element and evicts the oldest.
    pub fn push(&mut self, value: T) -> T {
        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.slots.len();
        evicted
    }

    /// Elements from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Owned copy, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// The most recently pushed element.
    #[must_use]
    pub fn newest(&self) -> &T {
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        &self.slots[idx]
    }

    /// Always equal to the capacity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: capacity is at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fixed slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Owned copy of both history buffers at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Tick the snapshot was taken at.
    pub tick: Tick,
    /// Wall-clock time the snapshot was taken at.
    pub taken_at: DateTime<Utc>,
    /// Whether a forecast resolved on this tick.
    pub resolved: bool,
    /// Actual series, oldest first.
    pub actual: Vec<f64>,
    /// Shifted predictions aligned with `actual`.
    pub predicted: Vec<f64>,
}

impl HistorySnapshot {
    /// The newest aligned `(actual, predicted)` pair.
    #[must_use]
    pub fn latest(&self) -> Option<(f64, f64)> {
        Some((*self.actual.last()?, *self.predicted.last()?))
    }
}

/// Actual and predicted series of equal, fixed length.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    actual: RingBuffer<f64>,
    predicted: RingBuffer<f64>,
}

impl HistoryWindow {
    /// Creates a window of `capacity` sentinel values per series.
    ///
    /// # Errors
    ///
    /// `ConfigError::Invalid` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            actual: RingBuffer::filled(capacity, SENTINEL)?,
            predicted: RingBuffer::filled(capacity, SENTINEL)?,
        })
    }

    /// Appends to the actual series, evicting its oldest value.
    pub fn push_actual(&mut self, value: f64) {
        self.actual.push(value);
    }

    /// Appends to the predicted series, evicting its oldest value.
    pub fn push_predicted(&mut self, value: f64) {
        self.predicted.push(value);
    }

    /// Pushes one aligned pair.
    pub fn record(&mut self, actual: f64, predicted: f64) {
        self.push_actual(actual);
        self.push_predicted(predicted);
    }

    /// Actual series, oldest first.
    #[must_use]
    pub fn actual(&self) -> Vec<f64> {
        self.actual.to_vec()
    }

    /// Predicted series, aligned with `actual`.
    #[must_use]
    pub fn predicted(&self) -> Vec<f64> {
        self.predicted.to_vec()
    }

    /// Length of each series.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.actual.capacity()
    }

    /// Copies both series, stamped with `tick` and the current time.
    #[must_use]
    pub fn snapshot(&self, tick: Tick, resolved: bool) -> HistorySnapshot {
        HistorySnapshot {
            tick,
            taken_at: Utc::now(),
            resolved,
            actual: self.actual(),
            predicted: self.predicted(),
        }
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            actual: RingBuffer::full(DEFAULT_WINDOW, SENTINEL),
            predicted: RingBuffer::full(DEFAULT_WINDOW, SENTINEL),
        }
    }
}
