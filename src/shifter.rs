//! Forecast alignment.
//!
//! A prediction for horizon `h` made at tick `t` only becomes comparable to
//! an actual value at tick `t + h`. The shifter parks each prediction under
//! its target tick and hands it back when that tick arrives.

use std::collections::BTreeMap;

use crate::event::{Event, Tick};
use crate::model::RawPrediction;

/// Forecasts that target one tick, keyed by the horizon they were made at.
///
/// Never empty: `ForecastShifter::resolve` returns `None` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    tick: Tick,
    by_horizon: BTreeMap<u32, Event>,
}

impl Resolution {
    /// The tick every forecast in this resolution targets.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// The forecast made `horizon` ticks ago.
    #[must_use]
    pub fn get(&self, horizon: u32) -> Option<Event> {
        self.by_horizon.get(&horizon).copied()
    }

    /// The forecast made closest to the target tick.
    #[must_use]
    pub fn nearest(&self) -> Option<Event> {
        self.by_horizon.values().next().copied()
    }

    /// `(horizon, forecast)` pairs in ascending horizon order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Event)> + '_ {
        self.by_horizon.iter().map(|(h, v)| (*h, *v))
    }

    /// Number of horizons that resolved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_horizon.len()
    }

    /// Always false for a resolution returned by `resolve`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_horizon.is_empty()
    }
}

/// Buffers in-flight predictions until the tick they describe.
#[derive(Debug, Default)]
pub struct ForecastShifter {
    pending: BTreeMap<(Tick, u32), Event>,
}

impl ForecastShifter {
    /// An empty shifter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks every present prediction under `current + horizon`.
    ///
    /// Missing predictions are skipped. A later call targeting the same tick
    /// and horizon replaces the earlier value.
    pub fn accept(&mut self, current: Tick, raw: &RawPrediction) {
        for (horizon, value) in raw.iter() {
            let Some(value) = value else {
                continue;
            };
            let target = current.advanced_by(horizon);
            if let Some(stale) = self.pending.insert((target, horizon), value) {
                tracing::trace!(%target, horizon, %stale, %value, "overwrote pending forecast");
            }
        }
    }

    /// Removes and returns the forecasts targeting `current`.
    ///
    /// Forecasts whose target already passed without being resolved are
    /// dropped as well.
    pub fn resolve(&mut self, current: Tick) -> Option<Resolution> {
        let mut due = self.pending.split_off(&(current, 0));
        let later = due.split_off(&(current.next(), 0));
        let stale = std::mem::replace(&mut self.pending, later);
        if !stale.is_empty() {
            tracing::debug!(%current, dropped = stale.len(), "dropped forecasts for past ticks");
        }

        if due.is_empty() {
            return None;
        }
        Some(Resolution {
            tick: current,
            by_horizon: due.into_iter().map(|((_, h), v)| (h, v)).collect(),
        })
    }

    /// Forecasts still waiting for their target tick.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True when no forecast is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
