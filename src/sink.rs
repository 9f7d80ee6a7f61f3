//! Consumers of the aligned history.

use crate::history::HistorySnapshot;

/// Receives the two aligned series once per tick. Fire and forget.
pub trait VisualizationSink {
    /// Draws or records one snapshot. Must not block the loop.
    fn render(&mut self, snapshot: &HistorySnapshot);
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl VisualizationSink for NullSink {
    fn render(&mut self, _snapshot: &HistorySnapshot) {}
}

/// Logs the newest aligned pair whenever a forecast resolves.
#[derive(Debug, Default, Clone)]
pub struct TracingSink {
    rendered: u64,
}

impl TracingSink {
    /// A sink that has rendered nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots that carried a resolved pair.
    #[must_use]
    pub const fn rendered(&self) -> u64 {
        self.rendered
    }
}

impl VisualizationSink for TracingSink {
    fn render(&mut self, snapshot: &HistorySnapshot) {
        if !snapshot.resolved {
            return;
        }
        if let Some((actual, predicted)) = snapshot.latest() {
            self.rendered += 1;
            tracing::info!(
                tick = snapshot.tick.index(),
                actual,
                predicted,
                hit = (actual - predicted).abs() < f64::EPSILON,
                "forecast resolved"
            );
        }
    }
}
