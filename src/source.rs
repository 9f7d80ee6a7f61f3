//! Event sources feeding the prediction loop.
//!
//! A source yields one signal per tick: either the next event or a request
//! to stop. `SteeringSource` turns live steering inputs into direction
//! codes at a fixed tick interval; `ScriptedSource` replays a fixed list.

use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::event::{Direction, Event, EventCodec};

/// What a source produced for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSignal {
    /// The event observed on this tick.
    Event(Event),
    /// Stop the loop. Sources keep returning this once they have.
    Quit,
}

/// Produces one signal per tick. May block until the tick boundary.
pub trait EventSource {
    /// Pull the next signal.
    ///
    /// # Errors
    ///
    /// Implementation specific; the loop treats any error as fatal.
    fn next_signal(&mut self) -> Result<SourceSignal, SourceError>;
}

/// Replays a fixed sequence of events, then quits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    events: VecDeque<Event>,
}

impl ScriptedSource {
    /// Replays `events` in order.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Parses a JSON array of event codes.
    ///
    /// # Errors
    ///
    /// `SourceError::Replay` if the input is not an array of non-negative
    /// integers.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let events: Vec<Event> = serde_json::from_str(json).map_err(|e| SourceError::Replay {
            reason: format!("expected a JSON array of event codes: {e}"),
        })?;
        Ok(Self::new(events))
    }

    /// Reads a replay file holding a JSON array of event codes.
    ///
    /// # Errors
    ///
    /// `SourceError::Io` if the file cannot be read, `SourceError::Replay`
    /// if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Events not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ScriptedSource {
    fn next_signal(&mut self) -> Result<SourceSignal, SourceError> {
        Ok(self.events.pop_front().map_or(SourceSignal::Quit, SourceSignal::Event))
    }
}

/// Grid the steered head moves on. Leaving it ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playfield {
    /// Number of columns.
    pub width: i64,
    /// Number of rows.
    pub height: i64,
    /// Starting column of the head.
    pub start_x: i64,
    /// Starting row of the head.
    pub start_y: i64,
}

impl Default for Playfield {
    /// 800x600 pixels in 10 pixel cells, starting near the top left.
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
            start_x: 3,
            start_y: 3,
        }
    }
}

impl Playfield {
    /// Whether a cell is on the field. Both edges are inclusive.
    #[must_use]
    pub const fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x <= self.width && y <= self.height
    }
}

/// Steering source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Time between ticks. Zero drains pending input without waiting.
    pub tick_interval_ms: u64,
    /// Direction held until the first input arrives.
    pub initial_direction: Direction,
    /// Bounds of the field; `None` steers forever.
    pub playfield: Option<Playfield>,
    /// Capacity of the input channel.
    pub input_capacity: usize,
}

impl Default for SteeringConfig {
    /// 30 ticks per second, heading right on the default field.
    fn default() -> Self {
        Self {
            tick_interval_ms: 33,
            initial_direction: Direction::Right,
            playfield: Some(Playfield::default()),
            input_capacity: 64,
        }
    }
}

/// Input delivered to a `SteeringSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringInput {
    /// Hold a new direction from the next tick on.
    Steer(Direction),
    /// End the session.
    Quit,
}

/// Creates the bounded channel a `SteeringSource` reads from.
#[must_use]
pub fn steering_channel(capacity: usize) -> (Sender<SteeringInput>, Receiver<SteeringInput>) {
    bounded(capacity.max(1))
}

/// Emits the code of the held direction once per tick interval.
///
/// Inputs queued during a tick are applied in order, so the last steer of
/// the tick wins. A quit input, a disconnected channel, or the head leaving
/// the playfield ends the session.
#[derive(Debug)]
pub struct SteeringSource {
    rx: Receiver<SteeringInput>,
    codec: EventCodec,
    tick_interval: Duration,
    next_deadline: Instant,
    direction: Direction,
    playfield: Option<Playfield>,
    head: (i64, i64),
    finished: bool,
}

impl SteeringSource {
    /// Reads inputs from `rx`. The first tick is due one interval from now.
    #[must_use]
    pub fn new(rx: Receiver<SteeringInput>, config: &SteeringConfig) -> Self {
        let tick_interval = Duration::from_millis(config.tick_interval_ms);
        let head = config
            .playfield
            .map_or((0, 0), |field| (field.start_x, field.start_y));
        Self {
            rx,
            codec: EventCodec,
            tick_interval,
            next_deadline: Instant::now() + tick_interval,
            direction: config.initial_direction,
            playfield: config.playfield,
            head,
            finished: false,
        }
    }

    /// Direction currently held.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Head position on the grid.
    #[must_use]
    pub const fn head(&self) -> (i64, i64) {
        self.head
    }

    /// Applies inputs until the tick deadline. Returns false on quit.
    fn drain_until_deadline(&mut self) -> bool {
        loop {
            match self.rx.recv_deadline(self.next_deadline) {
                Ok(SteeringInput::Steer(direction)) => self.direction = direction,
                Ok(SteeringInput::Quit) => return false,
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("steering input disconnected");
                    return false;
                }
            }
        }
    }
}

impl EventSource for SteeringSource {
    fn next_signal(&mut self) -> Result<SourceSignal, SourceError> {
        if self.finished {
            return Ok(SourceSignal::Quit);
        }
        if !self.drain_until_deadline() {
            self.finished = true;
            return Ok(SourceSignal::Quit);
        }
        self.next_deadline = Instant::now() + self.tick_interval;

        let (dx, dy) = self.direction.delta();
        self.head = (self.head.0 + dx, self.head.1 + dy);
        if let Some(field) = &self.playfield {
            if !field.contains(self.head.0, self.head.1) {
                // The event that left the field is still reported.
                tracing::info!(x = self.head.0, y = self.head.1, "head left the playfield");
                self.finished = true;
            }
        }

        Ok(SourceSignal::Event(self.codec.encode(self.direction)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_config(playfield: Option<Playfield>) -> SteeringConfig {
        SteeringConfig {
            tick_interval_ms: 0,
            initial_direction: Direction::Right,
            playfield,
            input_capacity: 16,
        }
    }

    #[test]
    fn scripted_source_replays_then_quits() {
        let mut source = ScriptedSource::new([Event::new(1), Event::new(2)]);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(1)));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(2)));
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
    }

    #[test]
    fn scripted_source_parses_json() {
        let mut source = ScriptedSource::from_json_str("[3, 3, 1]").unwrap();
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(3)));

        assert!(matches!(
            ScriptedSource::from_json_str("[-1]"),
            Err(SourceError::Replay { .. })
        ));
        assert!(ScriptedSource::from_json_str("{\"a\": 1}").is_err());
    }

    #[test]
    fn scripted_source_reads_replay_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");
        std::fs::write(&path, "[4, 2]").unwrap();
        let mut source = ScriptedSource::from_path(&path).unwrap();
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(4)));

        let missing = dir.path().join("absent.json");
        let err = ScriptedSource::from_path(&missing).unwrap_err();
        assert!(matches!(err, SourceError::Io { ref path, .. } if *path == missing));
    }

    #[test]
    fn steering_holds_direction_between_inputs() {
        let (tx, rx) = steering_channel(16);
        let mut source = SteeringSource::new(rx, &instant_config(None));

        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(3)));
        tx.send(SteeringInput::Steer(Direction::Up)).unwrap();
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(1)));
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(1)));
        assert_eq!(source.direction(), Direction::Up);
        assert_eq!(source.head(), (1, -2));
    }

    #[test]
    fn steering_last_input_of_tick_wins() {
        let (tx, rx) = steering_channel(16);
        let mut source = SteeringSource::new(rx, &instant_config(None));
        tx.send(SteeringInput::Steer(Direction::Up)).unwrap();
        tx.send(SteeringInput::Steer(Direction::Left)).unwrap();
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(4)));
    }

    #[test]
    fn steering_quit_is_sticky() {
        let (tx, rx) = steering_channel(16);
        let mut source = SteeringSource::new(rx, &instant_config(None));
        tx.send(SteeringInput::Quit).unwrap();
        tx.send(SteeringInput::Steer(Direction::Down)).unwrap();
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
    }

    #[test]
    fn steering_disconnect_quits() {
        let (tx, rx) = steering_channel(16);
        let mut source = SteeringSource::new(rx, &instant_config(None));
        drop(tx);
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
    }

    #[test]
    fn leaving_the_playfield_ends_the_session() {
        let field = Playfield {
            width: 4,
            height: 4,
            start_x: 3,
            start_y: 0,
        };
        let (_tx, rx) = steering_channel(16);
        let mut source = SteeringSource::new(rx, &instant_config(Some(field)));

        // x=4 is still on the field, x=5 is not but is still reported.
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(3)));
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Event(Event::new(3)));
        assert_eq!(source.head(), (5, 0));
        assert_eq!(source.next_signal().unwrap(), SourceSignal::Quit);
    }

    #[test]
    fn steering_waits_for_tick_interval() {
        let (_tx, rx) = steering_channel(1);
        let config = SteeringConfig {
            tick_interval_ms: 20,
            ..instant_config(None)
        };
        let mut source = SteeringSource::new(rx, &config);
        let started = Instant::now();
        source.next_signal().unwrap();
        source.next_signal().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
