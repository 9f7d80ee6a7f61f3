//! Events, ticks and the direction codec.
//!
//! An `Event` is the discrete observation fed to the model once per tick.
//! Ticks are the coordinate system every forecast is aligned against.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One discrete observation of the control signal.
///
/// # Examples
///
/// ```
/// use eventcast::Event;
///
/// let event = Event::new(3);
/// assert_eq!(event.code(), 3);
/// assert_eq!(event.as_f64(), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(u32);

impl Event {
    /// Wraps a raw event code.
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// The raw code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// The event as a plottable value.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl From<u32> for Event {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic loop iteration index. Starts at 0 and is never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(u64);

impl Tick {
    /// The first tick of a run.
    pub const ZERO: Self = Self(0);

    /// Tick at `index`.
    #[must_use]
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Zero-based position of this tick in the run.
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }

    /// The tick `horizon` steps after this one.
    #[must_use]
    pub const fn advanced_by(self, horizon: u32) -> Self {
        Self(self.0.saturating_add(horizon as u64))
    }

    /// The following tick.
    #[must_use]
    pub const fn next(self) -> Self {
        self.advanced_by(1)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Identifier stamped on each prediction loop instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Steering direction of the controlled head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards larger columns.
    Right,
    /// Towards column 0.
    Left,
}

impl Direction {
    /// All directions in code order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Right, Self::Left];

    /// Grid delta applied to the head for one tick. `y` grows downwards.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Right => (1, 0),
            Self::Left => (-1, 0),
        }
    }

    /// Parses a key name as typed at the terminal.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "up" | "w" | "k" => Some(Self::Up),
            "down" | "s" | "j" => Some(Self::Down),
            "right" | "d" | "l" => Some(Self::Right),
            "left" | "a" | "h" => Some(Self::Left),
            _ => None,
        }
    }
}

/// Maps directions to event codes and back.
///
/// Up=1, Down=2, Right=3, Left=4.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventCodec;

impl EventCodec {
    /// Event code for `direction`.
    #[must_use]
    pub const fn encode(self, direction: Direction) -> Event {
        match direction {
            Direction::Up => Event::new(1),
            Direction::Down => Event::new(2),
            Direction::Right => Event::new(3),
            Direction::Left => Event::new(4),
        }
    }

    /// Direction for `event`, or `None` for a code outside the alphabet.
    #[must_use]
    pub const fn decode(self, event: Event) -> Option<Direction> {
        match event.code() {
            1 => Some(Direction::Up),
            2 => Some(Direction::Down),
            3 => Some(Direction::Right),
            4 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Every code this codec can produce.
    #[must_use]
    pub fn alphabet(self) -> Vec<u32> {
        Direction::ALL.iter().map(|d| self.encode(*d).code()).collect()
    }
}
