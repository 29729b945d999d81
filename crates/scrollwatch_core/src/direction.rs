//! Gesture direction tracking
//!
//! The whole container shares one last-known direction: velocity and
//! direction belong to the user's gesture, not to any single reference
//! line. The tracker is fed raw pointer Y positions by the host's touch
//! handlers and read by every classifier.
//!
//! Sign convention: a positive delta (pointer moved down) drags content
//! down, which is [`Direction::Down`].

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Last known gesture direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Content moving up (scroll offset growing)
    #[default]
    Up,
    /// Content moving down (scroll offset shrinking)
    Down,
}

impl Direction {
    /// Direction implied by a pointer delta, `None` for no movement
    pub fn from_delta(delta: f32) -> Option<Self> {
        if delta > 0.0 {
            Some(Direction::Down)
        } else if delta < 0.0 {
            Some(Direction::Up)
        } else {
            None
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Default)]
struct TrackerInner {
    direction: Cell<Direction>,
    last_y: Cell<Option<f32>>,
}

/// Shared, last-write-wins gesture direction
///
/// Cloning yields another handle to the same value. Uses `Rc` since the
/// engine runs on the host's single UI thread.
#[derive(Debug, Clone, Default)]
pub struct DirectionTracker {
    inner: Rc<TrackerInner>,
}

impl DirectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer delta between two Y positions
    ///
    /// A zero delta leaves the direction unchanged.
    pub fn record_touch_delta(&self, start_y: f32, current_y: f32) -> Direction {
        if let Some(direction) = Direction::from_delta(current_y - start_y) {
            if direction != self.inner.direction.get() {
                tracing::trace!(%direction, "gesture direction changed");
            }
            self.inner.direction.set(direction);
        }
        self.inner.direction.get()
    }

    /// Start a new gesture at `y`
    pub fn touch_start(&self, y: f32) {
        self.inner.last_y.set(Some(y));
    }

    /// Continue the current gesture to `y`
    ///
    /// Compares against the previous pointer position and then advances it.
    /// A move without a preceding start only seeds the position.
    pub fn touch_move(&self, y: f32) -> Direction {
        let previous = self.inner.last_y.replace(Some(y));
        match previous {
            Some(prev) => self.record_touch_delta(prev, y),
            None => self.inner.direction.get(),
        }
    }

    pub fn current_direction(&self) -> Direction {
        self.inner.direction.get()
    }

    /// Force the direction (used by hosts that derive it elsewhere)
    pub fn set(&self, direction: Direction) {
        self.inner.direction.set(direction);
    }
}
