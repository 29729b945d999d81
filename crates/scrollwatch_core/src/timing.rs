//! Rate limiting for high-frequency scroll notifications
//!
//! Scroll events arrive far faster than a host wants to react to them.
//! [`Throttle`] lets the first call of a window through and remembers that
//! more arrived, so a trailing call fires once the window closes.
//! [`Debounce`] fires only after the calls have stopped for its delay.
//!
//! Both are driven by caller-supplied instants rather than a clock, so the
//! host's event timestamps (and tests) decide what "now" is.

use std::time::{Duration, Instant};

/// Leading + trailing edge throttle
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fire: Option<Instant>,
    trailing_pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
            trailing_pending: false,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Record a call at `now`; returns true if it should fire immediately
    pub fn call(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.trailing_pending = true;
                false
            }
            _ => {
                self.last_fire = Some(now);
                self.trailing_pending = false;
                true
            }
        }
    }

    /// Fire the trailing call if the window has closed
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.trailing_pending {
            return false;
        }
        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_fire = Some(now);
                self.trailing_pending = false;
                true
            }
        }
    }

    pub fn cancel(&mut self) {
        self.last_fire = None;
        self.trailing_pending = false;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Trailing edge debounce
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Record a call at `now`, pushing the deadline back
    pub fn call(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns true exactly once after calls have been quiet for the delay
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
