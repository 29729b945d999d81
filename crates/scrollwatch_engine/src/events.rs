//! Scroll and touch notifications
//!
//! Hosts may subscribe to coarse scroll notifications carrying the current
//! gesture direction:
//!
//! - `on_scroll`: throttled (leading and trailing edge)
//! - `on_scroll_end`: after scroll notifications have been quiet for the
//!   debounce delay
//! - `on_touch`: every touch move

use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use scrollwatch_core::{Debounce, Direction, Throttle};

/// Callback receiving the current gesture direction
pub type DirectionCallback = Rc<dyn Fn(Direction)>;

/// Optional scroll notification handlers
#[derive(Clone, Default)]
pub struct ScrollHandlers {
    on_scroll: Option<DirectionCallback>,
    on_scroll_end: Option<DirectionCallback>,
    on_touch: Option<DirectionCallback>,
}

impl fmt::Debug for ScrollHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollHandlers")
            .field("on_scroll", &self.on_scroll.is_some())
            .field("on_scroll_end", &self.on_scroll_end.is_some())
            .field("on_touch", &self.on_touch.is_some())
            .finish()
    }
}

impl ScrollHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_scroll<F: Fn(Direction) + 'static>(mut self, handler: F) -> Self {
        self.on_scroll = Some(Rc::new(handler));
        self
    }

    pub fn on_scroll_end<F: Fn(Direction) + 'static>(mut self, handler: F) -> Self {
        self.on_scroll_end = Some(Rc::new(handler));
        self
    }

    pub fn on_touch<F: Fn(Direction) + 'static>(mut self, handler: F) -> Self {
        self.on_touch = Some(Rc::new(handler));
        self
    }
}

/// Rate-limits raw scroll events into [`ScrollHandlers`] calls
#[derive(Debug)]
pub struct ScrollNotifier {
    handlers: ScrollHandlers,
    throttle: Throttle,
    debounce: Debounce,
    /// Swallow the next scroll event (caused by our own offset write)
    suppress_next: bool,
}

impl ScrollNotifier {
    pub fn new(handlers: ScrollHandlers, throttle_ms: u64, debounce_ms: u64) -> Self {
        Self {
            handlers,
            throttle: Throttle::from_millis(throttle_ms),
            debounce: Debounce::from_millis(debounce_ms),
            suppress_next: false,
        }
    }

    pub fn set_handlers(&mut self, handlers: ScrollHandlers) {
        self.handlers = handlers;
    }

    /// A raw scroll event at `now`; returns whether `on_scroll` fired
    pub fn scroll(&mut self, now: Instant, direction: Direction) -> bool {
        if std::mem::take(&mut self.suppress_next) {
            tracing::trace!("scroll caused by anchor write swallowed");
            return false;
        }
        if !self.throttle.call(now) {
            return false;
        }
        self.fire_scroll(now, direction);
        true
    }

    fn fire_scroll(&mut self, now: Instant, direction: Direction) {
        self.debounce.call(now);
        if let Some(ref handler) = self.handlers.on_scroll {
            handler(direction);
        }
    }

    /// Flush the trailing throttled call and the scroll-end debounce
    pub fn poll(&mut self, now: Instant, direction: Direction) {
        if self.throttle.poll(now) {
            self.fire_scroll(now, direction);
        }
        if self.debounce.poll(now) {
            if let Some(ref handler) = self.handlers.on_scroll_end {
                handler(direction);
            }
        }
    }

    pub fn touch(&self, direction: Direction) {
        if let Some(ref handler) = self.handlers.on_touch {
            handler(direction);
        }
    }

    /// Ignore the scroll event the host will raise for our own write
    pub fn suppress_next_scroll(&mut self) {
        self.suppress_next = true;
    }

    /// Whether a scroll-end notification is still due
    pub fn is_settling(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Drop every pending notification
    pub fn cancel(&mut self) {
        self.throttle.cancel();
        self.debounce.cancel();
        self.suppress_next = false;
    }
}
