//! Scrollwatch Core
//!
//! Leaf primitives shared by the scroll-observation engine and its hosts:
//!
//! - **Geometry**: `Point`, `Size`, `Rect` with the vertical-axis helpers
//!   intersection bands need
//! - **Handles**: slotmap keys for elements, observation points and watchers
//! - **Direction**: the shared last-known gesture direction
//! - **State Machines**: watch-set lifecycle and one-shot DPR calibration
//! - **Frame Scheduling**: next-animation-frame deferred work
//! - **Rate Limiting**: throttle and debounce for scroll notifications
//!
//! # Example
//!
//! ```rust
//! use scrollwatch_core::{Direction, DirectionTracker};
//!
//! let tracker = DirectionTracker::new();
//! tracker.touch_start(400.0);
//! assert_eq!(tracker.touch_move(420.0), Direction::Down);
//! ```

pub mod direction;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod ids;
pub mod state;
pub mod timing;

pub use direction::{Direction, DirectionTracker};
pub use error::{EngineError, Result};
pub use frame::FrameScheduler;
pub use geometry::{Point, Rect, Size};
pub use ids::{ElementId, PointId, WatcherId};
pub use state::{
    calibration_events, dispatch, watch_events, CalibrationPhase, StateTransitions, WatchState,
};
pub use timing::{Debounce, Throttle};
