//! State machines for watch-set lifecycle and DPR calibration
//!
//! Both are tiny enum FSMs driven by `u32` events, in the same shape as
//! widget interaction states: `on_event` returns the next state or `None`
//! when the event does not apply.
//!
//! ```text
//! Uninstalled ──INSTALL──▶ Installed ──ATTACH──▶ Attached
//!                             ▲   │                 │
//!                             │   └──TEARDOWN──┐    │ TEARDOWN
//!                          INSTALL             ▼    ▼
//!                             └──────────────── TornDown
//!
//! Uncalibrated ──DISAGREE──▶ Calibrating ──REINSTALLED──▶ Calibrated
//!      ▲                                                      │
//!      └──────────────────────RESET────────────────────────────┘
//! ```

use std::hash::Hash;

/// Trait for enum-based state machines
///
/// ```ignore
/// match (self, event) {
///     (WatchState::Uninstalled, INSTALL) => Some(WatchState::Installed),
///     _ => None,
/// }
/// ```
pub trait StateTransitions:
    Clone + Copy + PartialEq + Eq + Hash + std::fmt::Debug + 'static
{
    /// Handle an event and return the new state, or None if no transition
    fn on_event(&self, event: u32) -> Option<Self>;
}

/// Apply `event` to `state` in place, returning whether it transitioned
pub fn dispatch<S: StateTransitions>(state: &mut S, event: u32) -> bool {
    match state.on_event(event) {
        Some(next) => {
            tracing::trace!(from = ?state, to = ?next, event, "state transition");
            *state = next;
            true
        }
        None => false,
    }
}

// ============================================================================
// Watch set lifecycle
// ============================================================================

/// Events for [`WatchState`]
pub mod watch_events {
    /// Watchers created from the current container geometry
    pub const INSTALL: u32 = 1;
    /// Rendered elements handed to the watchers
    pub const ATTACH: u32 = 2;
    /// All watchers disconnected
    pub const TEARDOWN: u32 = 3;
}

/// Lifecycle of a watch set (and of every point it carries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WatchState {
    /// Never installed
    #[default]
    Uninstalled,
    /// Watchers exist but observe nothing yet
    Installed,
    /// Watchers observe the rendered elements; crossings may fire
    Attached,
    /// Disconnected; must be reinstalled before use
    TornDown,
}

impl WatchState {
    /// Watchers exist (installed or attached)
    pub fn is_live(&self) -> bool {
        matches!(self, WatchState::Installed | WatchState::Attached)
    }
}

impl StateTransitions for WatchState {
    fn on_event(&self, event: u32) -> Option<Self> {
        use watch_events::*;

        match (self, event) {
            (WatchState::Uninstalled, INSTALL) => Some(WatchState::Installed),
            (WatchState::TornDown, INSTALL) => Some(WatchState::Installed),

            (WatchState::Installed, ATTACH) => Some(WatchState::Attached),
            // Re-attaching after another render keeps the set attached
            (WatchState::Attached, ATTACH) => None,

            (WatchState::Installed, TEARDOWN) => Some(WatchState::TornDown),
            (WatchState::Attached, TEARDOWN) => Some(WatchState::TornDown),

            _ => None,
        }
    }
}

// ============================================================================
// Calibration
// ============================================================================

/// Events for [`CalibrationPhase`]
pub mod calibration_events {
    /// Observed boundary disagreed with the requested one
    pub const DISAGREE: u32 = 1;
    /// Watchers were rebuilt with the corrected factor
    pub const REINSTALLED: u32 = 2;
    /// Caller explicitly asked for a new measurement
    pub const RESET: u32 = 3;
}

/// Orthogonal one-shot calibration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationPhase {
    #[default]
    Uncalibrated,
    /// A reinstall is queued for the next frame
    Calibrating,
    Calibrated,
}

impl CalibrationPhase {
    /// Whether new samples are still taken
    pub fn is_sampling(&self) -> bool {
        matches!(self, CalibrationPhase::Uncalibrated)
    }
}

impl StateTransitions for CalibrationPhase {
    fn on_event(&self, event: u32) -> Option<Self> {
        use calibration_events::*;

        match (self, event) {
            (CalibrationPhase::Uncalibrated, DISAGREE) => Some(CalibrationPhase::Calibrating),
            (CalibrationPhase::Calibrating, REINSTALLED) => Some(CalibrationPhase::Calibrated),
            (CalibrationPhase::Calibrating, RESET) => Some(CalibrationPhase::Uncalibrated),
            (CalibrationPhase::Calibrated, RESET) => Some(CalibrationPhase::Uncalibrated),
            _ => None,
        }
    }
}
