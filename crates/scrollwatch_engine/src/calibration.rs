//! Device-pixel-ratio calibration
//!
//! Some displays round viewport-intersection margins so that the band a
//! host actually uses is off from the requested one by a constant factor.
//! Rather than correcting each point, the disagreement is measured once
//! from the first usable entry and every later margin is scaled by the
//! inverse factor.
//!
//! The measurement is one-shot ([`CalibrationPhase`]): once a disagreement
//! has been seen, further samples are ignored until the caller explicitly
//! resets. The reinstall itself is not done here; [`Calibration::sample`]
//! only reports that one is needed, and the owner schedules it for the next
//! frame.

use scrollwatch_core::{calibration_events, dispatch, CalibrationPhase, Rect};

use crate::band::BandSide;
use crate::intersection::IntersectionEntry;
use crate::watch_set::Watcher;

/// Root margin actually used by the host, recovered from an entry's band
///
/// Only the margin on the line edge is recovered; the other edge is always
/// requested as 0.
pub fn observed_margin(side: BandSide, root_bounds: &Rect, container: &Rect) -> f32 {
    match side {
        BandSide::AboveLine => root_bounds.bottom() - container.bottom(),
        BandSide::BelowLine => container.top() - root_bounds.top(),
    }
}

/// Calibration state of one container
#[derive(Debug, Clone)]
pub struct Calibration {
    phase: CalibrationPhase,
    factor: f32,
    tolerance_px: f32,
    min_margin_px: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(0.5, 1.0)
    }
}

impl Calibration {
    /// `tolerance_px`: disagreement ignored as noise; `min_margin_px`:
    /// margins smaller than this are too close to 0 to measure a ratio
    pub fn new(tolerance_px: f32, min_margin_px: f32) -> Self {
        Self {
            phase: CalibrationPhase::Uncalibrated,
            factor: 1.0,
            tolerance_px,
            min_margin_px,
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Measured host/requested margin ratio (1.0 until calibrated)
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Multiplier for every margin handed to the host
    pub fn correction(&self) -> f32 {
        1.0 / self.factor
    }

    /// Ratio between an observed and an intended margin, if they disagree
    pub fn measure(&self, intended: f32, observed: f32) -> Option<f32> {
        if intended.abs() < self.min_margin_px {
            return None;
        }
        if (observed - intended).abs() <= self.tolerance_px {
            return None;
        }
        let ratio = observed / intended;
        if !ratio.is_finite() || ratio <= 0.0 {
            tracing::warn!(intended, observed, "unusable calibration sample ignored");
            return None;
        }
        Some(ratio)
    }

    /// Compare one entry's band against what `watcher` requested
    ///
    /// Returns true when a recalibration must be scheduled. At most one
    /// sample returns true until [`reset`](Self::reset).
    pub fn sample(
        &mut self,
        watcher: &Watcher,
        entry: &IntersectionEntry,
        container: &Rect,
    ) -> bool {
        if !self.phase.is_sampling() {
            return false;
        }

        // What the point asked for before any correction was applied
        let intended = watcher.requested_margin() * self.factor;
        let observed = observed_margin(watcher.side, &entry.root_bounds, container);
        let Some(ratio) = self.measure(intended, observed) else {
            return false;
        };

        self.factor *= ratio;
        dispatch(&mut self.phase, calibration_events::DISAGREE);
        tracing::warn!(
            intended,
            observed,
            factor = self.factor,
            "observed band disagrees with requested margin, recalibrating"
        );
        true
    }

    /// The watch set was rebuilt with the corrected factor
    pub fn complete(&mut self) -> bool {
        let done = dispatch(&mut self.phase, calibration_events::REINSTALLED);
        if done {
            tracing::debug!(factor = self.factor, "calibration applied");
        }
        done
    }

    /// Allow one more measurement
    ///
    /// The current factor is kept; a new measurement refines it.
    pub fn reset(&mut self) -> bool {
        dispatch(&mut self.phase, calibration_events::RESET)
    }
}
