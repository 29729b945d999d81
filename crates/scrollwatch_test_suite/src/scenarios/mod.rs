//! Scenarios organized by category

pub mod anchoring;
pub mod calibration;
pub mod crossings;
pub mod lifecycle;

use crate::runner::TestSuite;

/// Create all scenario suites
pub fn all_suites() -> Vec<TestSuite> {
    vec![
        anchoring::suite(),
        crossings::suite(),
        calibration::suite(),
        lifecycle::suite(),
    ]
}
