//! Device pixel ratio calibration

use anyhow::{ensure, Result};

use scrollwatch_core::{CalibrationPhase, Direction};
use scrollwatch_engine::{AnchorElement, Classification, ObservationPoint};

use crate::driver::ScrollDriver;
use crate::dom::SimulatedDom;
use crate::harness::TestContext;
use crate::runner::TestSuite;

/// Margin distortion of the simulated display
const DISTORTION: f32 = 1.25;

pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("calibration");

    suite.add("distortion_is_measured_once", distortion_is_measured_once);
    suite.add("calibrated_lines_cross_exactly", calibrated_lines_cross_exactly);
    suite.add("recalibration_keeps_factor", recalibration_keeps_factor);
    suite.add("exact_display_stays_uncalibrated", exact_display_stays_uncalibrated);

    suite
}

fn distorted_driver(ctx: &TestContext) -> ScrollDriver {
    ScrollDriver::with_dom(
        ctx.config.clone(),
        SimulatedDom::default().with_dpr_distortion(DISTORTION),
    )
}

fn mount(ctx: &TestContext, driver: &mut ScrollDriver) {
    driver.mount(
        &ctx.initial_keys(),
        Some(AnchorElement::preserve(r#"div[data-val="3"]"#)),
    );
}

pub fn distortion_is_measured_once(ctx: &mut TestContext) -> Result<()> {
    let mut driver = distorted_driver(ctx);
    driver.add_point(ObservationPoint::bottom(100.0))?;
    mount(ctx, &mut driver);

    let calibration = driver.container.calibration();
    ensure!(
        calibration.phase() == CalibrationPhase::Calibrated,
        "calibration phase: {:?}",
        calibration.phase()
    );
    ensure!(
        (calibration.factor() - DISTORTION).abs() < 1e-3,
        "measured factor {}",
        calibration.factor()
    );
    ensure!(driver.container.watch_state().is_live(), "watch set not rebuilt");
    ensure!(driver.crossings().is_empty(), "calibration produced crossings");
    Ok(())
}

pub fn calibrated_lines_cross_exactly(ctx: &mut TestContext) -> Result<()> {
    let mut driver = distorted_driver(ctx);
    let point = driver.add_point(ObservationPoint::bottom(100.0))?;
    mount(ctx, &mut driver);

    // Uncorrected, the line would sit 25px lower and item 8 would not cross
    driver.swipe(-30.0, 5.0);
    ensure!(driver.crossings_at(point).is_empty(), "crossed on partial overlap");

    driver.swipe(-30.0, 5.0);
    let crossings = driver.crossings_at(point);
    ensure!(crossings.len() == 1, "expected one crossing, got {}", crossings.len());
    let crossing = crossings[0];
    ensure!(
        &*crossing.key == "8"
            && crossing.classification == Classification::Below
            && crossing.direction == Direction::Down,
        "unexpected crossing {:?}",
        crossing
    );
    Ok(())
}

pub fn recalibration_keeps_factor(ctx: &mut TestContext) -> Result<()> {
    let mut driver = distorted_driver(ctx);
    driver.add_point(ObservationPoint::top(60.0))?;
    mount(ctx, &mut driver);
    let factor = driver.container.calibration().factor();

    ensure!(driver.container.request_recalibration(), "recalibration refused");
    driver.pump();

    // The corrected bands agree with what was asked for
    let calibration = driver.container.calibration();
    ensure!(
        (calibration.factor() - factor).abs() < 1e-3,
        "factor drifted from {} to {}",
        factor,
        calibration.factor()
    );
    ensure!(
        calibration.phase() != CalibrationPhase::Calibrating,
        "a second correction was scheduled"
    );
    ensure!(driver.container.watch_state().is_live(), "watch set lost");
    Ok(())
}

pub fn exact_display_stays_uncalibrated(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    driver.add_point(ObservationPoint::bottom(100.0))?;
    mount(ctx, &mut driver);

    let calibration = driver.container.calibration();
    ensure!(
        calibration.phase() == CalibrationPhase::Uncalibrated && calibration.factor() == 1.0,
        "calibrated without distortion: {:?} x{}",
        calibration.phase(),
        calibration.factor()
    );
    ensure!(
        !driver.container.request_recalibration(),
        "recalibration accepted before any calibration"
    );
    Ok(())
}
