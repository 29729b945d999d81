//! Reference-line crossings under touch scrolling

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{ensure, Result};

use scrollwatch_core::{Direction, PointId};
use scrollwatch_engine::{AnchorElement, Classification, ObservationPoint, ScrollHandlers};

use crate::driver::ScrollDriver;
use crate::harness::TestContext;
use crate::runner::TestSuite;
use crate::tracker::{Role, VisibilityTracker};

pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("crossings");

    suite.add("bottom_point_reports_below_once", bottom_point_reports_below_once);
    suite.add("scrolling_up_reports_above", scrolling_up_reports_above);
    suite.add("through_is_opt_in", through_is_opt_in);
    suite.add("visibility_tracker_follows_scroll", visibility_tracker_follows_scroll);
    suite.add("scroll_notifications_are_rate_limited", scroll_notifications_are_rate_limited);

    suite
}

/// Mount the initial list scrolled so that item 3 is at the top
fn mount_at_item_3(ctx: &TestContext, driver: &mut ScrollDriver) {
    driver.mount(
        &ctx.initial_keys(),
        Some(AnchorElement::preserve(r#"div[data-val="3"]"#)),
    );
}

/// (key, classification, direction) of every crossing at `point`
fn log_at(driver: &ScrollDriver, point: PointId) -> Vec<(String, Classification, Direction)> {
    driver
        .crossings_at(point)
        .into_iter()
        .map(|c| (c.key.to_string(), c.classification, c.direction))
        .collect()
}

fn entry(key: &str, classification: Classification, direction: Direction) -> (String, Classification, Direction) {
    (key.to_string(), classification, direction)
}

pub fn bottom_point_reports_below_once(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    let point = driver.add_point(ObservationPoint::bottom(100.0))?;
    mount_at_item_3(ctx, &mut driver);

    // Item 8's bottom sits on the line; half a row down it straddles
    driver.swipe(-30.0, 5.0);
    ensure!(
        driver.crossings_at(point).is_empty(),
        "partial overlap reported: {:?}",
        log_at(&driver, point)
    );

    driver.swipe(-30.0, 5.0);
    let log = log_at(&driver, point);
    ensure!(
        log == vec![entry("8", Classification::Below, Direction::Down)],
        "unexpected crossings: {:?}",
        log
    );
    Ok(())
}

pub fn scrolling_up_reports_above(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    let point = driver.add_point(ObservationPoint::bottom(100.0))?;
    mount_at_item_3(ctx, &mut driver);

    driver.swipe(60.0, 5.0);
    let log = log_at(&driver, point);
    ensure!(
        log == vec![entry("9", Classification::Above, Direction::Up)],
        "unexpected crossings: {:?}",
        log
    );
    ensure!(driver.container.direction() == Direction::Up, "direction not tracked");
    Ok(())
}

pub fn through_is_opt_in(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    let point = driver.add_point(ObservationPoint::bottom(100.0).report_through(true))?;
    mount_at_item_3(ctx, &mut driver);

    driver.swipe(-60.0, 5.0);
    let item_8: Vec<Classification> = log_at(&driver, point)
        .into_iter()
        .filter(|(key, _, _)| key == "8")
        .map(|(_, classification, _)| classification)
        .collect();
    ensure!(
        item_8 == vec![Classification::Through, Classification::Below],
        "item 8 reported {:?}",
        item_8
    );
    Ok(())
}

pub fn visibility_tracker_follows_scroll(ctx: &mut TestContext) -> Result<()> {
    let tracker = VisibilityTracker::shared();
    let mut driver = ctx.driver();
    for role in Role::ALL {
        let id = driver.add_point(VisibilityTracker::point_for(&tracker, role))?;
        tracker.borrow_mut().assign(id, role);
    }
    mount_at_item_3(ctx, &mut driver);

    driver.swipe(100.0, 10.0);

    let tracker = tracker.borrow();
    let above: Vec<&str> = tracker.above_top.iter().map(String::as_str).collect();
    let below: Vec<&str> = tracker.below_bottom.iter().map(String::as_str).collect();
    ensure!(above == ["2", "3"], "above top: {:?}", above);
    ensure!(below == ["17", "18"], "below bottom: {:?}", below);
    ensure!(tracker.top_most.as_deref() == Some("3"), "top most: {:?}", tracker.top_most);
    ensure!(
        tracker.bottom_most.as_deref() == Some("12"),
        "bottom most: {:?}",
        tracker.bottom_most
    );
    Ok(())
}

pub fn scroll_notifications_are_rate_limited(ctx: &mut TestContext) -> Result<()> {
    let scrolls = Rc::new(Cell::new(0usize));
    let ends = Rc::new(Cell::new(Vec::<Direction>::new()));
    let touches = Rc::new(Cell::new(0usize));

    let handlers = {
        let (scrolls, ends, touches) = (scrolls.clone(), ends.clone(), touches.clone());
        ScrollHandlers::new()
            .on_scroll(move |_| scrolls.set(scrolls.get() + 1))
            .on_scroll_end(move |direction| {
                let mut seen = ends.take();
                seen.push(direction);
                ends.set(seen);
            })
            .on_touch(move |_| touches.set(touches.get() + 1))
    };

    let mut driver = ctx.driver().with_handlers(handlers);
    mount_at_item_3(ctx, &mut driver);
    ensure!(scrolls.get() == 0, "anchor write was reported as a user scroll");

    // 12 moves, 16ms apart
    driver.swipe(-60.0, 5.0);
    ensure!(touches.get() == 12, "touch handler ran {} times", touches.get());
    ensure!(
        (1..12).contains(&scrolls.get()),
        "on_scroll ran {} times for 12 scroll events",
        scrolls.get()
    );

    driver.advance(std::time::Duration::from_millis(500));
    let ends = ends.take();
    ensure!(ends == vec![Direction::Down], "scroll end notifications: {:?}", ends);
    Ok(())
}
