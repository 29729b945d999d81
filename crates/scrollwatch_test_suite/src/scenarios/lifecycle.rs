//! Mount, detach and unmount

use anyhow::{ensure, Context, Result};

use scrollwatch_core::WatchState;
use scrollwatch_engine::{AnchorElement, ObservationPoint};

use crate::data::Mutation;
use crate::harness::{ensure_px, TestContext};
use crate::runner::TestSuite;

pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("lifecycle");

    suite.add("detached_container_recovers", detached_container_recovers);
    suite.add("unmount_releases_watchers", unmount_releases_watchers);
    suite.add("pinned_anchor_sits_on_line", pinned_anchor_sits_on_line);

    suite
}

pub fn detached_container_recovers(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    driver.add_point(ObservationPoint::bottom(100.0))?;
    driver.dom.set_detached(true);

    let anchor = AnchorElement::preserve("3");
    driver.mount(&ctx.initial_keys(), Some(anchor.clone()));
    ensure!(
        driver.container.watch_state() == WatchState::Uninstalled,
        "installed without geometry"
    );
    ensure_px(driver.scroll_top(), 0.0, "offset without geometry")?;

    // Next render with geometry back: everything catches up
    driver.dom.set_detached(false);
    let keys = ctx.fetch_keys(Mutation::AddBottom);
    ensure!(driver.update(&keys, Some(anchor)), "update skipped");
    ensure!(
        driver.container.watch_state() == WatchState::Attached,
        "watch state {:?}",
        driver.container.watch_state()
    );
    ensure!(
        driver.dom.observation_count() == 2 * keys.len(),
        "observing {} of {} items",
        driver.dom.observation_count(),
        2 * keys.len()
    );
    Ok(())
}

pub fn unmount_releases_watchers(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    driver.add_point(ObservationPoint::bottom(100.0))?;
    driver.add_point(ObservationPoint::top(0.0))?;
    driver.mount(&ctx.initial_keys(), None);
    ensure!(driver.dom.watcher_count() > 0, "nothing installed");

    driver.unmount();
    driver.unmount();
    ensure!(driver.dom.watcher_count() == 0, "watchers survive unmount");
    ensure!(!driver.container.is_mounted(), "still mounted");

    driver.swipe(120.0, 10.0);
    ensure!(driver.crossings().is_empty(), "crossings after unmount");
    Ok(())
}

pub fn pinned_anchor_sits_on_line(ctx: &mut TestContext) -> Result<()> {
    let mut driver = ctx.driver();
    let line = driver.add_point(ObservationPoint::bottom(100.0))?;
    let container_height = driver.dom.layout().container.height();

    driver.mount(&ctx.initial_keys(), Some(AnchorElement::pin("8", line)));
    let top = driver.top_of("8").context("item 8 not rendered")?;
    ensure_px(top, container_height - 100.0, "item 8 top")?;
    ensure!(driver.crossings().is_empty(), "pinning produced crossings");
    Ok(())
}
