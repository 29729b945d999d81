//! Anchor repositioning across list mutations

use anyhow::{ensure, Context, Result};

use scrollwatch_engine::AnchorElement;

use crate::data::Mutation;
use crate::driver::ScrollDriver;
use crate::harness::{ensure_px, TestContext};
use crate::runner::TestSuite;

pub fn suite() -> TestSuite {
    let mut suite = TestSuite::new("anchoring");

    suite.add("initial_anchor_at_top", initial_anchor_at_top);
    suite.add("prepend_keeps_anchor_in_place", prepend_keeps_anchor_in_place);
    suite.add("append_keeps_offset", append_keeps_offset);
    suite.add("remove_top_shifts_offset", remove_top_shifts_offset);
    suite.add("remove_bottom_keeps_offset", remove_bottom_keeps_offset);
    suite.add("middle_removal_keeps_topmost_item", middle_removal_keeps_topmost_item);
    suite.add("middle_mutations_round_trip", middle_mutations_round_trip);
    suite.add("empty_list_degrades", empty_list_degrades);
    suite.add("unchanged_props_skip_update", unchanged_props_skip_update);

    suite
}

/// Selector the demo view uses for item `key`
fn item(key: &str) -> AnchorElement {
    AnchorElement::preserve(format!(r#"div[data-val="{}"]"#, key))
}

/// Mount the initial list with item 3 at the container top
fn mount_initial(ctx: &TestContext) -> ScrollDriver {
    let mut driver = ctx.driver();
    driver.mount(&ctx.initial_keys(), Some(item("3")));
    driver
}

fn top_of(driver: &ScrollDriver, key: &str) -> Result<f32> {
    driver
        .top_of(key)
        .with_context(|| format!("item {} is not rendered", key))
}

/// Scroll `delta` forward and return the item now at the top
fn scroll_to_topmost(driver: &mut ScrollDriver, delta: f32) -> Result<String> {
    driver.swipe(delta, 10.0);
    driver
        .dom
        .topmost_visible_key()
        .map(str::to_string)
        .context("no visible item")
}

/// Apply `mutation` keeping `key` in place; returns the offset shift
fn update_preserving(
    ctx: &TestContext,
    driver: &mut ScrollDriver,
    mutation: Mutation,
    key: &str,
) -> Result<f32> {
    let scroll_before = driver.scroll_top();
    let top_before = top_of(driver, key)?;

    let keys = ctx.fetch_keys(mutation);
    ensure!(
        driver.update(&keys, Some(item(key))),
        "{:?} did not trigger an update",
        mutation
    );

    ensure_px(top_of(driver, key)?, top_before, &format!("item {} after {:?}", key, mutation))?;
    Ok(driver.scroll_top() - scroll_before)
}

pub fn initial_anchor_at_top(ctx: &mut TestContext) -> Result<()> {
    let driver = mount_initial(ctx);
    let layout = *driver.dom.layout();

    ensure_px(top_of(&driver, "3")?, 0.0, "item 3 top")?;
    ensure_px(
        driver.scroll_top(),
        layout.loader_top + 3.0 * layout.item_height,
        "initial offset",
    )?;
    ensure!(driver.crossings().is_empty(), "mount produced crossings");
    Ok(())
}

pub fn prepend_keeps_anchor_in_place(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let item_height = driver.dom.layout().item_height;

    let shift = update_preserving(ctx, &mut driver, Mutation::AddTop, "3")?;
    ensure_px(shift, 9.0 * item_height, "offset shift after prepend")
}

pub fn append_keeps_offset(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let shift = update_preserving(ctx, &mut driver, Mutation::AddBottom, "3")?;
    ensure_px(shift, 0.0, "offset shift after append")
}

pub fn remove_top_shifts_offset(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let item_height = driver.dom.layout().item_height;
    let topmost = scroll_to_topmost(&mut driver, 350.0)?;
    ensure!(topmost == "10", "expected item 10 at the top, got {}", topmost);

    let shift = update_preserving(ctx, &mut driver, Mutation::RemoveTop, &topmost)?;
    ensure_px(shift, -6.0 * item_height, "offset shift after removing the head")
}

pub fn remove_bottom_keeps_offset(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let shift = update_preserving(ctx, &mut driver, Mutation::RemoveBottom, "3")?;
    ensure_px(shift, 0.0, "offset shift after removing the tail")
}

pub fn middle_removal_keeps_topmost_item(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let item_height = driver.dom.layout().item_height;
    let topmost = scroll_to_topmost(&mut driver, 350.0)?;

    // 5, 7 and 8 sit above item 10
    let shift = update_preserving(ctx, &mut driver, Mutation::RemoveMultipleMiddle, &topmost)?;
    ensure_px(shift, -3.0 * item_height, "offset shift after middle removal")
}

pub fn middle_mutations_round_trip(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let item_height = driver.dom.layout().item_height;
    let topmost = scroll_to_topmost(&mut driver, 350.0)?;

    let steps = [
        (Mutation::AddSingleMiddle, 1.0),
        (Mutation::RemoveSingleMiddle, -1.0),
        (Mutation::AddMultipleMiddle, 6.0),
        (Mutation::RemoveMultipleMiddle, -6.0),
        (Mutation::RemoveSingleMiddle, -1.0),
        (Mutation::AddSingleMiddle, 1.0),
    ];
    for (mutation, items) in steps {
        let shift = update_preserving(ctx, &mut driver, mutation, &topmost)?;
        ensure_px(shift, items * item_height, &format!("offset shift after {:?}", mutation))?;
    }

    let expected = ctx.initial_keys();
    ensure!(
        driver.dom.rendered_keys() == expected,
        "round trip did not restore the initial list"
    );
    Ok(())
}

pub fn empty_list_degrades(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    update_preserving(ctx, &mut driver, Mutation::AddBottom, "3")?;

    // Not applicable to the appended list: the service answers empty
    let keys = ctx.fetch_keys(Mutation::AddTop);
    ensure!(keys.is_empty(), "expected an empty list, got {} items", keys.len());
    ensure!(driver.update(&keys, Some(item("3"))), "empty list did not update");

    ensure_px(driver.scroll_top(), 0.0, "offset of an empty list")?;
    ensure!(driver.container.is_mounted(), "container lost its mount");
    ensure!(driver.container.watch_state().is_live(), "watch set not reinstalled");
    ensure!(driver.dom.observation_count() == 0, "stale observations remain");
    Ok(())
}

pub fn unchanged_props_skip_update(ctx: &mut TestContext) -> Result<()> {
    let mut driver = mount_initial(ctx);
    let keys = driver.dom.rendered_keys();
    let watchers = driver.dom.watcher_count();

    ensure!(!driver.update(&keys, Some(item("3"))), "identical props re-rendered");
    ensure!(driver.dom.watcher_count() == watchers, "watchers were rebuilt");

    // Same items, new anchor: repositions without a data change
    ensure!(driver.update(&keys, Some(item("5"))), "anchor change ignored");
    ensure_px(top_of(&driver, "5")?, 100.0, "item 5 top")?;
    Ok(())
}
