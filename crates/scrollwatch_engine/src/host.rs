//! Host seam
//!
//! Everything the engine needs from the UI it runs in: container and
//! element geometry, the scroll offset, and a viewport-intersection
//! primitive. Implementations exist for a real view tree and for the
//! headless simulation used by the scenario suites.

use scrollwatch_core::{ElementId, Rect, WatcherId};

use crate::intersection::WatcherSpec;

/// An item element as currently rendered, in render order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    pub element: ElementId,
    /// Stable lookup key (the item's data value)
    pub key: String,
}

impl RenderedItem {
    pub fn new(element: ElementId, key: impl Into<String>) -> Self {
        Self {
            element,
            key: key.into(),
        }
    }
}

/// The view hosting a scroll container
///
/// Geometry getters return `None` while the corresponding node is not
/// mounted or has not been laid out yet.
pub trait ScrollHost {
    // ─────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────

    /// The scroll container's rect
    fn container_rect(&self) -> Option<Rect>;

    /// Offset of the list node from the top of the scroll content
    ///
    /// Non-zero when something (a loading indicator) renders above the list.
    fn list_offset_top(&self) -> Option<f32>;

    /// Offset of an item element from the top of the list node
    fn element_offset_top(&self, element: ElementId) -> Option<f32>;

    /// Item elements after the last committed render
    fn rendered_items(&self) -> Vec<RenderedItem>;

    // ─────────────────────────────────────────────────────────────────────
    // Scrolling
    // ─────────────────────────────────────────────────────────────────────

    fn scroll_top(&self) -> f32;

    /// Write the scroll offset; the host may clamp it to its range
    fn set_scroll_top(&mut self, offset: f32);

    // ─────────────────────────────────────────────────────────────────────
    // Intersection watchers
    // ─────────────────────────────────────────────────────────────────────

    /// Create a watcher over the container with the given band
    fn create_watcher(&mut self, spec: &WatcherSpec) -> WatcherId;

    /// Start observing an element
    ///
    /// The host delivers one initial entry for the element, then one entry
    /// per threshold crossing.
    fn observe(&mut self, watcher: WatcherId, element: ElementId);

    fn unobserve(&mut self, watcher: WatcherId, element: ElementId);

    /// Stop the watcher and drop every observation it holds
    fn disconnect(&mut self, watcher: WatcherId);
}
