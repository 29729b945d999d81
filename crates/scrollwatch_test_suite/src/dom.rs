//! Headless scroll container
//!
//! `SimulatedDom` lays out fixed-height items in a vertical scroll
//! container, with a loading indicator above and below the list, and
//! implements [`ScrollHost`] on top of it. Its intersection watchers behave
//! like a browser's with `[0, 1]` thresholds: one initial entry when an
//! element is observed, then one entry whenever the element starts or stops
//! intersecting the band, or becomes fully contained or stops being so.
//!
//! Entries and scroll events are queued; the scenario driver drains them
//! with [`SimulatedDom::take_entries`] and
//! [`SimulatedDom::take_scroll_events`].

use indexmap::IndexMap;
use slotmap::SlotMap;

use scrollwatch_core::{ElementId, Rect, WatcherId};
use scrollwatch_engine::{IntersectionEntry, RenderedItem, ScrollHost, WatcherSpec};

/// Ratio counted as "fully contained" by the simulated watchers
const FULL_RATIO: f32 = 0.99;

/// Fixed layout of the simulated page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomLayout {
    /// Scroll container rect in page coordinates
    pub container: Rect,
    pub item_height: f32,
    /// Height of the loading indicator rendered above the list
    pub loader_top: f32,
    /// Height of the loading indicator rendered below the list
    pub loader_bottom: f32,
}

impl Default for DomLayout {
    fn default() -> Self {
        Self {
            container: Rect::new(0.0, 80.0, 320.0, 400.0),
            item_height: 50.0,
            loader_top: 40.0,
            loader_bottom: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThresholdState {
    intersecting: bool,
    full: bool,
}

impl ThresholdState {
    fn of(entry: &IntersectionEntry) -> Self {
        Self {
            intersecting: entry.is_intersecting,
            full: entry.is_intersecting && entry.ratio >= FULL_RATIO,
        }
    }
}

#[derive(Debug)]
struct SimWatcher {
    spec: WatcherSpec,
    observed: IndexMap<ElementId, ThresholdState>,
}

#[derive(Debug)]
pub struct SimulatedDom {
    layout: DomLayout,
    /// Element keys, alive while rendered
    elements: SlotMap<ElementId, String>,
    /// Rendered elements in list order
    order: Vec<ElementId>,
    scroll_top: f32,
    /// Factor the "display" applies to every root margin
    dpr_distortion: f32,
    /// Container detached from the page: no geometry
    detached: bool,
    watchers: SlotMap<WatcherId, SimWatcher>,
    entries: Vec<IntersectionEntry>,
    scroll_events: usize,
}

impl Default for SimulatedDom {
    fn default() -> Self {
        Self::new(DomLayout::default())
    }
}

impl SimulatedDom {
    pub fn new(layout: DomLayout) -> Self {
        Self {
            layout,
            elements: SlotMap::with_key(),
            order: Vec::new(),
            scroll_top: 0.0,
            dpr_distortion: 1.0,
            detached: false,
            watchers: SlotMap::with_key(),
            entries: Vec::new(),
            scroll_events: 0,
        }
    }

    /// Distort every root margin by `factor`, like sub-pixel rounding on a
    /// high-DPR display
    pub fn with_dpr_distortion(mut self, factor: f32) -> Self {
        self.dpr_distortion = factor;
        self
    }

    pub fn layout(&self) -> &DomLayout {
        &self.layout
    }

    pub fn set_detached(&mut self, detached: bool) {
        self.detached = detached;
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Commit a render of `keys`, reusing the elements of keys that stay
    pub fn render<S: AsRef<str>>(&mut self, keys: &[S]) {
        let previous: IndexMap<String, ElementId> = self
            .order
            .iter()
            .filter_map(|id| self.elements.get(*id).map(|key| (key.clone(), *id)))
            .collect();

        let mut order = Vec::with_capacity(keys.len());
        let mut reused = Vec::new();
        for key in keys {
            let key = key.as_ref();
            let id = match previous.get(key) {
                Some(id) if !reused.contains(id) => *id,
                _ => self.elements.insert(key.to_string()),
            };
            reused.push(id);
            order.push(id);
        }

        for id in previous.values() {
            if !order.contains(id) {
                self.elements.remove(*id);
            }
        }
        self.order = order;

        // The browser clamps the offset when the content shrinks
        let clamped = self.scroll_top.clamp(0.0, self.max_scroll_top());
        if clamped != self.scroll_top {
            self.scroll_top = clamped;
            self.scroll_events += 1;
        }

        tracing::trace!(items = self.order.len(), "simulated render committed");
        self.refresh();
    }

    pub fn content_height(&self) -> f32 {
        self.layout.loader_top
            + self.order.len() as f32 * self.layout.item_height
            + self.layout.loader_bottom
    }

    pub fn max_scroll_top(&self) -> f32 {
        (self.content_height() - self.layout.container.height()).max(0.0)
    }

    /// A user scroll by `delta` pixels of content
    pub fn scroll_by(&mut self, delta: f32) {
        self.set_scroll_top(self.scroll_top + delta);
    }

    // ========================================================================
    // Geometry queries
    // ========================================================================

    pub fn element_of(&self, key: &str) -> Option<ElementId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.elements.get(*id).is_some_and(|k| k == key))
    }

    pub fn key_of(&self, element: ElementId) -> Option<&str> {
        self.elements.get(element).map(String::as_str)
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        let index = self.order.iter().position(|id| *id == element)?;
        let container = &self.layout.container;
        let top = container.top() + self.layout.loader_top
            + index as f32 * self.layout.item_height
            - self.scroll_top;
        Some(Rect::new(
            container.x(),
            top,
            container.width(),
            self.layout.item_height,
        ))
    }

    /// Item top relative to the container's top edge
    pub fn top_in_container(&self, key: &str) -> Option<f32> {
        let rect = self.element_rect(self.element_of(key)?)?;
        Some(rect.top() - self.layout.container.top())
    }

    /// Key of the first item whose bottom is below the container top
    pub fn topmost_visible_key(&self) -> Option<&str> {
        let container_top = self.layout.container.top();
        self.order
            .iter()
            .find(|id| {
                self.element_rect(**id)
                    .is_some_and(|rect| rect.bottom() > container_top)
            })
            .and_then(|id| self.key_of(*id))
    }

    pub fn rendered_keys(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(*id).cloned())
            .collect()
    }

    // ========================================================================
    // Watchers
    // ========================================================================

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn observation_count(&self) -> usize {
        self.watchers.values().map(|w| w.observed.len()).sum()
    }

    /// The band a watcher really uses, distortion included
    fn band(&self, spec: &WatcherSpec) -> Rect {
        spec.root_margin
            .scaled(self.dpr_distortion)
            .apply(&self.layout.container)
    }

    fn entry(&self, watcher: WatcherId, spec: &WatcherSpec, element: ElementId) -> Option<IntersectionEntry> {
        let item = self.element_rect(element)?;
        let band = self.band(spec);
        Some(IntersectionEntry {
            watcher,
            element,
            bounding_rect: item,
            root_bounds: band,
            ratio: item.intersection_ratio(&band),
            is_intersecting: item.intersects(&band),
        })
    }

    /// Queue an entry for every observation whose threshold state changed
    fn refresh(&mut self) {
        let mut changed = Vec::new();
        for (id, watcher) in self.watchers.iter() {
            for (element, state) in &watcher.observed {
                if let Some(entry) = self.entry(id, &watcher.spec, *element) {
                    let next = ThresholdState::of(&entry);
                    if next != *state {
                        changed.push((id, *element, next, entry));
                    }
                }
            }
        }

        for (id, element, next, entry) in changed {
            if let Some(watcher) = self.watchers.get_mut(id) {
                watcher.observed.insert(element, next);
            }
            self.entries.push(entry);
        }
    }

    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn take_scroll_events(&mut self) -> usize {
        std::mem::take(&mut self.scroll_events)
    }
}

impl ScrollHost for SimulatedDom {
    fn container_rect(&self) -> Option<Rect> {
        (!self.detached).then_some(self.layout.container)
    }

    fn list_offset_top(&self) -> Option<f32> {
        (!self.detached).then_some(self.layout.loader_top)
    }

    fn element_offset_top(&self, element: ElementId) -> Option<f32> {
        let index = self.order.iter().position(|id| *id == element)?;
        Some(index as f32 * self.layout.item_height)
    }

    fn rendered_items(&self) -> Vec<RenderedItem> {
        self.order
            .iter()
            .filter_map(|id| {
                self.elements
                    .get(*id)
                    .map(|key| RenderedItem::new(*id, key.clone()))
            })
            .collect()
    }

    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, offset: f32) {
        let clamped = offset.clamp(0.0, self.max_scroll_top());
        if clamped == self.scroll_top {
            return;
        }
        self.scroll_top = clamped;
        self.scroll_events += 1;
        self.refresh();
    }

    fn create_watcher(&mut self, spec: &WatcherSpec) -> WatcherId {
        self.watchers.insert(SimWatcher {
            spec: spec.clone(),
            observed: IndexMap::new(),
        })
    }

    fn observe(&mut self, watcher: WatcherId, element: ElementId) {
        let Some(spec) = self.watchers.get(watcher).map(|w| w.spec.clone()) else {
            return;
        };
        let Some(entry) = self.entry(watcher, &spec, element) else {
            return;
        };
        if let Some(sim) = self.watchers.get_mut(watcher) {
            if sim.observed.contains_key(&element) {
                return;
            }
            sim.observed.insert(element, ThresholdState::of(&entry));
            self.entries.push(entry);
        }
    }

    fn unobserve(&mut self, watcher: WatcherId, element: ElementId) {
        if let Some(sim) = self.watchers.get_mut(watcher) {
            sim.observed.shift_remove(&element);
        }
    }

    fn disconnect(&mut self, watcher: WatcherId) {
        self.watchers.remove(watcher);
        self.entries.retain(|entry| entry.watcher != watcher);
    }
}
