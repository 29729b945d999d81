//! Observation set manager
//!
//! Owns the live intersection watchers of one container and the elements
//! they observe. The set is never patched: whenever container geometry or
//! the rendered item list may have changed it is torn down and installed
//! again from scratch.
//!
//! Entries from the host pass through [`WatchSet::process`], which
//!
//! 1. drops entries of watchers or elements it no longer tracks,
//! 2. treats the first entry per watcher and element as priming (it records
//!    which side of the line the element sits on and reports nothing),
//! 3. classifies the rest, and
//! 4. suppresses a classification equal to the last one recorded for the
//!    same point and element. Both watchers of a point see the same
//!    crossing, so this keeps it to one emission.

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use scrollwatch_core::{
    dispatch, watch_events, Direction, ElementId, EngineError, PointId, Result, WatchState,
    WatcherId,
};

use crate::band::{
    classify, margins_for, position_of, BandSide, Classification, ClassifyOptions, RootMargin,
};
use crate::host::ScrollHost;
use crate::intersection::{Crossing, IntersectionEntry, WatcherSpec};
use crate::point::PointSet;
use crate::registry::ElementRegistry;

/// One installed watcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Watcher {
    pub id: WatcherId,
    pub point: PointId,
    pub side: BandSide,
    /// Margin as handed to the host, calibration included
    pub margin: RootMargin,
}

impl Watcher {
    /// The margin on the line edge, the one calibration measures
    pub fn requested_margin(&self) -> f32 {
        self.margin.line_margin(self.side)
    }
}

/// Live watchers plus the elements they observe
#[derive(Debug, Default)]
pub struct WatchSet {
    state: WatchState,
    watchers: SmallVec<[Watcher; 4]>,
    /// Observed elements and their keys, in attach order
    observed: IndexMap<ElementId, Rc<str>>,
    primed: FxHashSet<(WatcherId, ElementId)>,
    last: FxHashMap<(PointId, ElementId), Classification>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Create the watchers for every point
    ///
    /// A set that is still live is torn down first. Fails only when the
    /// container has no geometry yet, in which case the set stays empty.
    pub fn install<H: ScrollHost + ?Sized>(
        &mut self,
        host: &mut H,
        points: &PointSet,
        correction: f32,
    ) -> Result<usize> {
        if self.state.is_live() {
            tracing::warn!("install on a live watch set, tearing it down first");
            self.teardown(host);
        }

        let container = host
            .container_rect()
            .ok_or(EngineError::GeometryUnavailable("container rect"))?;

        for (point_id, point) in points.iter() {
            for (side, margin) in margins_for(&point.spec(), container.height(), correction) {
                let spec = WatcherSpec::new(point_id, side, margin);
                let id = host.create_watcher(&spec);
                self.watchers.push(Watcher {
                    id,
                    point: point_id,
                    side,
                    margin,
                });
            }
        }

        dispatch(&mut self.state, watch_events::INSTALL);
        tracing::debug!(
            watchers = self.watchers.len(),
            points = points.len(),
            correction,
            "watch set installed"
        );
        Ok(self.watchers.len())
    }

    /// Observe the elements of the last render
    ///
    /// Elements already observed are skipped and elements that are no
    /// longer rendered are released, so calling this after every render is
    /// safe. Returns the number of newly observed elements. Does nothing on
    /// a set that is not installed.
    pub fn attach<H: ScrollHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &ElementRegistry,
    ) -> usize {
        if !self.state.is_live() {
            tracing::trace!(state = ?self.state, "attach skipped, watch set not installed");
            return 0;
        }

        let stale: Vec<ElementId> = self
            .observed
            .keys()
            .filter(|element| registry.key_of(**element).is_none())
            .copied()
            .collect();
        for element in stale {
            self.release(host, element);
        }

        let mut added = 0;
        for (key, element) in registry.iter() {
            if self.observed.contains_key(&element) {
                continue;
            }
            for watcher in &self.watchers {
                host.observe(watcher.id, element);
            }
            self.observed.insert(element, key.clone());
            added += 1;
        }

        dispatch(&mut self.state, watch_events::ATTACH);
        tracing::trace!(added, observed = self.observed.len(), "watch set attached");
        added
    }

    fn release<H: ScrollHost + ?Sized>(&mut self, host: &mut H, element: ElementId) {
        for watcher in &self.watchers {
            host.unobserve(watcher.id, element);
            self.primed.remove(&(watcher.id, element));
        }
        self.observed.shift_remove(&element);
        self.last.retain(|(_, observed), _| *observed != element);
    }

    /// Disconnect every watcher and forget all observation state
    ///
    /// Safe on a set that was never installed or is already torn down.
    pub fn teardown<H: ScrollHost + ?Sized>(&mut self, host: &mut H) {
        for watcher in self.watchers.drain(..) {
            host.disconnect(watcher.id);
        }
        self.observed.clear();
        self.primed.clear();
        self.last.clear();

        if dispatch(&mut self.state, watch_events::TEARDOWN) {
            tracing::debug!("watch set torn down");
        }
    }

    /// Classify one host entry
    pub fn process(
        &mut self,
        entry: &IntersectionEntry,
        direction: Direction,
        points: &PointSet,
        ratio_epsilon: f32,
    ) -> Option<Crossing> {
        let Some(watcher) = self.watcher(entry.watcher).copied() else {
            tracing::trace!(watcher = ?entry.watcher, "entry from a disconnected watcher");
            return None;
        };
        let key = self.observed.get(&entry.element)?.clone();
        let slot = (watcher.point, entry.element);

        tracing::trace!(
            key = %key,
            side = ?watcher.side,
            ratio = entry.ratio,
            intersecting = entry.is_intersecting,
            %direction,
            "intersection entry"
        );

        if self.primed.insert((watcher.id, entry.element)) {
            let line = watcher.side.line_of(&entry.root_bounds);
            self.last
                .entry(slot)
                .or_insert_with(|| position_of(&entry.bounding_rect, line));
            return None;
        }

        let point = points.get(watcher.point)?;
        let options = ClassifyOptions {
            ratio_epsilon,
            report_through: point.reports_through(),
        };
        let classification = classify(entry, watcher.side, direction, &options)?;

        if self.last.get(&slot) == Some(&classification) {
            tracing::trace!(key = %key, %classification, "repeated classification suppressed");
            return None;
        }
        self.last.insert(slot, classification);

        Some(Crossing {
            point: watcher.point,
            element: entry.element,
            key,
            direction,
            classification,
        })
    }

    pub fn watcher(&self, id: WatcherId) -> Option<&Watcher> {
        self.watchers.iter().find(|watcher| watcher.id == id)
    }

    pub fn watchers(&self) -> &[Watcher] {
        &self.watchers
    }

    /// Watchers derived from one point
    pub fn watchers_for(&self, point: PointId) -> impl Iterator<Item = &Watcher> {
        self.watchers.iter().filter(move |watcher| watcher.point == point)
    }

    pub fn is_observing(&self, element: ElementId) -> bool {
        self.observed.contains_key(&element)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Last classification recorded for an element at a point
    pub fn last_classification(&self, point: PointId, element: ElementId) -> Option<Classification> {
        self.last.get(&(point, element)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty() && self.observed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RenderedItem;
    use crate::point::ObservationPoint;
    use scrollwatch_core::Rect;
    use slotmap::SlotMap;

    /// Host that only records watcher bookkeeping
    #[derive(Default)]
    struct RecordingHost {
        container: Option<Rect>,
        watchers: SlotMap<WatcherId, WatcherSpec>,
        observations: Vec<(WatcherId, ElementId)>,
        disconnected: Vec<WatcherId>,
    }

    impl ScrollHost for RecordingHost {
        fn container_rect(&self) -> Option<Rect> {
            self.container
        }
        fn list_offset_top(&self) -> Option<f32> {
            Some(0.0)
        }
        fn element_offset_top(&self, _element: ElementId) -> Option<f32> {
            None
        }
        fn rendered_items(&self) -> Vec<RenderedItem> {
            Vec::new()
        }
        fn scroll_top(&self) -> f32 {
            0.0
        }
        fn set_scroll_top(&mut self, _offset: f32) {}
        fn create_watcher(&mut self, spec: &WatcherSpec) -> WatcherId {
            self.watchers.insert(spec.clone())
        }
        fn observe(&mut self, watcher: WatcherId, element: ElementId) {
            self.observations.push((watcher, element));
        }
        fn unobserve(&mut self, watcher: WatcherId, element: ElementId) {
            self.observations.retain(|o| *o != (watcher, element));
        }
        fn disconnect(&mut self, watcher: WatcherId) {
            self.observations.retain(|(w, _)| *w != watcher);
            self.disconnected.push(watcher);
        }
    }

    fn host() -> RecordingHost {
        RecordingHost {
            container: Some(Rect::new(0.0, 0.0, 320.0, 400.0)),
            ..Default::default()
        }
    }

    fn registry_with(keys: &[&str]) -> (ElementRegistry, Vec<ElementId>) {
        let mut elements: SlotMap<ElementId, ()> = SlotMap::with_key();
        let ids: Vec<ElementId> = keys.iter().map(|_| elements.insert(())).collect();
        let items: Vec<RenderedItem> = keys
            .iter()
            .zip(&ids)
            .map(|(key, id)| RenderedItem::new(*id, *key))
            .collect();
        let mut registry = ElementRegistry::new();
        registry.rebuild(&items);
        (registry, ids)
    }

    fn entry(watcher: &Watcher, element: ElementId, top: f32) -> IntersectionEntry {
        let band = watcher.margin.apply(&Rect::new(0.0, 0.0, 320.0, 400.0));
        let item = Rect::new(0.0, top, 320.0, 50.0);
        IntersectionEntry {
            watcher: watcher.id,
            element,
            bounding_rect: item,
            root_bounds: band,
            ratio: item.intersection_ratio(&band),
            is_intersecting: item.intersects(&band),
        }
    }

    #[test]
    fn test_install_pairs_per_inside_point() {
        let points: PointSet = [ObservationPoint::bottom(100.0), ObservationPoint::top(40.0)]
            .into_iter()
            .collect();
        let mut host = host();
        let mut set = WatchSet::new();

        assert_eq!(set.install(&mut host, &points, 1.0), Ok(3));
        assert_eq!(set.state(), WatchState::Installed);
        assert_eq!(host.watchers.len(), 3);
    }

    #[test]
    fn test_install_without_geometry_fails_cleanly() {
        let points: PointSet = [ObservationPoint::bottom(100.0)].into_iter().collect();
        let mut host = RecordingHost::default();
        let mut set = WatchSet::new();

        assert!(matches!(
            set.install(&mut host, &points, 1.0),
            Err(EngineError::GeometryUnavailable(_))
        ));
        assert_eq!(set.state(), WatchState::Uninstalled);
        assert!(set.is_empty());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let points: PointSet = [ObservationPoint::bottom(100.0)].into_iter().collect();
        let (registry, _) = registry_with(&["0", "1", "2"]);
        let mut host = host();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0).ok();

        assert_eq!(set.attach(&mut host, &registry), 3);
        assert_eq!(set.attach(&mut host, &registry), 0);
        assert_eq!(host.observations.len(), 6);
        assert_eq!(set.state(), WatchState::Attached);
    }

    #[test]
    fn test_attach_releases_unrendered_elements() {
        let points: PointSet = [ObservationPoint::bottom(100.0)].into_iter().collect();
        let (registry, ids) = registry_with(&["0", "1"]);
        let mut host = host();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0).ok();
        set.attach(&mut host, &registry);

        let mut shrunk = ElementRegistry::new();
        shrunk.register("1", ids[1]);
        set.attach(&mut host, &shrunk);

        assert!(!set.is_observing(ids[0]));
        assert!(set.is_observing(ids[1]));
        assert_eq!(host.observations.len(), 2);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut host = host();
        let mut set = WatchSet::new();
        set.teardown(&mut host);
        assert_eq!(set.state(), WatchState::Uninstalled);

        let points: PointSet = [ObservationPoint::bottom(100.0)].into_iter().collect();
        set.install(&mut host, &points, 1.0).ok();
        set.teardown(&mut host);
        set.teardown(&mut host);
        assert_eq!(set.state(), WatchState::TornDown);
        assert!(set.is_empty());
        assert_eq!(host.disconnected.len(), 2);
    }

    #[test]
    fn test_attach_on_torn_down_set_does_nothing() {
        let (registry, _) = registry_with(&["0"]);
        let mut host = host();
        let mut set = WatchSet::new();
        assert_eq!(set.attach(&mut host, &registry), 0);
        assert!(host.observations.is_empty());
    }

    #[test]
    fn test_first_entry_only_primes() {
        let mut points = PointSet::new();
        let point = points.register(ObservationPoint::bottom(100.0));
        let (registry, ids) = registry_with(&["0"]);
        let mut host = host();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0).ok();
        set.attach(&mut host, &registry);

        let below = *set.watchers_for(point).find(|w| w.side == BandSide::BelowLine).unwrap();
        // Already fully below the line when attached
        let first = entry(&below, ids[0], 320.0);
        assert_eq!(set.process(&first, Direction::Down, &points, 0.01), None);
        assert_eq!(set.last_classification(point, ids[0]), Some(Classification::Below));
    }

    #[test]
    fn test_crossing_seen_by_both_watchers_emits_once() {
        let mut points = PointSet::new();
        let point = points.register(ObservationPoint::bottom(100.0));
        let (registry, ids) = registry_with(&["0"]);
        let mut host = host();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0).ok();
        set.attach(&mut host, &registry);

        let above = *set.watchers_for(point).find(|w| w.side == BandSide::AboveLine).unwrap();
        let below = *set.watchers_for(point).find(|w| w.side == BandSide::BelowLine).unwrap();

        // Primed above the line
        set.process(&entry(&above, ids[0], 200.0), Direction::Down, &points, 0.01);
        set.process(&entry(&below, ids[0], 200.0), Direction::Down, &points, 0.01);

        // Moving down: leaves the above band, fully enters the below band
        let exit = set.process(&entry(&above, ids[0], 320.0), Direction::Down, &points, 0.01);
        let enter = set.process(&entry(&below, ids[0], 320.0), Direction::Down, &points, 0.01);

        let crossing = exit.expect("exit through the line classifies");
        assert_eq!(crossing.classification, Classification::Below);
        assert_eq!(crossing.point, point);
        assert_eq!(&*crossing.key, "0");
        assert_eq!(enter, None);
    }

    #[test]
    fn test_entries_for_unobserved_elements_are_dropped() {
        let points: PointSet = [ObservationPoint::bottom(100.0)].into_iter().collect();
        let (registry, _) = registry_with(&["0"]);
        let (_, strangers) = registry_with(&["x", "y"]);
        let mut host = host();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0).ok();
        set.attach(&mut host, &registry);

        let watcher = set.watchers()[0];
        let stray = entry(&watcher, strangers[1], 320.0);
        assert_eq!(set.process(&stray, Direction::Down, &points, 0.01), None);
    }
}
