use proptest::prelude::*;
use slotmap::SlotMap;

use scrollwatch_core::{
    CalibrationPhase, Direction, ElementId, Rect, WatchState, WatcherId,
};
use scrollwatch_engine::anchor::{pin_offset, preserve_displacement, preserve_offset};
use scrollwatch_engine::band::{position_of, BandSide, Classification, RootMargin};
use scrollwatch_engine::{
    AnchorElement, AnchorGeometry, AnchorRepositioner, Calibration, Crossing, ElementRegistry,
    IntersectionEntry, ObservationPoint, PointSet, PointSpec, RenderedItem, ScrollHost, WatchSet,
    Watcher, WatcherSpec,
};

const H: f32 = 400.0;
const ITEM: f32 = 50.0;
const EPS: f32 = 0.01;

fn container() -> Rect {
    Rect::new(0.0, 0.0, 320.0, H)
}

fn item_at(top: f32) -> Rect {
    Rect::new(0.0, top, 320.0, ITEM)
}

/// Host with a fixed container that only tracks watchers
#[derive(Default)]
struct BandHost {
    watchers: SlotMap<WatcherId, WatcherSpec>,
    disconnected: usize,
}

impl ScrollHost for BandHost {
    fn container_rect(&self) -> Option<Rect> {
        Some(container())
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
    fn observe(&mut self, _watcher: WatcherId, _element: ElementId) {}
    fn unobserve(&mut self, _watcher: WatcherId, _element: ElementId) {}
    fn disconnect(&mut self, watcher: WatcherId) {
        self.watchers.remove(watcher);
        self.disconnected += 1;
    }
}

/// Host with one laid-out item and a writable scroll offset
struct LayoutHost {
    scroll_top: f32,
    list_offset_top: f32,
    element_offset_top: f32,
}

impl ScrollHost for LayoutHost {
    fn container_rect(&self) -> Option<Rect> {
        Some(container())
    }
    fn list_offset_top(&self) -> Option<f32> {
        Some(self.list_offset_top)
    }
    fn element_offset_top(&self, _element: ElementId) -> Option<f32> {
        Some(self.element_offset_top)
    }
    fn rendered_items(&self) -> Vec<RenderedItem> {
        Vec::new()
    }
    fn scroll_top(&self) -> f32 {
        self.scroll_top
    }
    fn set_scroll_top(&mut self, offset: f32) {
        self.scroll_top = offset;
    }
    fn create_watcher(&mut self, _spec: &WatcherSpec) -> WatcherId {
        WatcherId::default()
    }
    fn observe(&mut self, _watcher: WatcherId, _element: ElementId) {}
    fn unobserve(&mut self, _watcher: WatcherId, _element: ElementId) {}
    fn disconnect(&mut self, _watcher: WatcherId) {}
}

/// Threshold state a [0, 1] watcher reports changes of
fn threshold_state(entry: &IntersectionEntry) -> (bool, bool) {
    (
        entry.is_intersecting,
        entry.is_intersecting && entry.ratio >= 1.0 - EPS,
    )
}

/// One item moved past one point, entries delivered on threshold changes
struct Sweep {
    host: BandHost,
    set: WatchSet,
    points: PointSet,
    element: ElementId,
    states: Vec<(Watcher, (bool, bool))>,
    crossings: Vec<Crossing>,
}

impl Sweep {
    fn new(spec: PointSpec, start: f32) -> Self {
        let mut points = PointSet::new();
        points.register(ObservationPoint::new(spec));

        let mut host = BandHost::default();
        let mut set = WatchSet::new();
        set.install(&mut host, &points, 1.0)
            .expect("container has geometry");

        let mut elements: SlotMap<ElementId, ()> = SlotMap::with_key();
        let element = elements.insert(());
        let mut registry = ElementRegistry::new();
        registry.register("0", element);
        set.attach(&mut host, &registry);

        let mut sweep = Sweep {
            host,
            set,
            points,
            element,
            states: Vec::new(),
            crossings: Vec::new(),
        };
        let watchers = sweep.set.watchers().to_vec();
        for watcher in watchers {
            let entry = sweep.entry(&watcher, start);
            sweep.states.push((watcher, threshold_state(&entry)));
            sweep.deliver(&entry, Direction::Up);
        }
        sweep
    }

    fn entry(&self, watcher: &Watcher, top: f32) -> IntersectionEntry {
        let band = watcher.margin.apply(&container());
        let item = item_at(top);
        IntersectionEntry {
            watcher: watcher.id,
            element: self.element,
            bounding_rect: item,
            root_bounds: band,
            ratio: item.intersection_ratio(&band),
            is_intersecting: item.intersects(&band),
        }
    }

    fn deliver(&mut self, entry: &IntersectionEntry, direction: Direction) {
        if let Some(crossing) = self.set.process(entry, direction, &self.points, EPS) {
            self.crossings.push(crossing);
        }
    }

    fn move_to(&mut self, from: f32, to: f32) {
        let direction = match Direction::from_delta(to - from) {
            Some(direction) => direction,
            None => return,
        };
        for index in 0..self.states.len() {
            let (watcher, previous) = self.states[index];
            let entry = self.entry(&watcher, to);
            let state = threshold_state(&entry);
            if state != previous {
                self.states[index].1 = state;
                self.deliver(&entry, direction);
            }
        }
    }

    fn follow(&mut self, positions: &[f32]) {
        for pair in positions.windows(2) {
            self.move_to(pair[0], pair[1]);
        }
    }

    /// Deliver every watcher's entry at `top` whether or not it changed
    fn redeliver(&mut self, top: f32, direction: Direction) {
        for index in 0..self.states.len() {
            let watcher = self.states[index].0;
            let entry = self.entry(&watcher, top);
            self.deliver(&entry, direction);
        }
    }
}

/// Point whose line sits at container-local `line`
fn spec_for(line: i32, from_top: bool) -> PointSpec {
    if from_top {
        PointSpec::top(-line as f32)
    } else {
        PointSpec::bottom(H - line as f32)
    }
}

fn monotone_path(start: i32, end: i32, step: i32) -> Vec<f32> {
    let mut positions = vec![start];
    let mut current = start;
    while current != end {
        current = if end > current {
            (current + step).min(end)
        } else {
            (current - step).max(end)
        };
        positions.push(current);
    }
    positions.into_iter().map(|p| p as f32).collect()
}

fn side_of(top: f32, line: f32) -> Classification {
    position_of(&item_at(top), line)
}

proptest! {
    #[test]
    fn prop_monotone_sweep_emits_once_per_crossing(
        line in -150i32..=550,
        from_top in any::<bool>(),
        start in -300i32..=700,
        end in -300i32..=700,
        step in 1i32..=10,
    ) {
        let line_y = line as f32;
        let first = side_of(start as f32, line_y);
        let last = side_of(end as f32, line_y);
        prop_assume!(first != Classification::Through && last != Classification::Through);

        let positions = monotone_path(start, end, step);
        let mut sweep = Sweep::new(spec_for(line, from_top), positions[0]);
        sweep.follow(&positions);

        let emitted: Vec<Classification> =
            sweep.crossings.iter().map(|c| c.classification).collect();
        if first == last {
            prop_assert!(emitted.is_empty(), "spurious crossings {:?}", emitted);
        } else {
            prop_assert_eq!(emitted, vec![last]);
            let expected = if end > start { Direction::Down } else { Direction::Up };
            prop_assert_eq!(sweep.crossings[0].direction, expected);
        }
    }

    #[test]
    fn prop_fluctuation_on_one_side_is_silent(
        line in -150i32..=550,
        from_top in any::<bool>(),
        above in any::<bool>(),
        offsets in prop::collection::vec(0i32..=250, 2..40),
    ) {
        let positions: Vec<f32> = offsets
            .iter()
            .map(|offset| {
                if above {
                    (line - ITEM as i32 - offset) as f32
                } else {
                    (line + offset) as f32
                }
            })
            .collect();

        let mut sweep = Sweep::new(spec_for(line, from_top), positions[0]);
        sweep.follow(&positions);
        prop_assert!(sweep.crossings.is_empty(), "{:?}", sweep.crossings);
    }

    #[test]
    fn prop_repeated_entries_are_suppressed(
        line in 60i32..=340,
        from_top in any::<bool>(),
        repeats in 1usize..8,
    ) {
        // Wholly above the line to wholly below it
        let start = line - ITEM as i32 - 20;
        let end = line + 20;
        let positions = monotone_path(start, end, 5);

        let mut sweep = Sweep::new(spec_for(line, from_top), positions[0]);
        sweep.follow(&positions);
        prop_assert_eq!(sweep.crossings.len(), 1);

        for _ in 0..repeats {
            sweep.redeliver(end as f32, Direction::Down);
        }
        prop_assert_eq!(sweep.crossings.len(), 1);
    }

    #[test]
    fn prop_pin_offset_reference_symmetry(
        d in -500i32..=500,
        height in 100i32..=1000,
        list_offset in 0i32..=200,
        element_offset in 0i32..=5000,
    ) {
        let geometry = AnchorGeometry {
            container_height: height as f32,
            list_offset_top: list_offset as f32,
            element_offset_top: element_offset as f32,
        };
        let top = pin_offset(&PointSpec::top(d as f32), &geometry);
        let bottom = pin_offset(&PointSpec::bottom((d + height) as f32), &geometry);
        prop_assert!((top - bottom).abs() < 1e-3, "{} != {}", top, bottom);
    }

    #[test]
    fn prop_preserve_reissue_is_identity(
        scroll_top in -1000.0f32..5000.0,
        list_offset in 0.0f32..200.0,
        element_offset in 0.0f32..5000.0,
    ) {
        let geometry = AnchorGeometry {
            container_height: H,
            list_offset_top: list_offset,
            element_offset_top: element_offset,
        };
        let displacement = preserve_displacement(scroll_top, &geometry);
        let reissued = preserve_offset(displacement, &geometry);
        prop_assert!((reissued - scroll_top).abs() < 1e-2);
    }

    #[test]
    fn prop_repositioner_reissue_is_identity(
        scroll_top in -1000.0f32..5000.0,
        list_offset in 0.0f32..200.0,
        element_offset in 0.0f32..5000.0,
    ) {
        let mut host = LayoutHost {
            scroll_top,
            list_offset_top: list_offset,
            element_offset_top: element_offset,
        };
        let mut elements: SlotMap<ElementId, ()> = SlotMap::with_key();
        let mut registry = ElementRegistry::new();
        registry.register("3", elements.insert(()));
        let points = PointSet::new();
        let anchor = AnchorElement::preserve("3");
        let mut repositioner = AnchorRepositioner::new();

        repositioner.snapshot(&host, &registry, &anchor).unwrap();
        repositioner.request();
        let applied = repositioner
            .apply(&mut host, &registry, &points, &anchor)
            .unwrap()
            .unwrap();
        prop_assert!((applied - scroll_top).abs() < 1e-2, "applied {} != {}", applied, scroll_top);

        for _ in 0..2 {
            let offset = repositioner
                .compute_offset(&host, &registry, &points, &anchor)
                .unwrap();
            prop_assert!((offset - scroll_top).abs() < 1e-2, "reissued {} != {}", offset, scroll_top);
        }
    }

    #[test]
    fn prop_calibration_measures_once(
        distortion in 1.05f32..2.0,
        margin in 20.0f32..300.0,
        samples in 1usize..20,
    ) {
        let watcher = Watcher {
            id: WatcherId::default(),
            point: Default::default(),
            side: BandSide::BelowLine,
            margin: RootMargin::new(-margin, 0.0),
        };
        let entry = IntersectionEntry {
            watcher: watcher.id,
            element: ElementId::default(),
            bounding_rect: item_at(0.0),
            root_bounds: watcher.margin.scaled(distortion).apply(&container()),
            ratio: 0.0,
            is_intersecting: false,
        };

        let mut calibration = Calibration::default();
        let triggered = (0..samples)
            .filter(|_| calibration.sample(&watcher, &entry, &container()))
            .count();

        prop_assert_eq!(triggered, 1);
        prop_assert_eq!(calibration.phase(), CalibrationPhase::Calibrating);
        prop_assert!((calibration.factor() - distortion).abs() < 1e-3);

        // The corrected margin comes out of the host as requested
        let corrected = margin * calibration.correction() * distortion;
        prop_assert!((corrected - margin).abs() < 0.5);
    }

    #[test]
    fn prop_teardown_is_idempotent(
        lines in prop::collection::vec(-150i32..=550, 0..5),
        teardowns in 1usize..5,
    ) {
        let points: PointSet = lines
            .iter()
            .map(|line| ObservationPoint::new(spec_for(*line, false)))
            .collect();
        let mut host = BandHost::default();
        let mut set = WatchSet::new();
        let installed = set.install(&mut host, &points, 1.0).expect("container has geometry");

        for _ in 0..teardowns {
            set.teardown(&mut host);
        }

        prop_assert_eq!(set.state(), WatchState::TornDown);
        prop_assert!(set.is_empty());
        prop_assert_eq!(host.disconnected, installed);
        prop_assert!(host.watchers.is_empty());
    }
}
