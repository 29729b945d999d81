//! Anchor repositioning
//!
//! Keeps one item visually stationary across list mutations, in one of two
//! modes:
//!
//! - **Pin**: put the item's top edge on an observation point's line.
//! - **Preserve**: keep the item wherever it was before the mutation. The
//!   displacement `scroll_top - (list_offset + item_offset)` is snapshotted
//!   from the pre-mutation geometry and reissued against the new geometry.
//!
//! Offsets are computed from layout geometry, so they are only valid once
//! the host has laid out the new render. The container therefore queues the
//! repositioning with [`AnchorRepositioner::request`] and runs it from its
//! after-layout hook through [`AnchorRepositioner::apply`], exactly once.

use std::rc::Rc;

use scrollwatch_core::{EngineError, PointId, Result};

use crate::host::ScrollHost;
use crate::point::{PointSet, PointSpec};
use crate::registry::{selector_key, ElementRegistry};

/// Request to hold one rendered item in place
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorElement {
    /// Item key, or an attribute selector naming it
    pub selector: String,
    /// Pin to this point; `None` preserves the current position
    pub point: Option<PointId>,
}

impl AnchorElement {
    pub fn preserve(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            point: None,
        }
    }

    pub fn pin(selector: impl Into<String>, point: PointId) -> Self {
        Self {
            selector: selector.into(),
            point: Some(point),
        }
    }

    pub fn is_preserve(&self) -> bool {
        self.point.is_none()
    }

    pub fn key(&self) -> &str {
        selector_key(&self.selector)
    }
}

/// Layout geometry of the anchor item at one moment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorGeometry {
    pub container_height: f32,
    /// Offset of the list node inside the scroll content
    pub list_offset_top: f32,
    /// Offset of the item inside the list node
    pub element_offset_top: f32,
}

impl AnchorGeometry {
    /// Read the current geometry of the item `selector` names
    pub fn read<H: ScrollHost + ?Sized>(
        host: &H,
        registry: &ElementRegistry,
        selector: &str,
    ) -> Result<Self> {
        let element = registry.resolve(selector)?;
        let container = host
            .container_rect()
            .ok_or(EngineError::GeometryUnavailable("container rect"))?;
        let list_offset_top = host
            .list_offset_top()
            .ok_or(EngineError::GeometryUnavailable("list offset"))?;
        let element_offset_top = host
            .element_offset_top(element)
            .ok_or(EngineError::GeometryUnavailable("anchor element offset"))?;

        Ok(Self {
            container_height: container.height(),
            list_offset_top,
            element_offset_top,
        })
    }

    /// Offset of the item's top edge inside the scroll content
    pub fn content_offset(&self) -> f32 {
        self.list_offset_top + self.element_offset_top
    }
}

/// Scroll offset placing the item's top edge on the line of `spec`
pub fn pin_offset(spec: &PointSpec, geometry: &AnchorGeometry) -> f32 {
    geometry.content_offset() - spec.line_y(geometry.container_height)
}

/// Displacement of the item from the container top at `scroll_top`
pub fn preserve_displacement(scroll_top: f32, geometry: &AnchorGeometry) -> f32 {
    scroll_top - geometry.content_offset()
}

/// Scroll offset reissuing a preserved displacement against new geometry
pub fn preserve_offset(displacement: f32, geometry: &AnchorGeometry) -> f32 {
    geometry.content_offset() + displacement
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    key: Rc<str>,
    displacement: f32,
}

/// Computes and applies anchor scroll offsets for one container
#[derive(Debug, Default)]
pub struct AnchorRepositioner {
    snapshot: Option<Snapshot>,
    pending: bool,
}

impl AnchorRepositioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the preserve displacement of `anchor` from the current,
    /// pre-mutation geometry
    ///
    /// Pin anchors need no snapshot; their previous one is dropped.
    pub fn snapshot<H: ScrollHost + ?Sized>(
        &mut self,
        host: &H,
        registry: &ElementRegistry,
        anchor: &AnchorElement,
    ) -> Result<Option<f32>> {
        self.snapshot = None;
        if !anchor.is_preserve() {
            return Ok(None);
        }

        let geometry = AnchorGeometry::read(host, registry, &anchor.selector)?;
        let displacement = preserve_displacement(host.scroll_top(), &geometry);
        self.record(anchor.key(), displacement);
        Ok(Some(displacement))
    }

    /// Record a preserve displacement directly
    ///
    /// A displacement of 0 puts the item at the container top, which is
    /// where a preserve anchor starts on mount.
    pub fn record(&mut self, key: &str, displacement: f32) {
        tracing::trace!(key, displacement, "anchor displacement recorded");
        self.snapshot = Some(Snapshot {
            key: Rc::from(key),
            displacement,
        });
    }

    pub fn snapshot_displacement(&self) -> Option<f32> {
        self.snapshot.as_ref().map(|s| s.displacement)
    }

    /// Scroll offset that satisfies `anchor` in the current geometry
    pub fn compute_offset<H: ScrollHost + ?Sized>(
        &self,
        host: &H,
        registry: &ElementRegistry,
        points: &PointSet,
        anchor: &AnchorElement,
    ) -> Result<f32> {
        let geometry = AnchorGeometry::read(host, registry, &anchor.selector)?;
        self.offset_for(&geometry, points, anchor)
    }

    fn offset_for(
        &self,
        geometry: &AnchorGeometry,
        points: &PointSet,
        anchor: &AnchorElement,
    ) -> Result<f32> {
        match anchor.point {
            Some(point) => Ok(pin_offset(&points.resolve(point)?.spec(), geometry)),
            None => {
                let displacement = self
                    .snapshot
                    .as_ref()
                    .filter(|snapshot| &*snapshot.key == anchor.key())
                    .map(|snapshot| snapshot.displacement)
                    .ok_or_else(|| EngineError::AnchorNotSnapshotted(anchor.key().to_string()))?;
                Ok(preserve_offset(displacement, geometry))
            }
        }
    }

    /// Queue repositioning for the next after-layout pass
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop a queued repositioning
    pub fn cancel(&mut self) {
        self.pending = false;
        self.snapshot = None;
    }

    /// Run a queued repositioning
    ///
    /// Returns the offset written, or `None` if nothing was queued. The
    /// request is consumed even when it fails; a later render supplies a
    /// new one. A preserve snapshot survives the write, so the anchor can
    /// be recomputed until the next render replaces it.
    pub fn apply<H: ScrollHost + ?Sized>(
        &mut self,
        host: &mut H,
        registry: &ElementRegistry,
        points: &PointSet,
        anchor: &AnchorElement,
    ) -> Result<Option<f32>> {
        if !std::mem::take(&mut self.pending) {
            return Ok(None);
        }

        let geometry = AnchorGeometry::read(&*host, registry, &anchor.selector)?;
        let offset = self.offset_for(&geometry, points, anchor)?;
        host.set_scroll_top(offset);

        // The item now sits where it was preserved; re-record against the
        // offset the host actually took so later computations agree with it
        if anchor.is_preserve() {
            self.record(anchor.key(), preserve_displacement(host.scroll_top(), &geometry));
        }
        tracing::debug!(key = anchor.key(), offset, "anchor applied");
        Ok(Some(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersection::WatcherSpec;
    use scrollwatch_core::{ElementId, Rect, WatcherId};
    use slotmap::SlotMap;

    /// One laid-out item inside a 400px container
    struct LayoutHost {
        scroll_top: f32,
        element_offset_top: f32,
    }

    impl ScrollHost for LayoutHost {
        fn container_rect(&self) -> Option<Rect> {
            Some(Rect::new(0.0, 0.0, 320.0, 400.0))
        }
        fn list_offset_top(&self) -> Option<f32> {
            Some(40.0)
        }
        fn element_offset_top(&self, _element: ElementId) -> Option<f32> {
            Some(self.element_offset_top)
        }
        fn rendered_items(&self) -> Vec<crate::host::RenderedItem> {
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

    fn registry_with(key: &str) -> ElementRegistry {
        let mut elements: SlotMap<ElementId, ()> = SlotMap::with_key();
        let mut registry = ElementRegistry::new();
        registry.register(key, elements.insert(()));
        registry
    }

    fn geometry(element_offset_top: f32) -> AnchorGeometry {
        AnchorGeometry {
            container_height: 400.0,
            list_offset_top: 40.0,
            element_offset_top,
        }
    }

    #[test]
    fn test_pin_top_zero_puts_item_at_container_top() {
        assert_eq!(pin_offset(&PointSpec::top(0.0), &geometry(150.0)), 190.0);
    }

    #[test]
    fn test_pin_bottom_subtracts_container_height() {
        // Item top on the line 100px above the container bottom
        assert_eq!(pin_offset(&PointSpec::bottom(100.0), &geometry(150.0)), -110.0);
    }

    #[test]
    fn test_pin_reference_symmetry() {
        let g = geometry(500.0);
        for d in [-40.0_f32, 0.0, 25.0, 300.0] {
            assert_eq!(
                pin_offset(&PointSpec::top(d), &g),
                pin_offset(&PointSpec::bottom(d + g.container_height), &g)
            );
        }
    }

    #[test]
    fn test_preserve_round_trip_is_identity() {
        let g = geometry(150.0);
        let displacement = preserve_displacement(230.0, &g);
        assert_eq!(displacement, 40.0);
        assert_eq!(preserve_offset(displacement, &g), 230.0);
    }

    #[test]
    fn test_preserve_follows_shifted_item() {
        let before = geometry(150.0);
        let displacement = preserve_displacement(190.0, &before);
        // Nine 50px items inserted above
        let after = geometry(600.0);
        assert_eq!(preserve_offset(displacement, &after), 640.0);
    }

    #[test]
    fn test_anchor_key() {
        assert_eq!(AnchorElement::preserve(r#"div[data-val="3"]"#).key(), "3");
        assert!(AnchorElement::preserve("3").is_preserve());
    }

    #[test]
    fn test_record_replaces_snapshot() {
        let mut repositioner = AnchorRepositioner::new();
        repositioner.record("3", 0.0);
        repositioner.record("4", -12.0);
        assert_eq!(repositioner.snapshot_displacement(), Some(-12.0));

        repositioner.cancel();
        assert_eq!(repositioner.snapshot_displacement(), None);
        assert!(!repositioner.is_pending());
    }

    #[test]
    fn test_preserve_apply_is_idempotent() {
        let mut host = LayoutHost {
            scroll_top: 300.0,
            element_offset_top: 150.0,
        };
        let registry = registry_with("3");
        let points = PointSet::new();
        let anchor = AnchorElement::preserve("3");
        let mut repositioner = AnchorRepositioner::new();

        assert_eq!(repositioner.snapshot(&host, &registry, &anchor), Ok(Some(110.0)));
        repositioner.request();
        assert_eq!(
            repositioner.apply(&mut host, &registry, &points, &anchor),
            Ok(Some(300.0))
        );

        // Reissuing after the write lands on the same offset, every time
        for _ in 0..2 {
            assert_eq!(
                repositioner.compute_offset(&host, &registry, &points, &anchor),
                Ok(300.0)
            );
        }
        assert_eq!(repositioner.snapshot_displacement(), Some(110.0));
    }

    #[test]
    fn test_preserve_apply_follows_shift_then_holds() {
        let mut host = LayoutHost {
            scroll_top: 190.0,
            element_offset_top: 150.0,
        };
        let registry = registry_with("3");
        let points = PointSet::new();
        let anchor = AnchorElement::preserve("3");
        let mut repositioner = AnchorRepositioner::new();

        repositioner.snapshot(&host, &registry, &anchor).unwrap();
        repositioner.request();
        // Nine 50px items rendered above
        host.element_offset_top = 600.0;
        assert_eq!(
            repositioner.apply(&mut host, &registry, &points, &anchor),
            Ok(Some(640.0))
        );
        assert_eq!(host.scroll_top, 640.0);
        assert_eq!(
            repositioner.compute_offset(&host, &registry, &points, &anchor),
            Ok(640.0)
        );

        // Nothing queued: a second apply is a no-op
        assert_eq!(repositioner.apply(&mut host, &registry, &points, &anchor), Ok(None));
    }

    #[test]
    fn test_missing_snapshot_is_not_a_selector_miss() {
        let host = LayoutHost {
            scroll_top: 0.0,
            element_offset_top: 150.0,
        };
        let registry = registry_with("3");
        let points = PointSet::new();
        let repositioner = AnchorRepositioner::new();

        assert_eq!(
            repositioner.compute_offset(&host, &registry, &points, &AnchorElement::preserve("3")),
            Err(EngineError::AnchorNotSnapshotted("3".to_string()))
        );
        assert_eq!(
            repositioner.compute_offset(&host, &registry, &points, &AnchorElement::preserve("9")),
            Err(EngineError::SelectorMiss("9".to_string()))
        );
    }
}
