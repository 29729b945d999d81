//! Observation points
//!
//! A point is a horizontal reference line inside (or just outside) the
//! scroll container. Its geometry is a [`PointSpec`]: which container edge
//! it is measured from and how far.
//!
//! # Displacement sign
//!
//! Displacement is positive **up** from the reference edge, for both edges.
//! In container-local coordinates (`y = 0` at the container top, growing
//! down, `H` the container height) the line sits at:
//!
//! ```text
//! TOP     d  ->  y = -d        (d > 0: above the container)
//! BOTTOM  d  ->  y = H - d     (d > 0: inside the container)
//! ```
//!
//! So `TOP d` and `BOTTOM d + H` name the same line.
//!
//! Points are registered in a [`PointSet`] which hands out a [`PointId`];
//! two points with identical geometry are still distinct watch sites.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use scrollwatch_core::{EngineError, PointId, Result};

use crate::intersection::Crossing;

/// Displacement used when none (or an unreadable one) is given
pub const DEFAULT_DISPLACEMENT: f32 = 100.0;

/// Container edge a displacement is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reference {
    Top,
    #[default]
    Bottom,
}

impl Reference {
    /// Parse `top` / `bottom` (any case) or the numeric forms `1` / `2`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" | "1" => Some(Reference::Top),
            "bottom" | "2" => Some(Reference::Bottom),
            _ => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Top => f.write_str("top"),
            Reference::Bottom => f.write_str("bottom"),
        }
    }
}

/// Geometry of an observation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointSpec {
    pub reference: Reference,
    pub displacement: f32,
}

impl Default for PointSpec {
    fn default() -> Self {
        Self {
            reference: Reference::Bottom,
            displacement: DEFAULT_DISPLACEMENT,
        }
    }
}

impl PointSpec {
    pub fn new(reference: Reference, displacement: f32) -> Self {
        Self {
            reference,
            displacement,
        }
    }

    pub fn top(displacement: f32) -> Self {
        Self::new(Reference::Top, displacement)
    }

    pub fn bottom(displacement: f32) -> Self {
        Self::new(Reference::Bottom, displacement)
    }

    /// Container-local Y of the reference line
    pub fn line_y(&self, container_height: f32) -> f32 {
        match self.reference {
            Reference::Top => -self.displacement,
            Reference::Bottom => container_height - self.displacement,
        }
    }
}

impl fmt::Display for PointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:+}", self.reference, self.displacement)
    }
}

/// Handler invoked for every classified crossing of a point
pub type CrossingCallback = Rc<dyn Fn(&Crossing)>;

/// A configured watch site
#[derive(Clone)]
pub struct ObservationPoint {
    spec: PointSpec,
    report_through: bool,
    callback: Option<CrossingCallback>,
}

impl fmt::Debug for ObservationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservationPoint")
            .field("spec", &self.spec)
            .field("report_through", &self.report_through)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ObservationPoint {
    pub fn new(spec: PointSpec) -> Self {
        Self {
            spec,
            report_through: false,
            callback: None,
        }
    }

    pub fn top(displacement: f32) -> Self {
        Self::new(PointSpec::top(displacement))
    }

    pub fn bottom(displacement: f32) -> Self {
        Self::new(PointSpec::bottom(displacement))
    }

    /// Set the crossing handler
    pub fn on_crossing<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Crossing) + 'static,
    {
        self.callback = Some(Rc::new(callback));
        self
    }

    /// Also report items that straddle the line (`Classification::Through`)
    pub fn report_through(mut self, enabled: bool) -> Self {
        self.report_through = enabled;
        self
    }

    pub fn spec(&self) -> PointSpec {
        self.spec
    }

    pub fn reference(&self) -> Reference {
        self.spec.reference
    }

    pub fn displacement(&self) -> f32 {
        self.spec.displacement
    }

    pub fn reports_through(&self) -> bool {
        self.report_through
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    pub(crate) fn notify(&self, crossing: &Crossing) {
        if let Some(ref callback) = self.callback {
            callback(crossing);
        }
    }
}

/// Registered observation points of one container
///
/// Points are fixed at mount; the set is never mutated afterwards.
#[derive(Debug, Default)]
pub struct PointSet {
    points: SlotMap<PointId, ObservationPoint>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a point and return its handle
    pub fn register(&mut self, point: ObservationPoint) -> PointId {
        let id = self.points.insert(point);
        tracing::debug!(point = ?id, spec = %self.points[id].spec, "observation point registered");
        id
    }

    pub fn get(&self, id: PointId) -> Option<&ObservationPoint> {
        self.points.get(id)
    }

    /// Like [`get`](Self::get), but an unknown id is an error
    pub fn resolve(&self, id: PointId) -> Result<&ObservationPoint> {
        self.points.get(id).ok_or(EngineError::UnknownPoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, &ObservationPoint)> {
        self.points.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.points.keys()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<ObservationPoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = ObservationPoint>>(iter: I) -> Self {
        let mut set = PointSet::new();
        for point in iter {
            set.register(point);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Classification;
    use scrollwatch_core::{Direction, ElementId};
    use std::cell::RefCell;

    #[test]
    fn test_line_y_convention() {
        assert_eq!(PointSpec::top(40.0).line_y(400.0), -40.0);
        assert_eq!(PointSpec::top(-40.0).line_y(400.0), 40.0);
        assert_eq!(PointSpec::bottom(100.0).line_y(400.0), 300.0);
        assert_eq!(PointSpec::bottom(-20.0).line_y(400.0), 420.0);
        // TOP d and BOTTOM d + H name the same line
        assert_eq!(PointSpec::top(-40.0).line_y(400.0), PointSpec::bottom(360.0).line_y(400.0));
    }

    #[test]
    fn test_default_spec() {
        let spec = PointSpec::default();
        assert_eq!(spec.reference, Reference::Bottom);
        assert_eq!(spec.displacement, DEFAULT_DISPLACEMENT);
    }

    #[test]
    fn test_reference_parse() {
        assert_eq!(Reference::parse("TOP"), Some(Reference::Top));
        assert_eq!(Reference::parse(" bottom "), Some(Reference::Bottom));
        assert_eq!(Reference::parse("1"), Some(Reference::Top));
        assert_eq!(Reference::parse("2"), Some(Reference::Bottom));
        assert_eq!(Reference::parse("left"), None);
    }

    #[test]
    fn test_identical_points_are_distinct_sites() {
        let mut points = PointSet::new();
        let a = points.register(ObservationPoint::bottom(100.0));
        let b = points.register(ObservationPoint::bottom(100.0));
        assert_ne!(a, b);
        assert_eq!(points.len(), 2);
        assert_eq!(points.resolve(a).map(|p| p.spec()), Ok(PointSpec::bottom(100.0)));
    }

    #[test]
    fn test_unknown_point() {
        let mut other = PointSet::new();
        let id = other.register(ObservationPoint::top(0.0));
        let points = PointSet::new();
        assert_eq!(points.resolve(id).err(), Some(EngineError::UnknownPoint));
    }

    #[test]
    fn test_notify_invokes_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let point = ObservationPoint::bottom(100.0)
            .on_crossing(move |crossing| sink.borrow_mut().push(crossing.classification));

        let mut points = PointSet::new();
        let id = points.register(point);
        let crossing = Crossing {
            point: id,
            element: ElementId::default(),
            key: Rc::from("3"),
            direction: Direction::Down,
            classification: Classification::Below,
        };
        points.resolve(id).map(|p| p.notify(&crossing)).ok();
        assert_eq!(*seen.borrow(), vec![Classification::Below]);
    }
}
