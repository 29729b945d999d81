//! Data exchanged with the host's intersection primitive

use std::rc::Rc;

use smallvec::SmallVec;

use scrollwatch_core::{Direction, ElementId, PointId, Rect, WatcherId};

use crate::band::{BandSide, Classification, RootMargin, THRESHOLDS};

/// Parameters of one watcher the host should create
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherSpec {
    pub point: PointId,
    pub side: BandSide,
    /// Root margin applied to the container rect
    pub root_margin: RootMargin,
    /// Intersection ratios at which the host must deliver an entry
    pub thresholds: SmallVec<[f32; 2]>,
}

impl WatcherSpec {
    pub fn new(point: PointId, side: BandSide, root_margin: RootMargin) -> Self {
        Self {
            point,
            side,
            root_margin,
            thresholds: SmallVec::from_slice(&THRESHOLDS),
        }
    }
}

/// One intersection change delivered by the host
///
/// `bounding_rect` and `root_bounds` are in the same coordinate space as
/// the host's container rect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub watcher: WatcherId,
    pub element: ElementId,
    /// The observed element's rect
    pub bounding_rect: Rect,
    /// The watcher's band (container rect after root margin)
    pub root_bounds: Rect,
    /// Fraction of the element inside the band
    pub ratio: f32,
    pub is_intersecting: bool,
}

/// A classified crossing, as handed to point callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub point: PointId,
    pub element: ElementId,
    /// Render key of the element
    pub key: Rc<str>,
    pub direction: Direction,
    pub classification: Classification,
}
