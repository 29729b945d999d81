//! Band geometry and crossing classification
//!
//! Every observation point is watched through one or two *bands*: the part
//! of the container on one side of the point's line, expressed as a root
//! margin on the container rect.
//!
//! ```text
//!   y = 0  ┌──────────────┐
//!          │  AboveLine   │  line is the band's bottom edge
//!   line ──┼──────────────┼──
//!          │  BelowLine   │  line is the band's top edge
//!   y = H  └──────────────┘
//! ```
//!
//! A point inside the container gets both bands. A point outside it gets
//! only the band that still overlaps the container (the band then reaches
//! past the container edge to the line).
//!
//! [`classify`] turns one intersection entry into a [`Classification`] by
//! combining the ratio extreme with the tracked gesture direction and the
//! item's edges relative to the band: a threshold crossing on its own is
//! ambiguous about which way the item moved.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use scrollwatch_core::{Direction, Rect};

use crate::intersection::IntersectionEntry;
use crate::point::PointSpec;

/// Slack for comparing item edges against band edges
pub const EDGE_TOLERANCE_PX: f32 = 0.5;

/// Intersection thresholds requested for every watcher
pub const THRESHOLDS: [f32; 2] = [0.0, 1.0];

/// Which side of a point's line a band covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandSide {
    /// Between the container top and the line
    AboveLine,
    /// Between the line and the container bottom
    BelowLine,
}

impl BandSide {
    /// Y of the line on a band rect
    pub fn line_of(self, band: &Rect) -> f32 {
        match self {
            BandSide::AboveLine => band.bottom(),
            BandSide::BelowLine => band.top(),
        }
    }
}

/// Root margin of a watcher, in CSS root-margin sense
///
/// Positive values grow the container rect outward, negative shrink it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: f32,
    pub bottom: f32,
}

impl RootMargin {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            top: self.top * factor,
            bottom: self.bottom * factor,
        }
    }

    /// The margin on the edge that carries the line
    pub fn line_margin(&self, side: BandSide) -> f32 {
        match side {
            BandSide::AboveLine => self.bottom,
            BandSide::BelowLine => self.top,
        }
    }

    /// The band this margin cuts out of `container`
    pub fn apply(&self, container: &Rect) -> Rect {
        container.expand_vertical(self.top, self.bottom)
    }
}

/// Bands needed to watch `spec` in a container of `container_height`
///
/// Two for a line within `[0, H]`, otherwise the single band that overlaps
/// the container.
pub fn sides_for(spec: &PointSpec, container_height: f32) -> SmallVec<[BandSide; 2]> {
    let line = spec.line_y(container_height);
    let mut sides = SmallVec::new();
    if line >= 0.0 {
        sides.push(BandSide::AboveLine);
    }
    if line <= container_height {
        sides.push(BandSide::BelowLine);
    }
    sides
}

/// Root margin placing the band edge of `side` exactly on the point's line
///
/// `correction` is the calibration multiplier (1.0 when uncalibrated).
pub fn margin_for(
    spec: &PointSpec,
    side: BandSide,
    container_height: f32,
    correction: f32,
) -> RootMargin {
    let line = spec.line_y(container_height);
    let margin = match side {
        BandSide::AboveLine => RootMargin::new(0.0, line - container_height),
        BandSide::BelowLine => RootMargin::new(-line, 0.0),
    };
    margin.scaled(correction)
}

/// Every band of a point with its margin
pub fn margins_for(
    spec: &PointSpec,
    container_height: f32,
    correction: f32,
) -> SmallVec<[(BandSide, RootMargin); 2]> {
    sides_for(spec, container_height)
        .into_iter()
        .map(|side| (side, margin_for(spec, side, container_height, correction)))
        .collect()
}

// ============================================================================
// Classification
// ============================================================================

/// Where an item ended up relative to a point's line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Wholly on the container-start side of the line
    Above,
    /// Straddling the line
    Through,
    /// Wholly on the container-end side of the line
    Below,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Above => f.write_str("above"),
            Classification::Through => f.write_str("through"),
            Classification::Below => f.write_str("below"),
        }
    }
}

/// Tunables for [`classify`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyOptions {
    /// How close to 0 / 1 a ratio must be to count as an extreme
    pub ratio_epsilon: f32,
    /// Emit [`Classification::Through`] for straddling items
    pub report_through: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            ratio_epsilon: 0.01,
            report_through: false,
        }
    }
}

/// Position of `item` relative to a line, ignoring direction
pub fn position_of(item: &Rect, line: f32) -> Classification {
    if item.bottom() <= line + EDGE_TOLERANCE_PX {
        Classification::Above
    } else if item.top() >= line - EDGE_TOLERANCE_PX {
        Classification::Below
    } else {
        Classification::Through
    }
}

/// Classify one intersection entry of a `side` band
///
/// | band      | direction | ratio | item edges                | result |
/// |-----------|-----------|-------|---------------------------|--------|
/// | AboveLine | Up        | ≈1    | top inside band           | Above  |
/// | AboveLine | Down      | ≈0    | wholly below the line     | Below  |
/// | BelowLine | Down      | ≈1    | bottom inside band        | Below  |
/// | BelowLine | Up        | ≈0    | wholly above the line     | Above  |
///
/// Anything else is noise and yields `None`, except that a partially
/// intersecting item straddling the line yields `Through` when enabled.
pub fn classify(
    entry: &IntersectionEntry,
    side: BandSide,
    direction: Direction,
    options: &ClassifyOptions,
) -> Option<Classification> {
    let band = &entry.root_bounds;
    let item = &entry.bounding_rect;
    let line = side.line_of(band);

    let full = entry.is_intersecting && entry.ratio >= 1.0 - options.ratio_epsilon;
    let empty = entry.ratio <= options.ratio_epsilon;

    let crossed = match (side, direction) {
        (BandSide::AboveLine, Direction::Up) => {
            (full && item.top() >= band.top() - EDGE_TOLERANCE_PX).then_some(Classification::Above)
        }
        (BandSide::AboveLine, Direction::Down) => {
            (empty && item.top() >= line - EDGE_TOLERANCE_PX).then_some(Classification::Below)
        }
        (BandSide::BelowLine, Direction::Down) => {
            (full && item.bottom() <= band.bottom() + EDGE_TOLERANCE_PX)
                .then_some(Classification::Below)
        }
        (BandSide::BelowLine, Direction::Up) => {
            (empty && item.bottom() <= line + EDGE_TOLERANCE_PX).then_some(Classification::Above)
        }
    };

    crossed.or_else(|| {
        let straddles = item.top() < line && item.bottom() > line;
        (options.report_through && entry.is_intersecting && !full && straddles)
            .then_some(Classification::Through)
    })
}
