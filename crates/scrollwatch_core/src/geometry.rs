//! Core geometry types
//!
//! All coordinates are in CSS-style pixels with `y` growing downward.
//! Scroll containers, item elements and intersection bands are all plain
//! [`Rect`]s; the helpers here are the vertical-axis operations the
//! observation engine needs (edges, vertical margins, intersection ratio).

// ─────────────────────────────────────────────────────────────────────────────
// Point / Size / Rect
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Build a rect from its vertical edges
    ///
    /// A bottom edge above the top edge collapses to an empty rect at `top`.
    pub fn from_vertical_edges(x: f32, width: f32, top: f32, bottom: f32) -> Self {
        Self::new(x, top, width, (bottom - top).max(0.0))
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Top edge (same as `y`)
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn area(&self) -> f32 {
        self.size.width.max(0.0) * self.size.height.max(0.0)
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Grow (positive) or shrink (negative) the rect vertically.
    ///
    /// This mirrors the root-margin semantics of viewport intersection
    /// primitives: a positive `top` moves the top edge up, a positive
    /// `bottom` moves the bottom edge down.
    pub fn expand_vertical(&self, top: f32, bottom: f32) -> Self {
        let new_top = self.top() - top;
        let new_bottom = self.bottom() + bottom;
        Rect::from_vertical_edges(self.origin.x, self.size.width, new_top, new_bottom)
    }

    /// Check if this rect intersects with another
    ///
    /// Touching edges do not count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Get the intersection of two rects, if they overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Fraction of `self` that is covered by `other` (0.0 ..= 1.0)
    ///
    /// Zero-area rects report 0.0.
    pub fn intersection_ratio(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection(other)
            .map(|r| (r.area() / area).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }
}

impl From<Size> for Rect {
    /// Convert Size to Rect at origin (0, 0)
    fn from(size: Size) -> Self {
        Rect {
            origin: Point::ZERO,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(0.0, 40.0, 300.0, 100.0);
        assert_eq!(r.top(), 40.0);
        assert_eq!(r.bottom(), 140.0);
        assert_eq!(r.right(), 300.0);
    }

    #[test]
    fn test_expand_vertical_follows_root_margin_signs() {
        let root = Rect::new(0.0, 100.0, 320.0, 500.0);

        // Negative bottom margin pulls the bottom edge up
        let band = root.expand_vertical(0.0, -100.0);
        assert_eq!(band.top(), 100.0);
        assert_eq!(band.bottom(), 500.0);

        // Positive top margin pushes the top edge up
        let band = root.expand_vertical(40.0, 0.0);
        assert_eq!(band.top(), 60.0);
        assert_eq!(band.bottom(), 600.0);
    }

    #[test]
    fn test_expand_vertical_collapses_instead_of_inverting() {
        let root = Rect::new(0.0, 0.0, 100.0, 100.0);
        let band = root.expand_vertical(-150.0, 0.0);
        assert_eq!(band.top(), 150.0);
        assert_eq!(band.height(), 0.0);
    }

    #[test]
    fn test_intersection_ratio() {
        let band = Rect::new(0.0, 0.0, 100.0, 100.0);

        let inside = Rect::new(0.0, 10.0, 100.0, 50.0);
        assert_eq!(inside.intersection_ratio(&band), 1.0);

        let half = Rect::new(0.0, 75.0, 100.0, 50.0);
        assert!((half.intersection_ratio(&band) - 0.5).abs() < 1e-6);

        let touching = Rect::new(0.0, 100.0, 100.0, 50.0);
        assert_eq!(touching.intersection_ratio(&band), 0.0);
    }

    #[test]
    fn test_zero_area_ratio() {
        let band = Rect::new(0.0, 0.0, 100.0, 100.0);
        let empty = Rect::new(0.0, 10.0, 100.0, 0.0);
        assert_eq!(empty.intersection_ratio(&band), 0.0);
    }
}
