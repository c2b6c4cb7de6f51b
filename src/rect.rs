// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A rectangle.

use crate::Point;

/// A rectangle.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// The minimum x coordinate (left edge).
    pub x0: f64,
    /// The minimum y coordinate (top edge in y-down spaces).
    pub y0: f64,
    /// The maximum x coordinate (right edge).
    pub x1: f64,
    /// The maximum y coordinate (bottom edge in y-down spaces).
    pub y1: f64,
}

impl Rect {
    /// A new rectangle from minimum and maximum coordinates.
    #[inline]
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        Rect { x0, y0, x1, y1 }
    }

    /// A new rectangle from two points.
    ///
    /// The result will have non-negative width and height.
    #[inline]
    pub fn from_points(p0: impl Into<Point>, p1: impl Into<Point>) -> Rect {
        let p0 = p0.into();
        let p1 = p1.into();
        Rect::new(
            p0.x.min(p1.x),
            p0.y.min(p1.y),
            p0.x.max(p1.x),
            p0.y.max(p1.y),
        )
    }

    /// The width of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// The height of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// The larger of the width and the height.
    #[inline]
    pub fn max_extent(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Compute the union with one point.
    ///
    /// This method includes the perimeter of zero-area rectangles.
    #[inline]
    pub fn union_pt(&self, pt: Point) -> Rect {
        Rect::new(
            self.x0.min(pt.x),
            self.y0.min(pt.y),
            self.x1.max(pt.x),
            self.y1.max(pt.y),
        )
    }

    /// Expand the rectangle by `amount` on every side.
    #[inline]
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.x0 - amount,
            self.y0 - amount,
            self.x1 + amount,
            self.y1 + amount,
        )
    }

    /// Whether the point lies inside the rectangle or on its boundary.
    #[inline]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x0 && pt.x <= self.x1 && pt.y >= self.y0 && pt.y <= self.y1
    }

    /// Whether the two rectangles share any point, edges and corners included.
    ///
    /// Zero-area rectangles take part, so a point-like curve still overlaps
    /// the box of a curve passing through it.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }
}

#[cfg(test)]
mod tests {
    use crate::{Point, Rect};

    #[test]
    fn from_points_orders_corners() {
        let r = Rect::from_points((10.0, 2.0), (-1.0, 5.0));
        assert_eq!(r, Rect::new(-1.0, 2.0, 10.0, 5.0));
        assert_eq!(r.width(), 11.0);
    }

    #[test]
    fn overlap_includes_edges() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0);
        let b = Rect::new(1.0, 1.0, 2.0, 2.0);
        let c = Rect::new(1.5, 0.0, 2.0, 0.5);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        let degenerate = Rect::from_points((0.5, 0.5), (0.5, 0.5));
        assert!(a.overlaps(&degenerate));
    }

    #[test]
    fn grows_to_include_points() {
        let r = Rect::from_points((1.0, 4.0), (1.0, 4.0))
            .union_pt(Point::new(-2.0, 0.0))
            .union_pt(Point::new(3.0, 1.0));
        assert_eq!(r, Rect::new(-2.0, 0.0, 3.0, 4.0));
        assert!(r.contains(Point::new(3.0, 4.0)));
        assert!(!r.contains(Point::new(3.0, 4.5)));
    }
}
