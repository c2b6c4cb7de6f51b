// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lines.

use core::ops::{Mul, Range};

use crate::{Affine, Nearest, ParamCurve, ParamCurveNearest, Point, Vec2};

/// A single line.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// The line's start point.
    pub p0: Point,
    /// The line's end point.
    pub p1: Point,
}

impl Line {
    /// Create a new line.
    #[inline(always)]
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Line {
        Line {
            p0: p0.into(),
            p1: p1.into(),
        }
    }

    /// Returns a copy of this `Line` with the end points swapped so that it
    /// points in the opposite direction.
    #[must_use]
    #[inline(always)]
    pub fn reversed(&self) -> Line {
        Self {
            p0: self.p1,
            p1: self.p0,
        }
    }

    /// The length of the line.
    #[inline]
    pub fn length(self) -> f64 {
        (self.p1 - self.p0).hypot()
    }

    /// The midpoint of the line.
    #[must_use]
    #[inline]
    pub fn midpoint(&self) -> Point {
        self.p0.midpoint(self.p1)
    }

    /// The vector from the start point to the end point.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.p1 - self.p0
    }

    /// Computes the point where two lines, if extended to infinity, would cross.
    pub fn crossing_point(self, other: Line) -> Option<Point> {
        let ab = self.p1 - self.p0;
        let cd = other.p1 - other.p0;
        let pcd = ab.cross(cd);
        if pcd == 0.0 {
            return None;
        }
        let h = ab.cross(self.p0 - other.p0) / pcd;
        Some(other.p0 + cd * h)
    }

    /// Parameters `(t, u)` where the two segments cross, `t` on `self` and
    /// `u` on `other`.
    ///
    /// Both parameters must lie in `[-slack, 1 + slack]`. Parallel or
    /// degenerate segments never cross.
    pub fn segment_crossing(self, other: Line, slack: f64) -> Option<(f64, f64)> {
        let ab = self.p1 - self.p0;
        let cd = other.p1 - other.p0;
        let denom = ab.cross(cd);
        if denom == 0.0 || !denom.is_finite() {
            return None;
        }
        let ac = other.p0 - self.p0;
        let t = ac.cross(cd) / denom;
        let u = ac.cross(ab) / denom;
        let range = -slack..=1.0 + slack;
        if range.contains(&t) && range.contains(&u) {
            Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
        } else {
            None
        }
    }

    /// Is this line `finite`?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.p0.is_finite() && self.p1.is_finite()
    }
}

impl From<(Point, Point)> for Line {
    #[inline(always)]
    fn from((from, to): (Point, Point)) -> Self {
        Line::new(from, to)
    }
}

impl ParamCurve for Line {
    #[inline]
    fn eval(&self, t: f64) -> Point {
        self.p0.lerp(self.p1, t)
    }

    #[inline]
    fn subsegment(&self, range: Range<f64>) -> Line {
        Line {
            p0: self.eval(range.start),
            p1: self.eval(range.end),
        }
    }

    #[inline(always)]
    fn start(&self) -> Point {
        self.p0
    }

    #[inline(always)]
    fn end(&self) -> Point {
        self.p1
    }
}

impl ParamCurveNearest for Line {
    #[inline]
    fn nearest(&self, p: Point, _accuracy: f64) -> Nearest {
        let d = self.p1 - self.p0;
        let v = p - self.p0;

        // Infinite or NaN for a zero-length segment; clamping maps that to 0.
        let t = d.dot(v) / d.hypot2();
        #[allow(clippy::manual_clamp)]
        let t = t.max(0.).min(1.);

        let distance_sq = (v - t * d).hypot2();
        Nearest { distance_sq, t }
    }
}

impl Mul<Line> for Affine {
    type Output = Line;

    #[inline]
    fn mul(self, other: Line) -> Line {
        Line {
            p0: self * other.p0,
            p1: self * other.p1,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Line, ParamCurveNearest, Point};

    #[test]
    fn crossing() {
        let a = Line::new((0.0, 0.0), (10.0, 10.0));
        let b = Line::new((0.0, 10.0), (10.0, 0.0));
        assert_eq!(a.crossing_point(b), Some(Point::new(5.0, 5.0)));
        let (t, u) = a.segment_crossing(b, 0.0).unwrap();
        assert!((t - 0.5).abs() < 1e-12);
        assert!((u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn segments_that_miss() {
        let a = Line::new((0.0, 0.0), (1.0, 0.0));
        let b = Line::new((2.0, -1.0), (2.0, 1.0));
        assert!(a.crossing_point(b).is_some());
        assert!(a.segment_crossing(b, 1e-9).is_none());
        let parallel = Line::new((0.0, 1.0), (1.0, 1.0));
        assert!(a.segment_crossing(parallel, 1.0).is_none());
    }

    #[test]
    fn nearest_degenerate() {
        let l = Line::new((3.0, 4.0), (3.0, 4.0));
        let n = l.nearest(Point::ZERO, 1e-9);
        assert_eq!(n.t, 0.0);
        assert_eq!(n.distance_sq, 25.0);
    }
}
