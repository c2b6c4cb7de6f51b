// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fat lines, the bounding strips used by Bézier clipping.

use core::f64::consts::FRAC_PI_2;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::{Affine, Bezier, Epsilon, Interval, Line, ParamCurve, Point, Vec2};

/// Relative widening of every strip, so that curves touching a strip
/// boundary exactly are not clipped away by rounding.
const STRIP_SLACK: Epsilon = Epsilon::new(-12);

/// A strip around a baseline: every point whose signed distance from the
/// baseline lies in `[dmin, dmax]`.
///
/// Distances are positive to the left of the baseline direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FatLine {
    /// The baseline.
    pub line: Line,
    /// Unit direction of the baseline.
    dir: Vec2,
    /// The minimum signed distance, zero or less.
    pub dmin: f64,
    /// The maximum signed distance, zero or more.
    pub dmax: f64,
}

impl FatLine {
    /// The fat line along the chord of `curve`, through its first and last
    /// points, bounding all of its control points.
    ///
    /// A zero-length chord is replaced by the direction towards the control
    /// point farthest from the start. Returns `None` if every control point
    /// is at the same place.
    pub fn from_curve(curve: &Bezier) -> Option<FatLine> {
        let line = baseline(curve)?;
        Some(FatLine::bounding(line, curve))
    }

    /// Like [`FatLine::from_curve`], but with the baseline rotated 90° about
    /// its midpoint.
    pub fn perpendicular(curve: &Bezier) -> Option<FatLine> {
        let line = baseline(curve)?;
        let rotated = Affine::rotate_about(FRAC_PI_2, line.midpoint()) * line;
        Some(FatLine::bounding(rotated, curve))
    }

    /// A strip of half-width `tolerance` through `center`, horizontal or
    /// vertical.
    ///
    /// This stands in for the fat line of a curve collapsed to a point.
    pub fn around_point(center: Point, tolerance: f64, vertical: bool) -> FatLine {
        let dir = if vertical {
            Vec2::new(0.0, 1.0)
        } else {
            Vec2::new(1.0, 0.0)
        };
        FatLine {
            line: Line::new(center, center + dir),
            dir,
            dmin: -tolerance,
            dmax: tolerance,
        }
    }

    /// A fat line along `line` tight around the control points of `curve`.
    ///
    /// Returns `None` for a zero-length line.
    pub fn from_line(line: Line, curve: &Bezier) -> Option<FatLine> {
        line.direction().try_normalize()?;
        Some(FatLine::bounding(line, curve))
    }

    fn bounding(line: Line, curve: &Bezier) -> FatLine {
        // Only called with a non-degenerate line.
        let dir = line.direction().try_normalize().unwrap_or(Vec2::new(1.0, 0.0));
        let mut fat = FatLine {
            line,
            dir,
            dmin: 0.0,
            dmax: 0.0,
        };
        let mut magnitude = line.p0.magnitude().max(line.p1.magnitude());
        for p in curve.points() {
            let d = fat.signed_distance(*p);
            fat.dmin = fat.dmin.min(d);
            fat.dmax = fat.dmax.max(d);
            magnitude = magnitude.max(p.magnitude());
        }
        let slack = STRIP_SLACK.tolerance(magnitude);
        fat.dmin -= slack;
        fat.dmax += slack;
        fat
    }

    /// Signed perpendicular distance of `p` from the baseline.
    #[inline]
    pub fn signed_distance(&self, p: Point) -> f64 {
        self.dir.cross(p - self.line.p0)
    }

    /// The strip's width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.dmax - self.dmin
    }

    /// The sub-range of `subject`'s parameters that may lie inside the strip.
    ///
    /// The distance curve of `subject` has control points `(i / n, dᵢ)`; its
    /// convex hull clipped to `dmin ≤ d ≤ dmax` bounds the parameters that
    /// can be inside the strip. Returns an empty interval if the hull misses
    /// the strip.
    pub fn clip(&self, subject: &Bezier) -> Interval {
        let pts = subject.points();
        let n = pts.len() - 1;
        if n == 0 {
            let d = self.signed_distance(pts[0]);
            return if self.dmin <= d && d <= self.dmax {
                Interval::FULL
            } else {
                Interval::EMPTY
            };
        }
        let dist: smallvec::SmallVec<[f64; 8]> =
            pts.iter().map(|p| self.signed_distance(*p)).collect();
        let mut result = Interval::EMPTY;
        let step = 1.0 / n as f64;
        for (i, &di) in dist.iter().enumerate() {
            let ti = i as f64 * step;
            if self.dmin <= di && di <= self.dmax {
                result = result.expand(ti);
            }
            // Hull edges are among the chords between pairs of points; their
            // crossings with the strip bounds give the remaining extremes.
            for (j, &dj) in dist.iter().enumerate().skip(i + 1) {
                let tj = j as f64 * step;
                for bound in [self.dmin, self.dmax] {
                    if (di - bound) * (dj - bound) < 0.0 {
                        let s = (bound - di) / (dj - di);
                        result = result.expand(ti + (tj - ti) * s);
                    }
                }
            }
        }
        if result.is_empty() {
            return result;
        }
        Interval::new(result.start.clamp(0.0, 1.0), result.end.clamp(0.0, 1.0))
    }
}

/// Clip `subject` against the box of half-width `tolerance` around `center`.
///
/// Used when the clip curve has collapsed to a point and has no baseline.
pub fn clip_to_point(subject: &Bezier, center: Point, tolerance: f64) -> Interval {
    let h = FatLine::around_point(center, tolerance, false).clip(subject);
    if h.is_empty() {
        return h;
    }
    let v = FatLine::around_point(center, tolerance, true).clip(subject);
    if v.is_empty() {
        return v;
    }
    let start = h.start.max(v.start);
    let end = h.end.min(v.end);
    Interval::new(start, end)
}

/// The chord of `curve`, or the direction to its farthest control point if
/// the chord has zero length.
fn baseline(curve: &Bezier) -> Option<Line> {
    let p0 = curve.start();
    let p1 = curve.end();
    if (p1 - p0).try_normalize().is_some() {
        return Some(Line::new(p0, p1));
    }
    let far = curve
        .points()
        .iter()
        .copied()
        .max_by(|a, b| a.distance_squared(p0).total_cmp(&b.distance_squared(p0)))?;
    (far - p0).try_normalize()?;
    Some(Line::new(p0, far))
}

#[cfg(test)]
mod tests {
    use super::{clip_to_point, FatLine};
    use crate::{Bezier, Line, ParamCurve, Point};

    #[test]
    fn bounds_own_control_points() {
        let c = Bezier::new([(0.0, 0.0), (1.0, 2.0), (3.0, -1.0), (4.0, 0.0)]).unwrap();
        let fat = FatLine::from_curve(&c).unwrap();
        assert!(fat.dmin < -0.5 && fat.dmin > -1.01);
        assert!(fat.dmax > 1.5 && fat.dmax < 2.01);
        for i in 0..=16 {
            let d = fat.signed_distance(c.eval(i as f64 / 16.0));
            assert!(fat.dmin <= d && d <= fat.dmax);
        }
    }

    #[test]
    fn zero_length_chord_uses_farthest_point() {
        let loopy = Bezier::new([(0.0, 0.0), (5.0, 5.0), (-5.0, 5.0), (0.0, 0.0)]).unwrap();
        let fat = FatLine::from_curve(&loopy).unwrap();
        assert_eq!(fat.line.p0, Point::ZERO);
        assert!(fat.line.p1 != Point::ZERO);
        let point = Bezier::new([(1.0, 1.0), (1.0, 1.0)]).unwrap();
        assert!(FatLine::from_curve(&point).is_none());
    }

    #[test]
    fn perpendicular_is_rotated() {
        let c = Bezier::new([(0.0, 0.0), (2.0, 1.0), (4.0, 0.0)]).unwrap();
        let fat = FatLine::perpendicular(&c).unwrap();
        let dir = fat.line.direction();
        assert!(dir.x.abs() < 1e-12);
        assert!((fat.dmax - fat.dmin - 4.0).abs() < 1e-9);
    }

    #[test]
    fn clip_line_against_strip() {
        let horizontal = Bezier::new([(0.0, 0.0), (10.0, 0.0)]).unwrap();
        let fat = FatLine::from_line(Line::new((0.0, 0.0), (10.0, 0.0)), &horizontal).unwrap();
        let vertical = Bezier::new([(4.0, -10.0), (4.0, 10.0)]).unwrap();
        let clipped = fat.clip(&vertical);
        assert!((clipped.start - 0.5).abs() < 1e-9);
        assert!((clipped.end - 0.5).abs() < 1e-9);

        let away = Bezier::new([(0.0, 5.0), (10.0, 6.0)]).unwrap();
        assert!(fat.clip(&away).is_empty());
    }

    #[test]
    fn point_box() {
        let l = Bezier::new([(0.0, 0.0), (10.0, 10.0)]).unwrap();
        let hit = clip_to_point(&l, Point::new(5.0, 5.0), 0.01);
        assert!(hit.contains(0.5));
        assert!(hit.length() < 0.01);
        assert!(clip_to_point(&l, Point::new(5.0, 6.0), 0.01).is_empty());
    }
}
