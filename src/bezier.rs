// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bézier curves of arbitrary degree.

use alloc::vec::Vec;
use core::ops::{Mul, Range};

use smallvec::SmallVec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::{
    Affine, CurveError, Epsilon, Nearest, ParamCurve, ParamCurveDeriv, ParamCurveNearest, Point,
    Rect, Vec2,
};

/// Control point storage; cubics and below stay inline.
pub(crate) type Points = SmallVec<[Point; 4]>;

/// Scratch storage for de Casteljau evaluation.
type Scratch = SmallVec<[Point; 8]>;

/// A Bézier curve of degree `n`, defined by `n + 1` control points.
///
/// The curve is an immutable value: every transform returns a new curve.
/// It always has at least one control point, and every coordinate is finite.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Point>", into = "Vec<Point>")
)]
pub struct Bezier {
    points: Points,
}

impl Bezier {
    /// Create a new curve from its control points.
    ///
    /// Returns an error if there are no points, or if any coordinate is
    /// NaN or infinite.
    pub fn new<P: Into<Point>>(points: impl IntoIterator<Item = P>) -> Result<Bezier, CurveError> {
        let points: Points = points.into_iter().map(Into::into).collect();
        if points.is_empty() {
            return Err(CurveError::NoControlPoints);
        }
        if let Some(ix) = points.iter().position(|p| !p.is_finite()) {
            return Err(CurveError::NonFiniteControlPoint(ix));
        }
        Ok(Bezier { points })
    }

    /// Build a curve from points already known to be valid.
    #[inline]
    pub(crate) fn from_points(points: Points) -> Bezier {
        debug_assert!(!points.is_empty(), "a curve needs a control point");
        Bezier { points }
    }

    /// A straight line between two points, as a degree 1 curve.
    pub(crate) fn line(p0: Point, p1: Point) -> Bezier {
        let mut points = Points::new();
        points.push(p0);
        points.push(p1);
        Bezier { points }
    }

    /// The degree of the curve, one less than the number of control points.
    #[inline]
    pub fn degree(&self) -> usize {
        self.points.len() - 1
    }

    /// The control points.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Split the curve at parameter `t` by de Casteljau subdivision.
    ///
    /// The two halves share the split point exactly.
    pub fn split(&self, t: f64) -> (Bezier, Bezier) {
        let (left, right) = split_points(&self.points, t);
        (Bezier { points: left }, Bezier { points: right })
    }

    /// The same curve traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Bezier {
        Bezier {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// A copy of the curve with the first control point replaced.
    #[must_use]
    pub fn with_start(&self, p: Point) -> Bezier {
        let mut points = self.points.clone();
        points[0] = p;
        Bezier { points }
    }

    /// A copy of the curve with the last control point replaced.
    #[must_use]
    pub fn with_end(&self, p: Point) -> Bezier {
        let mut points = self.points.clone();
        let last = points.len() - 1;
        points[last] = p;
        Bezier { points }
    }

    /// The bounding box of the control points.
    ///
    /// This contains the curve, by the convex hull property.
    pub fn bounding_box(&self) -> Rect {
        let p0 = self.points[0];
        self.points[1..]
            .iter()
            .fold(Rect::from_points(p0, p0), |r, p| r.union_pt(*p))
    }

    /// Whether all control points coincide within the tolerance.
    pub fn is_point(&self, eps: Epsilon) -> bool {
        let p0 = self.points[0];
        self.points[1..].iter().all(|p| eps.points_eq(p0, *p))
    }

    /// The length of the control polygon, an upper bound on the arc length.
    pub fn hull_length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// The unit tangent at parameter `t`.
    ///
    /// Where the derivative vanishes, the direction is taken from the
    /// neighbouring geometry: the first distinct control point at an end,
    /// a central difference in the interior. Returns `None` when the curve is
    /// a single point.
    pub fn tangent(&self, t: f64) -> Option<Vec2> {
        if let Some(d) = self.deriv().eval(t).to_vec2().try_normalize() {
            return Some(d);
        }
        let n = self.points.len();
        if t <= 0.0 {
            let p0 = self.points[0];
            return self.points[1..]
                .iter()
                .find_map(|p| (*p - p0).try_normalize());
        }
        if t >= 1.0 {
            let pn = self.points[n - 1];
            return self.points[..n - 1]
                .iter()
                .rev()
                .find_map(|p| (pn - *p).try_normalize());
        }
        const H: f64 = 1e-6;
        let t0 = (t - H).max(0.0);
        let t1 = (t + H).min(1.0);
        (self.eval(t1) - self.eval(t0)).try_normalize()
    }

    /// The unit left normal at parameter `t`, the tangent turned 90°.
    #[inline]
    pub fn normal(&self, t: f64) -> Option<Vec2> {
        self.tangent(t).map(Vec2::turn_90)
    }

    /// Is this curve finite?
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }

    /// The points where this curve meets `other`.
    ///
    /// See [`intersect`](crate::intersect::intersect).
    pub fn intersect(&self, other: &Bezier) -> Vec<Point> {
        crate::intersect::intersect(self, other)
    }

    /// The stretch of this curve that `other` also traces, if any.
    ///
    /// See [`overlap`](crate::intersect::overlap).
    pub fn overlap(&self, other: &Bezier) -> Option<Bezier> {
        crate::intersect::overlap(self, other)
    }

    /// Offset this curve by a signed distance, to its left for positive
    /// distances.
    ///
    /// See [`offset`](crate::offset::offset).
    pub fn offset(&self, distance: f64) -> Vec<Bezier> {
        crate::offset::offset(self, distance)
    }

    /// A curve of the same degree with every control point at `p`.
    fn constant(&self, p: Point) -> Bezier {
        Bezier {
            points: core::iter::repeat(p).take(self.points.len()).collect(),
        }
    }
}

/// One de Casteljau split of a control polygon at `t`.
fn split_points(points: &[Point], t: f64) -> (Points, Points) {
    let n = points.len();
    let mut work: Scratch = points.iter().copied().collect();
    let mut left = Points::with_capacity(n);
    let mut right = Points::with_capacity(n);
    left.push(work[0]);
    right.push(work[n - 1]);
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
        left.push(work[0]);
        right.push(work[n - 1 - level]);
    }
    right.reverse();
    (left, right)
}

impl ParamCurve for Bezier {
    fn eval(&self, t: f64) -> Point {
        let n = self.points.len();
        if t == 0.0 || n == 1 {
            return self.points[0];
        }
        if t == 1.0 {
            return self.points[n - 1];
        }
        let mut work: Scratch = self.points.iter().copied().collect();
        for level in 1..n {
            for i in 0..n - level {
                work[i] = work[i].lerp(work[i + 1], t);
            }
        }
        work[0]
    }

    fn subsegment(&self, range: Range<f64>) -> Bezier {
        let (t0, t1) = (range.start, range.end);
        if t0 == 0.0 && t1 == 1.0 {
            return self.clone();
        }
        // Split at the parameter farther from its end first so the second
        // split's local parameter stays well conditioned.
        if t1 >= 1.0 - t0 {
            if t1 == 0.0 {
                return self.constant(self.eval(t0));
            }
            let (left, _) = split_points(&self.points, t1);
            let (_, mid) = split_points(&left, t0 / t1);
            Bezier { points: mid }
        } else {
            let span = 1.0 - t0;
            if span == 0.0 {
                return self.constant(self.eval(t0));
            }
            let (_, right) = split_points(&self.points, t0);
            let (mid, _) = split_points(&right, (t1 - t0) / span);
            Bezier { points: mid }
        }
    }

    #[inline]
    fn subdivide(&self) -> (Bezier, Bezier) {
        self.split(0.5)
    }

    #[inline]
    fn start(&self) -> Point {
        self.points[0]
    }

    #[inline]
    fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

impl ParamCurveDeriv for Bezier {
    type DerivResult = Bezier;

    /// The hodograph.
    ///
    /// A degree 0 curve has a single zero vector as its derivative.
    fn deriv(&self) -> Bezier {
        let n = self.degree();
        if n == 0 {
            return Bezier::from_points(smallvec::smallvec![Point::ZERO]);
        }
        let scale = n as f64;
        Bezier {
            points: self
                .points
                .windows(2)
                .map(|w| ((w[1] - w[0]) * scale).to_point())
                .collect(),
        }
    }
}

impl ParamCurveNearest for Bezier {
    /// Find the nearest point by dense sampling, then golden-section search
    /// in the bracket around every sample that is a local minimum.
    ///
    /// A folded curve can pass close to `p` more than once; refining every
    /// local minimum keeps the search from settling in the wrong basin.
    fn nearest(&self, p: Point, accuracy: f64) -> Nearest {
        let n = 16 * (self.degree() + 1);
        let step = 1.0 / n as f64;
        let dist = |t: f64| self.eval(t).distance_squared(p);
        let samples: Vec<f64> = (0..=n).map(|i| dist(i as f64 * step)).collect();
        let param_accuracy = (accuracy / self.hull_length().max(1.0)).max(f64::EPSILON);
        let mut best = Nearest {
            distance_sq: samples[0],
            t: 0.0,
        };
        for (i, &d) in samples.iter().enumerate() {
            let falling = i == 0 || d < samples[i - 1];
            let rising = i == n || d <= samples[i + 1];
            if !(falling && rising) {
                continue;
            }
            let t = i as f64 * step;
            if d < best.distance_sq {
                best = Nearest { distance_sq: d, t };
            }
            let lo = (t - step).max(0.0);
            let hi = (t + step).min(1.0);
            let t = golden_section(&dist, lo, hi, param_accuracy);
            let d = dist(t);
            if d < best.distance_sq {
                best = Nearest { distance_sq: d, t };
            }
        }
        best
    }
}

/// Minimize `f` over `lo..hi`, assuming it is unimodal there.
fn golden_section(f: &impl Fn(f64) -> f64, mut lo: f64, mut hi: f64, accuracy: f64) -> f64 {
    const INV_PHI: f64 = 0.618_033_988_749_894_8;
    for _ in 0..64 {
        if hi - lo <= accuracy {
            break;
        }
        let a = hi - INV_PHI * (hi - lo);
        let b = lo + INV_PHI * (hi - lo);
        if f(a) < f(b) {
            hi = b;
        } else {
            lo = a;
        }
    }
    0.5 * (lo + hi)
}

impl Mul<&Bezier> for Affine {
    type Output = Bezier;

    #[inline]
    fn mul(self, c: &Bezier) -> Bezier {
        Bezier {
            points: c.points.iter().map(|p| self * *p).collect(),
        }
    }
}

impl Mul<Bezier> for Affine {
    type Output = Bezier;

    #[inline]
    fn mul(self, c: Bezier) -> Bezier {
        self * &c
    }
}

impl TryFrom<Vec<Point>> for Bezier {
    type Error = CurveError;

    fn try_from(points: Vec<Point>) -> Result<Bezier, CurveError> {
        Bezier::new(points)
    }
}

impl TryFrom<&[Point]> for Bezier {
    type Error = CurveError;

    fn try_from(points: &[Point]) -> Result<Bezier, CurveError> {
        Bezier::new(points.iter().copied())
    }
}

impl From<Bezier> for Vec<Point> {
    fn from(c: Bezier) -> Vec<Point> {
        c.points.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Affine, Bezier, CurveError, Epsilon, ParamCurve, ParamCurveDeriv, ParamCurveNearest,
        Point, Vec2,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cubic() -> Bezier {
        Bezier::new([(0.0, 0.0), (10.0, 30.0), (40.0, 30.0), (50.0, 0.0)]).unwrap()
    }

    fn assert_near(p0: Point, p1: Point, tol: f64) {
        assert!(p0.distance(p1) <= tol, "{p0:?} != {p1:?}");
    }

    #[test]
    fn rejects_malformed() {
        let empty: [Point; 0] = [];
        assert_eq!(Bezier::new(empty), Err(CurveError::NoControlPoints));
        assert_eq!(
            Bezier::new([(0.0, 0.0), (f64::NAN, 1.0)]),
            Err(CurveError::NonFiniteControlPoint(1))
        );
        let single = Bezier::new([(1.0, 2.0)]).unwrap();
        assert_eq!(single.degree(), 0);
        assert_eq!(single.eval(0.3), Point::new(1.0, 2.0));
    }

    #[test]
    fn eval_matches_bernstein() {
        let c = cubic();
        let t: f64 = 0.3;
        let mt = 1.0 - t;
        let p = c.points();
        let x = mt.powi(3) * p[0].x
            + 3.0 * mt * mt * t * p[1].x
            + 3.0 * mt * t * t * p[2].x
            + t.powi(3) * p[3].x;
        let y = mt.powi(3) * p[0].y
            + 3.0 * mt * mt * t * p[1].y
            + 3.0 * mt * t * t * p[2].y
            + t.powi(3) * p[3].y;
        assert_near(c.eval(t), Point::new(x, y), 1e-12);
        assert_eq!(c.eval(1.0), Point::new(50.0, 0.0));
    }

    #[test]
    fn split_and_subsegment() {
        let c = cubic();
        let (a, b) = c.split(0.25);
        assert_eq!(a.end(), b.start());
        assert_near(a.eval(0.5), c.eval(0.125), 1e-9);
        assert_near(b.eval(0.5), c.eval(0.625), 1e-9);

        for (t0, t1) in [(0.1, 0.4), (0.6, 0.9), (0.0, 0.5), (0.5, 1.0), (0.2, 0.8)] {
            let s = c.subsegment(t0..t1);
            assert_near(s.start(), c.eval(t0), 1e-9);
            assert_near(s.end(), c.eval(t1), 1e-9);
            assert_near(s.eval(0.5), c.eval(0.5 * (t0 + t1)), 1e-9);
        }
        let collapsed = c.subsegment(1.0..1.0);
        assert!(collapsed.is_point(Epsilon::new(-20)));
    }

    #[test]
    fn hodograph() {
        let c = cubic();
        let d = c.deriv();
        assert_eq!(d.degree(), 2);
        let h = 1e-6;
        let fd = (c.eval(0.4 + h) - c.eval(0.4 - h)) * (0.5 / h);
        assert!((d.eval(0.4).to_vec2() - fd).hypot() < 1e-4);
        let point = Bezier::new([(3.0, 3.0)]).unwrap();
        assert_eq!(point.deriv().eval(0.5), Point::ZERO);
    }

    #[test]
    fn degenerate_tangent_reuses_neighbour() {
        let c = Bezier::new([(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]).unwrap();
        assert_eq!(c.tangent(0.0), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(c.normal(0.0), Some(Vec2::new(0.0, 1.0)));
        let p = Bezier::new([(1.0, 1.0), (1.0, 1.0)]).unwrap();
        assert!(p.tangent(0.5).is_none());
        assert!(p.is_point(Epsilon::ULP));
    }

    #[test]
    fn transforms_return_new_curves() {
        let c = cubic();
        let moved = Affine::translate((1.0, 2.0)) * &c;
        assert_eq!(c.start(), Point::ZERO);
        assert_eq!(moved.start(), Point::new(1.0, 2.0));
        let r = c.reversed();
        assert_eq!(r.start(), c.end());
        assert_near(r.eval(0.3), c.eval(0.7), 1e-9);
        let s = c.with_start(Point::new(-1.0, 0.0)).with_end(Point::new(51.0, 0.0));
        assert_eq!(s.points()[1], c.points()[1]);
        assert_eq!(s.end(), Point::new(51.0, 0.0));
    }

    #[test]
    fn nearest_point() {
        let c = cubic();
        let target = c.eval(0.37);
        let n = c.nearest(target + Vec2::new(0.0, 0.01), 1e-9);
        assert!((n.t - 0.37).abs() < 1e-3, "{}", n.t);
        assert!(n.distance_sq < 1e-3);
    }

    #[test]
    fn nearest_on_folded_curves() {
        // Passes close to itself around its self-intersection.
        let folded = Bezier::new([(0.0, 0.0), (120.0, 60.0), (-120.0, 60.0), (10.0, 0.0)]).unwrap();
        for i in 0..=50 {
            let t = i as f64 / 50.0;
            let n = folded.nearest(folded.eval(t), 1e-9);
            assert!(n.distance_sq.sqrt() < 1e-6, "t = {t}: {n:?}");
        }
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..64 {
            let c = Bezier::new((0..4).map(|_| {
                Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0))
            }))
            .unwrap();
            let t = rng.random_range(0.0..1.0);
            let n = c.nearest(c.eval(t), 1e-9);
            assert!(n.distance_sq.sqrt() < 1e-6, "{c:?} at {t}: {n:?}");
        }
    }

    #[test]
    fn bounding_box_contains_curve() {
        let c = cubic();
        let bb = c.bounding_box();
        for i in 0..=20 {
            assert!(bb.contains(c.eval(i as f64 / 20.0)));
        }
    }
}
