// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameter intervals and pairs of them.

use core::ops::Range;

use crate::{Bezier, Epsilon, ParamCurve};

/// Forward nudge applied to the lower bound of the upper half of a split, so
/// at most one branch of a split can converge onto the split point itself.
pub const SPLIT_NUDGE: f64 = 1.0 / (1u64 << 40) as f64;

/// A closed range of curve parameters, nominally inside `[0, 1]`.
///
/// An interval whose start is after its end is empty.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    /// The lower bound.
    pub start: f64,
    /// The upper bound.
    pub end: f64,
}

impl Interval {
    /// The whole parameter domain, `[0, 1]`.
    pub const FULL: Interval = Interval::new(0.0, 1.0);

    /// The canonical empty interval, `[1, 0]`.
    pub const EMPTY: Interval = Interval::new(1.0, 0.0);

    /// Create a new interval.
    #[inline]
    pub const fn new(start: f64, end: f64) -> Interval {
        Interval { start, end }
    }

    /// A zero-length interval at `t`.
    #[inline]
    pub const fn at(t: f64) -> Interval {
        Interval { start: t, end: t }
    }

    /// Whether the interval is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.start > self.end
    }

    /// The length of the interval, zero when empty.
    #[inline]
    pub fn length(self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// The parameter halfway between the bounds.
    #[inline]
    pub fn midpoint(self) -> f64 {
        0.5 * (self.start + self.end)
    }

    /// Map a parameter local to this interval into the enclosing domain.
    #[inline]
    pub fn lerp(self, t: f64) -> f64 {
        self.start + (self.end - self.start) * t
    }

    /// Whether `t` lies inside the closed interval.
    #[inline]
    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// Whether `t` lies inside the interval, with both bounds widened by the
    /// tolerance of `eps`.
    #[inline]
    pub fn contains_within(self, t: f64, eps: Epsilon) -> bool {
        eps.le(self.start, t) && eps.le(t, self.end)
    }

    /// The smallest interval containing both.
    ///
    /// An empty interval is the identity.
    #[must_use]
    pub fn union(self, other: Interval) -> Interval {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Interval::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Expand the interval to include `t`.
    #[must_use]
    pub fn expand(self, t: f64) -> Interval {
        self.union(Interval::at(t))
    }

    /// Remap this interval to the fractional sub-range `sub` of itself.
    ///
    /// `sub` is expressed in this interval's local parameters, so `[0, 1]`
    /// leaves it unchanged. Returns the ratio of the new span to the old; an
    /// empty `sub` makes this interval empty and returns 0.
    pub fn scale_to(&mut self, sub: Interval) -> f64 {
        if sub.is_empty() {
            *self = Interval::EMPTY;
            return 0.0;
        }
        let old = self.end - self.start;
        let lo = sub.start.clamp(0.0, 1.0);
        let hi = sub.end.clamp(0.0, 1.0);
        let start = self.lerp(lo);
        let end = self.lerp(hi);
        *self = Interval::new(start, end);
        if old > 0.0 {
            (end - start) / old
        } else {
            0.0
        }
    }

    /// Whether the bounds are equal within the tolerance.
    #[inline]
    pub fn is_converged(self, eps: Epsilon) -> bool {
        eps.eq(self.start, self.end)
    }

    /// Split into halves.
    ///
    /// The upper half's lower bound is nudged forward by [`SPLIT_NUDGE`]
    /// (but never past its end).
    pub fn split(self) -> (Interval, Interval) {
        let mid = self.midpoint();
        let upper_start = (mid + SPLIT_NUDGE).min(self.end);
        (
            Interval::new(self.start, mid),
            Interval::new(upper_start, self.end),
        )
    }

    /// Whether the two closed intervals share a point, within tolerance.
    pub fn overlaps(self, other: Interval, eps: Epsilon) -> bool {
        eps.le(self.start, other.end) && eps.le(other.start, self.end)
    }

    /// The interval as a `Range`.
    #[inline]
    pub fn range(self) -> Range<f64> {
        self.start..self.end
    }
}

impl Default for Interval {
    fn default() -> Interval {
        Interval::FULL
    }
}

impl From<Range<f64>> for Interval {
    fn from(r: Range<f64>) -> Interval {
        Interval::new(r.start, r.end)
    }
}

/// Which of the caller's curves is on the `p` side of an [`IntervalPair`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// `p` is the caller's first curve.
    Original,
    /// `p` is the caller's second curve.
    Swapped,
}

impl Role {
    /// The other role.
    #[inline]
    pub fn flip(self) -> Role {
        match self {
            Role::Original => Role::Swapped,
            Role::Swapped => Role::Original,
        }
    }
}

/// Two curves, each restricted to a parameter interval.
///
/// The pair represents a candidate shared region. The curves are borrowed and
/// the pair itself is a small `Copy` value, so work lists hold copies rather
/// than aliases.
#[derive(Clone, Copy, Debug)]
pub struct IntervalPair<'a> {
    /// The `p` curve.
    pub p: &'a Bezier,
    /// The `q` curve.
    pub q: &'a Bezier,
    /// Parameter range on `p`.
    pub p_range: Interval,
    /// Parameter range on `q`.
    pub q_range: Interval,
    /// Whether `p` is the caller's first curve.
    pub role: Role,
}

/// Which side of an [`IntervalPair`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// The `p` side.
    P,
    /// The `q` side.
    Q,
}

impl<'a> IntervalPair<'a> {
    /// A pair covering both curves completely, with `a` as the `p` side.
    pub fn new(a: &'a Bezier, b: &'a Bezier) -> Self {
        IntervalPair {
            p: a,
            q: b,
            p_range: Interval::FULL,
            q_range: Interval::FULL,
            role: Role::Original,
        }
    }

    /// A pair with explicit ranges, with `a` as the `p` side.
    pub fn with_ranges(a: &'a Bezier, a_range: Interval, b: &'a Bezier, b_range: Interval) -> Self {
        IntervalPair {
            p: a,
            q: b,
            p_range: a_range,
            q_range: b_range,
            role: Role::Original,
        }
    }

    /// The sub-curve of `p` covered by its interval.
    pub fn p_curve(&self) -> Bezier {
        self.p.subsegment(self.p_range.range())
    }

    /// The sub-curve of `q` covered by its interval.
    pub fn q_curve(&self) -> Bezier {
        self.q.subsegment(self.q_range.range())
    }

    /// The same pair with the sides exchanged.
    #[must_use]
    pub fn swapped(self) -> Self {
        IntervalPair {
            p: self.q,
            q: self.p,
            p_range: self.q_range,
            q_range: self.p_range,
            role: self.role.flip(),
        }
    }

    /// The side whose interval is longer; `p` on ties.
    pub fn longer_side(&self) -> Side {
        if self.q_range.length() > self.p_range.length() {
            Side::Q
        } else {
            Side::P
        }
    }

    /// Split the `p` interval into halves.
    pub fn split_p(self) -> (Self, Self) {
        let (lo, hi) = self.p_range.split();
        (
            IntervalPair {
                p_range: lo,
                ..self
            },
            IntervalPair {
                p_range: hi,
                ..self
            },
        )
    }

    /// Split the `q` interval into halves.
    pub fn split_q(self) -> (Self, Self) {
        let (lo, hi) = self.q_range.split();
        (
            IntervalPair {
                q_range: lo,
                ..self
            },
            IntervalPair {
                q_range: hi,
                ..self
            },
        )
    }

    /// Split the longer side into halves.
    pub fn split_longer(self) -> (Self, Self) {
        match self.longer_side() {
            Side::P => self.split_p(),
            Side::Q => self.split_q(),
        }
    }

    /// Whether the `p` side has converged.
    ///
    /// A side also counts as converged when the images of its two interval
    /// ends coincide even though the interval has not shrunk. At cusps and
    /// self-intersections many parameters map to one point.
    pub fn p_converged(&self, param_eps: Epsilon, point_eps: Epsilon) -> bool {
        side_converged(self.p, self.p_range, param_eps, point_eps)
    }

    /// Whether the `q` side has converged; see [`IntervalPair::p_converged`].
    pub fn q_converged(&self, param_eps: Epsilon, point_eps: Epsilon) -> bool {
        side_converged(self.q, self.q_range, param_eps, point_eps)
    }

    /// Whether either interval is empty.
    pub fn is_empty(&self) -> bool {
        self.p_range.is_empty() || self.q_range.is_empty()
    }

    /// The intervals as (first curve, second curve), undoing any swaps.
    pub fn normalized(&self) -> (Interval, Interval) {
        match self.role {
            Role::Original => (self.p_range, self.q_range),
            Role::Swapped => (self.q_range, self.p_range),
        }
    }
}

fn side_converged(curve: &Bezier, range: Interval, param_eps: Epsilon, point_eps: Epsilon) -> bool {
    if range.is_converged(param_eps) {
        return true;
    }
    point_eps.points_eq(curve.eval(range.start), curve.eval(range.end))
}

#[cfg(test)]
mod tests {
    use super::{Interval, IntervalPair, Role, Side, SPLIT_NUDGE};
    use crate::{Bezier, Epsilon};

    #[test]
    fn basics() {
        assert!(Interval::EMPTY.is_empty());
        assert!(!Interval::FULL.is_empty());
        assert_eq!(Interval::FULL.midpoint(), 0.5);
        assert_eq!(Interval::new(0.2, 0.6).lerp(0.5), 0.4);
        let u = Interval::new(0.2, 0.3).union(Interval::new(0.5, 0.6));
        assert_eq!(u, Interval::new(0.2, 0.6));
        assert_eq!(Interval::EMPTY.union(u), u);
        assert_eq!(Interval::at(0.4).expand(0.1), Interval::new(0.1, 0.4));
    }

    #[test]
    fn scale_to_reports_ratio() {
        let mut i = Interval::new(0.2, 0.6);
        let ratio = i.scale_to(Interval::new(0.25, 0.75));
        assert!((ratio - 0.5).abs() < 1e-12);
        assert!((i.start - 0.3).abs() < 1e-12);
        assert!((i.end - 0.5).abs() < 1e-12);

        let ratio = i.scale_to(Interval::EMPTY);
        assert_eq!(ratio, 0.0);
        assert!(i.is_empty());
    }

    #[test]
    fn split_nudges_upper_half() {
        let (lo, hi) = Interval::FULL.split();
        assert_eq!(lo, Interval::new(0.0, 0.5));
        assert_eq!(hi.start, 0.5 + SPLIT_NUDGE);
        assert_eq!(hi.end, 1.0);
        let (_, tiny) = Interval::at(0.3).split();
        assert_eq!(tiny, Interval::at(0.3));
    }

    #[test]
    fn convergence() {
        let eps = Epsilon::new(-20);
        assert!(Interval::new(0.5, 0.5 + 1e-12).is_converged(eps));
        assert!(!Interval::new(0.5, 0.51).is_converged(eps));
    }

    #[test]
    fn pair_roles() {
        let a = Bezier::new([(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let b = Bezier::new([(0.0, 1.0), (1.0, 0.0)]).unwrap();
        let pair = IntervalPair::with_ranges(&a, Interval::new(0.0, 0.25), &b, Interval::FULL);
        assert_eq!(pair.longer_side(), Side::Q);
        let swapped = pair.swapped();
        assert_eq!(swapped.role, Role::Swapped);
        assert_eq!(swapped.p_range, Interval::FULL);
        assert_eq!(swapped.normalized(), pair.normalized());
        assert_eq!(swapped.swapped().role, Role::Original);
        let (lo, hi) = pair.split_longer();
        assert_eq!(lo.q_range.end, 0.5);
        assert!(hi.q_range.start > 0.5);
        assert_eq!(lo.p_range, pair.p_range);
    }

    #[test]
    fn collapsed_image_counts_as_converged() {
        // Every control point coincides.
        let c = Bezier::new([(1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]).unwrap();
        let l = Bezier::new([(0.0, 0.0), (2.0, 2.0)]).unwrap();
        let pair = IntervalPair::new(&c, &l);
        let eps = Epsilon::new(-20);
        assert!(pair.p_converged(eps, Epsilon::new(-30)));
        assert!(!pair.q_converged(eps, Epsilon::new(-30)));
    }

    #[test]
    fn coinciding_end_images_count_as_converged() {
        // A closed loop: both ends of the full range map to the origin.
        let closed = Bezier::new([(0.0, 0.0), (100.0, 100.0), (-100.0, 100.0), (0.0, 0.0)]).unwrap();
        let l = Bezier::new([(-100.0, 50.0), (100.0, 50.0)]).unwrap();
        let eps = Epsilon::new(-20);
        let point_eps = Epsilon::new(-30);
        let pair = IntervalPair::new(&closed, &l);
        assert!(pair.p_converged(eps, point_eps));
        assert!(pair.swapped().q_converged(eps, point_eps));
        // Half of the loop has distinct end images.
        let half = IntervalPair::with_ranges(&closed, Interval::new(0.0, 0.5), &l, Interval::FULL);
        assert!(!half.p_converged(eps, point_eps));
    }
}
