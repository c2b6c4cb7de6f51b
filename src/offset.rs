// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offset curves.
//!
//! The offset of a curve at a signed distance `d` is the set of points
//! `c(t) + d n(t)`, where `n` is the unit left normal. It is not itself a
//! Bézier curve, so it is approximated piecewise:
//!
//! 1. The curve is split at its cusps and the remaining stretches are
//!    bisected until none turns by more than a half turn. See
//!    [`split_cusps`] and [`simplify`].
//! 2. Each ordinary segment is approximated by translating the legs of its
//!    control polygon and reconnecting them, bisecting until the result is
//!    within the accuracy. Each cusp becomes a circular arc around the cusp
//!    point. See [`approximate_offset`].
//! 3. Self-intersections introduced by the approximation are cut out, while
//!    loops that belong to the input are kept. See [`refine_offset`].

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use smallvec::SmallVec;

use crate::bezier::Points;
use crate::refine::refine_offset;
use crate::simplify::{simplify, split_cusps, Segment, SegmentKind};
use crate::{Arc, Bezier, CurveError, Epsilon, Interval, Line, ParamCurve, Point};

/// Offset legs whose reconnection point lands farther than this many
/// distances from the original vertex are treated as parallel.
const RUNAWAY_FACTOR: f64 = 4.0;

/// Precision at which consecutive control points count as duplicates.
const DUPLICATE_POINTS: Epsilon = Epsilon::new(-30);

/// Options for computing offset curves.
///
/// The defaults suit curves drawn in units of roughly a pixel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetOptions {
    /// Maximum deviation of an offset piece from the exact offset.
    pub accuracy: f64,
    /// Maximum bisection depth when refining an offset piece.
    pub max_depth: usize,
    /// Maximum bisection depth when simplifying the input.
    pub simplify_max_depth: usize,
    /// Number of derivative samples when looking for cusps.
    pub cusp_samples: usize,
    /// Change of direction between derivative samples, in radians, above
    /// which a cusp is suspected.
    pub cusp_angle: f64,
    /// Maximum number of refinement steps for a suspected cusp.
    pub cusp_refine_depth: usize,
    /// Cusp refinement stops once the bracket spans less than this distance.
    pub cusp_bracket_size: f64,
    /// Cusps closer together than this distance are merged.
    pub cusp_merge_distance: f64,
    /// Crossings of adjacent pieces within this fraction of their shared end
    /// are treated as the shared end itself.
    pub boundary_fraction: f64,
    /// Number of derivative samples when measuring how far the input turns
    /// between the two ends of a crossing.
    pub winding_samples: usize,
    /// Turning, in radians, at or above which a crossing belongs to a loop
    /// of the input and is kept.
    pub winding_threshold: f64,
    /// Pieces are treated as straight lines once their control points are
    /// within this distance of their chord.
    pub flatness: f64,
    /// A piece lying within the offset distance less this margin of the
    /// input curve is inside the offset region.
    pub containment_epsilon: f64,
}

impl Default for OffsetOptions {
    fn default() -> Self {
        OffsetOptions {
            accuracy: 0.1,
            max_depth: 32,
            simplify_max_depth: 16,
            cusp_samples: 128,
            cusp_angle: 10f64.to_radians(),
            cusp_refine_depth: 4,
            cusp_bracket_size: 0.2,
            cusp_merge_distance: 1.0,
            boundary_fraction: 0.02,
            winding_samples: 64,
            winding_threshold: core::f64::consts::PI,
            flatness: 1e-3,
            containment_epsilon: 0.1,
        }
    }
}

impl OffsetOptions {
    /// Builder method for setting the accuracy.
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Builder method for setting the maximum refinement depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method for setting the maximum simplification depth.
    pub fn with_simplify_max_depth(mut self, depth: usize) -> Self {
        self.simplify_max_depth = depth;
        self
    }

    /// Builder method for setting the number of cusp detection samples.
    pub fn with_cusp_samples(mut self, samples: usize) -> Self {
        self.cusp_samples = samples;
        self
    }

    /// Builder method for setting the cusp detection angle, in radians.
    pub fn with_cusp_angle(mut self, angle: f64) -> Self {
        self.cusp_angle = angle;
        self
    }

    /// Builder method for setting the cusp refinement limits.
    pub fn with_cusp_refinement(mut self, depth: usize, bracket_size: f64) -> Self {
        self.cusp_refine_depth = depth;
        self.cusp_bracket_size = bracket_size;
        self
    }

    /// Builder method for setting the distance under which cusps are merged.
    pub fn with_cusp_merge_distance(mut self, distance: f64) -> Self {
        self.cusp_merge_distance = distance;
        self
    }

    /// Builder method for setting the boundary fraction of adjacent pieces.
    pub fn with_boundary_fraction(mut self, fraction: f64) -> Self {
        self.boundary_fraction = fraction;
        self
    }

    /// Builder method for setting how loops of the input are recognised.
    pub fn with_winding(mut self, samples: usize, threshold: f64) -> Self {
        self.winding_samples = samples;
        self.winding_threshold = threshold;
        self
    }

    /// Builder method for setting the flatness tolerance.
    pub fn with_flatness(mut self, flatness: f64) -> Self {
        self.flatness = flatness;
        self
    }

    /// Builder method for setting the containment margin.
    pub fn with_containment_epsilon(mut self, epsilon: f64) -> Self {
        self.containment_epsilon = epsilon;
        self
    }
}

/// How an [`OffsetPiece`] was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceKind {
    /// Translated control legs of an ordinary segment.
    Offset,
    /// Part of the circular arc around a cusp.
    Arc,
}

/// One piece of a raw offset.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetPiece {
    /// The offset curve piece.
    pub curve: Bezier,
    /// How the piece was made.
    pub kind: PieceKind,
    /// Index of the prepared segment the piece derives from.
    pub source: usize,
    /// The parameter range of the input curve the piece derives from.
    pub range: Interval,
}

/// A raw offset: pieces in order along the input, possibly crossing each
/// other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetApproximation {
    /// The signed offset distance.
    pub distance: f64,
    /// The prepared segments of the input curve, see [`prepare`].
    pub segments: Vec<Segment>,
    /// The pieces, in order.
    pub pieces: Vec<OffsetPiece>,
}

/// Offset a curve by a signed distance, to its left for positive distances.
///
/// The result is a sequence of connected curves: each one starts exactly
/// where the previous one ends. A curve collapsed to a point, or a distance
/// that is not finite, gives an empty result.
pub fn offset(curve: &Bezier, distance: f64) -> Vec<Bezier> {
    match offset_with(curve, distance, &OffsetOptions::default()) {
        Ok(pieces) => pieces,
        Err(e) => {
            log::debug!("offset: {e}");
            Vec::new()
        }
    }
}

/// Offset a curve by a signed distance, with explicit options.
///
/// Returns an error if the distance is not finite.
pub fn offset_with(
    curve: &Bezier,
    distance: f64,
    options: &OffsetOptions,
) -> Result<Vec<Bezier>, CurveError> {
    if !distance.is_finite() {
        return Err(CurveError::NonFiniteDistance);
    }
    let approx = approximate_offset(curve, distance, options);
    Ok(refine_offset(curve, &approx, options))
}

/// Split `curve` at its cusps and simplify the ordinary stretches.
///
/// The indices of the returned list are the `source` indices of the offset
/// pieces.
pub fn prepare(curve: &Bezier, options: &OffsetOptions) -> Vec<Segment> {
    let mut segments = Vec::new();
    for segment in split_cusps(curve, options) {
        match segment.kind {
            SegmentKind::Cusp => segments.push(segment),
            SegmentKind::Ordinary => segments.extend(
                simplify(curve, segment.range, options)
                    .into_iter()
                    .map(|range| Segment {
                        kind: SegmentKind::Ordinary,
                        range,
                    }),
            ),
        }
    }
    segments
}

/// Compute the raw offset of a curve.
///
/// Pieces are not yet checked for crossings; see [`refine_offset`].
pub fn approximate_offset(
    curve: &Bezier,
    distance: f64,
    options: &OffsetOptions,
) -> OffsetApproximation {
    let mut approx = OffsetApproximation {
        distance,
        ..Default::default()
    };
    if curve.is_point(DUPLICATE_POINTS) {
        log::debug!("approximate_offset: curve is a single point");
        return approx;
    }
    approx.segments = prepare(curve, options);
    for (source, segment) in approx.segments.iter().enumerate() {
        match segment.kind {
            SegmentKind::Ordinary => approximate_segment(
                curve,
                segment.range,
                distance,
                source,
                options,
                &mut approx.pieces,
            ),
            SegmentKind::Cusp => {
                cusp_arc(curve, segment.range, distance, source, &mut approx.pieces);
            }
        }
    }
    log::trace!(
        "approximate_offset: {} segments, {} pieces",
        approx.segments.len(),
        approx.pieces.len()
    );
    approx
}

/// Offset one ordinary segment, bisecting until each piece is accurate.
fn approximate_segment(
    curve: &Bezier,
    range: Interval,
    distance: f64,
    source: usize,
    options: &OffsetOptions,
    out: &mut Vec<OffsetPiece>,
) {
    let mut work = vec![(range, 0usize)];
    while let Some((range, depth)) = work.pop() {
        let sub = curve.subsegment(range.range());
        let candidate = translate_legs(&sub, distance);
        let error = deviation(&sub, &candidate, distance);
        if error > options.accuracy && depth < options.max_depth {
            let mid = range.midpoint();
            work.push((Interval::new(mid, range.end), depth + 1));
            work.push((Interval::new(range.start, mid), depth + 1));
            continue;
        }
        if error > options.accuracy {
            log::debug!("offset piece {range:?} kept with error {error} at depth {depth}");
        }
        out.push(OffsetPiece {
            curve: candidate,
            kind: PieceKind::Offset,
            source,
            range,
        });
    }
}

/// Largest distance between the approximation and the exact offset, sampled
/// at matching parameters.
fn deviation(sub: &Bezier, candidate: &Bezier, distance: f64) -> f64 {
    let n = 4 * sub.points().len();
    let mut worst: f64 = 0.0;
    for i in 0..=n {
        let t = i as f64 / n as f64;
        let Some(normal) = sub.normal(t) else {
            continue;
        };
        let exact = sub.eval(t) + distance * normal;
        worst = worst.max(exact.distance(candidate.eval(t)));
    }
    worst
}

/// Translate each leg of the control polygon along its left normal and
/// reconnect the legs.
///
/// Runs of coincident control points are collapsed into one weighted vertex
/// first, and expanded again afterwards, so the degree is preserved.
pub(crate) fn translate_legs(sub: &Bezier, distance: f64) -> Bezier {
    let mut vertices: SmallVec<[(Point, usize); 4]> = SmallVec::new();
    for p in sub.points() {
        match vertices.last_mut() {
            Some((v, count)) if DUPLICATE_POINTS.points_eq(*v, *p) => *count += 1,
            _ => vertices.push((*p, 1)),
        }
    }
    if vertices.len() < 2 {
        return sub.clone();
    }

    let legs: SmallVec<[Line; 4]> = vertices
        .windows(2)
        .map(|w| {
            let leg = Line::new(w[0].0, w[1].0);
            // Vertices are distinct, so the direction is not zero.
            let normal = leg.direction().try_normalize().unwrap_or_default().turn_90();
            let shift = distance * normal;
            Line::new(leg.p0 + shift, leg.p1 + shift)
        })
        .collect();

    let mut points = Points::with_capacity(sub.points().len());
    for (i, &(v, count)) in vertices.iter().enumerate() {
        let moved = if i == 0 {
            legs[0].p0
        } else if i == vertices.len() - 1 {
            legs[i - 1].p1
        } else {
            let (before, after) = (legs[i - 1], legs[i]);
            match before.crossing_point(after) {
                Some(p) if p.distance(v) <= RUNAWAY_FACTOR * distance.abs() => p,
                _ => before.p1.midpoint(after.p0),
            }
        };
        points.extend(core::iter::repeat(moved).take(count));
    }
    Bezier::from_points(points)
}

/// Render a cusp as a circular arc around the cusp point.
fn cusp_arc(
    curve: &Bezier,
    range: Interval,
    distance: f64,
    source: usize,
    out: &mut Vec<OffsetPiece>,
) {
    let radius = distance.abs();
    if radius == 0.0 {
        return;
    }
    let center = curve.eval(range.midpoint());
    let (Some(n0), Some(n1), Some(incoming)) = (
        curve.normal(range.start),
        curve.normal(range.end),
        curve.tangent(range.start),
    ) else {
        log::debug!("cusp at {range:?} has no direction, skipped");
        return;
    };
    let Some(arc) = Arc::between(center, radius, distance * n0, distance * n1, incoming) else {
        return;
    };
    let mut pieces: Vec<Bezier> = arc.cubics().collect();
    if let Some(prev) = out.last() {
        let prev_end = prev.curve.end();
        if arc.end_point().distance(prev_end) < arc.start_point().distance(prev_end) {
            pieces = pieces.iter().rev().map(Bezier::reversed).collect();
        }
    }
    out.extend(pieces.into_iter().map(|curve| OffsetPiece {
        curve,
        kind: PieceKind::Arc,
        source,
        range,
    }));
}

#[cfg(test)]
mod tests {
    use super::{approximate_offset, offset, offset_with, translate_legs, PieceKind};
    use crate::{Bezier, CurveError, OffsetOptions, ParamCurve, Point};

    const K: f64 = 0.551_915_024_494;

    fn quarter_circle(r: f64) -> Bezier {
        Bezier::new([(r, 0.0), (r, r * K), (r * K, r), (0.0, r)]).unwrap()
    }

    fn assert_connected(pieces: &[Bezier]) {
        for w in pieces.windows(2) {
            assert_eq!(w[0].end(), w[1].start());
        }
    }

    #[test]
    fn translated_line() {
        let line = Bezier::new([(0.0, 0.0), (10.0, 0.0)]).unwrap();
        let moved = translate_legs(&line, 2.0);
        assert_eq!(moved.points(), [Point::new(0.0, 2.0), Point::new(10.0, 2.0)]);
        // Duplicated control points keep their multiplicity.
        let doubled = Bezier::new([(0.0, 0.0), (0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]).unwrap();
        let moved = translate_legs(&doubled, -1.0);
        assert_eq!(moved.degree(), 3);
        assert_eq!(moved.points()[0], moved.points()[1]);
        assert_eq!(moved.points()[0], Point::new(0.0, -1.0));
        assert!(moved.points()[2].distance(Point::new(11.0, -1.0)) < 1e-12);
    }

    #[test]
    fn circle_offsets_are_concentric() {
        let r = 50.0;
        let c = quarter_circle(r);
        // Left of a counter-clockwise arc is inwards.
        for (d, expected) in [(10.0, 40.0), (-10.0, 60.0)] {
            let pieces = offset(&c, d);
            assert!(!pieces.is_empty());
            assert_connected(&pieces);
            for piece in &pieces {
                for i in 0..=16 {
                    let radius = piece.eval(i as f64 / 16.0).distance(Point::ZERO);
                    assert!(
                        (radius - expected).abs() < 0.1 + 3e-4 * r,
                        "d = {d}: radius {radius}"
                    );
                }
            }
            assert!(pieces[0].start().distance(Point::new(r - d, 0.0)) < 0.1);
        }
    }

    #[test]
    fn cusp_becomes_arc() {
        let c = Bezier::new([(0.0, 0.0), (10.0, 0.0), (-10.0, 0.0), (0.0, 0.0)]).unwrap();
        let d = 2.0;
        let approx = approximate_offset(&c, d, &OffsetOptions::default());
        let arcs: Vec<_> = approx
            .pieces
            .iter()
            .filter(|p| p.kind == PieceKind::Arc)
            .collect();
        assert!(!arcs.is_empty());
        for arc in &arcs {
            let center = c.eval(arc.range.midpoint());
            for i in 0..=8 {
                let r = arc.curve.eval(i as f64 / 8.0).distance(center);
                assert!((r - d).abs() < 2e-3, "{r}");
            }
        }

        let pieces = offset(&c, d);
        assert!(!pieces.is_empty());
        assert_connected(&pieces);
        // The arc around the first cusp reaches past it in the direction of travel.
        let furthest = pieces
            .iter()
            .flat_map(|p| (0..=8).map(move |i| p.eval(i as f64 / 8.0).x))
            .fold(f64::MIN, f64::max);
        // The first cusp is at x = 5 / sqrt(3).
        let cusp_x = 5.0 / 3f64.sqrt();
        assert!((furthest - (cusp_x + d)).abs() < 0.05, "{furthest}");
    }

    #[test]
    fn degenerate_input() {
        let point = Bezier::new([(3.0, 3.0), (3.0, 3.0), (3.0, 3.0)]).unwrap();
        assert!(offset(&point, 5.0).is_empty());
        let line = Bezier::new([(0.0, 0.0), (10.0, 0.0)]).unwrap();
        assert_eq!(
            offset_with(&line, f64::NAN, &OffsetOptions::default()),
            Err(CurveError::NonFiniteDistance)
        );
        assert!(offset(&line, f64::INFINITY).is_empty());
        let zero = offset(&line, 0.0);
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].start(), Point::ZERO);
    }
}
