// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersection of two Bézier curves by Bézier clipping.
//!
//! The search runs in phases, each at its own precision:
//!
//! 1. Every end point of each curve is looked up on the other curve by
//!    bounding-box bisection. The clipping loop is unstable exactly at the
//!    ends of the domain, so these matches are recorded separately and take
//!    precedence.
//! 2. Pairs of end-point matches are the candidate bounds of an overlap, a
//!    stretch where both curves trace the same points. A confirmed overlap
//!    is reported as a range and its points are excluded from the result.
//! 3. The clipping loop narrows pairs of parameter intervals with fat lines
//!    until both sides converge at a coarse precision, yielding chunks.
//! 4. Chunks are clustered, and each cluster is resolved to at most one
//!    point by running the loop again at a fine precision.
//!
//! All recursion is an explicit work list with hard caps. Running out of
//! budget drops that branch; it is not an error.

use alloc::vec;
use alloc::vec::Vec;

use arrayvec::ArrayVec;

use crate::fat_line::{clip_to_point, FatLine};
use crate::{Bezier, Epsilon, Interval, IntervalPair, ParamCurve, Point};

/// Parameter precision at which chunks of the clipping loop converge, and at
/// which intervals count as adjacent when clustering.
pub const PARAM_COARSE: Epsilon = Epsilon::new(-39);

/// Parameter precision at which a cluster is resolved to a point.
pub const PARAM_FINE: Epsilon = Epsilon::new(-20);

/// Point precision at which sub-curves count as collapsed during clipping.
pub const POINT_FINE: Epsilon = Epsilon::new(-30);

/// Point precision for containment, membership and deduplication.
pub const POINT_COARSE: Epsilon = Epsilon::new(-36);

/// Maximum number of interval pairs examined by one run of the clipping loop.
pub const MAX_CLIP_ITERATIONS: usize = 4096;

/// Maximum number of clips and splits along one branch of the clipping loop.
pub const MAX_CLIP_DEPTH: usize = 128;

/// When a clip keeps more than this fraction of the subject interval, the
/// pair is split instead.
const SPLIT_RATIO: f64 = 0.8;

const MAX_CONTAINMENT_ITERATIONS: usize = 4096;
const MAX_CONTAINMENT_DEPTH: usize = 64;

/// Number of sub-intervals sampled when confirming an overlap.
const OVERLAP_SAMPLES: usize = 8;
const OVERLAP_BISECTIONS: usize = 48;

/// A point where two curves meet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Parameter on the first curve.
    pub t0: f64,
    /// Parameter on the second curve.
    pub t1: f64,
    /// The point itself.
    pub point: Point,
}

/// A stretch traced by both curves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    /// The shared range on the first curve.
    pub range0: Interval,
    /// The shared range on the second curve.
    pub range1: Interval,
    /// Whether the second curve runs through the shared stretch in the
    /// opposite direction.
    pub reversed: bool,
}

/// Everything [`intersections`] finds for a pair of curves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Intersections {
    /// Isolated intersection points, ordered by parameter on the first curve.
    pub points: Vec<Intersection>,
    /// The overlap, if the curves share a continuous stretch.
    pub overlap: Option<Overlap>,
}

impl Intersections {
    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.overlap.is_none()
    }
}

/// Settings for one run of the clipping loop.
struct Precision {
    param: Epsilon,
    point: Epsilon,
    /// Also stop when both sub-curves have collapsed onto the same point.
    stop_on_point: bool,
}

const CHUNKS: Precision = Precision {
    param: PARAM_COARSE,
    point: POINT_FINE,
    stop_on_point: false,
};

const RESOLVE: Precision = Precision {
    param: PARAM_FINE,
    point: POINT_FINE,
    stop_on_point: true,
};

/// Find where two curves meet.
///
/// If the curves share a continuous stretch, it is reported as an overlap and
/// no point inside it appears among the intersection points.
pub fn intersections(a: &Bezier, b: &Bezier) -> Intersections {
    if a.is_point(POINT_FINE) || b.is_point(POINT_FINE) {
        return point_intersections(a, b);
    }

    let hits = end_point_hits(a, b);
    let overlap = find_overlap(a, b, &hits);

    let mut ranges: ArrayVec<Interval, 2> = ArrayVec::new();
    match overlap {
        None => ranges.push(Interval::FULL),
        Some(o) => {
            if !PARAM_COARSE.eq(o.range0.start, 0.0) {
                ranges.push(Interval::new(0.0, o.range0.start));
            }
            if !PARAM_COARSE.eq(o.range0.end, 1.0) {
                ranges.push(Interval::new(o.range0.end, 1.0));
            }
        }
    }

    let mut chunks = Vec::new();
    for range in ranges {
        let pair = IntervalPair::with_ranges(a, range, b, Interval::FULL);
        chunks.extend(clip_loop(pair, &CHUNKS, false));
    }
    let n_chunks = chunks.len();
    let clusters = cluster(chunks);
    log::trace!(
        "intersections: {} end point matches, {} chunks, {} clusters",
        hits.len(),
        n_chunks,
        clusters.len()
    );

    let mut found: Vec<Intersection> = Vec::new();
    for hit in &hits {
        push_unique(&mut found, *hit);
    }
    for (ra, rb) in clusters {
        let at_end_point = hits.iter().any(|h| {
            ra.contains_within(h.t0, PARAM_COARSE) && rb.contains_within(h.t1, PARAM_COARSE)
        });
        if at_end_point {
            continue;
        }
        if let Some(x) = resolve(a, b, ra, rb) {
            push_unique(&mut found, x);
        }
    }

    if let Some(o) = overlap {
        found.retain(|x| {
            !o.range0.contains_within(x.t0, PARAM_COARSE)
                && !o.range1.contains_within(x.t1, PARAM_COARSE)
        });
    }
    found.sort_by(|x, y| x.t0.total_cmp(&y.t0));

    Intersections {
        points: found,
        overlap,
    }
}

/// The points where two curves meet, deduplicated.
///
/// An overlapping stretch contributes no points; see [`overlap`].
pub fn intersect(a: &Bezier, b: &Bezier) -> Vec<Point> {
    intersections(a, b).points.iter().map(|x| x.point).collect()
}

/// The largest stretch of `a` that `b` also traces, if any.
pub fn overlap(a: &Bezier, b: &Bezier) -> Option<Bezier> {
    if a.is_point(POINT_FINE) || b.is_point(POINT_FINE) {
        return None;
    }
    let hits = end_point_hits(a, b);
    let o = find_overlap(a, b, &hits)?;
    Some(a.subsegment(o.range0.range()))
}

/// The lowest parameter at which `curve` passes through `pt`, within the
/// tolerance of `eps`.
///
/// The search bisects the curve, discarding halves whose bounding box misses
/// the point. End points are checked first and return exactly 0 or 1.
///
/// One tolerance, scaled by the larger coordinate of `pt`, applies to both
/// coordinates, so a point with one coordinate near zero is found as readily
/// as any other.
pub fn containment_parameter(curve: &Bezier, pt: Point, eps: Epsilon) -> Option<f64> {
    let tol = eps.point_tolerance(pt);
    let near = |q: Point| (q.x - pt.x).abs() <= tol && (q.y - pt.y).abs() <= tol;
    if near(curve.start()) {
        return Some(0.0);
    }
    if near(curve.end()) {
        return Some(1.0);
    }
    let mut work = vec![(Interval::FULL, 0usize)];
    let mut iterations = 0;
    // Lower halves are popped first, so the first match has the lowest t.
    while let Some((range, depth)) = work.pop() {
        iterations += 1;
        if iterations > MAX_CONTAINMENT_ITERATIONS {
            log::debug!("containment search for {pt:?} exceeded its iteration budget");
            return None;
        }
        // A leaf box of extent at most tol/2 that reaches within tol/2 of
        // `pt` keeps every point of its curve within tol.
        let bbox = curve.subsegment(range.range()).bounding_box();
        if !bbox.inflate(0.5 * tol).contains(pt) {
            continue;
        }
        let mid = range.midpoint();
        if bbox.max_extent() <= 0.5 * tol || depth >= MAX_CONTAINMENT_DEPTH {
            if near(curve.eval(mid)) {
                return Some(mid);
            }
            continue;
        }
        work.push((Interval::new(mid, range.end), depth + 1));
        work.push((Interval::new(range.start, mid), depth + 1));
    }
    None
}

/// Intersections when at least one curve has collapsed to a point.
fn point_intersections(a: &Bezier, b: &Bezier) -> Intersections {
    let mut points = Vec::new();
    if a.is_point(POINT_FINE) {
        let pt = a.start();
        if let Some(t1) = containment_parameter(b, pt, POINT_COARSE) {
            points.push(Intersection { t0: 0.0, t1, point: pt });
        }
    } else {
        let pt = b.start();
        if let Some(t0) = containment_parameter(a, pt, POINT_COARSE) {
            points.push(Intersection { t0, t1: 0.0, point: pt });
        }
    }
    Intersections {
        points,
        overlap: None,
    }
}

/// End points of either curve lying on the other.
fn end_point_hits(a: &Bezier, b: &Bezier) -> ArrayVec<Intersection, 4> {
    let mut hits = ArrayVec::new();
    for t0 in [0.0, 1.0] {
        let point = a.eval(t0);
        if let Some(t1) = containment_parameter(b, point, POINT_COARSE) {
            hits.push(Intersection { t0, t1, point });
        }
    }
    for t1 in [0.0, 1.0] {
        let point = b.eval(t1);
        if let Some(t0) = containment_parameter(a, point, POINT_COARSE) {
            let seen = hits
                .iter()
                .any(|h| PARAM_COARSE.eq(h.t0, t0) && POINT_COARSE.points_eq(h.point, point));
            if !seen {
                hits.push(Intersection { t0, t1, point });
            }
        }
    }
    hits
}

/// Whether `pt` lies on `curve`.
fn on_curve(curve: &Bezier, pt: Point) -> bool {
    containment_parameter(curve, pt, POINT_COARSE).is_some()
}

/// Confirm the widest overlap whose bounds are a pair of end point matches.
fn find_overlap(a: &Bezier, b: &Bezier, hits: &[Intersection]) -> Option<Overlap> {
    let mut best: Option<Overlap> = None;
    for (i, h0) in hits.iter().enumerate() {
        for h1 in &hits[i + 1..] {
            let (lo, hi) = if h0.t0 <= h1.t0 { (h0, h1) } else { (h1, h0) };
            if PARAM_COARSE.eq(lo.t0, hi.t0) || PARAM_COARSE.eq(lo.t1, hi.t1) {
                continue;
            }
            let reversed = lo.t1 > hi.t1;
            let range1 = Interval::new(lo.t1.min(hi.t1), lo.t1.max(hi.t1));
            let b_sub = b.subsegment(range1.range());
            let a_sub = a.subsegment(lo.t0..hi.t0);
            let confirmed = (1..OVERLAP_SAMPLES).all(|k| {
                let s = k as f64 / OVERLAP_SAMPLES as f64;
                on_curve(&b_sub, a_sub.eval(s)) && on_curve(&a_sub, b_sub.eval(s))
            });
            if !confirmed {
                continue;
            }
            let mid = 0.5 * (lo.t0 + hi.t0);
            let start = tighten(a, &b_sub, mid, lo.t0);
            let end = tighten(a, &b_sub, mid, hi.t0);
            let range0 = Interval::new(start, end);
            if best.map_or(true, |o| range0.length() > o.range0.length()) {
                best = Some(Overlap {
                    range0,
                    range1,
                    reversed,
                });
            }
        }
    }
    best
}

/// Walk from `outside` towards `inside` until `a` lies on `other` again.
///
/// Returns `outside` itself when it is already on the other curve.
fn tighten(a: &Bezier, other: &Bezier, inside: f64, outside: f64) -> f64 {
    if on_curve(other, a.eval(outside)) {
        return outside;
    }
    let (mut inside, mut outside) = (inside, outside);
    for _ in 0..OVERLAP_BISECTIONS {
        if PARAM_FINE.eq(inside, outside) {
            break;
        }
        let m = 0.5 * (inside + outside);
        if on_curve(other, a.eval(m)) {
            inside = m;
        } else {
            outside = m;
        }
    }
    inside
}

/// Parameter range of `p` inside both fat lines of `q`.
fn fat_line_clip(p: &Bezier, q: &Bezier) -> Interval {
    let parallel = FatLine::from_curve(q).map(|f| f.clip(p));
    let perpendicular = FatLine::perpendicular(q).map(|f| f.clip(p));
    match (parallel, perpendicular) {
        (Some(a), Some(b)) => {
            if a.is_empty() || b.is_empty() {
                Interval::EMPTY
            } else {
                Interval::new(a.start.max(b.start), a.end.min(b.end))
            }
        }
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => Interval::FULL,
    }
}

/// Whether both sub-curves have collapsed onto one point.
fn collapsed_together(p: &Bezier, q: &Bezier, eps: Epsilon) -> bool {
    p.is_point(eps) && q.is_point(eps) && eps.points_eq(p.start(), q.start())
}

/// Run Bézier clipping from `start`, returning the converged interval pairs
/// as (first curve, second curve) intervals.
fn clip_loop(
    start: IntervalPair<'_>,
    precision: &Precision,
    first_only: bool,
) -> Vec<(Interval, Interval)> {
    let mut found = Vec::new();
    let mut work = vec![(start, 0usize)];
    let mut iterations = 0;
    while let Some((pair, depth)) = work.pop() {
        iterations += 1;
        if iterations > MAX_CLIP_ITERATIONS {
            log::debug!(
                "clipping loop exceeded {MAX_CLIP_ITERATIONS} iterations, {} pairs dropped",
                work.len() + 1
            );
            break;
        }
        if depth > MAX_CLIP_DEPTH {
            log::debug!("clipping branch exceeded depth {MAX_CLIP_DEPTH}");
            continue;
        }
        if pair.is_empty() {
            continue;
        }

        let p_curve = pair.p_curve();
        let q_curve = pair.q_curve();
        let p_done = pair.p_converged(precision.param, precision.point);
        let q_done = pair.q_converged(precision.param, precision.point);
        if (p_done && q_done)
            || (precision.stop_on_point && collapsed_together(&p_curve, &q_curve, precision.point))
        {
            found.push(pair.normalized());
            if first_only {
                break;
            }
            continue;
        }

        let magnitude = p_curve.start().magnitude().max(q_curve.start().magnitude());
        let tol = precision.point.tolerance(magnitude);
        if !p_curve
            .bounding_box()
            .inflate(tol)
            .overlaps(&q_curve.bounding_box())
        {
            continue;
        }
        if p_done {
            work.push((pair.swapped(), depth + 1));
            continue;
        }

        let clip = if q_curve.is_point(precision.point) {
            clip_to_point(&p_curve, q_curve.start(), tol)
        } else {
            fat_line_clip(&p_curve, &q_curve)
        };
        if clip.is_empty() {
            continue;
        }
        let mut next = pair;
        let ratio = next.p_range.scale_to(clip);
        if next.p_range.is_empty() {
            continue;
        }
        if ratio > SPLIT_RATIO {
            let (lo, hi) = next.split_longer();
            work.push((hi, depth + 1));
            work.push((lo, depth + 1));
        } else {
            work.push((next.swapped(), depth + 1));
        }
    }
    found
}

/// Merge chunks whose intervals touch on both curves, until nothing changes.
fn cluster(mut chunks: Vec<(Interval, Interval)>) -> Vec<(Interval, Interval)> {
    loop {
        chunks.sort_by(|x, y| x.0.start.total_cmp(&y.0.start));
        let before = chunks.len();
        let mut merged: Vec<(Interval, Interval)> = Vec::with_capacity(before);
        for (ra, rb) in chunks {
            match merged.last_mut() {
                Some((ma, mb))
                    if ma.overlaps(ra, PARAM_COARSE) && mb.overlaps(rb, PARAM_COARSE) =>
                {
                    *ma = ma.union(ra);
                    *mb = mb.union(rb);
                }
                _ => merged.push((ra, rb)),
            }
        }
        chunks = merged;
        if chunks.len() == before {
            return chunks;
        }
    }
}

/// Resolve a cluster to at most one intersection point.
fn resolve(a: &Bezier, b: &Bezier, ra: Interval, rb: Interval) -> Option<Intersection> {
    let grow = PARAM_COARSE.value();
    let widen = |r: Interval| Interval::new((r.start - grow).max(0.0), (r.end + grow).min(1.0));
    let pair = IntervalPair::with_ranges(a, widen(ra), b, widen(rb));
    let Some(&(ia, ib)) = clip_loop(pair, &RESOLVE, true).first() else {
        log::debug!("cluster {ra:?} x {rb:?} did not resolve to a point");
        return None;
    };
    let (mut t0, mut t1) = (ia.midpoint(), ib.midpoint());
    // A side stopped only because its end images coincide still spans a
    // loop; pin it to the other side's point.
    if !ia.is_converged(PARAM_FINE) && ib.is_converged(PARAM_FINE) {
        t0 = pin(a, ia, b.eval(t1)).unwrap_or(t0);
    } else if !ib.is_converged(PARAM_FINE) && ia.is_converged(PARAM_FINE) {
        t1 = pin(b, ib, a.eval(t0)).unwrap_or(t1);
    }
    let pa = a.eval(t0);
    let pb = b.eval(t1);
    if !POINT_COARSE.points_eq(pa, pb) {
        return None;
    }
    Some(Intersection {
        t0,
        t1,
        point: pa.midpoint(pb),
    })
}

/// The parameter within `range` where `curve` passes through `pt`.
fn pin(curve: &Bezier, range: Interval, pt: Point) -> Option<f64> {
    let sub = curve.subsegment(range.range());
    containment_parameter(&sub, pt, POINT_COARSE).map(|s| range.lerp(s))
}

fn push_unique(found: &mut Vec<Intersection>, x: Intersection) {
    if !found
        .iter()
        .any(|f| POINT_COARSE.points_eq(f.point, x.point))
    {
        found.push(x);
    }
}
