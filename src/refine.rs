// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Removing self-intersections from a raw offset.
//!
//! Where the input bends more tightly than the offset distance, the raw
//! offset folds back over itself and forms small swallowtail loops. These
//! are cut out. Loops that the input curve itself makes are real features
//! of the offset and are kept; the two are told apart by how far the input
//! turns between the two ends of the crossing.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::common::{min_max, turning_angle};
use crate::{
    Bezier, Interval, Line, OffsetApproximation, OffsetOptions, ParamCurve, ParamCurveDeriv,
    ParamCurveNearest,
};

/// Bisection depth limit of the flatness intersector.
const MAX_FLAT_DEPTH: usize = 32;

/// Iteration limit of the flatness intersector, per pair of pieces.
const MAX_FLAT_ITERATIONS: usize = 1 << 14;

/// Crossings closer than this in both parameters are the same crossing.
const SAME_CROSSING: f64 = 1e-6;

/// Kept stretches shorter than this, in piece parameters, are dropped.
const MIN_STRETCH: f64 = 1e-9;

/// Number of points of a piece checked against the input curve.
const CONTAINMENT_SAMPLES: usize = 8;

/// A crossing between two pieces of the raw offset.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Crossing {
    first: usize,
    s: f64,
    second: usize,
    u: f64,
}

/// A stretch of the piece sequence, with positions `i + t` meaning
/// parameter `t` of piece `i`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    start: f64,
    end: f64,
}

impl Span {
    fn strictly_contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end && self != other
    }
}

/// Cut the artificial loops out of a raw offset and stitch the rest into a
/// connected sequence.
///
/// `curve` is the curve the approximation was computed from. Consecutive
/// curves of the result share their endpoints exactly.
pub fn refine_offset(
    curve: &Bezier,
    approx: &OffsetApproximation,
    options: &OffsetOptions,
) -> Vec<Bezier> {
    let pieces = &approx.pieces;
    if pieces.is_empty() {
        return Vec::new();
    }
    let deriv = curve.deriv();

    let mut spans = Vec::new();
    for i in 0..pieces.len() {
        for j in i + 1..pieces.len() {
            let hits = flat_crossings(&pieces[i].curve, &pieces[j].curve, options.flatness);
            let isolated = hits.len() == 1;
            for (s, u) in hits {
                let crossing = Crossing {
                    first: i,
                    s,
                    second: j,
                    u,
                };
                if is_boundary(crossing, isolated, pieces.len(), options.boundary_fraction) {
                    continue;
                }
                let t0 = pieces[i].range.lerp(s);
                let t1 = pieces[j].range.lerp(u);
                let turn = input_turning(&deriv, t0, t1, options.winding_samples);
                if turn.abs() >= options.winding_threshold {
                    log::trace!("crossing {crossing:?} is a loop of the input, kept");
                    continue;
                }
                spans.push(Span {
                    start: i as f64 + s,
                    end: j as f64 + u,
                });
            }
        }
    }
    log::trace!("refine_offset: {} local crossings", spans.len());

    let cuts = resolve_spans(spans);
    let mut result = Vec::with_capacity(pieces.len());
    let mut from = 0.0;
    for cut in &cuts {
        extract(approx, from, cut.start, &mut result);
        from = cut.end;
    }
    extract(approx, from, pieces.len() as f64, &mut result);

    let result = prune_contained(curve, result, approx.distance, options);
    stitch(result)
}

/// Whether a crossing is only the shared end of neighbouring pieces.
///
/// `isolated` tells whether it is the only crossing of its pair of pieces;
/// neighbours that also cross elsewhere keep their crossing near the joint.
fn is_boundary(c: Crossing, isolated: bool, count: usize, fraction: f64) -> bool {
    let adjacent =
        isolated && c.second == c.first + 1 && c.s >= 1.0 - fraction && c.u <= fraction;
    // The last piece may end where the first one starts.
    let closure =
        c.first == 0 && c.second == count - 1 && c.s <= fraction && c.u >= 1.0 - fraction;
    adjacent || closure
}

/// Signed turning of the input between parameters `t0` and `t1`, measured
/// on samples of its derivative.
fn input_turning(deriv: &Bezier, t0: f64, t1: f64, samples: usize) -> f64 {
    let (lo, hi) = min_max(t0, t1);
    let samples = samples.max(1);
    let mut total = 0.0;
    let mut prev = None;
    for k in 0..=samples {
        let t = lo + (hi - lo) * (k as f64 / samples as f64);
        let dir = deriv.eval(t).to_vec2();
        if dir.hypot2() == 0.0 {
            continue;
        }
        if let Some(prev) = prev {
            total += turning_angle(prev, dir);
        }
        prev = Some(dir);
    }
    total
}

/// Choose which spans to cut.
///
/// Spans nested inside another are dropped, and a span starting inside an
/// already removed stretch is skipped. The result is sorted and disjoint.
fn resolve_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.total_cmp(&b.start).then(b.end.total_cmp(&a.end)));
    let outer: Vec<Span> = spans
        .iter()
        .copied()
        .filter(|span| !spans.iter().any(|other| other.strictly_contains(*span)))
        .collect();
    let mut cuts: Vec<Span> = Vec::with_capacity(outer.len());
    for span in outer {
        debug_assert!(span.start <= span.end, "span out of order: {span:?}");
        if cuts.last().is_some_and(|last| span.start < last.end) {
            continue;
        }
        cuts.push(span);
    }
    cuts
}

/// Append the pieces covering positions `from..to` of the sequence.
fn extract(approx: &OffsetApproximation, from: f64, to: f64, out: &mut Vec<Bezier>) {
    let pieces = &approx.pieces;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "`from` is a position in the sequence, at most the number of pieces"
    )]
    let first = from.floor().max(0.0) as usize;
    for (k, piece) in pieces.iter().enumerate().skip(first) {
        let base = k as f64;
        if base >= to {
            break;
        }
        let lo = (from - base).max(0.0);
        let hi = (to - base).min(1.0);
        if hi - lo < MIN_STRETCH {
            continue;
        }
        if lo == 0.0 && hi == 1.0 {
            out.push(piece.curve.clone());
        } else {
            out.push(piece.curve.subsegment(lo..hi));
        }
    }
}

/// Drop the runs of pieces at either end that lie inside the offset region.
fn prune_contained(
    curve: &Bezier,
    pieces: Vec<Bezier>,
    distance: f64,
    options: &OffsetOptions,
) -> Vec<Bezier> {
    let limit = distance.abs() - options.containment_epsilon;
    if limit <= 0.0 {
        return pieces;
    }
    let contained = |piece: &Bezier| {
        (0..=CONTAINMENT_SAMPLES).all(|i| {
            let p = piece.eval(i as f64 / CONTAINMENT_SAMPLES as f64);
            curve.nearest(p, 1e-9).distance_sq < limit * limit
        })
    };
    let lead = pieces.iter().take_while(|p| contained(*p)).count();
    if lead == pieces.len() {
        log::debug!("refine_offset: every piece lies inside the offset region");
        return Vec::new();
    }
    let trail = pieces.iter().rev().take_while(|p| contained(*p)).count();
    let end = pieces.len() - trail;
    if lead > 0 || trail > 0 {
        log::trace!("refine_offset: pruned {lead} leading and {trail} trailing pieces");
    }
    pieces.into_iter().take(end).skip(lead).collect()
}

/// Snap every pair of neighbouring ends to their midpoint.
fn stitch(mut pieces: Vec<Bezier>) -> Vec<Bezier> {
    for k in 1..pieces.len() {
        let joint = pieces[k - 1].end().midpoint(pieces[k].start());
        pieces[k - 1] = pieces[k - 1].with_end(joint);
        pieces[k] = pieces[k].with_start(joint);
    }
    pieces
}

/// Crossings of two curves, found by bisecting both until they are flat and
/// intersecting the chords.
///
/// Returns parameter pairs, one per crossing.
fn flat_crossings(a: &Bezier, b: &Bezier, flatness: f64) -> Vec<(f64, f64)> {
    let mut found: Vec<(f64, f64)> = Vec::new();
    let mut work = vec![(Interval::FULL, Interval::FULL, 0usize)];
    let mut iterations = 0;
    while let Some((ra, rb, depth)) = work.pop() {
        iterations += 1;
        if iterations > MAX_FLAT_ITERATIONS {
            log::debug!("flat_crossings: iteration limit reached");
            break;
        }
        let sa = a.subsegment(ra.range());
        let sb = b.subsegment(rb.range());
        if !sa
            .bounding_box()
            .inflate(flatness)
            .overlaps(&sb.bounding_box())
        {
            continue;
        }
        let flat_a = is_flat(&sa, flatness);
        let flat_b = is_flat(&sb, flatness);
        if (flat_a && flat_b) || depth >= MAX_FLAT_DEPTH {
            let chord_a = Line::new(sa.start(), sa.end());
            let chord_b = Line::new(sb.start(), sb.end());
            if let Some((s, u)) = chord_a.segment_crossing(chord_b, MIN_STRETCH) {
                let hit = (ra.lerp(s), rb.lerp(u));
                let duplicate = found.iter().any(|&(s0, u0)| {
                    (s0 - hit.0).abs() < SAME_CROSSING && (u0 - hit.1).abs() < SAME_CROSSING
                });
                if !duplicate {
                    found.push(hit);
                }
            }
            continue;
        }
        let halves_a = if flat_a {
            [ra, Interval::EMPTY]
        } else {
            let mid = ra.midpoint();
            [Interval::new(ra.start, mid), Interval::new(mid, ra.end)]
        };
        let halves_b = if flat_b {
            [rb, Interval::EMPTY]
        } else {
            let mid = rb.midpoint();
            [Interval::new(rb.start, mid), Interval::new(mid, rb.end)]
        };
        for ha in halves_a.into_iter().filter(|r| !r.is_empty()) {
            for hb in halves_b.into_iter().filter(|r| !r.is_empty()) {
                work.push((ha, hb, depth + 1));
            }
        }
    }
    found.sort_by(|x, y| x.0.total_cmp(&y.0));
    found
}

/// Whether every control point is within `tolerance` of the chord.
fn is_flat(curve: &Bezier, tolerance: f64) -> bool {
    let p0 = curve.start();
    let chord = curve.end() - p0;
    let len = chord.hypot();
    if len <= tolerance {
        return curve.bounding_box().max_extent() <= tolerance;
    }
    curve
        .points()
        .iter()
        .all(|p| chord.cross(*p - p0).abs() <= tolerance * len)
}

#[cfg(test)]
mod tests {
    use super::{flat_crossings, is_boundary, refine_offset, Crossing};
    use crate::{
        offset, Bezier, Interval, OffsetApproximation, OffsetOptions, OffsetPiece, ParamCurve,
        ParamCurveNearest, PieceKind, Point,
    };

    fn approximation(
        distance: f64,
        corners: &[(f64, f64)],
        ranges: &[Interval],
    ) -> OffsetApproximation {
        let pieces = corners
            .windows(2)
            .zip(ranges)
            .enumerate()
            .map(|(source, (w, &range))| OffsetPiece {
                curve: Bezier::line(w[0].into(), w[1].into()),
                kind: PieceKind::Offset,
                source,
                range,
            })
            .collect();
        OffsetApproximation {
            distance,
            segments: Vec::new(),
            pieces,
        }
    }

    fn quarters() -> [Interval; 4] {
        [
            Interval::new(0.0, 0.25),
            Interval::new(0.25, 0.5),
            Interval::new(0.5, 0.75),
            Interval::new(0.75, 1.0),
        ]
    }

    fn near(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn chords_cross() {
        let a = Bezier::new([(0.0, 0.0), (50.0, 40.0), (100.0, 0.0)]).unwrap();
        let b = Bezier::new([(0.0, 10.0), (100.0, 10.0)]).unwrap();
        let hits = flat_crossings(&a, &b, 1e-3);
        assert_eq!(hits.len(), 2);
        for (s, u) in hits {
            assert!(a.eval(s).distance(b.eval(u)) < 1e-2);
        }
    }

    #[test]
    fn only_isolated_joints_are_boundaries() {
        let joint = Crossing {
            first: 2,
            s: 0.995,
            second: 3,
            u: 0.004,
        };
        assert!(is_boundary(joint, true, 6, 0.02));
        assert!(!is_boundary(joint, false, 6, 0.02));
        let far = Crossing { s: 0.9, ..joint };
        assert!(!is_boundary(far, true, 6, 0.02));
        let closure = Crossing {
            first: 0,
            s: 0.001,
            second: 5,
            u: 0.999,
        };
        assert!(is_boundary(closure, false, 6, 0.02));
    }

    #[test]
    fn swallowtail_is_cut() {
        let line = Bezier::new([(0.0, 0.0), (100.0, 0.0)]).unwrap();
        let approx = approximation(
            10.0,
            &[(0.0, 10.0), (60.0, 10.0), (60.0, 5.0), (40.0, 15.0), (100.0, 10.0)],
            &quarters(),
        );
        let refined = refine_offset(&line, &approx, &OffsetOptions::default());
        assert_eq!(refined.len(), 3);
        assert!(near(refined[0].start(), Point::new(0.0, 10.0)));
        assert!(near(refined[0].end(), Point::new(50.0, 10.0)));
        assert!(near(refined[1].end(), Point::new(40.0, 15.0)));
        assert!(near(refined[2].end(), Point::new(100.0, 10.0)));
        for w in refined.windows(2) {
            assert_eq!(w[0].end(), w[1].start());
        }
    }

    #[test]
    fn loop_of_the_input_is_kept() {
        let loopy =
            Bezier::new([(0.0, 0.0), (150.0, 100.0), (-50.0, 100.0), (100.0, 0.0)]).unwrap();
        let ranges = [
            Interval::new(0.0, 0.02),
            Interval::new(0.02, 0.5),
            Interval::new(0.98, 1.0),
            Interval::new(0.99, 1.0),
        ];
        let approx = approximation(
            10.0,
            &[
                (0.0, 1010.0),
                (60.0, 1010.0),
                (60.0, 1005.0),
                (40.0, 1015.0),
                (100.0, 1010.0),
            ],
            &ranges,
        );
        let refined = refine_offset(&loopy, &approx, &OffsetOptions::default());
        assert_eq!(refined.len(), 4);
        assert_eq!(refined[0].end(), Point::new(60.0, 1010.0));
    }

    #[test]
    fn contained_ends_are_pruned() {
        let line = Bezier::new([(0.0, 0.0), (100.0, 0.0)]).unwrap();
        let ranges = [Interval::new(0.0, 0.1), Interval::new(0.1, 0.2), Interval::new(0.2, 1.0)];
        let corners = [(0.0, 2.0), (10.0, 2.0), (20.0, 10.0), (100.0, 10.0)];
        let approx = approximation(10.0, &corners, &ranges);
        let refined = refine_offset(&line, &approx, &OffsetOptions::default());
        assert_eq!(refined.len(), 2);
        assert_eq!(refined[0].start(), Point::new(10.0, 2.0));

        let inside = approximation(10.0, &[(0.0, 2.0), (50.0, 3.0), (100.0, 2.0)], &ranges);
        assert!(refine_offset(&line, &inside, &OffsetOptions::default()).is_empty());
    }

    #[test]
    fn tight_bend_offset_stays_outside() {
        // Radius of curvature 25 at the apex, offset inwards by 30.
        let c = Bezier::new([(0.0, 0.0), (50.0, 100.0), (100.0, 0.0)]).unwrap();
        let d = -30.0;
        let pieces = offset(&c, d);
        assert!(!pieces.is_empty());
        for w in pieces.windows(2) {
            assert_eq!(w[0].end(), w[1].start());
        }
        for piece in &pieces {
            for i in 0..=8 {
                let p = piece.eval(i as f64 / 8.0);
                let dist = c.nearest(p, 1e-9).distance_sq.sqrt();
                assert!(dist > 29.0 - 1.0, "{p:?} at {dist}");
            }
        }
    }
}
