// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Preparing a curve for offsetting.
//!
//! Leg translation only approximates an offset well on pieces that neither
//! reverse direction nor turn too far. [`split_cusps`] finds the places where
//! the tangent flips, by sampling the hodograph, and [`simplify`] bisects the
//! rest until each piece turns by at most a half turn.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::common::turning_angle;
use crate::{Bezier, Interval, OffsetOptions, ParamCurve, ParamCurveDeriv, Vec2};

/// Number of chords sampled when measuring how far a piece turns.
const TURN_SAMPLES: usize = 16;

/// Number of sub-brackets examined per cusp refinement step.
const REFINE_SAMPLES: usize = 8;

/// What a [`Segment`] of a prepared curve is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// A stretch offset by leg translation.
    Ordinary,
    /// A short stretch around a cusp, rendered as a circular arc.
    Cusp,
}

/// A parameter range of the input curve, tagged with how to offset it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// How the range is offset.
    pub kind: SegmentKind,
    /// The range on the input curve.
    pub range: Interval,
}

impl Segment {
    fn ordinary(range: Interval) -> Segment {
        Segment {
            kind: SegmentKind::Ordinary,
            range,
        }
    }
}

/// Split a curve at its cusps.
///
/// The result alternates ordinary segments and cusps, and covers the whole
/// parameter domain. A curve without cusps is a single ordinary segment.
pub fn split_cusps(curve: &Bezier, options: &OffsetOptions) -> Vec<Segment> {
    let deriv = curve.deriv();
    let n = options.cusp_samples.max(2);
    let mut cusps: Vec<Interval> = Vec::new();

    let mut last: Option<(f64, Vec2)> = None;
    for i in 0..=n {
        let t = i as f64 / n as f64;
        let Some(dir) = deriv.eval(t).to_vec2().try_normalize() else {
            continue;
        };
        if let Some((t_prev, prev)) = last {
            if turning_angle(prev, dir).abs() > options.cusp_angle {
                if let Some(bracket) = refine_cusp(curve, &deriv, Interval::new(t_prev, t), options)
                {
                    cusps.push(bracket);
                }
            }
        }
        last = Some((t, dir));
    }

    // Merge cusps whose locations are close together.
    let mut merged: Vec<Interval> = Vec::with_capacity(cusps.len());
    for cusp in cusps {
        match merged.last_mut() {
            Some(prev)
                if curve
                    .eval(prev.midpoint())
                    .distance(curve.eval(cusp.midpoint()))
                    <= options.cusp_merge_distance =>
            {
                *prev = prev.union(cusp);
            }
            _ => merged.push(cusp),
        }
    }

    let mut segments = Vec::with_capacity(2 * merged.len() + 1);
    let mut pos = 0.0;
    for cusp in merged {
        if cusp.start > pos {
            segments.push(Segment::ordinary(Interval::new(pos, cusp.start)));
        }
        segments.push(Segment {
            kind: SegmentKind::Cusp,
            range: cusp,
        });
        pos = cusp.end;
    }
    if pos < 1.0 || segments.is_empty() {
        segments.push(Segment::ordinary(Interval::new(pos, 1.0)));
    }
    log::trace!("split_cusps: {} segments", segments.len());
    segments
}

/// Narrow a bracket around a sharp change of direction.
///
/// Returns `None` if the change turns out to be a smooth bend that falls
/// under the threshold once the bracket is small.
fn refine_cusp(
    curve: &Bezier,
    deriv: &Bezier,
    mut bracket: Interval,
    options: &OffsetOptions,
) -> Option<Interval> {
    let direction = |t: f64| deriv.eval(t).to_vec2().try_normalize();
    for _ in 0..options.cusp_refine_depth {
        if curve.eval(bracket.start).distance(curve.eval(bracket.end)) <= options.cusp_bracket_size
        {
            break;
        }
        let mut best: Option<(f64, Interval)> = None;
        let mut prev: Option<(f64, Vec2)> = None;
        for k in 0..=REFINE_SAMPLES {
            let t = bracket.lerp(k as f64 / REFINE_SAMPLES as f64);
            let Some(dir) = direction(t) else {
                continue;
            };
            if let Some((t_prev, d_prev)) = prev {
                let turn = turning_angle(d_prev, dir).abs();
                if best.map_or(true, |(b, _)| turn > b) {
                    best = Some((turn, Interval::new(t_prev, t)));
                }
            }
            prev = Some((t, dir));
        }
        match best {
            Some((_, narrower)) => bracket = narrower,
            None => break,
        }
    }
    let start = direction(bracket.start)?;
    let end = direction(bracket.end)?;
    if turning_angle(start, end).abs() > options.cusp_angle {
        Some(bracket)
    } else {
        None
    }
}

/// Bisect `range` of `curve` until no piece turns by more than a half turn.
///
/// Turning is the sum of the absolute angles between consecutive chords of
/// sampled points. The pieces are returned in order and cover `range`.
pub fn simplify(curve: &Bezier, range: Interval, options: &OffsetOptions) -> Vec<Interval> {
    let mut out = Vec::new();
    let mut work = vec![(range, 0usize)];
    while let Some((range, depth)) = work.pop() {
        let sub = curve.subsegment(range.range());
        if depth < options.simplify_max_depth && total_turn(&sub) > core::f64::consts::PI {
            let mid = range.midpoint();
            work.push((Interval::new(mid, range.end), depth + 1));
            work.push((Interval::new(range.start, mid), depth + 1));
        } else {
            out.push(range);
        }
    }
    out
}

/// Sum of the absolute turning angles along sampled chords of `curve`.
fn total_turn(curve: &Bezier) -> f64 {
    let mut total = 0.0;
    let mut prev_point = curve.start();
    let mut prev_chord: Option<Vec2> = None;
    for i in 1..=TURN_SAMPLES {
        let p = curve.eval(i as f64 / TURN_SAMPLES as f64);
        let chord = p - prev_point;
        if chord.hypot2() == 0.0 {
            continue;
        }
        if let Some(prev) = prev_chord {
            total += turning_angle(prev, chord).abs();
        }
        prev_chord = Some(chord);
        prev_point = p;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::{simplify, split_cusps, SegmentKind};
    use crate::{Bezier, Interval, OffsetOptions};

    #[test]
    fn smooth_curve_is_one_segment() {
        let c = Bezier::new([(0.0, 0.0), (30.0, 40.0), (60.0, 40.0), (90.0, 0.0)]).unwrap();
        let segments = split_cusps(&c, &OffsetOptions::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Ordinary);
        assert_eq!(segments[0].range, Interval::FULL);
    }

    #[test]
    fn reversing_curve_has_two_cusps() {
        let c = Bezier::new([(0.0, 0.0), (10.0, 0.0), (-10.0, 0.0), (0.0, 0.0)]).unwrap();
        let segments = split_cusps(&c, &OffsetOptions::default());
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                SegmentKind::Ordinary,
                SegmentKind::Cusp,
                SegmentKind::Ordinary,
                SegmentKind::Cusp,
                SegmentKind::Ordinary
            ]
        );
        let t0 = (3.0 - 3f64.sqrt()) / 6.0;
        let t1 = (3.0 + 3f64.sqrt()) / 6.0;
        assert!(segments[1].range.contains(t0), "{:?}", segments[1]);
        assert!(segments[3].range.contains(t1), "{:?}", segments[3]);
        // Consecutive segments tile the domain.
        assert_eq!(segments[0].range.start, 0.0);
        assert_eq!(segments[4].range.end, 1.0);
        for w in segments.windows(2) {
            assert_eq!(w[0].range.end, w[1].range.start);
        }
    }

    #[test]
    fn cusp_at_tight_bend_is_rejected_after_refinement() {
        // A smooth but fast turn, sharper than the threshold between samples.
        let c = Bezier::new([(0.0, 0.0), (100.0, 0.0), (100.0, 0.0), (100.0, 100.0)]).unwrap();
        let options = OffsetOptions::default().with_cusp_samples(4);
        let segments = split_cusps(&c, &options);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Ordinary));
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn simplify_splits_long_turns() {
        let gentle = Bezier::new([(0.0, 0.0), (50.0, 20.0), (100.0, 0.0)]).unwrap();
        assert_eq!(
            simplify(&gentle, Interval::FULL, &OffsetOptions::default()),
            [Interval::FULL]
        );
        // Nearly a full loop.
        let loopy = Bezier::new([(0.0, 0.0), (100.0, 100.0), (-100.0, 100.0), (1.0, 0.0)]).unwrap();
        let pieces = simplify(&loopy, Interval::FULL, &OffsetOptions::default());
        assert!(pieces.len() >= 2);
        assert_eq!(pieces[0].start, 0.0);
        assert_eq!(pieces[pieces.len() - 1].end, 1.0);
        for w in pieces.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
    }
}
