// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circular arcs.

use core::f64::consts::{FRAC_PI_2, PI};

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::{Bezier, Point, Vec2};

/// A circular arc.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arc {
    /// The arc's centre point.
    pub center: Point,
    /// The arc's radius.
    pub radius: f64,
    /// The start angle in radians.
    pub start_angle: f64,
    /// The angle between the start and end of the arc, positive counter-clockwise
    /// in a y-up space.
    pub sweep_angle: f64,
}

impl Arc {
    /// Create a new arc.
    #[inline]
    pub const fn new(center: Point, radius: f64, start_angle: f64, sweep_angle: f64) -> Arc {
        Arc {
            center,
            radius,
            start_angle,
            sweep_angle,
        }
    }

    /// The arc of radius `radius` around `center` that turns from direction
    /// `from` to direction `to` by the shorter way round.
    ///
    /// When the two directions are opposite, `prefer` picks the way: the arc
    /// passes through the side `prefer` points to. Returns `None` if either
    /// direction is zero.
    pub fn between(center: Point, radius: f64, from: Vec2, to: Vec2, prefer: Vec2) -> Option<Arc> {
        let from = from.try_normalize()?;
        let to = to.try_normalize()?;
        let start_angle = from.atan2();
        let mut sweep = from.cross(to).atan2(from.dot(to));
        const TIE: f64 = 1e-9;
        if PI - sweep.abs() < TIE {
            // Half turn: go round through the preferred side.
            let sign = if from.cross(prefer) >= 0.0 { 1.0 } else { -1.0 };
            sweep = sign * PI;
        }
        Some(Arc::new(center, radius, start_angle, sweep))
    }

    /// The point at angle `angle` on the circle.
    #[inline]
    fn sample(&self, angle: f64) -> Point {
        self.center + self.radius * Vec2::from_angle(angle)
    }

    /// The start point of the arc.
    pub fn start_point(&self) -> Point {
        self.sample(self.start_angle)
    }

    /// The end point of the arc.
    pub fn end_point(&self) -> Point {
        self.sample(self.start_angle + self.sweep_angle)
    }

    /// Convert the arc into cubic Bézier pieces, none spanning more than 90°.
    pub fn cubics(&self) -> ArcCubics {
        let n = (self.sweep_angle.abs() / FRAC_PI_2).ceil().max(1.0);
        let angle_step = self.sweep_angle / n;
        let arm_len = (4.0 / 3.0) * (0.25 * angle_step).tan() * self.radius;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "`n` is a small whole number of quarter turns; the cast saturates otherwise"
        )]
        let n = n as usize;
        ArcCubics {
            arc: *self,
            idx: 0,
            n,
            arm_len,
            angle_step,
            angle0: self.start_angle,
            p0: self.start_point(),
        }
    }
}

/// Iterator over the cubic pieces of an [`Arc`], see [`Arc::cubics`].
#[derive(Clone, Debug)]
pub struct ArcCubics {
    arc: Arc,
    idx: usize,
    n: usize,
    arm_len: f64,
    angle_step: f64,
    angle0: f64,
    p0: Point,
}

impl Iterator for ArcCubics {
    type Item = Bezier;

    fn next(&mut self) -> Option<Bezier> {
        if self.idx >= self.n {
            return None;
        }
        let angle1 = self.angle0 + self.angle_step;
        let p0 = self.p0;
        let p1 = p0 + self.arm_len * Vec2::from_angle(self.angle0 + FRAC_PI_2);
        let p3 = self.arc.sample(angle1);
        let p2 = p3 - self.arm_len * Vec2::from_angle(angle1 + FRAC_PI_2);

        self.angle0 = angle1;
        self.p0 = p3;
        self.idx += 1;

        Some(Bezier::from_points(smallvec::smallvec![p0, p1, p2, p3]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.n - self.idx;
        (rest, Some(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::Arc;
    use crate::{ParamCurve, Point, Vec2};
    use core::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn pieces_stay_on_the_circle() {
        let arc = Arc::new(Point::new(10.0, 10.0), 5.0, 0.3, 2.5);
        let pieces: Vec<_> = arc.cubics().collect();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].end(), pieces[1].start());
        assert!(pieces[0].start().distance(arc.start_point()) < 1e-12);
        assert!(pieces[1].end().distance(arc.end_point()) < 1e-12);
        for piece in &pieces {
            for i in 0..=10 {
                let r = piece.eval(i as f64 / 10.0).distance(arc.center);
                assert!((r - 5.0).abs() < 5.0 * 3e-4);
            }
        }
    }

    #[test]
    fn piece_count_follows_quarter_turns() {
        let count = |sweep: f64| Arc::new(Point::ZERO, 1.0, 0.0, sweep).cubics().count();
        assert_eq!(count(0.0), 1);
        assert_eq!(count(1e-9), 1);
        assert_eq!(count(FRAC_PI_2), 1);
        assert_eq!(count(-3.0 * FRAC_PI_2 - 0.1), 4);
        assert_eq!(count(4.0 * PI), 8);
    }

    #[test]
    fn shorter_way_round() {
        let arc = Arc::between(
            Point::ZERO,
            1.0,
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::ZERO,
        )
        .unwrap();
        assert!((arc.sweep_angle + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn half_turn_prefers_side() {
        let from = Vec2::new(0.0, 1.0);
        let to = Vec2::new(0.0, -1.0);
        let ccw = Arc::between(Point::ZERO, 2.0, from, to, Vec2::new(-1.0, 0.0)).unwrap();
        assert_eq!(ccw.sweep_angle, PI);
        let cw = Arc::between(Point::ZERO, 2.0, from, to, Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(cw.sweep_angle, -PI);
        // The midpoint of the arc sits on the preferred side.
        let mid = cw.cubics().next().unwrap().end();
        assert!(mid.x > 1.9);
        assert!(Arc::between(Point::ZERO, 1.0, Vec2::ZERO, to, from).is_none());
    }
}
