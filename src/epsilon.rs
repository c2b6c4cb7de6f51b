// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared tolerance predicate.
//!
//! Every approximate comparison in this crate, whether between parameters,
//! coordinates or points, goes through an [`Epsilon`]. An epsilon is keyed by
//! an integer *precision shift*: the number of bits of precision given up
//! relative to [`f64::EPSILON`]. More negative shifts are looser.
//!
//! Tolerances are relative to the magnitude of the values compared (but never
//! smaller than the absolute value of the epsilon), so the same shift behaves
//! the same for geometry drawn at the origin and geometry drawn far away.

#[cfg(not(feature = "std"))]
use crate::common::FloatFuncs;

use crate::Point;

/// A tolerance at a given precision shift.
///
/// The absolute tolerance is **ε × 2⁻ˢ** where ε is [`f64::EPSILON`] and _s_
/// is the shift.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Epsilon {
    shift: i32,
}

impl Default for Epsilon {
    #[inline]
    fn default() -> Epsilon {
        Self::ULP
    }
}

impl Epsilon {
    /// Machine epsilon, no precision given up.
    pub const ULP: Epsilon = Epsilon::new(0);

    /// Create an epsilon at the given precision shift.
    ///
    /// Positive shifts are tighter than machine epsilon and are clamped to 0.
    #[inline]
    pub const fn new(shift: i32) -> Self {
        let shift = if shift > 0 { 0 } else { shift };
        Epsilon { shift }
    }

    /// The precision shift of this epsilon.
    #[inline]
    pub const fn shift(self) -> i32 {
        self.shift
    }

    /// An epsilon `bits` bits looser than this one.
    #[inline]
    pub const fn coarser(self, bits: i32) -> Self {
        Epsilon::new(self.shift - bits)
    }

    /// The absolute value of this epsilon.
    #[inline]
    pub fn value(self) -> f64 {
        f64::EPSILON * 2.0_f64.powi(-self.shift)
    }

    /// The tolerance used when comparing values of the given magnitude.
    #[inline]
    pub fn tolerance(self, magnitude: f64) -> f64 {
        self.value() * magnitude.abs().max(1.0)
    }

    /// The tolerance used when comparing points of the given magnitude.
    ///
    /// See [`Point::magnitude`].
    #[inline]
    pub fn point_tolerance(self, pt: Point) -> f64 {
        self.tolerance(pt.magnitude())
    }

    /// Are `a` and `b` equal within this tolerance?
    #[inline]
    pub fn eq(self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= self.tolerance(a.abs().max(b.abs()))
    }

    /// Is `a` less than, or equal within tolerance to, `b`?
    #[inline]
    pub fn le(self, a: f64, b: f64) -> bool {
        a <= b || self.eq(a, b)
    }

    /// Are the two points equal within this tolerance, coordinate by coordinate?
    #[inline]
    pub fn points_eq(self, a: Point, b: Point) -> bool {
        self.eq(a.x, b.x) && self.eq(a.y, b.y)
    }
}
