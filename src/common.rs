// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Common mathematical operations

#![allow(missing_docs)]

/// Defines a trait that chooses between libstd or libm implementations of float methods.
macro_rules! define_float_funcs {
    ($(
        fn $name:ident(self $(,$arg:ident: $arg_ty:ty)*) -> $ret:ty
        => $lname:ident;
    )+) => {
        #[cfg(not(feature = "std"))]
        pub(crate) trait FloatFuncs : Sized {
            /// Special implementation for signum, because libm doesn't have it.
            fn signum(self) -> Self;

            $(fn $name(self $(,$arg: $arg_ty)*) -> $ret;)+
        }

        #[cfg(not(feature = "std"))]
        impl FloatFuncs for f64 {
            #[inline]
            fn signum(self) -> f64 {
                if self.is_nan() {
                    f64::NAN
                } else {
                    1.0_f64.copysign(self)
                }
            }

            $(fn $name(self $(,$arg: $arg_ty)*) -> $ret {
                #[cfg(feature = "libm")]
                return libm::$lname(self $(,$arg as _)*);

                #[cfg(not(feature = "libm"))]
                compile_error!("bezcut requires either the `std` or `libm` feature")
            })+
        }
    }
}

define_float_funcs! {
    fn abs(self) -> Self => fabs;
    fn atan2(self, other: Self) -> Self => atan2;
    fn ceil(self) -> Self => ceil;
    fn copysign(self, sign: Self) -> Self => copysign;
    fn cos(self) -> Self => cos;
    fn floor(self) -> Self => floor;
    fn hypot(self, other: Self) -> Self => hypot;
    fn powi(self, n: i32) -> Self => pow;
    fn sin(self) -> Self => sin;
    fn sqrt(self) -> Self => sqrt;
    fn tan(self) -> Self => tan;
}

/// Return the two values ordered as `(min, max)`.
#[inline]
pub fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Signed angle, in radians, that rotates `a` onto `b`.
///
/// The result is in `(-π, π]`. Either vector being zero gives zero.
#[inline]
pub fn turning_angle(a: crate::Vec2, b: crate::Vec2) -> f64 {
    if a.hypot2() == 0.0 || b.hypot2() == 0.0 {
        return 0.0;
    }
    a.cross(b).atan2(a.dot(b))
}

#[cfg(test)]
mod tests {
    use super::{min_max, turning_angle};
    use crate::Vec2;
    use core::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn ordered_pair() {
        assert_eq!(min_max(3.0, -1.0), (-1.0, 3.0));
        assert_eq!(min_max(-1.0, 3.0), (-1.0, 3.0));
    }

    #[test]
    fn turning() {
        let x = Vec2::new(1.0, 0.0);
        let y = Vec2::new(0.0, 2.0);
        assert!((turning_angle(x, y) - FRAC_PI_2).abs() < 1e-12);
        assert!((turning_angle(y, x) + FRAC_PI_2).abs() < 1e-12);
        assert!((turning_angle(x, -x).abs() - PI).abs() < 1e-12);
        assert_eq!(turning_angle(x, Vec2::ZERO), 0.0);
    }
}
