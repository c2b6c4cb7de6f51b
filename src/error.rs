// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors for malformed curve input.

use core::fmt;

/// An error constructing a curve or running an operation on malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// A curve needs at least one control point.
    NoControlPoints,
    /// A control point has a NaN or infinite coordinate.
    NonFiniteControlPoint(usize),
    /// The offset distance is NaN or infinite.
    NonFiniteDistance,
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::NoControlPoints => write!(f, "curve has no control points"),
            CurveError::NonFiniteControlPoint(ix) => {
                write!(f, "control point {ix} is not finite")
            }
            CurveError::NonFiniteDistance => write!(f, "offset distance is not finite"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CurveError {}

#[cfg(test)]
mod tests {
    use super::CurveError;

    #[test]
    fn messages() {
        assert_eq!(
            CurveError::NonFiniteControlPoint(2).to_string(),
            "control point 2 is not finite"
        );
        assert_eq!(
            CurveError::NoControlPoints.to_string(),
            "curve has no control points"
        );
    }
}
