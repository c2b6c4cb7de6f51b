// Copyright 2026 the Bezcut Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Intersections and offsets of 2D Bézier curves.
//!
//! The bezcut library finds where two Bézier curves of any degree meet,
//! including curves that trace the same stretch, and approximates the offset
//! of a curve at a signed distance by a connected sequence of Bézier pieces.
//! It is meant as the numeric core under shape assembly code such as stroke
//! expansion and boolean path operations.
//!
//! # Examples
//!
//! Intersecting two curves:
//! ```
//! use bezcut::Bezier;
//!
//! let a = Bezier::new([(0.0, 0.0), (50.0, 100.0), (100.0, 0.0)]).unwrap();
//! let b = Bezier::new([(0.0, 25.0), (100.0, 25.0)]).unwrap();
//! let points = a.intersect(&b);
//! assert_eq!(points.len(), 2);
//! for p in points {
//!     assert!((p.y - 25.0).abs() < 1e-3);
//! }
//! ```
//!
//! Offsetting a curve:
//! ```
//! use bezcut::{offset_with, Bezier, OffsetOptions, ParamCurve};
//!
//! let curve = Bezier::new([(0.0, 0.0), (30.0, 40.0), (60.0, 40.0), (90.0, 0.0)]).unwrap();
//! let options = OffsetOptions::default().with_accuracy(0.05);
//! let pieces = offset_with(&curve, 5.0, &options).unwrap();
//! for pair in pieces.windows(2) {
//!     assert_eq!(pair[0].end(), pair[1].start());
//! }
//! ```
//!
//! # Features
//!
//! This crate either uses the standard library or the [`libm`] crate for
//! math functionality. The `std` feature is enabled by default, but can be
//! disabled, as long as the `libm` feature is enabled. This is useful for
//! `no_std` environments. However, note that the `libm` crate is not as
//! efficient as the standard library, and that this crate still uses the
//! `alloc` crate regardless.
//!
//! Diagnostics go through the [`log`] facade: hitting an iteration limit is
//! reported at `debug` level and per-phase counts at `trace` level.
//!
//! [`libm`]: https://docs.rs/libm
//! [`log`]: https://docs.rs/log

#![forbid(unsafe_code)]
#![deny(missing_docs, clippy::trivially_copy_pass_by_ref)]
#![warn(clippy::doc_markdown, rustdoc::broken_intra_doc_links)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(unused_qualifications)]
#![allow(
    clippy::unreadable_literal,
    clippy::many_single_char_names,
    clippy::excessive_precision,
    clippy::bool_to_int_with_if
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("bezcut requires either the `std` or `libm` feature");

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use libm as _;

extern crate alloc;

mod affine;
mod arc;
mod bezier;
pub mod common;
mod epsilon;
mod error;
mod fat_line;
pub mod intersect;
mod interval;
mod line;
pub mod offset;
mod param_curve;
mod point;
mod rect;
mod refine;
pub mod simplify;
mod vec2;

pub use crate::affine::*;
pub use crate::arc::*;
pub use crate::bezier::*;
pub use crate::epsilon::*;
pub use crate::error::*;
pub use crate::fat_line::*;
pub use crate::intersect::{
    containment_parameter, intersect, intersections, overlap, Intersection, Intersections,
    Overlap,
};
pub use crate::interval::*;
pub use crate::line::*;
pub use crate::offset::{
    approximate_offset, offset, offset_with, OffsetApproximation, OffsetOptions, OffsetPiece,
    PieceKind,
};
pub use crate::param_curve::*;
pub use crate::point::*;
pub use crate::rect::*;
pub use crate::refine::*;
pub use crate::simplify::{split_cusps, Segment, SegmentKind};
pub use crate::vec2::*;
