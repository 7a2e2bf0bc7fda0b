//! Fixed-point numerics and point/box primitives shared by the outline
//! rasterizer's components.
//!
//! This crate plays the same role for the rasterizer that `font-types`
//! plays for a font-table reader: a dependency-free leaf that higher-level
//! crates build on, kept `no_std`-friendly so it can be embedded without
//! pulling in an allocator.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate core as std;

mod fixed;
mod point;

pub use fixed::{div_fix, mul_div, mul_fix, F22Dot10, F26Dot6, F2Dot14, Fixed, FixedPoint};
pub use point::Point;
