//! AVX tier: 256-bit floating point kernels for `f32`.
//!
//! Every kernel here is compiled with `#[target_feature(enable = "avx")]` and is
//! only bound into a dispatch table after runtime detection reported AVX, so the
//! crate itself can be built for a baseline x86-64 target.

pub mod f32x8;

pub(crate) mod kernels;

pub(crate) use kernels::*;
