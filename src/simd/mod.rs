//! Kernels and their dispatch.
//!
//! - `scalar`: portable reference kernels for any float type.
//! - `avx`: 256-bit `f32` kernels (x86 only).
//! - `avx2`: AVX2 specializations of add and negate (x86 only).
//! - [`dispatch`]: the per-tier [`Kernels`] tables an array binds to.

pub mod dispatch;

pub(crate) mod scalar;

pub mod traits;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod avx;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod avx2;

pub use dispatch::Kernels;
pub use traits::Element;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) use traits::{Alignment, SimdLoad, SimdStore};

/// Number of `f32` lanes in one 256-bit register.
pub const LANE_COUNT: usize = 8;

/// Byte alignment of every array buffer, the width of one AVX register.
pub const ALIGNMENT: usize = 32;
