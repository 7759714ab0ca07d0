//! Traits shared by the kernel tiers.
//!
//! `Alignment`, `SimdLoad` and `SimdStore` describe how a register type
//! moves data between memory and lanes. [`Element`] is the set of scalar types
//! an [`Array`](crate::Array) can hold; it is sealed because the aligned
//! buffer relies on an all-zero bit pattern being a valid value.
//!
//! The register traits are internal to the crate:
//!
//! ```compile_fail
//! use simdarray::simd::SimdLoad;
//! ```

use std::fmt::Debug;

use num::Float;

use crate::caps::Tier;
use crate::simd::dispatch::{self, Kernels};

/// Pointer alignment checks for a register type.
pub(crate) trait Alignment<T> {
    /// Whether `ptr` satisfies the register's natural alignment.
    fn is_aligned(ptr: *const T) -> bool;
}

/// Loading full registers from memory.
pub(crate) trait SimdLoad<T> {
    type Output;

    /// Loads one full register, picking the aligned form when `ptr` allows it.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of one full register of `T`.
    unsafe fn load(ptr: *const T) -> Self::Output;

    /// # Safety
    ///
    /// `ptr` must be aligned to the register width and valid for one full register.
    unsafe fn load_aligned(ptr: *const T) -> Self::Output;

    /// # Safety
    ///
    /// `ptr` must be valid for reads of one full register.
    unsafe fn load_unaligned(ptr: *const T) -> Self::Output;
}

/// Storing full registers to memory.
pub(crate) trait SimdStore<T> {
    /// Stores the register, picking the aligned form when `ptr` allows it.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of one full register of `T`.
    unsafe fn store_at(&self, ptr: *mut T);

    /// # Safety
    ///
    /// `ptr` must be aligned to the register width and valid for one full register.
    unsafe fn store_aligned_at(&self, ptr: *mut T);

    /// # Safety
    ///
    /// `ptr` must be valid for writes of one full register.
    unsafe fn store_unaligned_at(&self, ptr: *mut T);
}

pub(crate) mod private {
    use super::{Kernels, Tier};

    pub trait Sealed: Sized + 'static {
        /// Kernel table for `tier`. Callers must have checked that the host
        /// supports `tier` (and FMA, when `fma` is set).
        fn table(tier: Tier, fma: bool) -> &'static Kernels<Self>;
    }
}

/// Scalar element type of an [`Array`](crate::Array).
///
/// Implemented for `f32`, which has vector kernels for every tier, and `f64`,
/// which binds the scalar kernels at every tier.
pub trait Element: Float + Default + Debug + Send + Sync + private::Sealed {
    /// Type name used in log messages.
    const NAME: &'static str;
}

impl private::Sealed for f32 {
    #[inline]
    fn table(tier: Tier, fma: bool) -> &'static Kernels<f32> {
        dispatch::f32_table(tier, fma)
    }
}

impl Element for f32 {
    const NAME: &'static str = "f32";
}

impl private::Sealed for f64 {
    #[inline]
    fn table(_tier: Tier, _fma: bool) -> &'static Kernels<f64> {
        &dispatch::SCALAR_F64
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";
}
