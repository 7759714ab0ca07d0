//! Kernel dispatch tables.
//!
//! A [`Kernels<T>`] binds every operation of an array to one concrete kernel.
//! The tables are immutable statics, one per tier and FMA choice, and an array
//! holds a `&'static` reference to one of them. Copies and moves of an array
//! therefore always carry a valid binding.
//!
//! | table          | elementwise        | dot product      | prefix sum |
//! |----------------|--------------------|------------------|------------|
//! | Scalar         | scalar             | scalar           | scalar     |
//! | AVX            | AVX                | AVX (mul + add)  | scalar     |
//! | AVX + FMA      | AVX                | AVX fused        | scalar     |
//! | AVX2           | AVX, AVX2 add/neg  | AVX (mul + add)  | scalar     |
//! | AVX2 + FMA     | AVX, AVX2 add/neg  | AVX fused        | scalar     |
//!
//! `f64` has no vector kernels and binds the scalar table at every tier.

use std::fmt;

use crate::caps::{Capabilities, Tier};
use crate::error::{Error, Result};
use crate::simd::scalar;
use crate::simd::traits::Element;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::simd::{avx, avx2};

pub type BinaryFn<T> = fn(&[T], &[T], &mut [T]);
pub type BinaryAssignFn<T> = fn(&mut [T], &[T]);
pub type ScalarFn<T> = fn(&[T], T, &mut [T]);
pub type ScalarAssignFn<T> = fn(&mut [T], T);
pub type UnaryFn<T> = fn(&[T], &mut [T]);
pub type UnaryAssignFn<T> = fn(&mut [T]);
pub type ReduceFn<T> = fn(&[T]) -> T;
pub type BinaryReduceFn<T> = fn(&[T], &[T]) -> T;

/// One kernel per array operation, all built for the same tier.
///
/// Out-of-place kernels take their destination last and require every slice
/// to have the same length. In-place kernels overwrite their first argument.
pub struct Kernels<T> {
    pub(crate) tier: Tier,
    pub(crate) fma: bool,

    pub(crate) add: BinaryFn<T>,
    pub(crate) add_assign: BinaryAssignFn<T>,
    pub(crate) sub: BinaryFn<T>,
    pub(crate) sub_assign: BinaryAssignFn<T>,
    pub(crate) mul: BinaryFn<T>,
    pub(crate) mul_assign: BinaryAssignFn<T>,
    pub(crate) div: BinaryFn<T>,
    pub(crate) div_assign: BinaryAssignFn<T>,

    pub(crate) scalar_mul: ScalarFn<T>,
    pub(crate) scalar_mul_assign: ScalarAssignFn<T>,
    pub(crate) scalar_div: ScalarFn<T>,
    pub(crate) scalar_div_assign: ScalarAssignFn<T>,

    pub(crate) sqrt: UnaryFn<T>,
    pub(crate) sqrt_assign: UnaryAssignFn<T>,
    pub(crate) square: UnaryFn<T>,
    pub(crate) square_assign: UnaryAssignFn<T>,
    pub(crate) cube: UnaryFn<T>,
    pub(crate) cube_assign: UnaryAssignFn<T>,
    pub(crate) negate: UnaryFn<T>,
    pub(crate) negate_assign: UnaryAssignFn<T>,
    pub(crate) reciprocate: UnaryFn<T>,
    pub(crate) reciprocate_assign: UnaryAssignFn<T>,
    pub(crate) prefix_sum: UnaryFn<T>,
    pub(crate) prefix_sum_assign: UnaryAssignFn<T>,

    pub(crate) dot_product: BinaryReduceFn<T>,
    pub(crate) summation: ReduceFn<T>,
    pub(crate) distance: BinaryReduceFn<T>,
}

impl<T: Element> Kernels<T> {
    /// The table for `tier`, checked against the host's capabilities.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedTier`] if the processor cannot run `tier`.
    pub fn for_tier(tier: Tier, fma: bool) -> Result<&'static Self> {
        let caps = Capabilities::get();
        if !caps.supports(tier) {
            return Err(Error::UnsupportedTier {
                requested: tier,
                available: caps.best_tier(),
            });
        }
        let fma = fma && caps.has_fma();
        Ok(T::table(tier, fma))
    }
}

impl<T> Kernels<T> {
    /// Tier the table was built for.
    #[inline]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Whether dot product uses fused multiply-add.
    #[inline]
    pub fn uses_fma(&self) -> bool {
        self.fma
    }
}

impl<T> fmt::Debug for Kernels<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernels")
            .field("tier", &self.tier)
            .field("fma", &self.fma)
            .finish_non_exhaustive()
    }
}

macro_rules! scalar_table {
    ($t:ty) => {
        Kernels::<$t> {
            tier: Tier::Scalar,
            fma: false,
            add: scalar::add::<$t>,
            add_assign: scalar::add_assign::<$t>,
            sub: scalar::sub::<$t>,
            sub_assign: scalar::sub_assign::<$t>,
            mul: scalar::mul::<$t>,
            mul_assign: scalar::mul_assign::<$t>,
            div: scalar::div::<$t>,
            div_assign: scalar::div_assign::<$t>,
            scalar_mul: scalar::scalar_mul::<$t>,
            scalar_mul_assign: scalar::scalar_mul_assign::<$t>,
            scalar_div: scalar::scalar_div::<$t>,
            scalar_div_assign: scalar::scalar_div_assign::<$t>,
            sqrt: scalar::sqrt::<$t>,
            sqrt_assign: scalar::sqrt_assign::<$t>,
            square: scalar::square::<$t>,
            square_assign: scalar::square_assign::<$t>,
            cube: scalar::cube::<$t>,
            cube_assign: scalar::cube_assign::<$t>,
            negate: scalar::negate::<$t>,
            negate_assign: scalar::negate_assign::<$t>,
            reciprocate: scalar::reciprocate::<$t>,
            reciprocate_assign: scalar::reciprocate_assign::<$t>,
            prefix_sum: scalar::prefix_sum::<$t>,
            prefix_sum_assign: scalar::prefix_sum_assign::<$t>,
            dot_product: scalar::dot_product::<$t>,
            summation: scalar::summation::<$t>,
            distance: scalar::distance::<$t>,
        }
    };
}

pub(crate) static SCALAR_F32: Kernels<f32> = scalar_table!(f32);
pub(crate) static SCALAR_F64: Kernels<f64> = scalar_table!(f64);

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const AVX_F32_TABLE: Kernels<f32> = Kernels {
    tier: Tier::Avx,
    fma: false,
    add: avx::add,
    add_assign: avx::add_assign,
    sub: avx::sub,
    sub_assign: avx::sub_assign,
    mul: avx::mul,
    mul_assign: avx::mul_assign,
    div: avx::div,
    div_assign: avx::div_assign,
    scalar_mul: avx::scalar_mul,
    scalar_mul_assign: avx::scalar_mul_assign,
    scalar_div: avx::scalar_div,
    scalar_div_assign: avx::scalar_div_assign,
    sqrt: avx::sqrt,
    sqrt_assign: avx::sqrt_assign,
    square: avx::square,
    square_assign: avx::square_assign,
    cube: avx::cube,
    cube_assign: avx::cube_assign,
    negate: avx::negate,
    negate_assign: avx::negate_assign,
    reciprocate: avx::reciprocate,
    reciprocate_assign: avx::reciprocate_assign,
    prefix_sum: scalar::prefix_sum::<f32>,
    prefix_sum_assign: scalar::prefix_sum_assign::<f32>,
    dot_product: avx::dot_product,
    summation: avx::summation,
    distance: avx::distance,
};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const AVX2_F32_TABLE: Kernels<f32> = Kernels {
    tier: Tier::Avx2,
    add: avx2::add,
    add_assign: avx2::add_assign,
    negate: avx2::negate,
    negate_assign: avx2::negate_assign,
    ..AVX_F32_TABLE
};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
static AVX_F32: Kernels<f32> = AVX_F32_TABLE;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
static AVX_FMA_F32: Kernels<f32> = Kernels {
    fma: true,
    dot_product: avx::dot_product_fma,
    ..AVX_F32_TABLE
};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
static AVX2_F32: Kernels<f32> = AVX2_F32_TABLE;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
static AVX2_FMA_F32: Kernels<f32> = Kernels {
    fma: true,
    dot_product: avx::dot_product_fma,
    ..AVX2_F32_TABLE
};

/// Unchecked `f32` table lookup. `tier` and `fma` must already be validated.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) fn f32_table(tier: Tier, fma: bool) -> &'static Kernels<f32> {
    match (tier, fma) {
        (Tier::Scalar, _) => &SCALAR_F32,
        (Tier::Avx, false) => &AVX_F32,
        (Tier::Avx, true) => &AVX_FMA_F32,
        (Tier::Avx2, false) => &AVX2_F32,
        (Tier::Avx2, true) => &AVX2_FMA_F32,
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub(crate) fn f32_table(_tier: Tier, _fma: bool) -> &'static Kernels<f32> {
    &SCALAR_F32
}
