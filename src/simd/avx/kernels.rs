//! AVX f32 kernels.
//!
//! Each operation has a pointer-based core compiled with
//! `#[target_feature(enable = "avx")]` that walks full 8-lane blocks and then
//! finishes the remaining `n % 8` elements with scalar code. The safe wrappers
//! below it are what the dispatch table binds; they are only reachable through
//! a table whose tier the processor was checked to support.
//!
//! In-place wrappers pass the same pointer as input and output. Each block is
//! fully loaded before it is stored, so aliasing input and output is sound.
//!
//! Elementwise results are bit-identical to the scalar kernels except for
//! reciprocate, which uses the hardware approximation on full blocks.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use super::f32x8::{F32x8, LANE_COUNT};
use crate::simd::{SimdLoad, SimdStore};

/// Number of f32 elements in a 128-bit register, used by negate.
const HALF_LANE_COUNT: usize = 4;

macro_rules! binary_kernel {
    ($raw:ident, $name:ident, $assign:ident, $op:tt) => {
        #[target_feature(enable = "avx")]
        unsafe fn $raw(n: usize, a: *const f32, b: *const f32, out: *mut f32) {
            let full = n - n % LANE_COUNT;
            let mut i = 0;
            while i < full {
                let va = F32x8::load(a.add(i));
                let vb = F32x8::load(b.add(i));
                (va $op vb).store_at(out.add(i));
                i += LANE_COUNT;
            }
            while i < n {
                *out.add(i) = *a.add(i) $op *b.add(i);
                i += 1;
            }
        }

        pub(crate) fn $name(a: &[f32], b: &[f32], out: &mut [f32]) {
            assert!(a.len() == out.len() && b.len() == out.len());
            // SAFETY: lengths checked; bound only when AVX is available.
            unsafe { $raw(out.len(), a.as_ptr(), b.as_ptr(), out.as_mut_ptr()) }
        }

        pub(crate) fn $assign(acc: &mut [f32], b: &[f32]) {
            assert_eq!(acc.len(), b.len());
            let p = acc.as_mut_ptr();
            // SAFETY: as above; blocks are read before they are written.
            unsafe { $raw(acc.len(), p, b.as_ptr(), p) }
        }
    };
}

binary_kernel!(add_raw, add, add_assign, +);
binary_kernel!(sub_raw, sub, sub_assign, -);
binary_kernel!(mul_raw, mul, mul_assign, *);
binary_kernel!(div_raw, div, div_assign, /);

macro_rules! scalar_kernel {
    ($raw:ident, $name:ident, $assign:ident, $op:tt) => {
        #[target_feature(enable = "avx")]
        unsafe fn $raw(n: usize, src: *const f32, k: f32, out: *mut f32) {
            let full = n - n % LANE_COUNT;
            let vk = F32x8::splat(k);
            let mut i = 0;
            while i < full {
                (F32x8::load(src.add(i)) $op vk).store_at(out.add(i));
                i += LANE_COUNT;
            }
            while i < n {
                *out.add(i) = *src.add(i) $op k;
                i += 1;
            }
        }

        pub(crate) fn $name(src: &[f32], k: f32, out: &mut [f32]) {
            assert_eq!(src.len(), out.len());
            // SAFETY: lengths checked; bound only when AVX is available.
            unsafe { $raw(out.len(), src.as_ptr(), k, out.as_mut_ptr()) }
        }

        pub(crate) fn $assign(values: &mut [f32], k: f32) {
            let p = values.as_mut_ptr();
            // SAFETY: bound only when AVX is available.
            unsafe { $raw(values.len(), p, k, p) }
        }
    };
}

scalar_kernel!(scalar_mul_raw, scalar_mul, scalar_mul_assign, *);
scalar_kernel!(scalar_div_raw, scalar_div, scalar_div_assign, /);

macro_rules! unary_kernel {
    ($raw:ident, $name:ident, $assign:ident, |$v:ident| $block:expr, |$x:ident| $tail:expr) => {
        #[target_feature(enable = "avx")]
        unsafe fn $raw(n: usize, src: *const f32, out: *mut f32) {
            let full = n - n % LANE_COUNT;
            let mut i = 0;
            while i < full {
                let $v = F32x8::load(src.add(i));
                let r: F32x8 = $block;
                r.store_at(out.add(i));
                i += LANE_COUNT;
            }
            while i < n {
                let $x = *src.add(i);
                *out.add(i) = $tail;
                i += 1;
            }
        }

        pub(crate) fn $name(src: &[f32], out: &mut [f32]) {
            assert_eq!(src.len(), out.len());
            // SAFETY: lengths checked; bound only when AVX is available.
            unsafe { $raw(out.len(), src.as_ptr(), out.as_mut_ptr()) }
        }

        pub(crate) fn $assign(values: &mut [f32]) {
            let p = values.as_mut_ptr();
            // SAFETY: bound only when AVX is available.
            unsafe { $raw(values.len(), p, p) }
        }
    };
}

unary_kernel!(sqrt_raw, sqrt, sqrt_assign, |v| v.sqrt(), |x| x.sqrt());
unary_kernel!(square_raw, square, square_assign, |v| v * v, |x| x * x);
unary_kernel!(cube_raw, cube, cube_assign, |v| v * v * v, |x| x * x * x);
// rcp is accurate to 1.5 * 2^-12 for 2^-126 <= |x| <= 2^126 and flushes outside it.
unary_kernel!(
    reciprocate_raw,
    reciprocate,
    reciprocate_assign,
    |v| v.rcp(),
    |x| 1.0 / x
);

// AVX has no 256-bit integer xor, so the sign flip runs on 128-bit halves.
#[target_feature(enable = "avx")]
unsafe fn negate_raw(n: usize, src: *const f32, out: *mut f32) {
    let full = n - n % HALF_LANE_COUNT;
    let sign = _mm_set1_epi32(i32::MIN);
    let mut i = 0;
    while i < full {
        let v = _mm_loadu_si128(src.add(i) as *const __m128i);
        _mm_storeu_si128(out.add(i) as *mut __m128i, _mm_xor_si128(v, sign));
        i += HALF_LANE_COUNT;
    }
    while i < n {
        *out.add(i) = -*src.add(i);
        i += 1;
    }
}

pub(crate) fn negate(src: &[f32], out: &mut [f32]) {
    assert_eq!(src.len(), out.len());
    // SAFETY: lengths checked; bound only when AVX is available.
    unsafe { negate_raw(out.len(), src.as_ptr(), out.as_mut_ptr()) }
}

pub(crate) fn negate_assign(values: &mut [f32]) {
    let p = values.as_mut_ptr();
    // SAFETY: bound only when AVX is available.
    unsafe { negate_raw(values.len(), p, p) }
}

/// Sums `n` elements with a pairwise horizontal-add tree.
///
/// Blocks are consumed two at a time through `hadd`; a leftover odd block is
/// paired with zero. The accumulator lanes are then added in lane order and
/// the scalar tail is added last.
#[target_feature(enable = "avx")]
unsafe fn summation_raw(n: usize, src: *const f32) -> f32 {
    let blocks = n / LANE_COUNT;
    let mut acc = F32x8::zero();
    let mut block = 0;
    while block + 1 < blocks {
        let x = F32x8::load(src.add(block * LANE_COUNT));
        let y = F32x8::load(src.add((block + 1) * LANE_COUNT));
        acc = acc + x.hadd(y);
        block += 2;
    }
    if block < blocks {
        acc = acc + F32x8::load(src.add(block * LANE_COUNT)).hadd(F32x8::zero());
    }

    let mut sum = acc.horizontal_sum();
    for i in blocks * LANE_COUNT..n {
        sum += *src.add(i);
    }
    sum
}

pub(crate) fn summation(values: &[f32]) -> f32 {
    // SAFETY: bound only when AVX is available.
    unsafe { summation_raw(values.len(), values.as_ptr()) }
}

#[target_feature(enable = "avx")]
unsafe fn dot_product_raw(n: usize, a: *const f32, b: *const f32) -> f32 {
    let full = n - n % LANE_COUNT;
    let mut acc = F32x8::zero();
    let mut i = 0;
    while i < full {
        acc = acc + F32x8::load(a.add(i)) * F32x8::load(b.add(i));
        i += LANE_COUNT;
    }
    let mut sum = acc.horizontal_sum();
    while i < n {
        sum += *a.add(i) * *b.add(i);
        i += 1;
    }
    sum
}

#[target_feature(enable = "avx,fma")]
unsafe fn dot_product_fma_raw(n: usize, a: *const f32, b: *const f32) -> f32 {
    let full = n - n % LANE_COUNT;
    let mut acc = F32x8::zero();
    let mut i = 0;
    while i < full {
        acc = F32x8::load(a.add(i)).mul_add(F32x8::load(b.add(i)), acc);
        i += LANE_COUNT;
    }
    let mut sum = acc.horizontal_sum();
    while i < n {
        sum = (*a.add(i)).mul_add(*b.add(i), sum);
        i += 1;
    }
    sum
}

pub(crate) fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    // SAFETY: lengths checked; bound only when AVX is available.
    unsafe { dot_product_raw(a.len(), a.as_ptr(), b.as_ptr()) }
}

pub(crate) fn dot_product_fma(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    // SAFETY: lengths checked; bound only when AVX and FMA are available.
    unsafe { dot_product_fma_raw(a.len(), a.as_ptr(), b.as_ptr()) }
}

#[target_feature(enable = "avx")]
unsafe fn distance_raw(n: usize, a: *const f32, b: *const f32) -> f32 {
    let full = n - n % LANE_COUNT;
    let mut acc = F32x8::zero();
    let mut i = 0;
    while i < full {
        let d = F32x8::load(a.add(i)) - F32x8::load(b.add(i));
        acc = acc + d * d;
        i += LANE_COUNT;
    }
    let mut sum = acc.horizontal_sum();
    while i < n {
        let d = *a.add(i) - *b.add(i);
        sum += d * d;
        i += 1;
    }
    sum.sqrt()
}

pub(crate) fn distance(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len());
    // SAFETY: lengths checked; bound only when AVX is available.
    unsafe { distance_raw(a.len(), a.as_ptr(), b.as_ptr()) }
}
