//! AVX 8-lane f32 register.
//!
//! `F32x8` wraps an `__m256` holding eight single-precision values. Every
//! method is `#[inline(always)]` so that it is compiled with the target
//! features of the kernel calling it; the kernels in this tier are all
//! `#[target_feature(enable = "avx")]` (or wider).
//!
//! # Supported Operations
//!
//! - **Loading and storing**: `load()`, `load_aligned()`, `load_unaligned()`,
//!   `store_at()`, `store_aligned_at()`, `store_unaligned_at()`
//! - **Construction**: `splat()`, `zero()`
//! - **Arithmetic**: `+`, `-`, `*`, `/`, `mul_add()` (FMA)
//! - **Math**: `sqrt()`, `rcp()`
//! - **Horizontal**: `hadd()`, `horizontal_sum()`

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Div, Mul, Sub};

pub(crate) use crate::simd::LANE_COUNT;
use crate::simd::{Alignment, SimdLoad, SimdStore, ALIGNMENT};

/// Eight packed f32 values in one AVX register.
#[derive(Copy, Clone, Debug)]
pub struct F32x8 {
    pub elements: __m256,
}

impl Alignment<f32> for F32x8 {
    #[inline(always)]
    fn is_aligned(ptr: *const f32) -> bool {
        (ptr as usize) % ALIGNMENT == 0
    }
}

impl SimdLoad<f32> for F32x8 {
    type Output = Self;

    /// Loads 8 elements, using the aligned instruction when `ptr` is 32-byte aligned.
    ///
    /// Buffers owned by an [`Array`](crate::Array) always take the aligned path.
    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self::Output {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match F32x8::is_aligned(ptr) {
            true => unsafe { Self::load_aligned(ptr) },
            false => unsafe { Self::load_unaligned(ptr) },
        }
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const f32) -> Self::Output {
        Self {
            elements: _mm256_load_ps(ptr),
        }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const f32) -> Self::Output {
        Self {
            elements: _mm256_loadu_ps(ptr),
        }
    }
}

impl SimdStore<f32> for F32x8 {
    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match F32x8::is_aligned(ptr) {
            true => unsafe { self.store_aligned_at(ptr) },
            false => unsafe { self.store_unaligned_at(ptr) },
        }
    }

    #[inline(always)]
    unsafe fn store_aligned_at(&self, ptr: *mut f32) {
        _mm256_store_ps(ptr, self.elements)
    }

    #[inline(always)]
    unsafe fn store_unaligned_at(&self, ptr: *mut f32) {
        _mm256_storeu_ps(ptr, self.elements)
    }
}

impl F32x8 {
    /// Broadcasts `value` to all lanes.
    #[inline(always)]
    pub fn splat(value: f32) -> Self {
        Self {
            elements: unsafe { _mm256_set1_ps(value) },
        }
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self {
            elements: unsafe { _mm256_setzero_ps() },
        }
    }

    /// Correctly rounded lane-wise square root.
    #[inline(always)]
    pub fn sqrt(self) -> Self {
        Self {
            elements: unsafe { _mm256_sqrt_ps(self.elements) },
        }
    }

    /// Approximate reciprocal, relative error at most 1.5 × 2⁻¹².
    #[inline(always)]
    pub fn rcp(self) -> Self {
        Self {
            elements: unsafe { _mm256_rcp_ps(self.elements) },
        }
    }

    /// Fused `self * b + c` with a single rounding. Requires FMA.
    #[inline(always)]
    pub fn mul_add(self, b: Self, c: Self) -> Self {
        Self {
            elements: unsafe { _mm256_fmadd_ps(self.elements, b.elements, c.elements) },
        }
    }

    /// Pairwise horizontal add within each 128-bit half:
    /// `[a0+a1, a2+a3, b0+b1, b2+b3, a4+a5, a6+a7, b4+b5, b6+b7]`.
    #[inline(always)]
    pub fn hadd(self, other: Self) -> Self {
        Self {
            elements: unsafe { _mm256_hadd_ps(self.elements, other.elements) },
        }
    }

    #[inline(always)]
    pub fn to_array(self) -> [f32; LANE_COUNT] {
        let mut lanes = [0.0f32; LANE_COUNT];
        unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), self.elements) };
        lanes
    }

    /// Sum of all eight lanes, added in lane order.
    #[inline(always)]
    pub fn horizontal_sum(self) -> f32 {
        self.to_array().iter().fold(0.0, |acc, &x| acc + x)
    }
}

impl Add for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_add_ps(self.elements, rhs.elements) },
        }
    }
}

impl Sub for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_sub_ps(self.elements, rhs.elements) },
        }
    }
}

impl Mul for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_mul_ps(self.elements, rhs.elements) },
        }
    }
}

impl Div for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn div(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_div_ps(self.elements, rhs.elements) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AlignedBuf;

    fn has_avx() -> bool {
        is_x86_feature_detected!("avx")
    }

    fn lanes(start: f32) -> [f32; 8] {
        std::array::from_fn(|i| start + i as f32)
    }

    mod alignment_tests {
        use super::*;

        #[test]
        fn test_is_aligned_32_byte_boundary() {
            let buf = AlignedBuf::<f32>::zeroed(16);
            assert!(F32x8::is_aligned(buf.as_ptr()));
        }

        #[test]
        fn test_is_not_aligned() {
            let buf = AlignedBuf::<f32>::zeroed(16);
            let unaligned = unsafe { buf.as_ptr().add(1) };
            assert!(!F32x8::is_aligned(unaligned));
        }
    }

    mod load_store_tests {
        use super::*;

        #[test]
        fn test_aligned_roundtrip() {
            if !has_avx() {
                return;
            }
            let src = AlignedBuf::from_slice(&lanes(1.0));
            let mut dst = AlignedBuf::<f32>::zeroed(8);

            unsafe {
                let v = F32x8::load(src.as_ptr());
                v.store_at(dst.as_mut_ptr());
            }
            assert_eq!(dst.as_slice(), src.as_slice());
        }

        #[test]
        fn test_unaligned_roundtrip() {
            if !has_avx() {
                return;
            }
            let mut src = AlignedBuf::<f32>::zeroed(9);
            src[1..].copy_from_slice(&lanes(10.0));
            let mut dst = AlignedBuf::<f32>::zeroed(9);

            unsafe {
                let v = F32x8::load(src.as_ptr().add(1));
                v.store_at(dst.as_mut_ptr().add(1));
            }
            assert_eq!(&dst[1..], &lanes(10.0));
            assert_eq!(dst[0], 0.0);
        }
    }

    mod arithmetic_tests {
        use super::*;

        #[test]
        fn test_operators() {
            if !has_avx() {
                return;
            }
            let a = unsafe { F32x8::load_unaligned(lanes(1.0).as_ptr()) };
            let b = F32x8::splat(2.0);

            assert_eq!((a + b).to_array(), lanes(3.0));
            assert_eq!((a - b).to_array(), lanes(-1.0));
            assert_eq!((a * b).to_array(), lanes(1.0).map(|x| x * 2.0));
            assert_eq!((a / b).to_array(), lanes(1.0).map(|x| x / 2.0));
        }

        #[test]
        fn test_sqrt_matches_scalar() {
            if !has_avx() {
                return;
            }
            let values = lanes(0.5);
            let v = unsafe { F32x8::load_unaligned(values.as_ptr()) };
            assert_eq!(v.sqrt().to_array(), values.map(f32::sqrt));
        }

        #[test]
        fn test_rcp_is_close() {
            if !has_avx() {
                return;
            }
            let values = lanes(1.0);
            let v = unsafe { F32x8::load_unaligned(values.as_ptr()) };
            for (approx, x) in v.rcp().to_array().iter().zip(values) {
                let exact = 1.0 / x;
                assert!(((approx - exact) / exact).abs() <= 1.5 / 4096.0);
            }
        }

        #[test]
        fn test_mul_add() {
            if !has_avx() || !is_x86_feature_detected!("fma") {
                return;
            }
            let a = unsafe { F32x8::load_unaligned(lanes(1.0).as_ptr()) };
            let r = a.mul_add(F32x8::splat(2.0), F32x8::splat(1.0));
            assert_eq!(r.to_array(), lanes(1.0).map(|x| x * 2.0 + 1.0));
        }
    }

    mod horizontal_tests {
        use super::*;

        #[test]
        fn test_hadd_layout() {
            if !has_avx() {
                return;
            }
            let a = unsafe { F32x8::load_unaligned(lanes(0.0).as_ptr()) };
            let b = unsafe { F32x8::load_unaligned(lanes(10.0).as_ptr()) };
            assert_eq!(
                a.hadd(b).to_array(),
                [1.0, 5.0, 21.0, 25.0, 9.0, 13.0, 29.0, 33.0]
            );
        }

        #[test]
        fn test_horizontal_sum() {
            if !has_avx() {
                return;
            }
            let v = unsafe { F32x8::load_unaligned(lanes(1.0).as_ptr()) };
            assert_eq!(v.horizontal_sum(), 36.0);
            assert_eq!(F32x8::zero().horizontal_sum(), 0.0);
        }
    }
}
