#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::avx::f32x8::{F32x8, LANE_COUNT};
use crate::simd::{SimdLoad, SimdStore};

const UNROLL: usize = 2 * LANE_COUNT;

/// Flips the sign bit of every lane.
#[inline(always)]
unsafe fn _mm256_neg_ps(v: __m256) -> __m256 {
    let sign = _mm256_set1_epi32(i32::MIN);
    _mm256_castsi256_ps(_mm256_xor_si256(_mm256_castps_si256(v), sign))
}

#[target_feature(enable = "avx,avx2")]
unsafe fn add_raw(n: usize, a: *const f32, b: *const f32, out: *mut f32) {
    let unrolled = n - n % UNROLL;
    let full = n - n % LANE_COUNT;
    let mut i = 0;
    while i < unrolled {
        let lo = F32x8::load(a.add(i)) + F32x8::load(b.add(i));
        let hi = F32x8::load(a.add(i + LANE_COUNT)) + F32x8::load(b.add(i + LANE_COUNT));
        lo.store_at(out.add(i));
        hi.store_at(out.add(i + LANE_COUNT));
        i += UNROLL;
    }
    while i < full {
        (F32x8::load(a.add(i)) + F32x8::load(b.add(i))).store_at(out.add(i));
        i += LANE_COUNT;
    }
    while i < n {
        *out.add(i) = *a.add(i) + *b.add(i);
        i += 1;
    }
}

pub(crate) fn add(a: &[f32], b: &[f32], out: &mut [f32]) {
    assert!(a.len() == out.len() && b.len() == out.len());
    // SAFETY: lengths checked; bound only when AVX2 is available.
    unsafe { add_raw(out.len(), a.as_ptr(), b.as_ptr(), out.as_mut_ptr()) }
}

pub(crate) fn add_assign(acc: &mut [f32], b: &[f32]) {
    assert_eq!(acc.len(), b.len());
    let p = acc.as_mut_ptr();
    // SAFETY: as above; both registers of a step are loaded before either is stored.
    unsafe { add_raw(acc.len(), p, b.as_ptr(), p) }
}

#[target_feature(enable = "avx,avx2")]
unsafe fn negate_raw(n: usize, src: *const f32, out: *mut f32) {
    let full = n - n % LANE_COUNT;
    let mut i = 0;
    while i < full {
        let v = F32x8::load(src.add(i));
        F32x8 {
            elements: _mm256_neg_ps(v.elements),
        }
        .store_at(out.add(i));
        i += LANE_COUNT;
    }
    while i < n {
        *out.add(i) = -*src.add(i);
        i += 1;
    }
}

pub(crate) fn negate(src: &[f32], out: &mut [f32]) {
    assert_eq!(src.len(), out.len());
    // SAFETY: lengths checked; bound only when AVX2 is available.
    unsafe { negate_raw(out.len(), src.as_ptr(), out.as_mut_ptr()) }
}

pub(crate) fn negate_assign(values: &mut [f32]) {
    let p = values.as_mut_ptr();
    // SAFETY: bound only when AVX2 is available.
    unsafe { negate_raw(values.len(), p, p) }
}
