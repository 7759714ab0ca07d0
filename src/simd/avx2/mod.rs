//! AVX2 tier: specializations over the AVX kernels.
//!
//! AVX2 adds 256-bit integer instructions, which lets negate flip eight sign
//! bits per instruction instead of four. Add is unrolled to two registers per
//! iteration. Every other operation in the AVX2 dispatch table is the AVX
//! kernel.

pub(crate) mod kernels;

pub(crate) use kernels::*;
