//! The numeric vector type.
//!
//! [`Array<T>`] owns a 32-byte aligned buffer and a reference to the kernel
//! table chosen at construction. Every arithmetic method checks operand
//! lengths and then forwards to the bound kernel; the binding never changes
//! for the lifetime of the array, and clones and moves carry it along.
//!
//! Method families:
//!
//! | form                         | example                          | result            |
//! |------------------------------|----------------------------------|-------------------|
//! | out-of-place                 | `a.add(&b)?`                     | new array         |
//! | into a destination           | `c.add_into(&a, &b)?`            | overwrites `c`    |
//! | in place                     | `a.add_assign(&b)?`              | `a = a + b`       |
//! | unary from a source          | `c.sqrt_from(&a)?`               | overwrites `c`    |
//! | unary in place               | `a.sqrt_in_place()`              | overwrites `a`    |
//!
//! # Thread safety
//!
//! An array has no interior mutability. Distinct arrays may be used from
//! different threads freely; sharing one array across threads for mutation
//! needs external synchronization like any `&mut` access.
//!
//! # Examples
//!
//! ```rust
//! use simdarray::Array;
//!
//! let a: Array = (0..13).map(|i| 10.0 * i as f32).collect();
//! let b: Array = (0..13).map(|i| 20.0 * i as f32).collect();
//!
//! let c = a.add(&b).unwrap();
//! assert!(c.iter().enumerate().all(|(i, &x)| x == 30.0 * i as f32));
//! assert_eq!(a.distance(&a).unwrap(), 0.0);
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::slice::SliceIndex;

use log::debug;

use crate::buffer::AlignedBuf;
use crate::caps::{Capabilities, Tier};
use crate::config::Config;
use crate::error::{check_len, Result};
use crate::simd::{Element, Kernels};

/// Element count of a default-constructed array.
pub const DEFAULT_CAPACITY: usize = 512;

/// Aligned numeric vector with runtime-selected SIMD kernels.
pub struct Array<T: Element = f32> {
    buf: AlignedBuf<T>,
    kernels: &'static Kernels<T>,
}

pub type SinglePrecisionArray = Array<f32>;
pub type DoublePrecisionArray = Array<f64>;

macro_rules! binary_ops {
    ($op:ident, $into:ident, $assign:ident, $symbol:literal) => {
        #[doc = concat!("Elementwise `self ", $symbol, " rhs` into a new array.")]
        ///
        /// # Errors
        ///
        /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) if the lengths differ.
        pub fn $op(&self, rhs: &Self) -> Result<Self> {
            check_len(stringify!($op), self.len(), rhs.len())?;
            let mut out = self.zeroed_like();
            (self.kernels.$op)(&self.buf, &rhs.buf, &mut out.buf);
            Ok(out)
        }

        #[doc = concat!("Writes `lhs ", $symbol, " rhs` into `self`, using `self`'s kernels.")]
        ///
        /// # Errors
        ///
        /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) unless all three
        /// lengths are equal.
        pub fn $into(&mut self, lhs: &Self, rhs: &Self) -> Result<()> {
            check_len(stringify!($into), lhs.len(), rhs.len())?;
            check_len(stringify!($into), lhs.len(), self.len())?;
            (self.kernels.$op)(&lhs.buf, &rhs.buf, &mut self.buf);
            Ok(())
        }

        #[doc = concat!("In place `self = self ", $symbol, " rhs`.")]
        ///
        /// # Errors
        ///
        /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) if the lengths differ.
        pub fn $assign(&mut self, rhs: &Self) -> Result<()> {
            check_len(stringify!($assign), self.len(), rhs.len())?;
            (self.kernels.$assign)(&mut self.buf, &rhs.buf);
            Ok(())
        }
    };
}

macro_rules! unary_ops {
    ($(#[$extra:meta])* $op:ident, $from:ident, $in_place:ident, $assign:ident, $what:literal) => {
        #[doc = concat!("Elementwise ", $what, " into a new array.")]
        $(#[$extra])*
        pub fn $op(&self) -> Self {
            let mut out = self.zeroed_like();
            (self.kernels.$op)(&self.buf, &mut out.buf);
            out
        }

        #[doc = concat!("Writes the elementwise ", $what, " of `src` into `self`.")]
        ///
        /// # Errors
        ///
        /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) if the lengths differ.
        pub fn $from(&mut self, src: &Self) -> Result<()> {
            check_len(stringify!($from), self.len(), src.len())?;
            (self.kernels.$op)(&src.buf, &mut self.buf);
            Ok(())
        }

        #[doc = concat!("Replaces every element with its ", $what, ".")]
        pub fn $in_place(&mut self) {
            (self.kernels.$assign)(&mut self.buf);
        }
    };
}

impl<T: Element> Array<T> {
    /// An empty array bound to the best kernels for this processor.
    pub fn new() -> Self {
        Self::from_buf(AlignedBuf::new())
    }

    /// `len` zeros, bound to the best kernels for this processor.
    pub fn zeros(len: usize) -> Self {
        Self::from_buf(AlignedBuf::zeroed(len))
    }

    /// Like [`Array::zeros`], reporting allocation failure instead of aborting.
    pub fn try_zeros(len: usize) -> Result<Self> {
        Ok(Self::from_buf(AlignedBuf::try_zeroed(len)?))
    }

    /// A copy of `values`, bound to the best kernels for this processor.
    pub fn from_slice(values: &[T]) -> Self {
        Self::from_buf(AlignedBuf::from_slice(values))
    }

    /// `len` zeros bound to the kernels `config` selects.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedTier`](crate::Error::UnsupportedTier) if `config`
    /// forces a tier the processor lacks.
    pub fn with_config(len: usize, config: &Config) -> Result<Self> {
        let kernels = Self::bind(config)?;
        Ok(Array {
            buf: AlignedBuf::try_zeroed(len)?,
            kernels,
        })
    }

    /// A copy of `values` bound to the kernels `config` selects.
    ///
    /// ```rust
    /// use simdarray::{Acceleration, Array, Config, Tier};
    ///
    /// let serial = Config::new().acceleration(Acceleration::Serial);
    /// let a = Array::from_slice_with_config(&[1.0f32, 2.0, 3.0], &serial).unwrap();
    /// assert_eq!(a.tier(), Tier::Scalar);
    /// ```
    pub fn from_slice_with_config(values: &[T], config: &Config) -> Result<Self> {
        let mut array = Self::with_config(values.len(), config)?;
        array.buf.copy_from_slice(values);
        Ok(array)
    }

    fn from_buf(buf: AlignedBuf<T>) -> Self {
        let tier = Capabilities::get().best_tier();
        Array {
            buf,
            kernels: T::table(tier, false),
        }
    }

    fn bind(config: &Config) -> Result<&'static Kernels<T>> {
        let caps = Capabilities::get();
        let tier = config.resolve(caps)?;
        let fma = config.use_fma(caps, tier);
        let kernels = T::table(tier, fma);
        debug!(
            "binding {} array to {} kernels (requested {}, fma {})",
            T::NAME,
            kernels.tier(),
            config.acceleration,
            kernels.uses_fma()
        );
        Ok(kernels)
    }

    /// Same length and binding as `self`, all zeros.
    fn zeroed_like(&self) -> Self {
        Array {
            buf: AlignedBuf::zeroed(self.len()),
            kernels: self.kernels,
        }
    }

    /// Tier of the bound kernels.
    #[inline]
    pub fn tier(&self) -> Tier {
        self.kernels.tier()
    }

    /// Whether dot product is bound to the fused multiply-add kernel.
    #[inline]
    pub fn uses_fma(&self) -> bool {
        self.kernels.uses_fma()
    }

    #[inline]
    pub fn kernels(&self) -> &'static Kernels<T> {
        self.kernels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of elements; same as [`Array::len`].
    #[inline]
    pub fn dimension(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Bytes occupied by the elements.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.buf.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }

    /// Pointer to the first element. 32-byte aligned whenever the array is non-empty.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.buf.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.buf.get_mut(index)
    }

    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        self.buf.as_slice().get_unchecked(index)
    }

    /// # Safety
    ///
    /// `index` must be less than `self.len()`.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        self.buf.as_mut_slice().get_unchecked_mut(index)
    }

    pub fn push(&mut self, value: T) {
        self.buf.push(value);
    }

    /// Changes the length, zero-filling new elements.
    pub fn resize(&mut self, len: usize) {
        self.buf.resize(len);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Moves the contents out, leaving `self` empty. Both keep the binding.
    pub fn take(&mut self) -> Self {
        Array {
            buf: self.buf.take(),
            kernels: self.kernels,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.buf.to_vec()
    }

    binary_ops!(add, add_into, add_assign, "+");
    binary_ops!(sub, sub_into, sub_assign, "-");
    binary_ops!(mul, mul_into, mul_assign, "*");
    binary_ops!(div, div_into, div_assign, "/");

    /// Multiplies every element by `k` into a new array.
    pub fn scalar_mul(&self, k: T) -> Self {
        let mut out = self.zeroed_like();
        (self.kernels.scalar_mul)(&self.buf, k, &mut out.buf);
        out
    }

    pub fn scalar_mul_assign(&mut self, k: T) {
        (self.kernels.scalar_mul_assign)(&mut self.buf, k);
    }

    /// Divides every element by `k` into a new array.
    pub fn scalar_div(&self, k: T) -> Self {
        let mut out = self.zeroed_like();
        (self.kernels.scalar_div)(&self.buf, k, &mut out.buf);
        out
    }

    pub fn scalar_div_assign(&mut self, k: T) {
        (self.kernels.scalar_div_assign)(&mut self.buf, k);
    }

    unary_ops!(sqrt, sqrt_from, sqrt_in_place, sqrt_assign, "square root");
    unary_ops!(square, square_from, square_in_place, square_assign, "square");
    unary_ops!(cube, cube_from, cube_in_place, cube_assign, "cube");
    unary_ops!(negate, negate_from, negate_in_place, negate_assign, "negation");
    unary_ops!(
        ///
        /// On the AVX and AVX2 tiers full 8-lane blocks use the hardware
        /// approximation, with relative error below 1.5 × 2⁻¹² for normal inputs
        /// with `2⁻¹²⁶ <= |x| <= 2¹²⁶`. Outside that range the approximation
        /// flushes: `|x| > 2¹²⁶` gives a zero of the same sign and subnormal `x`
        /// gives an infinity. The scalar tier and block tails divide exactly.
        reciprocate,
        reciprocate_from,
        reciprocate_in_place,
        reciprocate_assign,
        "reciprocal"
    );
    unary_ops!(
        prefix_sum,
        prefix_sum_from,
        prefix_sum_in_place,
        prefix_sum_assign,
        "inclusive running sum"
    );

    /// Sum of `self[i] * rhs[i]`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) if the lengths differ.
    pub fn dot_product(&self, rhs: &Self) -> Result<T> {
        check_len("dot_product", self.len(), rhs.len())?;
        Ok((self.kernels.dot_product)(&self.buf, &rhs.buf))
    }

    /// Sum of all elements. Vector tiers add in a pairwise tree, so the result
    /// may differ from a left-to-right sum in the last bits.
    pub fn summation(&self) -> T {
        (self.kernels.summation)(&self.buf)
    }

    /// Euclidean distance between `self` and `rhs`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`](crate::Error::LengthMismatch) if the lengths differ.
    pub fn distance(&self, rhs: &Self) -> Result<T> {
        check_len("distance", self.len(), rhs.len())?;
        Ok((self.kernels.distance)(&self.buf, &rhs.buf))
    }
}

impl<T: Element> Clone for Array<T> {
    /// Deep copy with the same binding.
    fn clone(&self) -> Self {
        Array {
            buf: self.buf.clone(),
            kernels: self.kernels,
        }
    }
}

impl<T: Element> Default for Array<T> {
    /// [`DEFAULT_CAPACITY`] zeros.
    fn default() -> Self {
        Self::zeros(DEFAULT_CAPACITY)
    }
}

impl<T: Element> PartialEq for Array<T> {
    /// Compares elements only; arrays bound to different tiers can be equal.
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("tier", &self.tier())
            .field("fma", &self.uses_fma())
            .field("elements", &self.buf)
            .finish()
    }
}

impl<T: Element> Deref for Array<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Element> DerefMut for Array<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Element, I: SliceIndex<[T]>> Index<I> for Array<T> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &I::Output {
        &self.as_slice()[index]
    }
}

impl<T: Element, I: SliceIndex<[T]>> IndexMut<I> for Array<T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: Element> From<&[T]> for Array<T> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Element> From<Vec<T>> for Array<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_slice(&values)
    }
}

impl<T: Element> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut array = Self::new();
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            array.buf.resize(lower);
            array.buf.clear();
        }
        for value in iter {
            array.push(value);
        }
        array
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Acceleration;
    use crate::error::Error;

    fn ramp(len: usize, scale: f32) -> Array {
        (0..len).map(|i| i as f32 * scale).collect()
    }

    #[test]
    fn test_default_holds_512_zeros() {
        let a = Array::<f32>::default();
        assert_eq!(a.len(), DEFAULT_CAPACITY);
        assert!(a.iter().all(|&x| x == 0.0));
        assert_eq!(a.size_in_bytes(), DEFAULT_CAPACITY * 4);
    }

    #[test]
    fn test_new_binds_best_tier() {
        let a = Array::<f32>::new();
        assert!(a.is_empty());
        assert_eq!(a.tier(), Capabilities::get().best_tier());
        assert!(!a.uses_fma());
    }

    #[test]
    fn test_f64_binds_scalar() {
        let a = Array::<f64>::zeros(4);
        assert_eq!(a.tier(), Tier::Scalar);
        assert_eq!(a.size_in_bytes(), 32);
    }

    #[test]
    fn test_serial_config_binds_scalar() {
        let config = Config::new().acceleration(Acceleration::Serial).fma(true);
        let a = Array::<f32>::with_config(8, &config).unwrap();
        assert_eq!(a.tier(), Tier::Scalar);
        assert!(!a.uses_fma());
    }

    #[test]
    fn test_unsupported_config_is_rejected() {
        let caps = Capabilities::get();
        let config = Config::new().acceleration(Acceleration::Avx2);
        let result = Array::<f32>::with_config(8, &config);
        if caps.supports(Tier::Avx2) {
            assert_eq!(result.unwrap().tier(), Tier::Avx2);
        } else {
            assert!(matches!(result, Err(Error::UnsupportedTier { .. })));
        }
    }

    #[test]
    fn test_add_scenarios() {
        let a = ramp(512, 1.0);
        let b = ramp(512, 2.0);
        let c = a.add(&b).unwrap();
        assert!(c.iter().enumerate().all(|(i, &x)| x == 3.0 * i as f32));

        let a = ramp(13, 10.0);
        let b = ramp(13, 20.0);
        let c = a.add(&b).unwrap();
        assert!(c.iter().enumerate().all(|(i, &x)| x == 30.0 * i as f32));
    }

    #[test]
    fn test_length_mismatch() {
        let a = ramp(8, 1.0);
        let b = ramp(5, 1.0);

        assert_eq!(
            a.add(&b).unwrap_err(),
            Error::LengthMismatch {
                op: "add",
                expected: 8,
                actual: 5
            }
        );
        assert!(a.dot_product(&b).is_err());
        assert!(a.distance(&b).is_err());

        let mut c = Array::zeros(8);
        assert!(c.sub_into(&a, &b).is_err());
        assert!(c.sqrt_from(&b).is_err());

        let mut d = Array::zeros(5);
        assert!(d.mul_into(&a, &a).is_err());
        assert!(d.div_assign(&a).is_err());
    }

    #[test]
    fn test_into_and_assign_forms_agree() {
        let a = ramp(19, 0.5);
        let b = ramp(19, 1.5);
        let expected = a.sub(&b).unwrap();

        let mut into = Array::zeros(19);
        into.sub_into(&a, &b).unwrap();
        assert_eq!(into, expected);

        let mut acc = a.clone();
        acc.sub_assign(&b).unwrap();
        assert_eq!(acc, expected);
    }

    #[test]
    fn test_unary_forms_agree() {
        let a = ramp(21, 0.25);
        let expected = a.cube();

        let mut from = Array::zeros(21);
        from.cube_from(&a).unwrap();
        assert_eq!(from, expected);

        let mut in_place = a.clone();
        in_place.cube_in_place();
        assert_eq!(in_place, expected);
    }

    #[test]
    fn test_results_inherit_binding() {
        let config = Config::new().acceleration(Acceleration::Serial);
        let a = Array::from_slice_with_config(&[1.0f32, 2.0, 3.0], &config).unwrap();
        assert_eq!(a.square().tier(), Tier::Scalar);
        assert_eq!(a.scalar_mul(2.0).tier(), Tier::Scalar);
        assert_eq!(a.clone().tier(), Tier::Scalar);
    }

    #[test]
    fn test_prefix_sum() {
        let a = Array::from(vec![1.0f32, 2.0, 3.0, 4.0]);
        assert_eq!(a.prefix_sum().as_slice(), &[1.0, 3.0, 6.0, 10.0]);
    }

    #[test]
    fn test_take_keeps_binding_and_empties_source() {
        let mut a = ramp(9, 1.0);
        let address = a.as_ptr();
        let tier = a.tier();

        let c = a.take();
        assert_eq!(c.as_ptr(), address);
        assert_eq!(c.tier(), tier);
        assert!(a.is_empty());
        assert_eq!(a.capacity(), 0);
    }

    #[test]
    fn test_accessors_and_growth() {
        let mut a = Array::<f32>::from_slice(&[1.0, 2.0]);
        assert_eq!(a.get(1), Some(&2.0));
        assert_eq!(a.get(2), None);

        *a.get_mut(0).unwrap() = 5.0;
        a[1] = 6.0;
        a.push(7.0);
        assert_eq!(a.to_vec(), vec![5.0, 6.0, 7.0]);
        assert_eq!(unsafe { *a.get_unchecked(2) }, 7.0);

        a.resize(5);
        assert_eq!(a.as_slice(), &[5.0, 6.0, 7.0, 0.0, 0.0]);
        assert_eq!(a.dimension(), 5);

        a.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_range_indexing() {
        let mut a = Array::<f32>::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(&a[1..3], &[2.0, 3.0]);
        assert_eq!(&a[3..], &[4.0, 5.0]);
        assert_eq!(a[..].len(), 5);

        a[..2].copy_from_slice(&[-1.0, -2.0]);
        assert_eq!(a.as_slice(), &[-1.0, -2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_clear_then_resize_zeroes_old_contents() {
        let mut a = Array::<f32>::from_slice(&[7.0; 8]);
        a.clear();
        a.resize(16);
        assert!(a.iter().all(|&x| x == 0.0));

        let mut b = Array::<f32>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
        b.resize(2);
        b.resize(40);
        assert_eq!(&b[..2], &[1.0, 2.0]);
        assert!(b[2..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_iter_is_aligned() {
        let a: Array = (0..100).map(|i| i as f32).collect();
        assert_eq!(a.len(), 100);
        assert_eq!(a.as_ptr() as usize % 32, 0);
        assert_eq!(a[99], 99.0);
    }

    #[test]
    fn test_debug_shows_tier() {
        let config = Config::new().acceleration(Acceleration::Serial);
        let a = Array::from_slice_with_config(&[1.0f32], &config).unwrap();
        let debug = format!("{a:?}");
        assert!(debug.contains("Scalar"));
        assert!(debug.contains("1.0"));
    }
}
