//! Portable kernels, one element at a time.
//!
//! These are the reference semantics for every tier: a vector kernel for an
//! elementwise operation must produce the bit pattern these produce. They are
//! generic over [`Float`] so the same code serves `f32` and `f64`.

use num::Float;

macro_rules! binary_kernels {
    ($name:ident, $assign:ident, $op:tt) => {
        pub(crate) fn $name<T: Float>(a: &[T], b: &[T], out: &mut [T]) {
            for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
                *o = x $op y;
            }
        }

        pub(crate) fn $assign<T: Float>(acc: &mut [T], b: &[T]) {
            for (o, &y) in acc.iter_mut().zip(b) {
                *o = *o $op y;
            }
        }
    };
}

binary_kernels!(add, add_assign, +);
binary_kernels!(sub, sub_assign, -);
binary_kernels!(mul, mul_assign, *);
binary_kernels!(div, div_assign, /);

macro_rules! unary_kernels {
    ($name:ident, $assign:ident, |$x:ident| $body:expr) => {
        pub(crate) fn $name<T: Float>(src: &[T], out: &mut [T]) {
            for (o, &$x) in out.iter_mut().zip(src) {
                *o = $body;
            }
        }

        pub(crate) fn $assign<T: Float>(values: &mut [T]) {
            for v in values.iter_mut() {
                let $x = *v;
                *v = $body;
            }
        }
    };
}

unary_kernels!(sqrt, sqrt_assign, |x| x.sqrt());
unary_kernels!(square, square_assign, |x| x * x);
unary_kernels!(cube, cube_assign, |x| x * x * x);
unary_kernels!(negate, negate_assign, |x| -x);
unary_kernels!(reciprocate, reciprocate_assign, |x| T::one() / x);

pub(crate) fn scalar_mul<T: Float>(src: &[T], k: T, out: &mut [T]) {
    for (o, &x) in out.iter_mut().zip(src) {
        *o = x * k;
    }
}

pub(crate) fn scalar_mul_assign<T: Float>(values: &mut [T], k: T) {
    for v in values.iter_mut() {
        *v = *v * k;
    }
}

pub(crate) fn scalar_div<T: Float>(src: &[T], k: T, out: &mut [T]) {
    for (o, &x) in out.iter_mut().zip(src) {
        *o = x / k;
    }
}

pub(crate) fn scalar_div_assign<T: Float>(values: &mut [T], k: T) {
    for v in values.iter_mut() {
        *v = *v / k;
    }
}

/// Left-to-right sum.
pub(crate) fn summation<T: Float>(values: &[T]) -> T {
    values.iter().fold(T::zero(), |acc, &x| acc + x)
}

pub(crate) fn dot_product<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Euclidean distance, `sqrt(sum((a - b)^2))`.
pub(crate) fn distance<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
        .sqrt()
}

/// Inclusive running sum: `out[i] = src[0] + ... + src[i]`.
pub(crate) fn prefix_sum<T: Float>(src: &[T], out: &mut [T]) {
    let mut running = T::zero();
    for (o, &x) in out.iter_mut().zip(src) {
        running = running + x;
        *o = running;
    }
}

pub(crate) fn prefix_sum_assign<T: Float>(values: &mut [T]) {
    let mut running = T::zero();
    for v in values.iter_mut() {
        running = running + *v;
        *v = running;
    }
}
