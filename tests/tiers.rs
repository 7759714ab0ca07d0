//! Cross-tier agreement tests.
//!
//! Every tier the host supports is forced through a `Config` and compared with
//! the scalar tier on the same inputs. Elementwise operations must agree bit
//! for bit; reductions must agree within floating point tolerance. Lengths
//! that are not multiples of eight exercise the scalar tail of each kernel.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simdarray::{Acceleration, Array, Capabilities, Config, Tier};

const LENGTHS: [usize; 10] = [1, 5, 8, 13, 16, 19, 512, 515, 517, 531];

fn config_for(tier: Tier) -> Config {
    let acceleration = match tier {
        Tier::Scalar => Acceleration::Serial,
        Tier::Avx => Acceleration::Avx,
        Tier::Avx2 => Acceleration::Avx2,
    };
    Config::new().acceleration(acceleration)
}

/// Vector tiers the host can run. Empty on machines without AVX.
fn vector_tiers() -> Vec<Tier> {
    let caps = Capabilities::get();
    [Tier::Avx, Tier::Avx2]
        .into_iter()
        .filter(|&t| caps.supports(t))
        .collect()
}

fn random_pair(len: usize, seed: u64, range: std::ops::RangeInclusive<f32>) -> (Vec<f32>, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = (0..len).map(|_| rng.random_range(range.clone())).collect();
    let b = (0..len).map(|_| rng.random_range(range.clone())).collect();
    (a, b)
}

fn bind(values: &[f32], tier: Tier) -> Array {
    Array::from_slice_with_config(values, &config_for(tier)).unwrap()
}

fn assert_bits_eq(actual: &Array, expected: &Array, what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}: length");
    for (i, (x, y)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()),
            "{what}: element {i} differs ({x} vs {y})"
        );
    }
}

#[test]
fn test_binary_operations_are_bit_identical() {
    for tier in vector_tiers() {
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, b) = random_pair(len, seed as u64, -1000.0..=1000.0);
            let (sa, sb) = (bind(&a, Tier::Scalar), bind(&b, Tier::Scalar));
            let (va, vb) = (bind(&a, tier), bind(&b, tier));
            assert_eq!(va.tier(), tier);

            let what = |op: &str| format!("{op} on {tier} at length {len}");
            assert_bits_eq(&va.add(&vb).unwrap(), &sa.add(&sb).unwrap(), &what("add"));
            assert_bits_eq(&va.sub(&vb).unwrap(), &sa.sub(&sb).unwrap(), &what("sub"));
            assert_bits_eq(&va.mul(&vb).unwrap(), &sa.mul(&sb).unwrap(), &what("mul"));
            assert_bits_eq(&va.div(&vb).unwrap(), &sa.div(&sb).unwrap(), &what("div"));
        }
    }
}

#[test]
fn test_unary_operations_are_bit_identical() {
    for tier in vector_tiers() {
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, _) = random_pair(len, 100 + seed as u64, -50.0..=50.0);
            let s = bind(&a, Tier::Scalar);
            let v = bind(&a, tier);

            let what = |op: &str| format!("{op} on {tier} at length {len}");
            assert_bits_eq(&v.sqrt(), &s.sqrt(), &what("sqrt"));
            assert_bits_eq(&v.square(), &s.square(), &what("square"));
            assert_bits_eq(&v.cube(), &s.cube(), &what("cube"));
            assert_bits_eq(&v.negate(), &s.negate(), &what("negate"));
            assert_bits_eq(&v.scalar_mul(1.5), &s.scalar_mul(1.5), &what("scalar_mul"));
            assert_bits_eq(&v.scalar_div(3.0), &s.scalar_div(3.0), &what("scalar_div"));
            assert_bits_eq(&v.prefix_sum(), &s.prefix_sum(), &what("prefix_sum"));
        }
    }
}

#[test]
fn test_in_place_forms_are_bit_identical() {
    for tier in vector_tiers() {
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, b) = random_pair(len, 200 + seed as u64, 0.5..=20.0);
            let sb = bind(&b, Tier::Scalar);
            let vb = bind(&b, tier);

            let mut s = bind(&a, Tier::Scalar);
            let mut v = bind(&a, tier);
            s.add_assign(&sb).unwrap();
            v.add_assign(&vb).unwrap();
            s.div_assign(&sb).unwrap();
            v.div_assign(&vb).unwrap();
            s.negate_in_place();
            v.negate_in_place();
            s.sqrt_in_place();
            v.sqrt_in_place();

            assert_bits_eq(&v, &s, &format!("in-place chain on {tier} at length {len}"));
        }
    }
}

#[test]
fn test_reductions_agree_within_tolerance() {
    for tier in vector_tiers() {
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, b) = random_pair(len, 300 + seed as u64, -10.0..=10.0);
            let (sa, sb) = (bind(&a, Tier::Scalar), bind(&b, Tier::Scalar));
            let (va, vb) = (bind(&a, tier), bind(&b, tier));

            let magnitude: f32 = a.iter().map(|x| x.abs()).sum::<f32>().max(1.0);
            let expected = sa.summation();
            let actual = va.summation();
            assert!(
                (actual - expected).abs() <= 1e-5 * magnitude,
                "summation on {tier} at length {len}: {actual} vs {expected}"
            );

            let magnitude: f32 = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum::<f32>().max(1.0);
            let expected = sa.dot_product(&sb).unwrap();
            let actual = va.dot_product(&vb).unwrap();
            assert!(
                (actual - expected).abs() <= 1e-5 * magnitude,
                "dot_product on {tier} at length {len}: {actual} vs {expected}"
            );

            let expected = sa.distance(&sb).unwrap();
            let actual = va.distance(&vb).unwrap();
            assert!(
                (actual - expected).abs() <= 1e-5 * expected.max(1.0),
                "distance on {tier} at length {len}: {actual} vs {expected}"
            );
        }
    }
}

#[test]
fn test_fma_dot_product_agrees_within_tolerance() {
    let caps = Capabilities::get();
    if !caps.has_fma() {
        return;
    }
    for tier in vector_tiers() {
        let config = config_for(tier).fma(true);
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, b) = random_pair(len, 400 + seed as u64, -10.0..=10.0);
            let fa = Array::from_slice_with_config(a.as_slice(), &config).unwrap();
            let fb = Array::from_slice_with_config(b.as_slice(), &config).unwrap();
            assert!(fa.uses_fma());

            let sa = bind(&a, Tier::Scalar);
            let sb = bind(&b, Tier::Scalar);

            let magnitude: f32 = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum::<f32>().max(1.0);
            let expected = sa.dot_product(&sb).unwrap();
            let actual = fa.dot_product(&fb).unwrap();
            assert!(
                (actual - expected).abs() <= 1e-5 * magnitude,
                "fma dot_product on {tier} at length {len}: {actual} vs {expected}"
            );
        }
    }
}

/// The hardware reciprocal holds its bound for normal inputs with
/// `2^-126 <= |x| <= 2^126`; inputs here stay inside that domain.
#[test]
fn test_reciprocate_within_hardware_tolerance() {
    let bound = 1.5 * 2f32.powi(-12);
    for tier in vector_tiers() {
        for (seed, &len) in LENGTHS.iter().enumerate() {
            let (a, b) = random_pair(len, 500 + seed as u64, 0.001..=1000.0);
            // Mix signs so negative inputs are covered too.
            let values: Vec<f32> = a.iter().zip(&b).map(|(x, y)| if y > &500.0 { -x } else { *x }).collect();
            let r = bind(&values, tier).reciprocate();
            for (i, (&approx, &x)) in r.iter().zip(&values).enumerate() {
                let exact = 1.0 / x;
                let relative = ((approx - exact) / exact).abs();
                assert!(
                    relative <= bound,
                    "reciprocate on {tier} at length {len}, element {i}: relative error {relative:e}"
                );
            }
        }
    }
}

#[test]
fn test_avx2_specializations_respect_negative_zero() {
    for tier in vector_tiers() {
        let values = [0.0f32, -0.0, 1.0, -1.0, 0.0, -0.0, 2.5, -2.5, 0.0, -0.0, 7.0];
        let negated = bind(&values, tier).negate();
        for (n, x) in negated.iter().zip(values) {
            assert_eq!(n.to_bits(), (-x).to_bits(), "negate on {tier}");
        }
        let twice = negated.negate();
        assert_bits_eq(&twice, &bind(&values, Tier::Scalar), &format!("negate twice on {tier}"));
    }
}

#[test]
fn test_reciprocate_at_domain_edges() {
    let bound = 1.5 * 2f32.powi(-12);
    let lower = 2f32.powi(-126);
    let upper = 2f32.powi(126);
    // 19 elements: two full blocks plus an exact tail.
    let values: Vec<f32> = [lower, -lower, upper, -upper, 1.0e-37, 5.0e37, -7.5e-20, 3.0e19]
        .into_iter()
        .cycle()
        .take(19)
        .collect();
    for tier in vector_tiers() {
        let r = bind(&values, tier).reciprocate();
        for (i, (&approx, &x)) in r.iter().zip(&values).enumerate() {
            let exact = 1.0 / x;
            assert!(
                ((approx - exact) / exact).abs() <= bound,
                "reciprocate on {tier}, element {i}: rcp({x:e}) = {approx:e}"
            );
        }
    }
}
