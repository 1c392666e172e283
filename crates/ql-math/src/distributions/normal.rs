//! Normal (Gaussian) distribution (translates `ql/math/distributions/normaldistribution.hpp`).

use ql_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::FRAC_1_SQRT_2;

/// The standard normal cumulative distribution function Φ(x).
///
/// Evaluated as `½ erfc(−x/√2)`, accurate to machine precision in both
/// tails, which Black prices deep out of the money rely on.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}
