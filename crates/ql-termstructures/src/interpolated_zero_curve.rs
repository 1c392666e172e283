//! `InterpolatedZeroCurve`: a yield term structure built from zero rates
//! (translates `ql/termstructures/yield/interpolatedzerocurve.hpp`).
//!
//! The curve stores (time, zero-rate) pillars and interpolates zero rates
//! linearly in time. Beyond the first and last pillar the zero rate is held
//! flat. Discount factors are computed as `P(t) = exp(-z(t) * t)`.

use crate::yield_term_structure::YieldTermStructure;
use ql_core::{ensure_param, errors::Result, DiscountFactor, Rate, Real, Time};
use ql_math::interpolations::{Interpolation1D, LinearInterpolation};

/// A yield curve defined by zero rates at known times.
///
/// Corresponds to `QuantLib::InterpolatedZeroCurve<Linear>`.
#[derive(Debug, Clone)]
pub struct InterpolatedZeroCurve {
    times: Vec<Time>,
    rates: Vec<Rate>,
    interp: LinearInterpolation,
}

impl InterpolatedZeroCurve {
    /// Build a zero-rate curve from pillar times and continuously-compounded
    /// zero rates.
    ///
    /// # Errors
    /// Fails if fewer than two pillars are given, the lengths differ, a time
    /// is negative, or the times are not strictly increasing.
    pub fn new(times: &[Time], rates: &[Rate]) -> Result<Self> {
        ensure_param!(times.len() >= 2, "need at least 2 pillars, got {}", times.len());
        ensure_param!(
            times.len() == rates.len(),
            "times and rates must have the same length"
        );
        ensure_param!(times[0] >= 0.0, "pillar times must be non-negative");
        ensure_param!(
            times.windows(2).all(|w| w[0] < w[1]),
            "pillar times must be strictly increasing"
        );
        Ok(Self {
            times: times.to_vec(),
            rates: rates.to_vec(),
            interp: LinearInterpolation::new(times, rates)?,
        })
    }

    /// Return the pillar times.
    pub fn times(&self) -> &[Real] {
        &self.times
    }

    /// Return the pillar zero rates.
    pub fn rates(&self) -> &[Rate] {
        &self.rates
    }
}

impl YieldTermStructure for InterpolatedZeroCurve {
    fn zero_rate_impl(&self, t: Time) -> Rate {
        let t = t.clamp(self.interp.x_min(), self.interp.x_max());
        self.interp.operator(t)
    }

    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        (-self.zero_rate_impl(t) * t).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn sample() -> InterpolatedZeroCurve {
        InterpolatedZeroCurve::new(&[0.0, 0.5, 1.0, 2.0, 5.0], &[0.02, 0.025, 0.03, 0.035, 0.04])
            .unwrap()
    }

    #[test]
    fn zero_curve_linear_in_zero_rates() {
        let curve = sample();
        assert_abs_diff_eq!(curve.discount(0.0), 1.0);
        assert_abs_diff_eq!(curve.zero_rate(1.0), 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.zero_rate(1.5), 0.0325, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(1.5), (-0.0325_f64 * 1.5).exp(), epsilon = 1e-15);
    }

    #[test]
    fn zero_curve_is_flat_outside_pillars() {
        let curve = sample();
        assert_abs_diff_eq!(curve.zero_rate(10.0), 0.04, epsilon = 1e-15);
        let short = InterpolatedZeroCurve::new(&[1.0, 2.0], &[0.01, 0.02]).unwrap();
        assert_abs_diff_eq!(short.zero_rate(0.25), 0.01, epsilon = 1e-15);
    }

    #[test]
    fn zero_curve_validates_pillars() {
        assert!(InterpolatedZeroCurve::new(&[0.0], &[0.01]).is_err());
        assert!(InterpolatedZeroCurve::new(&[0.0, 1.0], &[0.01]).is_err());
        assert!(InterpolatedZeroCurve::new(&[1.0, 1.0], &[0.01, 0.02]).is_err());
        assert!(InterpolatedZeroCurve::new(&[-1.0, 1.0], &[0.01, 0.02]).is_err());
    }

    proptest! {
        #[test]
        fn positive_rates_give_decreasing_discounts(t in 0.0..20.0_f64, dt in 0.01..5.0_f64) {
            let curve = sample();
            prop_assert!(curve.discount(t + dt) < curve.discount(t));
        }
    }
}
