//! `FlatForward`: a yield term structure with a constant forward rate
//! (translates `ql/termstructures/yield/flatforward.hpp`).

use crate::yield_term_structure::YieldTermStructure;
use ql_core::{ensure_param, errors::Result, DiscountFactor, Rate, Real, Time};

/// A flat (constant) forward-rate yield term structure.
///
/// Discount factors are computed as `P(t) = exp(-r * t)` where `r` is the
/// continuously-compounded equivalent of the supplied rate.
///
/// Corresponds to `QuantLib::FlatForward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatForward {
    /// The continuously-compounded flat rate.
    rate: Rate,
}

impl FlatForward {
    /// Create a flat-forward curve assuming continuous compounding.
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// Create a flat-forward curve from a rate compounded `frequency` times
    /// a year.
    ///
    /// The rate is converted to its continuous equivalent
    /// `m · ln(1 + r/m)`.
    ///
    /// # Errors
    /// Fails if `frequency` is zero or `1 + r/m` is not positive.
    pub fn compounded(rate: Rate, frequency: u32) -> Result<Self> {
        ensure_param!(frequency > 0, "compounding frequency must be positive");
        let m = frequency as Real;
        let growth = 1.0 + rate / m;
        ensure_param!(growth > 0.0, "rate {rate} compounded {frequency} times a year is below -100%");
        Ok(Self {
            rate: m * growth.ln(),
        })
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate_impl(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate(&self, _t1: Time, _t2: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn flat_forward_discount() {
        let curve = FlatForward::new(0.05);

        // At reference date, discount = 1
        assert_abs_diff_eq!(curve.discount(0.0), 1.0, epsilon = 1e-15);
        // At 1 year, discount = exp(-0.05)
        assert_abs_diff_eq!(curve.discount(1.0), (-0.05_f64).exp(), epsilon = 1e-12);
        // At 10 years
        assert_abs_diff_eq!(curve.discount(10.0), (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn flat_forward_rates_are_constant() {
        let curve = FlatForward::new(0.04);
        assert_abs_diff_eq!(curve.zero_rate(0.5), 0.04, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(0.0, 0.0), 0.04, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(3.0, 7.0), 0.04, epsilon = 1e-15);
    }

    #[test]
    fn flat_forward_with_annual_compounding() {
        // Annual 5% → continuous = ln(1.05) ≈ 0.04879
        let curve = FlatForward::compounded(0.05, 1).unwrap();
        assert_abs_diff_eq!(curve.rate(), (1.05_f64).ln(), epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(2.0), 1.0 / (1.05 * 1.05), epsilon = 1e-15);
        assert!(FlatForward::compounded(0.05, 0).is_err());
        assert!(FlatForward::compounded(-3.0, 2).is_err());
    }
}
