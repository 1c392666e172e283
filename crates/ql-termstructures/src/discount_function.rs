//! `DiscountFunction`: a yield term structure backed by a closure.

use crate::yield_term_structure::YieldTermStructure;
use ql_core::{ensure_param, errors::Result, DiscountFactor, Time};
use std::fmt;

/// A yield curve defined directly by its discount function `t ↦ P(0, t)`.
///
/// Useful when discount factors come from an external curve object: the
/// closure is the whole contract the pricing engines need.
pub struct DiscountFunction<F> {
    df: F,
}

impl<F> DiscountFunction<F>
where
    F: Fn(Time) -> DiscountFactor + Send + Sync,
{
    /// Wrap a discount function.
    ///
    /// # Errors
    /// Fails unless `df(0) = 1`.
    pub fn new(df: F) -> Result<Self> {
        let at_zero = df(0.0);
        ensure_param!(
            (at_zero - 1.0).abs() <= 1e-12,
            "discount function must equal 1 at t = 0, got {at_zero}"
        );
        Ok(Self { df })
    }
}

impl<F> fmt::Debug for DiscountFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscountFunction").finish_non_exhaustive()
    }
}

impl<F> YieldTermStructure for DiscountFunction<F>
where
    F: Fn(Time) -> DiscountFactor + Send + Sync,
{
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (self.df)(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wraps_a_closure() {
        let curve = DiscountFunction::new(|t: Time| 1.0 / (1.0 + 0.05 * t)).unwrap();
        assert_abs_diff_eq!(curve.discount(2.0), 1.0 / 1.1, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.zero_rate(2.0), 1.1_f64.ln() / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn rejects_unnormalised_functions() {
        assert!(DiscountFunction::new(|_t: Time| 0.99).is_err());
    }
}
