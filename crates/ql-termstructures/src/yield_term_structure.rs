//! `YieldTermStructure`: yield / interest-rate term structures
//! (translates `ql/termstructures/yieldtermstructure.hpp`).
//!
//! Curves are indexed by time in years from their reference point and
//! provide three connected quantities:
//!
//! * **discount factor**: `P(0,t)`
//! * **zero rate**: the continuously-compounded zero rate for maturity *t*
//! * **forward rate**: the continuously-compounded forward rate between two
//!   times

use ql_core::{DiscountFactor, Rate, Real, Time};

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Implementors must provide **at least one** of the low-level methods
/// [`discount_impl`](YieldTermStructure::discount_impl) or
/// [`zero_rate_impl`](YieldTermStructure::zero_rate_impl); the other follows
/// from `P(t) = exp(−z(t)·t)`.
///
/// Curves are shared read-only between pricing calls, hence `Send + Sync`.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: std::fmt::Debug + Send + Sync {
    // ── Low-level impl hooks ─────────────────────────────────────────────

    /// Return the discount factor for a given time `t`.
    ///
    /// Default: computed from `zero_rate_impl`.
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        if t == 0.0 {
            return 1.0;
        }
        (-self.zero_rate_impl(t) * t).exp()
    }

    /// Return the continuously-compounded zero rate for time `t`.
    ///
    /// Default: computed from `discount_impl`; at `t = 0` the short-end
    /// limit is taken.
    fn zero_rate_impl(&self, t: Time) -> Rate {
        let t = if t == 0.0 { DT } else { t };
        -self.discount_impl(t).ln() / t
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for time `t`.
    fn zero_rate(&self, t: Time) -> Rate {
        self.zero_rate_impl(t)
    }

    /// Continuously-compounded forward rate between `t1` and `t2`.
    ///
    /// When `t1 == t2` the instantaneous forward at `t1` is approximated
    /// by a central difference of `ln P`.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        let (t1, t2) = if t1 == t2 {
            ((t1 - 0.5 * DT).max(0.0), t1 + 0.5 * DT)
        } else {
            (t1, t2)
        };
        (self.discount(t1).ln() - self.discount(t2).ln()) / (t2 - t1)
    }

    /// Latest time for which the curve can return values.
    fn max_time(&self) -> Time {
        Time::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[derive(Debug)]
    struct Linear;

    // z(t) = 0.01 + 0.01 t, only the zero-rate hook is provided
    impl YieldTermStructure for Linear {
        fn zero_rate_impl(&self, t: Time) -> Rate {
            0.01 + 0.01 * t
        }
    }

    #[test]
    fn discount_follows_from_zero_rate() {
        let curve = Linear;
        assert_abs_diff_eq!(curve.discount(0.0), 1.0);
        assert_abs_diff_eq!(curve.discount(2.0), (-0.03_f64 * 2.0).exp(), epsilon = 1e-15);
    }

    #[test]
    fn forward_rate_between_times() {
        let curve = Linear;
        // −d/dt [(0.01 + 0.01 t) t] = 0.01 + 0.02 t
        assert_abs_diff_eq!(curve.forward_rate(1.0, 1.0), 0.03, epsilon = 1e-9);
        let expected = (0.03 * 2.0 - 0.02 * 1.0) / 1.0;
        assert_abs_diff_eq!(curve.forward_rate(1.0, 2.0), expected, epsilon = 1e-14);
    }
}
