//! European vanilla option.
//!
//! Translates `ql/instruments/vanillaoption.hpp` for European exercise.
//! Maturity is a year fraction: converting dates is the caller's job.

use crate::instrument::{PricingEngine, PricingResults};
use crate::payoff::{OptionType, PlainVanillaPayoff};
use ql_core::{ensure_param, errors::Result, Real, Time};

/// A European option on a single underlying asset.
///
/// Construction validates `strike > 0` and `maturity > 0`; a constructed
/// option is an immutable value.
///
/// Corresponds to `QuantLib::VanillaOption` / `QuantLib::EuropeanOption`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VanillaOption {
    payoff: PlainVanillaPayoff,
    maturity: Time,
}

impl VanillaOption {
    /// Create a European call/put expiring in `maturity` years.
    ///
    /// # Errors
    /// [`ql_core::Error::InvalidParameter`] if the strike or the maturity is
    /// not positive and finite.
    pub fn new(option_type: OptionType, strike: Real, maturity: Time) -> Result<Self> {
        ensure_param!(
            strike > 0.0 && strike.is_finite(),
            "strike must be positive, got {strike}"
        );
        ensure_param!(
            maturity > 0.0 && maturity.is_finite(),
            "maturity must be positive, got {maturity}"
        );
        Ok(Self {
            payoff: PlainVanillaPayoff::new(option_type, strike),
            maturity,
        })
    }

    /// The strike price.
    pub fn strike(&self) -> Real {
        self.payoff.strike
    }

    /// The option type (call/put).
    pub fn option_type(&self) -> OptionType {
        self.payoff.option_type
    }

    /// Time to expiry in years.
    pub fn maturity(&self) -> Time {
        self.maturity
    }

    /// The payoff.
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// The same contract with the other option type.
    pub fn with_option_type(mut self, option_type: OptionType) -> Self {
        self.payoff.option_type = option_type;
        self
    }

    /// Price this option using the given engine.
    pub fn price(&self, engine: &dyn PricingEngine<VanillaOption>) -> Result<PricingResults> {
        engine.calculate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::Error;

    #[derive(Debug)]
    struct Intrinsic {
        spot: Real,
    }

    impl PricingEngine<VanillaOption> for Intrinsic {
        fn calculate(&self, args: &VanillaOption) -> Result<PricingResults> {
            Ok(PricingResults::from_npv(args.payoff().value(self.spot)))
        }
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        for (k, t) in [(0.0, 1.0), (-5.0, 1.0), (100.0, 0.0), (100.0, -1.0), (Real::NAN, 1.0)] {
            let err = VanillaOption::new(OptionType::Call, k, t).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{k}, {t}: {err}");
        }
    }

    #[test]
    fn prices_through_an_engine() {
        let option = VanillaOption::new(OptionType::Put, 100.0, 0.5).unwrap();
        let npv = option.price(&Intrinsic { spot: 90.0 }).unwrap().npv;
        assert_eq!(npv, 10.0);
        let call = option.with_option_type(OptionType::Call);
        assert_eq!(call.option_type(), OptionType::Call);
        assert_eq!(call.strike(), 100.0);
        assert_eq!(call.maturity(), 0.5);
    }
}
