//! Black formula on forwards.
//!
//! Translates `ql/pricingengines/blackformula.hpp`.
//!
//! The price of a European option on a lognormal forward `F` with total
//! standard deviation `σ√T`:
//!
//! $$C = D\,[F N(d_1) - K N(d_2)], \quad P = D\,[K N(-d_2) - F N(-d_1)]$$
//!
//! with $d_{1,2} = \ln(F/K)/s \pm s/2$. The Heston engine uses it to value
//! its Black-Scholes control variates.

use ql_core::{ensure_param, errors::Result, DiscountFactor, Real};
use ql_instruments::OptionType;
use ql_math::distributions::normal_cdf;
use ql_math::solvers1d::bracket_and_solve;

/// Black price of a European option.
///
/// # Errors
/// [`ql_core::Error::InvalidParameter`] for a negative strike or standard
/// deviation, a non-positive forward or a non-positive discount factor.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: DiscountFactor,
) -> Result<Real> {
    ensure_param!(strike >= 0.0, "strike ({strike}) must be non-negative");
    ensure_param!(forward > 0.0, "forward ({forward}) must be positive");
    ensure_param!(std_dev >= 0.0, "stdDev ({std_dev}) must be non-negative");
    ensure_param!(discount > 0.0, "discount ({discount}) must be positive");

    let phi = option_type.sign();
    if std_dev == 0.0 {
        return Ok(discount * (phi * (forward - strike)).max(0.0));
    }
    if strike == 0.0 {
        return Ok(match option_type {
            OptionType::Call => discount * forward,
            OptionType::Put => 0.0,
        });
    }

    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let price = discount * phi * (forward * normal_cdf(phi * d1) - strike * normal_cdf(phi * d2));
    Ok(price.max(0.0))
}

/// Total standard deviation implied by a Black price.
///
/// Solved with Brent's method after bracketing upwards from zero.
///
/// # Errors
/// [`ql_core::Error::InvalidParameter`] if `price` lies below the
/// discounted intrinsic value or above the no-arbitrage bound.
pub fn black_formula_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    price: Real,
    discount: DiscountFactor,
    accuracy: Real,
) -> Result<Real> {
    ensure_param!(strike > 0.0, "strike ({strike}) must be positive");
    ensure_param!(forward > 0.0, "forward ({forward}) must be positive");
    ensure_param!(discount > 0.0, "discount ({discount}) must be positive");
    let intrinsic = discount * (option_type.sign() * (forward - strike)).max(0.0);
    ensure_param!(
        price >= intrinsic,
        "option price ({price}) must not be below its intrinsic value ({intrinsic})"
    );
    let upper = match option_type {
        OptionType::Call => discount * forward,
        OptionType::Put => discount * strike,
    };
    ensure_param!(
        price < upper,
        "option price ({price}) must be below its upper bound ({upper})"
    );
    if price == intrinsic {
        return Ok(0.0);
    }

    // black_formula only fails on its argument checks, all satisfied here
    let objective = |s: Real| {
        black_formula(option_type, strike, forward, s, discount).unwrap_or(Real::NAN) - price
    };
    bracket_and_solve(objective, 0.0, 0.5, accuracy)
}
