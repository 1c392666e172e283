//! Choice of the integrand formula from the model regime.

use ql_core::{Real, Time};
use ql_models::HestonParameters;

use super::characteristic_function::{HestonCharacteristicFunction, SMALL_SIGMA};
use super::integrand::ComplexLogFormula;

/// Thresholds of the formula selector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SelectorConfig {
    /// Vol-of-vol below which the variance is treated as deterministic.
    pub small_sigma: Real,
    /// `v0·t` below which the initial variance is negligible.
    pub min_variance: Real,
    /// Width of the band below `|ρ| = 1` handled with branch correction.
    pub rho_band: Real,
    /// Shortest maturity priced with the asymptotic control variate.
    pub asymptotic_min_maturity: Time,
    /// Largest decay rate `c∞` for the asymptotic control variate.
    pub asymptotic_max_decay: Real,
    /// Largest `Re ψ∞` for the asymptotic control variate.
    pub asymptotic_max_psi: Real,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            small_sigma: SMALL_SIGMA,
            min_variance: 1e-6,
            rho_band: 1e-3,
            asymptotic_min_maturity: 0.15,
            asymptotic_max_decay: 0.05,
            asymptotic_max_psi: 0.1,
        }
    }
}

impl SelectorConfig {
    /// Formula for pricing at maturity `t`.
    ///
    /// * tiny vol-of-vol or tiny `v0·t`: the optimal control variate,
    /// * `|ρ|` within `rho_band` of one: [`ComplexLogFormula::BranchCorrection`],
    /// * otherwise [`ComplexLogFormula::AndersenPiterbarg`].
    pub fn select_formula(&self, params: &HestonParameters, t: Time) -> ComplexLogFormula {
        if params.sigma() < self.small_sigma || params.v0() * t < self.min_variance {
            self.optimal_control_variate(params, t)
        } else if 1.0 - params.rho().abs() < self.rho_band {
            ComplexLogFormula::BranchCorrection
        } else {
            ComplexLogFormula::AndersenPiterbarg
        }
    }

    /// Resolve [`ComplexLogFormula::OptimalCV`].
    ///
    /// The asymptotic control variate is used when the integrand decays
    /// slowly, the maturity is long enough for the asymptote to be
    /// reached, its offset stays bounded and the Feller condition is
    /// violated. Everything else gets the Black control variate matched
    /// at `u = 0`.
    pub fn optimal_control_variate(&self, params: &HestonParameters, t: Time) -> ComplexLogFormula {
        let asymptotics = HestonCharacteristicFunction::new(*params).asymptotics(t);
        match asymptotics {
            Some(asym)
                if t > self.asymptotic_min_maturity
                    && asym.decay < self.asymptotic_max_decay
                    && asym.psi.re < self.asymptotic_max_psi
                    && !params.feller_satisfied() =>
            {
                ComplexLogFormula::AsymptoticChF
            }
            _ => ComplexLogFormula::AndersenPiterbargOptCV,
        }
    }
}

/// [`SelectorConfig::select_formula`] with the default thresholds.
pub fn select_formula(params: &HestonParameters, t: Time) -> ComplexLogFormula {
    SelectorConfig::default().select_formula(params, t)
}

/// [`SelectorConfig::optimal_control_variate`] with the default thresholds.
pub fn optimal_control_variate(params: &HestonParameters, t: Time) -> ComplexLogFormula {
    SelectorConfig::default().optimal_control_variate(params, t)
}
