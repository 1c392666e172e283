//! Heston stochastic volatility model.
//!
//! Translates `ql/models/equity/hestonmodel.hpp`.
//!
//! ```text
//! dS = (r − q)·S dt + √v·S dW₁
//! dv = κ(θ − v) dt + σ √v dW₂
//! dW₁·dW₂ = ρ dt
//! ```
//!
//! [`HestonParameters`] holds the five variance-process parameters and is
//! validated once, on construction. [`HestonModel`] binds them to a spot
//! value and the risk-free and dividend curves, from which forwards and
//! discount factors are read.

use ql_core::{ensure_param, errors::Result, DiscountFactor, Real, Time};
use ql_termstructures::YieldTermStructure;
use std::sync::Arc;

/// The Heston variance-process parameters.
///
/// Domain: `v0 ≥ 0`, `κ > 0`, `θ > 0`, `σ ≥ 0`, `ρ ∈ [−1, 1]`. Values are
/// immutable; a different parameter set is a different value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HestonParameters {
    v0: Real,
    kappa: Real,
    theta: Real,
    sigma: Real,
    rho: Real,
}

impl HestonParameters {
    /// Validate and create a parameter set.
    ///
    /// # Errors
    /// [`ql_core::Error::InvalidParameter`] when any value lies outside its
    /// domain or is not finite. Nothing is clamped.
    pub fn new(v0: Real, kappa: Real, theta: Real, sigma: Real, rho: Real) -> Result<Self> {
        ensure_param!(v0 >= 0.0 && v0.is_finite(), "v0 must be non-negative, got {v0}");
        ensure_param!(kappa > 0.0 && kappa.is_finite(), "kappa must be positive, got {kappa}");
        ensure_param!(theta > 0.0 && theta.is_finite(), "theta must be positive, got {theta}");
        ensure_param!(
            sigma >= 0.0 && sigma.is_finite(),
            "sigma must be non-negative, got {sigma}"
        );
        ensure_param!((-1.0..=1.0).contains(&rho), "rho must lie in [-1, 1], got {rho}");
        Ok(Self {
            v0,
            kappa,
            theta,
            sigma,
            rho,
        })
    }

    /// Initial variance.
    pub fn v0(&self) -> Real {
        self.v0
    }

    /// Mean-reversion speed.
    pub fn kappa(&self) -> Real {
        self.kappa
    }

    /// Long-run variance.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// Vol-of-vol.
    pub fn sigma(&self) -> Real {
        self.sigma
    }

    /// Spot-vol correlation.
    pub fn rho(&self) -> Real {
        self.rho
    }

    /// The same parameters with another vol-of-vol.
    ///
    /// # Errors
    /// As [`HestonParameters::new`].
    pub fn with_sigma(&self, sigma: Real) -> Result<Self> {
        Self::new(self.v0, self.kappa, self.theta, sigma, self.rho)
    }

    /// Feller condition: `2κθ ≥ σ²`.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa * self.theta >= self.sigma * self.sigma
    }

    /// Expected variance averaged over `[0, t]`,
    /// `θ + (v0 − θ)(1 − e^{−κt})/(κt)`.
    pub fn average_variance(&self, t: Time) -> Real {
        let kt = self.kappa * t;
        let weight = if kt < 1e-8 {
            1.0 - 0.5 * kt
        } else {
            -(-kt).exp_m1() / kt
        };
        self.theta + (self.v0 - self.theta) * weight
    }

    /// Expected integrated variance `E[∫₀ᵗ v(s) ds]`.
    pub fn integrated_variance(&self, t: Time) -> Real {
        self.average_variance(t) * t
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for HestonParameters {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            v0: Real,
            kappa: Real,
            theta: Real,
            sigma: Real,
            rho: Real,
        }
        let raw = Raw::deserialize(deserializer)?;
        HestonParameters::new(raw.v0, raw.kappa, raw.theta, raw.sigma, raw.rho)
            .map_err(serde::de::Error::custom)
    }
}

/// Heston model: parameters bound to a spot value and two yield curves.
///
/// Corresponds to `QuantLib::HestonModel` together with the market part of
/// `QuantLib::HestonProcess`.
#[derive(Debug, Clone)]
pub struct HestonModel {
    params: HestonParameters,
    spot: Real,
    risk_free: Arc<dyn YieldTermStructure>,
    dividend: Arc<dyn YieldTermStructure>,
}

impl HestonModel {
    /// Create a new Heston model.
    ///
    /// # Errors
    /// [`ql_core::Error::InvalidParameter`] unless `spot` is positive and
    /// finite.
    pub fn new(
        params: HestonParameters,
        spot: Real,
        risk_free: Arc<dyn YieldTermStructure>,
        dividend: Arc<dyn YieldTermStructure>,
    ) -> Result<Self> {
        ensure_param!(spot > 0.0 && spot.is_finite(), "spot must be positive, got {spot}");
        Ok(Self {
            params,
            spot,
            risk_free,
            dividend,
        })
    }

    /// The same market with another parameter set.
    pub fn with_params(&self, params: HestonParameters) -> Self {
        Self {
            params,
            spot: self.spot,
            risk_free: Arc::clone(&self.risk_free),
            dividend: Arc::clone(&self.dividend),
        }
    }

    /// Variance-process parameters.
    pub fn params(&self) -> &HestonParameters {
        &self.params
    }

    /// Initial spot.
    pub fn spot(&self) -> Real {
        self.spot
    }

    /// Risk-free curve.
    pub fn risk_free(&self) -> &dyn YieldTermStructure {
        &*self.risk_free
    }

    /// Dividend (or foreign) curve.
    pub fn dividend(&self) -> &dyn YieldTermStructure {
        &*self.dividend
    }

    /// Risk-free discount factor to `t`.
    pub fn discount(&self, t: Time) -> DiscountFactor {
        self.risk_free.discount(t)
    }

    /// Forward price `S0 · df_q(t) / df(t)`.
    pub fn forward(&self, t: Time) -> Real {
        self.spot * self.dividend.discount(t) / self.risk_free.discount(t)
    }

    /// Feller condition: `2κθ ≥ σ²`.
    pub fn feller_satisfied(&self) -> bool {
        self.params.feller_satisfied()
    }
}
