//! Fourier integrands for the call price.
//!
//! Two transforms are used. The Gatheral form splits the call into the two
//! exercise probabilities,
//!
//! ```text
//! C/D = (F − K)/2 + (1/π)∫₀^∞ [F·Im(e^{iuk}φ(u − i)) − K·Im(e^{iuk}φ(u))]/u du
//! ```
//!
//! with `k = ln(F/K)`. The control-variate forms start from Lewis' single
//! integral along `Im z = −½` and subtract a reference model `φ_cv` whose
//! call price `C_cv` is known in closed form:
//!
//! ```text
//! C/D = C_cv + (√(FK)/π)∫₀^∞ Re[e^{iuk}(φ_cv − φ)(u − i/2)]/(u² + ¼) du
//! ```

use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;
use ql_core::{fail, errors::Result, Real, Size, Time};
use ql_instruments::OptionType;
use ql_math::exponential_integral::e1_along_ray;
use ql_math::BranchTracker;

use super::characteristic_function::{AsymptoticBehaviour, HestonCharacteristicFunction};
use crate::black_formula::black_formula;

/// How the characteristic function is turned into a price integrand.
///
/// Corresponds to `QuantLib::AnalyticHestonEngine::ComplexLogFormula`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComplexLogFormula {
    /// Probability form with the rotation-free logarithm of Gatheral.
    Gatheral,
    /// Probability form in Heston's original parametrisation, with the
    /// complex logarithm unwrapped along the integration nodes.
    BranchCorrection,
    /// Lewis form with a Black-Scholes control variate whose variance is
    /// the expected average variance.
    AndersenPiterbarg,
    /// Lewis form with a Black-Scholes control variate matching
    /// `φ(−i/2, t)`, i.e. variance `−8·ln φ(−i/2, t)`.
    AndersenPiterbargOptCV,
    /// Lewis form with the large-frequency asymptote of `φ` as control
    /// variate.
    AsymptoticChF,
    /// Let the selector choose between `AsymptoticChF` and
    /// `AndersenPiterbargOptCV`.
    OptimalCV,
}

impl ComplexLogFormula {
    /// `true` for the Lewis-form variants.
    pub fn uses_control_variate(self) -> bool {
        !matches!(self, Self::Gatheral | Self::BranchCorrection)
    }
}

impl fmt::Display for ComplexLogFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gatheral => "Gatheral",
            Self::BranchCorrection => "BranchCorrection",
            Self::AndersenPiterbarg => "AndersenPiterbarg",
            Self::AndersenPiterbargOptCV => "AndersenPiterbargOptCV",
            Self::AsymptoticChF => "AsymptoticChF",
            Self::OptimalCV => "OptimalCV",
        };
        f.write_str(name)
    }
}

/// Branch trackers for `φ(u − i)` and `φ(u)`, threaded through the nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct BranchState {
    shifted: BranchTracker,
    plain: BranchTracker,
}

#[derive(Debug, Clone, Copy)]
enum ControlVariate {
    Black { total_variance: Real },
    Asymptotic(AsymptoticBehaviour),
    // no reference model, C_cv = F
    Forward,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Probability { branch_corrected: bool },
    Lewis(ControlVariate),
}

/// The integrand of one pricing problem.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HestonIntegrand<'a> {
    chf: &'a HestonCharacteristicFunction,
    shape: Shape,
    t: Time,
    fwd: Real,
    strike: Real,
    freq: Real,
}

impl<'a> HestonIntegrand<'a> {
    /// Build the integrand for a resolved formula (anything but
    /// `OptimalCV`).
    pub fn new(
        chf: &'a HestonCharacteristicFunction,
        formula: ComplexLogFormula,
        t: Time,
        fwd: Real,
        strike: Real,
    ) -> Result<Self> {
        let params = chf.params();
        let shape = match formula {
            // With κ < ρσ the variance under the share measure grows like
            // e^{(ρσ − κ)t} and φ(u − i) leaves 1 on a frequency scale no
            // rule resolves. Both probabilities are then taken on the
            // contour Im z = −½, which adds up to the bare Lewis integral.
            ComplexLogFormula::Gatheral | ComplexLogFormula::BranchCorrection
                if params.kappa() < params.rho() * params.sigma() =>
            {
                Shape::Lewis(ControlVariate::Forward)
            }
            ComplexLogFormula::Gatheral => Shape::Probability {
                branch_corrected: false,
            },
            ComplexLogFormula::BranchCorrection => Shape::Probability {
                branch_corrected: true,
            },
            ComplexLogFormula::AndersenPiterbarg => Shape::Lewis(ControlVariate::Black {
                total_variance: params.integrated_variance(t),
            }),
            ComplexLogFormula::AndersenPiterbargOptCV => {
                let at_half = chf.chf(Complex64::new(0.0, -0.5), t).re;
                let matched = -8.0 * at_half.ln();
                let total_variance = if matched.is_finite() && matched > 0.0 {
                    matched
                } else {
                    params.integrated_variance(t)
                };
                Shape::Lewis(ControlVariate::Black { total_variance })
            }
            ComplexLogFormula::AsymptoticChF => match chf.asymptotics(t) {
                Some(asym) => Shape::Lewis(ControlVariate::Asymptotic(asym)),
                None => fail!(
                    "asymptotic control variate needs sigma > 0 and |rho| < 1, got sigma = {}, rho = {}",
                    params.sigma(),
                    params.rho()
                ),
            },
            ComplexLogFormula::OptimalCV => {
                fail!("OptimalCV must be resolved to a concrete formula before pricing")
            }
        };
        Ok(Self {
            chf,
            shape,
            t,
            fwd,
            strike,
            freq: (fwd / strike).ln(),
        })
    }

    /// `true` for the Lewis-form integrands.
    pub fn is_lewis(&self) -> bool {
        matches!(self.shape, Shape::Lewis(_))
    }

    /// Characteristic-function evaluations per integrand evaluation.
    pub fn chf_per_node(&self) -> Size {
        match self.shape {
            Shape::Probability { .. } => 2,
            Shape::Lewis(_) => 1,
        }
    }

    /// Total variance of the Black control variate, if any.
    #[cfg(test)]
    pub fn control_variance(&self) -> Option<Real> {
        match self.shape {
            Shape::Lewis(ControlVariate::Black { total_variance }) => Some(total_variance),
            _ => None,
        }
    }

    /// Integrand value at `u ≥ 0`.
    pub fn value(&self, u: Real, state: BranchState) -> (Real, BranchState) {
        match self.shape {
            Shape::Probability { branch_corrected } => self.probability(u, state, branch_corrected),
            Shape::Lewis(cv) => (self.lewis(u, cv), state),
        }
    }

    fn probability(&self, u: Real, state: BranchState, branch_corrected: bool) -> (Real, BranchState) {
        if u < 1e-10 {
            return (self.probability_at_zero(), state);
        }
        let shifted = Complex64::new(u, -1.0);
        let plain = Complex64::new(u, 0.0);
        let (ln_shifted, ln_plain, state) = if branch_corrected {
            let (a, s) = self.chf.ln_chf_branch_corrected(shifted, self.t, state.shifted);
            let (b, p) = self.chf.ln_chf_branch_corrected(plain, self.t, state.plain);
            (
                a,
                b,
                BranchState {
                    shifted: s,
                    plain: p,
                },
            )
        } else {
            (
                self.chf.ln_chf(shifted, self.t),
                self.chf.ln_chf(plain, self.t),
                state,
            )
        };
        let phase = Complex64::new(0.0, u * self.freq);
        let p1 = (ln_shifted + phase).exp().im;
        let p2 = (ln_plain + phase).exp().im;
        ((self.fwd * p1 - self.strike * p2) / u, state)
    }

    // limit u → 0: F(k + m₁/2) − K(k − m₂/2) with m₂ the expected integrated
    // variance and m₁ the same under the share measure (κ₁ = κ − ρσ,
    // κ₁θ₁ = κθ)
    fn probability_at_zero(&self) -> Real {
        let p = self.chf.params();
        let t = self.t;
        let m2 = p.integrated_variance(t);
        let kappa1 = p.kappa() - p.rho() * p.sigma();
        let m1 = if kappa1.abs() < 1e-7 {
            p.v0() * t + 0.5 * p.kappa() * p.theta() * t * t
        } else {
            let w = -(-kappa1 * t).exp_m1() / kappa1;
            p.v0() * w + p.kappa() * p.theta() / kappa1 * (t - w)
        };
        self.fwd * (self.freq + 0.5 * m1) - self.strike * (self.freq - 0.5 * m2)
    }

    fn lewis(&self, u: Real, cv: ControlVariate) -> Real {
        let z = Complex64::new(u, -0.5);
        let phi = self.chf.chf(z, self.t);
        let reference = match cv {
            ControlVariate::Black { total_variance } => {
                Complex64::new((-0.5 * total_variance * (u * u + 0.25)).exp(), 0.0)
            }
            ControlVariate::Asymptotic(asym) => (u * asym.phi + asym.psi).exp(),
            ControlVariate::Forward => Complex64::new(0.0, 0.0),
        };
        let phase = Complex64::from_polar(1.0, u * self.freq);
        (phase * (reference - phi)).re / (u * u + 0.25)
    }

    /// Undiscounted call price from the value of `∫₀^∞ g(u) du`.
    pub fn call_from_integral(&self, integral: Real) -> Result<Real> {
        match self.shape {
            Shape::Probability { .. } => Ok(0.5 * (self.fwd - self.strike) + integral / PI),
            Shape::Lewis(cv) => {
                let scale = (self.fwd * self.strike).sqrt() / PI;
                Ok(self.control_variate_call(cv)? + scale * integral)
            }
        }
    }

    fn control_variate_call(&self, cv: ControlVariate) -> Result<Real> {
        match cv {
            ControlVariate::Black { total_variance } => black_formula(
                OptionType::Call,
                self.strike,
                self.fwd,
                total_variance.sqrt(),
                1.0,
            ),
            ControlVariate::Asymptotic(asym) => {
                let a = asym.phi + Complex64::new(0.0, self.freq);
                let kernel = lewis_kernel(a);
                Ok(self.fwd - (self.fwd * self.strike).sqrt() / PI * (asym.psi.exp() * kernel).re)
            }
            ControlVariate::Forward => Ok(self.fwd),
        }
    }
}

/// `∫₀^∞ e^{a·u}/(u² + ¼) du` for `Re a < 0`.
///
/// Partial fractions reduce it to `∫₀^∞ e^{au}/(u ∓ i/2) du`, each of
/// which is `e^{ab}·E₁(ab)` with `E₁` continued along the ray
/// `t = −a(u − b)`.
pub(crate) fn lewis_kernel(a: Complex64) -> Complex64 {
    let b = Complex64::new(0.0, 0.5);
    let pole = |b: Complex64| {
        let t0 = a * b;
        t0.exp() * e1_along_ray(t0, -a)
    };
    (pole(b) - pole(-b)) / Complex64::new(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_math::integrals::GaussKronrodAdaptive;
    use ql_math::Integrator;
    use ql_models::HestonParameters;

    fn chf(v0: Real, kappa: Real, theta: Real, sigma: Real, rho: Real) -> HestonCharacteristicFunction {
        HestonCharacteristicFunction::new(HestonParameters::new(v0, kappa, theta, sigma, rho).unwrap())
    }

    #[test]
    fn lewis_kernel_matches_quadrature() {
        let kronrod = GaussKronrodAdaptive::new(1e-13, 2_000_000);
        for a in [
            Complex64::new(-0.3, 0.7),
            Complex64::new(-0.05, -1.2),
            Complex64::new(-2.0, 0.0),
            Complex64::new(-0.0106, 2.1),
        ] {
            let upper = 40.0 / -a.re;
            let re = kronrod
                .integrate(|u| (a * u).exp().re / (u * u + 0.25), 0.0, upper)
                .unwrap()
                .value;
            let im = kronrod
                .integrate(|u| (a * u).exp().im / (u * u + 0.25), 0.0, upper)
                .unwrap()
                .value;
            let k = lewis_kernel(a);
            assert_abs_diff_eq!(k.re, re, epsilon = 1e-9);
            assert_abs_diff_eq!(k.im, im, epsilon = 1e-9);
        }
    }

    #[test]
    fn probability_integrand_is_continuous_at_zero() {
        let chf = chf(0.04, 4.0, 0.25, 1.0, -0.5);
        let integrand =
            HestonIntegrand::new(&chf, ComplexLogFormula::Gatheral, 1.0, 99.0, 110.0).unwrap();
        let (at_zero, _) = integrand.value(0.0, BranchState::default());
        let (near_zero, _) = integrand.value(1e-5, BranchState::default());
        assert_abs_diff_eq!(at_zero, near_zero, epsilon = 1e-6);
    }

    #[test]
    fn branch_correction_reproduces_gatheral_integrand() {
        let chf = chf(0.07, 1.0, 0.04, 0.55, 0.995);
        let gatheral =
            HestonIntegrand::new(&chf, ComplexLogFormula::Gatheral, 10.0, 1.2, 0.7).unwrap();
        let corrected =
            HestonIntegrand::new(&chf, ComplexLogFormula::BranchCorrection, 10.0, 1.2, 0.7)
                .unwrap();
        let mut state = BranchState::default();
        for i in 1..=300 {
            let u = 0.1 * i as Real;
            let (g, _) = gatheral.value(u, BranchState::default());
            let (c, next) = corrected.value(u, state);
            state = next;
            assert_abs_diff_eq!(g, c, epsilon = 1e-10);
        }
    }

    #[test]
    fn probability_forms_move_to_the_half_contour_when_share_variance_explodes() {
        // κ − ρσ = −0.99925; r = 1%, q = 2%, S = 100
        let chf = chf(0.1, 0.5, 0.2, 1.5, 0.9995);
        let t: f64 = 10.0;
        let fwd = 100.0 * (-0.01 * t).exp();
        let kronrod = GaussKronrodAdaptive::new(1e-10, 200_000);
        for formula in [ComplexLogFormula::Gatheral, ComplexLogFormula::BranchCorrection] {
            let integrand = HestonIntegrand::new(&chf, formula, t, fwd, 80.0).unwrap();
            assert!(integrand.is_lewis());
            assert_eq!(integrand.chf_per_node(), 1);
            let integral = kronrod
                .integrate(|u| integrand.value(u, BranchState::default()).0, 0.0, 2000.0)
                .unwrap()
                .value;
            // undiscounted Lewis price
            let call = integrand.call_from_integral(integral).unwrap();
            assert_abs_diff_eq!(call, 51.478_061_39, epsilon = 1e-5);
        }

        let tame = self::chf(0.07, 1.0, 0.04, 0.55, 0.995);
        let integrand = HestonIntegrand::new(&tame, ComplexLogFormula::Gatheral, t, fwd, 80.0).unwrap();
        assert!(!integrand.is_lewis());
    }

    #[test]
    fn control_variate_integrands_stay_small() {
        // r = 7.5%, q = 5%, T = 2, S = 100, K = 150
        let chf = chf(0.08, 4.0, 0.05, 0.5, -0.8);
        let t: f64 = 2.0;
        let fwd = 100.0 * (0.025 * t).exp();
        for formula in [
            ComplexLogFormula::AndersenPiterbarg,
            ComplexLogFormula::AndersenPiterbargOptCV,
        ] {
            let integrand = HestonIntegrand::new(&chf, formula, t, fwd, 150.0).unwrap();
            let mut u: Real = 0.001;
            while u < 15.0 {
                let (v, _) = integrand.value(u, BranchState::default());
                assert!(v.abs() <= 0.03, "{formula} at u = {u}: {v}");
                u *= 1.05;
            }
        }
    }

    #[test]
    fn optimal_variance_matches_the_half_shift() {
        let chf = chf(0.08, 4.0, 0.05, 0.5, -0.8);
        let integrand =
            HestonIntegrand::new(&chf, ComplexLogFormula::AndersenPiterbargOptCV, 2.0, 105.0, 150.0)
                .unwrap();
        // the reference and the model agree at u = 0
        let (v, _) = integrand.value(0.0, BranchState::default());
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-14);
        assert!(integrand.control_variance().unwrap() > 0.0);
    }

    #[test]
    fn optimal_cv_must_be_resolved() {
        let chf = chf(0.04, 1.0, 0.04, 0.3, -0.5);
        assert!(HestonIntegrand::new(&chf, ComplexLogFormula::OptimalCV, 1.0, 100.0, 100.0).is_err());
        let perfect = self::chf(0.04, 1.0, 0.04, 0.3, -1.0);
        assert!(
            HestonIntegrand::new(&perfect, ComplexLogFormula::AsymptoticChF, 1.0, 100.0, 100.0)
                .is_err()
        );
    }
}
