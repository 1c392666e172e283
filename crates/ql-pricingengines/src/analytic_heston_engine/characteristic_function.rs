//! Heston characteristic function of the log forward-moneyness.
//!
//! `φ(z, t) = E[exp(i·z·X)]` with `X = ln(S_t / F_t)`, so that `φ(u, 0) = 1`
//! and `φ(−i, t) = 1`. Writing `β = κ − iρσz` and
//! `d = √(β² + σ²(z² + iz))`, `Re d ≥ 0`:
//!
//! ```text
//! ln φ = v0·r₋·(1 − e^{−dt})/(1 − g e^{−dt})
//!      + κθ·[r₋·t − (2/σ²)·ln((1 − g e^{−dt})/(1 − g))]
//! r₋ = (β − d)/σ² = −(z² + iz)/(β + d),   g = (β − d)/(β + d)
//! ```
//!
//! `r₋` and `g` are evaluated in the rationalised forms on the right, which
//! stay finite as `σ → 0`. Below [`SMALL_SIGMA`] the closed form is replaced
//! by its second-order expansion in `σ`.
//!
//! The log argument is `A + B·e^{−dt}` with `A = (β + d)/2d`, `B = 1 − A`.
//! For `|B| ≤ |A|` the principal logarithm is the one continuous in `t`.
//! Otherwise the curve can circle the origin before settling at `A`, and
//! the logarithm is continued in `t` from `ln 1 = 0` explicitly.

use num_complex::Complex64;
use ql_core::{Real, Time};
use ql_math::complex::{exp_m1, ln_1p, principal_sqrt};
use ql_math::BranchTracker;
use ql_models::HestonParameters;
use std::f64::consts::TAU;

/// Vol-of-vol below which the small-sigma expansion is used.
pub const SMALL_SIGMA: Real = 1e-6;

// the expansion divides by κ⁴
const MIN_EXPANSION_KAPPA: Real = 1e-8;

const I: Complex64 = Complex64 { re: 0.0, im: 1.0 };

/// Large-`u` behaviour of `ln φ(u − i/2, t) ≈ u·φ∞ + ψ∞`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsymptoticBehaviour {
    /// Slope `φ∞ = −(v0 + κθt)(√(1−ρ²) + iρ)/σ`.
    pub phi: Complex64,
    /// Offset `ψ∞`.
    pub psi: Complex64,
    /// Exponential decay rate `c∞ = −Re φ∞`.
    pub decay: Real,
}

/// The Heston characteristic function for one parameter set.
///
/// A pure value: every method is a function of its arguments and the
/// parameters captured at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonCharacteristicFunction {
    params: HestonParameters,
}

impl HestonCharacteristicFunction {
    /// Bind the characteristic function to a parameter set.
    pub fn new(params: HestonParameters) -> Self {
        Self { params }
    }

    /// The captured parameters.
    pub fn params(&self) -> &HestonParameters {
        &self.params
    }

    /// `φ(z, t)`.
    pub fn chf(&self, z: Complex64, t: Time) -> Complex64 {
        self.ln_chf(z, t).exp()
    }

    /// `ln φ(z, t)` on the branch continuous in `z`.
    pub fn ln_chf(&self, z: Complex64, t: Time) -> Complex64 {
        if t <= 0.0 {
            return Complex64::new(0.0, 0.0);
        }
        let p = &self.params;
        if p.sigma() < SMALL_SIGMA && p.kappa() >= MIN_EXPANSION_KAPPA {
            self.small_sigma_ln_chf(z, t)
        } else {
            self.closed_form_ln_chf(z, t)
        }
    }

    fn closed_form_ln_chf(&self, z: Complex64, t: Time) -> Complex64 {
        let p = &self.params;
        let s2 = p.sigma() * p.sigma();
        let Roots {
            a,
            d,
            b_plus_d,
            d_minus_b,
            r_minus,
        } = self.roots(z);
        // φ(0) = φ(−i) = 1
        if a.norm() == 0.0 {
            return Complex64::new(0.0, 0.0);
        }

        let e = (-d * t).exp();
        let one_minus_e = -exp_m1(-d * t);
        let d_coef = -a * one_minus_e / (b_plus_d + d_minus_b * e);

        let c_coef = if d_minus_b.norm_sqr() > b_plus_d.norm_sqr() {
            let two_d = 2.0 * d;
            r_minus * t - 2.0 * trapped_log(b_plus_d / two_d, d_minus_b / two_d, d, t) / s2
        } else {
            // (2/σ²)·ln(1 + y) with y = σ²·r₋·(1 − e)/(2d)
            let decay = if d.norm() > 0.0 {
                one_minus_e / d
            } else {
                Complex64::new(t, 0.0)
            };
            let y_scaled = 0.5 * r_minus * decay;
            let log_term = if (s2 * y_scaled).norm() < 1e-200 {
                y_scaled
            } else {
                ln_1p(s2 * y_scaled) / s2
            };
            r_minus * t - 2.0 * log_term
        };
        p.kappa() * p.theta() * c_coef + p.v0() * d_coef
    }

    // β ± d and r₋, with the larger of |β + d| and |d − β| formed directly
    // and the other from (β + d)(d − β) = σ²a.
    fn roots(&self, z: Complex64) -> Roots {
        let p = &self.params;
        let s2 = p.sigma() * p.sigma();
        let a = z * z + I * z;
        let beta = p.kappa() - I * (p.rho() * p.sigma()) * z;
        let d = principal_sqrt(beta * beta + s2 * a);
        let (b_plus_d, r_minus) = if (beta + d).norm_sqr() >= (d - beta).norm_sqr() {
            let b_plus_d = beta + d;
            (b_plus_d, -a / b_plus_d)
        } else {
            let d_minus_b = d - beta;
            (s2 * a / d_minus_b, -d_minus_b / s2)
        };
        Roots {
            a,
            d,
            b_plus_d,
            d_minus_b: -s2 * r_minus,
            r_minus,
        }
    }

    // ln φ ≈ v0(B₀ + σB₁ + σ²B₂) + κθ∫(B₀ + σB₁ + σ²B₂), the Riccati
    // solution expanded around σ = 0.
    fn small_sigma_ln_chf(&self, z: Complex64, t: Time) -> Complex64 {
        let p = &self.params;
        let (kappa, sigma) = (p.kappa(), p.sigma());
        let x = kappa * t;
        let k2 = kappa * kappa;
        let k4 = k2 * k2;

        let a = 0.5 * (z * z + I * z);
        let g1 = -I * p.rho() * z;
        let g1_sq = g1 * g1;

        let b0 = -a / kappa * expm1_neg(x);
        let b1 = g1 * a / k2 * tail2(x);
        let b2 = (-g1_sq * a * tail3(x) + 0.5 * a * a * tail_h(x)) * (t / (k2 * x));

        let int_b0 = -a / k2 * tail_s(x);
        let int_b1 = g1 * a / (k2 * kappa) * tail_q(x);
        let int_b2 = (-g1_sq * a * tail_t4(x) + 0.5 * a * a * tail_t5(x)) / k4;

        let b = b0 + sigma * (b1 + sigma * b2);
        let int_b = int_b0 + sigma * (int_b1 + sigma * int_b2);
        p.v0() * b + kappa * p.theta() * int_b
    }

    /// `ln φ(z, t)` in Heston's original parametrisation, with the
    /// complex logarithm kept continuous by `tracker`.
    ///
    /// The winding factor `e^{dt}` of the logarithm is split off
    /// analytically; the tracker follows the remaining factor. Successive
    /// calls must be made at increasing `Re z` and thread the returned
    /// tracker into the next call. Where `|d − β| > |β + d|` the factor can
    /// wind around the origin as `t` grows; there the value comes from the
    /// closed form and the tracker restarts.
    pub fn ln_chf_branch_corrected(
        &self,
        z: Complex64,
        t: Time,
        tracker: BranchTracker,
    ) -> (Complex64, BranchTracker) {
        let p = &self.params;
        let sigma = p.sigma();
        if t <= 0.0 || sigma < SMALL_SIGMA {
            return (self.ln_chf(z, t), tracker);
        }
        let s2 = sigma * sigma;
        let Roots {
            a,
            d,
            b_plus_d,
            d_minus_b,
            ..
        } = self.roots(z);
        if a.norm() == 0.0 {
            return (Complex64::new(0.0, 0.0), tracker);
        }
        if d_minus_b.norm_sqr() > b_plus_d.norm_sqr() {
            return (self.closed_form_ln_chf(z, t), BranchTracker::new());
        }
        let pole = -b_plus_d / d_minus_b;

        let e = (-d * t).exp();
        let ratio = (e - pole) / (1.0 - pole);
        let (log_ratio, tracker) = tracker.continuous_log(ratio);
        let log_w = d * t + log_ratio;

        let c_coef = (b_plus_d * t - 2.0 * log_w) / s2;
        let d_coef = b_plus_d / s2 * (e - 1.0) / (e - pole);
        (p.kappa() * p.theta() * c_coef + p.v0() * d_coef, tracker)
    }

    /// Asymptotic slope and offset of `ln φ(u − i/2, t)` for `u → ∞`.
    ///
    /// `None` when `σ = 0` or `|ρ| = 1`, where the expansion degenerates.
    pub fn asymptotics(&self, t: Time) -> Option<AsymptoticBehaviour> {
        let p = &self.params;
        let (kappa, theta, sigma, rho) = (p.kappa(), p.theta(), p.sigma(), p.rho());
        if sigma <= 0.0 || rho.abs() >= 1.0 {
            return None;
        }
        let s = (1.0 - rho * rho).sqrt();
        let w = p.v0() + kappa * theta * t;
        let kappa_adj = kappa - 0.5 * rho * sigma;
        let s2 = sigma * sigma;

        let phi = -w / sigma * Complex64::new(s, rho);
        let psi = Complex64::new(
            (kappa_adj * w + kappa * theta * (4.0 * s * s).ln()) / s2,
            (rho * kappa_adj / s * w + 2.0 * kappa * theta * (rho / s).atan()) / s2,
        );
        Some(AsymptoticBehaviour {
            phi,
            psi,
            decay: w * s / sigma,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Roots {
    a: Complex64,
    d: Complex64,
    b_plus_d: Complex64,
    d_minus_b: Complex64,
    r_minus: Complex64,
}

// ln(A + B·e^{−dt}) continued in t from ln 1 = 0, for |B| > |A| and A + B = 1.
// Up to t* = ln(|B|/|A|)/Re d the B term dominates, afterwards the A term.
fn trapped_log(a: Complex64, b: Complex64, d: Complex64, t: Time) -> Complex64 {
    let (ln_a, ln_b) = (a.ln(), b.ln());
    let near = |s: Time| ln_b - d * s + ln_1p((ln_a - ln_b + d * s).exp());
    let far = |s: Time| ln_a + ln_1p((ln_b - ln_a - d * s).exp());
    let turns = |w: Complex64| I * (TAU * (w.im / TAU).round());

    let start = turns(near(0.0));
    let crossing = if a.norm() > 0.0 && d.re > 0.0 {
        (b.norm() / a.norm()).ln() / d.re
    } else {
        Time::INFINITY
    };
    if t <= crossing {
        near(t) - start
    } else {
        let at_crossing = near(crossing) - start;
        far(t) + turns(at_crossing - far(crossing))
    }
}

// ── Exponential remainders ────────────────────────────────────────────────────
//
// Combinations of e^{−x} and low-order polynomials that vanish to high order
// at x = 0. Below SERIES_LIMIT they are summed from their Taylor series,
// Σ c(m)·xᵐ/m!, to avoid cancellation.

const SERIES_LIMIT: Real = 0.5;
const SERIES_TERMS: i32 = 30;

fn remainder(x: Real, first: i32, coef: impl Fn(i32) -> Real, closed: impl Fn(Real) -> Real) -> Real {
    if x >= SERIES_LIMIT {
        return closed(x);
    }
    let mut power = 1.0; // xᵐ/m!
    for m in 1..=first {
        power *= x / Real::from(m);
    }
    let mut sum = 0.0;
    for m in first..first + SERIES_TERMS {
        sum += coef(m) * power;
        power *= x / Real::from(m + 1);
    }
    sum
}

fn alternating(m: i32) -> Real {
    if m % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// 1 − e^{−x}
fn expm1_neg(x: Real) -> Real {
    -(-x).exp_m1()
}

/// 1 − e^{−x}(1 + x)
fn tail2(x: Real) -> Real {
    remainder(
        x,
        2,
        |m| alternating(m) * Real::from(m - 1),
        |x| 1.0 - (-x).exp() * (1.0 + x),
    )
}

/// 1 − e^{−x}(1 + x + x²/2)
fn tail3(x: Real) -> Real {
    remainder(
        x,
        3,
        |m| -alternating(m) * Real::from(1 - m + m * (m - 1) / 2),
        |x| 1.0 - (-x).exp() * (1.0 + x + 0.5 * x * x),
    )
}

/// x − 1 + e^{−x}
fn tail_s(x: Real) -> Real {
    remainder(x, 2, alternating, |x| x + (-x).exp_m1())
}

/// x(1 + e^{−x}) − 2(1 − e^{−x})
fn tail_q(x: Real) -> Real {
    remainder(
        x,
        3,
        |m| alternating(m) * Real::from(2 - m),
        |x| {
            let e = (-x).exp();
            x * (1.0 + e) - 2.0 * (1.0 - e)
        },
    )
}

/// 1 − e^{−2x} − 2x·e^{−x}
fn tail_h(x: Real) -> Real {
    remainder(
        x,
        3,
        |m| alternating(m) * (2.0 * Real::from(m) - (2.0 as Real).powi(m)),
        |x| {
            let e = (-x).exp();
            1.0 - e * e - 2.0 * x * e
        },
    )
}

/// (x − 1 + e^{−x}) − tail2 − tail3
fn tail_t4(x: Real) -> Real {
    remainder(
        x,
        4,
        |m| alternating(m) * Real::from(3 - 2 * m + m * (m - 1) / 2),
        |x| tail_s(x) - tail2(x) - tail3(x),
    )
}

/// (2x − 1 + e^{−2x})/2 − 2·tail2
fn tail_t5(x: Real) -> Real {
    remainder(
        x,
        4,
        |m| alternating(m) * ((2.0 as Real).powi(m - 1) - 2.0 * Real::from(m - 1)),
        |x| 0.5 * tail_s(2.0 * x) - 2.0 * tail2(x),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn params(v0: Real, kappa: Real, theta: Real, sigma: Real, rho: Real) -> HestonParameters {
        HestonParameters::new(v0, kappa, theta, sigma, rho).unwrap()
    }

    #[test]
    fn remainders_match_closed_forms_across_the_switch() {
        for x in [0.499_999, 0.3, 0.05] {
            let e = (-x as Real).exp();
            assert_relative_eq!(tail2(x), 1.0 - e * (1.0 + x), max_relative = 1e-9);
            assert_relative_eq!(tail3(x), 1.0 - e * (1.0 + x + 0.5 * x * x), max_relative = 1e-8);
            assert_relative_eq!(tail_s(x), x - 1.0 + e, max_relative = 1e-9);
            assert_relative_eq!(
                tail_q(x),
                x * (1.0 + e) - 2.0 * (1.0 - e),
                max_relative = 1e-7
            );
            assert_relative_eq!(tail_h(x), 1.0 - e * e - 2.0 * x * e, max_relative = 1e-7);
        }
        // leading terms
        let x = 1e-3;
        assert_relative_eq!(tail3(x), x * x * x / 6.0, max_relative = 1e-3);
        assert_relative_eq!(tail_t4(x), x.powi(4) / 24.0, max_relative = 1e-3);
        assert_relative_eq!(tail_t5(x), x.powi(4) / 12.0, max_relative = 1e-2);
    }

    #[test]
    fn normalisation() {
        let chf = HestonCharacteristicFunction::new(params(0.1, 2.0, 0.15, 0.8, -0.85));
        for t in [0.01, 1.0, 23.2] {
            assert_abs_diff_eq!(chf.chf(Complex64::new(0.0, 0.0), t).re, 1.0, epsilon = 1e-15);
            let martingale = chf.chf(Complex64::new(0.0, -1.0), t);
            assert_abs_diff_eq!(martingale.re, 1.0, epsilon = 1e-14);
            assert_abs_diff_eq!(martingale.im, 0.0, epsilon = 1e-14);
        }
        for u in [0.45, 1.0, 3.0, 4.0] {
            let at_zero = chf.chf(Complex64::new(u, 0.0), 0.0);
            assert_eq!(at_zero, Complex64::new(1.0, 0.0));
            assert!(chf.chf(Complex64::new(u, 0.0), 3.2).norm() <= 1.0);
        }
    }

    #[test]
    fn zero_vol_of_vol_is_gaussian() {
        // σ = 0: X ~ N(−w/2, w) with w the integrated variance
        let p = params(0.04, 1.5, 0.09, 0.0, 0.3);
        let chf = HestonCharacteristicFunction::new(p);
        let t = 2.0;
        let w = p.integrated_variance(t);
        for u in [0.1, 1.0, 5.0] {
            let z = Complex64::new(u, -0.5);
            let expected = -0.5 * w * (z * z + I * z);
            let got = chf.ln_chf(z, t);
            assert_abs_diff_eq!((got - expected).norm(), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn small_sigma_reference_value() {
        let chf = HestonCharacteristicFunction::new(params(0.03, 1.25, 0.01, 1e-9, -0.9));
        let value = chf.chf(Complex64::new(0.55, -0.5), 2.0);
        assert_abs_diff_eq!(value.re, 0.990_463_578_538_352_651, epsilon = 1e-12);
        assert_abs_diff_eq!(value.im, 2.606_934_759_875_211_32e-12, epsilon = 1e-12);
    }

    #[test]
    fn small_sigma_expansion_agrees_with_closed_form() {
        for sigma in [1e-5, 3e-6, 9e-7] {
            let chf = HestonCharacteristicFunction::new(params(0.05, 0.8, 0.07, sigma, -0.6));
            for (u, t) in [(0.3, 0.5), (2.0, 1.0), (7.5, 3.0), (20.0, 0.05)] {
                let z = Complex64::new(u, -0.5);
                let closed = chf.closed_form_ln_chf(z, t);
                let expanded = chf.small_sigma_ln_chf(z, t);
                assert_abs_diff_eq!((closed - expanded).norm(), 0.0, epsilon = 1e-11);
            }
        }
    }

    #[test]
    fn branch_corrected_form_matches_principal_form() {
        let chf = HestonCharacteristicFunction::new(params(0.07, 1.0, 0.04, 0.55, 0.995));
        let t = 30.0;
        let (mut shifted, mut plain) = (BranchTracker::new(), BranchTracker::new());
        for i in 1..=400 {
            let u = 0.05 * i as Real;
            let z1 = Complex64::new(u, -1.0);
            let z2 = Complex64::new(u, 0.0);
            let (c1, next1) = chf.ln_chf_branch_corrected(z1, t, shifted);
            let (c2, next2) = chf.ln_chf_branch_corrected(z2, t, plain);
            shifted = next1;
            plain = next2;
            assert_abs_diff_eq!((c1.exp() - chf.chf(z1, t)).norm(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!((c2.exp() - chf.chf(z2, t)).norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn share_measure_with_explosive_variance() {
        // κ − ρσ < 0: d − β dominates β + d near u = 0 on Im z = −1
        let chf = HestonCharacteristicFunction::new(params(0.1, 0.5, 0.2, 1.5, 0.9995));
        for t in [1.0, 10.0, 50.0, 400.0] {
            let at_pole = chf.chf(Complex64::new(0.0, -1.0), t);
            assert_eq!(at_pole, Complex64::new(1.0, 0.0));
        }
        // Runge-Kutta solutions of the Riccati system
        for (u, t, re, im) in [
            (1e-4, 10.0, 0.902_966_014_678_876_5, 0.111_059_795_190_863_74),
            (0.5, 10.0, 0.399_682_994_461_202, -0.125_121_446_964_659_82),
            (1e-6, 50.0, 0.038_363_190_588_062_125, 0.005_391_429_851_694_151),
            (1.0, 50.0, -0.006_259_936_184_208_257, 0.007_742_448_555_250_718),
        ] {
            let value = chf.chf(Complex64::new(u, -1.0), t);
            assert_abs_diff_eq!(value.re, re, epsilon = 1e-10);
            assert_abs_diff_eq!(value.im, im, epsilon = 1e-10);
        }
    }

    #[test]
    fn log_is_continuous_in_maturity() {
        // 2κ < ρσ puts large frequencies on the far side of the crossing
        // time, where ln(A + B·e^{−dt}) switches representation
        let chf = HestonCharacteristicFunction::new(params(0.1, 0.5, 0.2, 1.5, 0.9995));
        for u in [0.3, 3.0, 30.0] {
            let z = Complex64::new(u, -0.5);
            let mut last = chf.ln_chf(z, 0.002);
            for i in 2..=25_000 {
                let t = 0.002 * i as Real;
                let next = chf.ln_chf(z, t);
                // a wrong branch jumps by 4πκθ/σ² ≈ 0.56
                assert!((next - last).norm() < 0.5, "u = {u}, t = {t}");
                last = next;
            }
        }
    }

    #[test]
    fn branch_corrected_form_with_explosive_share_variance() {
        let chf = HestonCharacteristicFunction::new(params(0.1, 0.5, 0.2, 1.5, 0.9995));
        let t = 50.0;
        let (mut shifted, mut plain) = (BranchTracker::new(), BranchTracker::new());
        for i in 1..=400 {
            let u = 0.05 * i as Real;
            let z1 = Complex64::new(u, -1.0);
            let z2 = Complex64::new(u, 0.0);
            let (c1, next1) = chf.ln_chf_branch_corrected(z1, t, shifted);
            let (c2, next2) = chf.ln_chf_branch_corrected(z2, t, plain);
            shifted = next1;
            plain = next2;
            assert_abs_diff_eq!((c1.exp() - chf.chf(z1, t)).norm(), 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!((c2.exp() - chf.chf(z2, t)).norm(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn asymptotics_describe_large_frequencies() {
        let chf = HestonCharacteristicFunction::new(params(0.0225, 0.1, 0.01, 2.0, 0.5));
        let t = 2.0;
        let asym = chf.asymptotics(t).unwrap();
        assert_relative_eq!(asym.decay, -asym.phi.re, max_relative = 1e-14);
        let u = 60.0;
        let exact = chf.ln_chf(Complex64::new(u, -0.5), t);
        let approx = u * asym.phi + asym.psi;
        assert_abs_diff_eq!((exact - approx).norm(), 0.0, epsilon = 1e-3);

        let degenerate = HestonCharacteristicFunction::new(params(0.04, 1.0, 0.04, 0.3, -1.0));
        assert!(degenerate.asymptotics(1.0).is_none());
    }
}
