//! Gaussian quadrature rules (translates `ql/math/integrals/gaussianquadratures.hpp`).
//!
//! Every rule carries two weight vectors: the classical weights `w`, for
//! `∫ f(x) W(x) dx ≈ Σ wᵢ f(xᵢ)` with the family's weight function `W`, and
//! the *plain* weights `wᵢ / W(xᵢ)` for `∫ f(x) dx ≈ Σ pᵢ f(xᵢ)`. The plain
//! Laguerre weights `wᵢ e^{xᵢ}` are computed in log space, so they stay
//! finite for high orders where `wᵢ` itself underflows.
//!
//! Nodes are returned in ascending order.

use ql_core::{
    errors::{Error, Result},
    Real, Size,
};
use std::f64::consts::PI;

/// A Gauss quadrature rule defined by nodes and weights.
///
/// Corresponds to `QuantLib::GaussianQuadrature`.
#[derive(Debug, Clone)]
pub struct GaussianQuadrature {
    x: Vec<Real>,
    w: Vec<Real>,
    plain: Vec<Real>,
}

impl GaussianQuadrature {
    /// Quadrature nodes.
    pub fn x(&self) -> &[Real] {
        &self.x
    }

    /// Weights relative to the family's weight function.
    pub fn w(&self) -> &[Real] {
        &self.w
    }

    /// Weights for integrating `f` itself, `wᵢ / W(xᵢ)`.
    pub fn plain_weights(&self) -> &[Real] {
        &self.plain
    }

    /// Number of quadrature points.
    pub fn order(&self) -> Size {
        self.x.len()
    }

    /// Evaluate ∫ f(x) W(x) dx ≈ Σ wᵢ f(xᵢ).
    pub fn integrate<F: Fn(Real) -> Real>(&self, f: F) -> Real {
        self.x.iter().zip(&self.w).map(|(&xi, &wi)| wi * f(xi)).sum()
    }

    /// Evaluate ∫ f(x) dx ≈ Σ pᵢ f(xᵢ) over the family's domain.
    pub fn integrate_plain<F: Fn(Real) -> Real>(&self, f: F) -> Real {
        self.x
            .iter()
            .zip(&self.plain)
            .map(|(&xi, &pi)| pi * f(xi))
            .sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Gauss-Legendre quadrature on [-1, 1]
// ═══════════════════════════════════════════════════════════════════════════════

/// Gauss-Legendre quadrature on [−1, 1].
///
/// Corresponds to `QuantLib::GaussLegendreIntegration`.
pub struct GaussLegendreIntegration;

impl GaussLegendreIntegration {
    /// Build a Gauss-Legendre quadrature of given `order`.
    ///
    /// Nodes are the roots of `Pₙ`, found by Newton iteration from the
    /// asymptotic guess `cos(π(i + ¾)/(n + ½))`.
    pub fn new(order: Size) -> GaussianQuadrature {
        let n = order;
        let mut x = vec![0.0; n];
        let mut w = vec![0.0; n];
        for i in 0..n.div_ceil(2) {
            let mut z = (PI * (i as Real + 0.75) / (n as Real + 0.5)).cos();
            for _ in 0..100 {
                let (p, dp) = legendre_and_derivative(n, z);
                let dz = p / dp;
                z -= dz;
                if dz.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre_and_derivative(n, z);
            let wi = 2.0 / ((1.0 - z * z) * dp * dp);
            x[i] = -z;
            x[n - 1 - i] = z;
            w[i] = wi;
            w[n - 1 - i] = wi;
        }
        let plain = w.clone();
        GaussianQuadrature { x, w, plain }
    }
}

fn legendre_and_derivative(n: Size, x: Real) -> (Real, Real) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let kf = k as Real;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as Real * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Gauss-Laguerre quadrature (weight e^{-x} on [0, ∞))
// ═══════════════════════════════════════════════════════════════════════════════

/// Gauss-Laguerre quadrature (weight e^{-x} on [0, ∞)).
///
/// Corresponds to `QuantLib::GaussLaguerreIntegration`.
pub struct GaussLaguerreIntegration;

impl GaussLaguerreIntegration {
    /// Build a Gauss-Laguerre quadrature of given `order`.
    ///
    /// Nodes are the eigenvalues of the Jacobi matrix (diagonal `2i + 1`,
    /// off-diagonal `i + 1`), polished by Newton steps on `Lₙ`. Weights
    /// follow from `wᵢ = xᵢ / ((n + 1)² Lₙ₊₁(xᵢ)²)`.
    ///
    /// # Errors
    /// Fails if the eigenvalue iteration does not converge.
    pub fn new(order: Size) -> Result<GaussianQuadrature> {
        let n = order;
        let mut diag: Vec<Real> = (0..n).map(|i| 2.0 * i as Real + 1.0).collect();
        let mut off: Vec<Real> = (0..n)
            .map(|i| if i + 1 < n { (i + 1) as Real } else { 0.0 })
            .collect();
        tridiagonal_eigenvalues(&mut diag, &mut off)?;
        diag.sort_by(|a, b| a.total_cmp(b));

        let mut x = Vec::with_capacity(n);
        let mut w = Vec::with_capacity(n);
        let mut plain = Vec::with_capacity(n);
        for &guess in &diag {
            let mut z = guess.max(Real::MIN_POSITIVE);
            for _ in 0..8 {
                let (pn, pn1, _) = laguerre_scaled(n, z);
                let denom = n as Real * (pn - pn1);
                if denom == 0.0 {
                    break;
                }
                let dz = z * pn / denom;
                z -= dz;
                if dz.abs() <= 1e-15 * z.abs() {
                    break;
                }
            }
            let (next, _, log_scale) = laguerre_scaled(n + 1, z);
            let ln_w = z.ln() - 2.0 * ((n + 1) as Real).ln() - 2.0 * (next.abs().ln() + log_scale);
            x.push(z);
            w.push(ln_w.exp());
            plain.push((ln_w + z).exp());
        }
        Ok(GaussianQuadrature { x, w, plain })
    }
}

// Lₙ(x) and Lₙ₋₁(x) by the three-term recurrence, rescaled on the fly:
// the true values are the returned ones times exp(log_scale).
fn laguerre_scaled(n: Size, x: Real) -> (Real, Real, Real) {
    const BIG: Real = 1e150;
    let mut p0 = 0.0;
    let mut p1 = 1.0;
    let mut log_scale = 0.0;
    for k in 0..n {
        let kf = k as Real;
        let p2 = ((2.0 * kf + 1.0 - x) * p1 - kf * p0) / (kf + 1.0);
        p0 = p1;
        p1 = p2;
        if p1.abs() > BIG {
            p0 /= BIG;
            p1 /= BIG;
            log_scale += BIG.ln();
        }
    }
    (p1, p0, log_scale)
}

// Implicit QL with Wilkinson shifts on a symmetric tridiagonal matrix;
// eigenvalues only. `off[i]` couples rows i and i + 1, `off[n - 1]` is unused.
fn tridiagonal_eigenvalues(d: &mut [Real], e: &mut [Real]) -> Result<()> {
    let n = d.len();
    for l in 0..n {
        let mut iterations = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= Real::EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            iterations += 1;
            if iterations > 60 {
                return Err(Error::Runtime(
                    "tridiagonal eigenvalue iteration did not converge".into(),
                ));
            }
            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + r.copysign(g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut deflated = false;
            let mut i = m;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    deflated = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;
            }
            if deflated {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Gauss-Chebyshev quadratures on [-1, 1]
// ═══════════════════════════════════════════════════════════════════════════════

/// Gauss-Chebyshev quadrature of the first kind.
///
/// weight: 1/√(1−x²) on [−1, 1].
/// Corresponds to `QuantLib::GaussChebyshevIntegration`.
pub struct GaussChebyshevIntegration;

impl GaussChebyshevIntegration {
    /// Build a Gauss-Chebyshev (first-kind) quadrature of given `order`.
    ///
    /// Nodes are xᵢ = cos((2i+1)π / (2n)), weights are wᵢ = π/n.
    pub fn new(order: Size) -> GaussianQuadrature {
        let n = order;
        let w_val = PI / n as Real;
        let x: Vec<Real> = (0..n)
            .rev()
            .map(|i| ((2 * i + 1) as Real * PI / (2.0 * n as Real)).cos())
            .collect();
        let plain = x.iter().map(|&xi| w_val * (1.0 - xi * xi).sqrt()).collect();
        GaussianQuadrature {
            x,
            w: vec![w_val; n],
            plain,
        }
    }
}

/// Gauss-Chebyshev quadrature of the second kind.
///
/// weight: √(1−x²) on [−1, 1].
/// Corresponds to `QuantLib::GaussChebyshev2ndIntegration`.
pub struct GaussChebyshev2ndIntegration;

impl GaussChebyshev2ndIntegration {
    /// Build a Gauss-Chebyshev-2nd quadrature of given `order`.
    pub fn new(order: Size) -> GaussianQuadrature {
        let n = order;
        let h = PI / (n + 1) as Real;
        let thetas: Vec<Real> = (1..=n).rev().map(|i| i as Real * h).collect();
        GaussianQuadrature {
            x: thetas.iter().map(|t| t.cos()).collect(),
            w: thetas.iter().map(|t| h * t.sin().powi(2)).collect(),
            plain: thetas.iter().map(|t| h * t.sin()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn ascending(x: &[Real]) -> bool {
        x.windows(2).all(|p| p[0] < p[1])
    }

    #[test]
    fn gauss_legendre_exact_for_polynomials() {
        // ∫_{-1}^{1} x^4 dx = 2/5, exact for order >= 3
        let q = GaussLegendreIntegration::new(5);
        assert_abs_diff_eq!(q.integrate(|x| x.powi(4)), 0.4, epsilon = 1e-14);
        assert!(ascending(q.x()));
    }

    #[test]
    fn gauss_legendre_high_order() {
        let q = GaussLegendreIntegration::new(96);
        assert_abs_diff_eq!(q.w().iter().sum::<Real>(), 2.0, epsilon = 1e-13);
        assert_abs_diff_eq!(q.integrate_plain(|x| x.exp()), 1.0_f64.exp() - (-1.0_f64).exp(), epsilon = 1e-13);
    }

    #[test]
    fn gauss_laguerre_moments() {
        // ∫₀^∞ xᵏ e^{-x} dx = k!
        let q = GaussLaguerreIntegration::new(12).unwrap();
        assert!(ascending(q.x()));
        let mut factorial = 1.0;
        for k in 0..20 {
            if k > 0 {
                factorial *= k as Real;
            }
            assert_relative_eq!(q.integrate(|x| x.powi(k)), factorial, max_relative = 1e-10);
        }
    }

    #[test]
    fn gauss_laguerre_high_order_plain_weights() {
        let q = GaussLaguerreIntegration::new(128).unwrap();
        assert_eq!(q.order(), 128);
        assert!(q.plain_weights().iter().all(|w| w.is_finite() && *w > 0.0));
        assert_relative_eq!(q.w().iter().sum::<Real>(), 1.0, max_relative = 1e-12);
        // ∫₀^∞ e^{-2x} cos x dx = 0.4
        assert_abs_diff_eq!(q.integrate_plain(|x| (-2.0 * x).exp() * x.cos()), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn chebyshev_plain_weights_integrate_smooth_functions() {
        for q in [GaussChebyshevIntegration::new(64), GaussChebyshev2ndIntegration::new(64)] {
            assert!(ascending(q.x()));
            assert_abs_diff_eq!(q.integrate_plain(|x| x * x), 2.0 / 3.0, epsilon = 1e-12);
        }
        // ∫ √(1−x²) · 1/√(1−x²) dx
        let q = GaussChebyshevIntegration::new(8);
        assert_abs_diff_eq!(q.integrate(|x| (1.0 - x * x).sqrt()), 2.0, epsilon = 1e-2);
        let q = GaussChebyshev2ndIntegration::new(8);
        assert_abs_diff_eq!(q.integrate(|_| 1.0), PI / 2.0, epsilon = 1e-14);
    }
}
