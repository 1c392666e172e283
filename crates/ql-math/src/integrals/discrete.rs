//! Discrete integrators on a fixed set of abscissae.
//!
//! Translates `ql/math/integrals/discreteintegrals.hpp`. The rules are
//! expressed as weight vectors so that the same grid can be reused, or
//! mapped onto another domain, without re-deriving the composite formula.

use super::{IntegrationOutcome, Integrator};
use ql_core::{ensure, errors::Result, Real, Size};

/// Weights of the composite trapezoidal rule on the abscissae `x`.
///
/// `Σ wᵢ f(xᵢ) = Σ ½ (xᵢ₊₁ − xᵢ)(fᵢ + fᵢ₊₁)`.
pub fn trapezoid_weights(x: &[Real]) -> Vec<Real> {
    let n = x.len();
    let mut w = vec![0.0; n];
    for i in 0..n.saturating_sub(1) {
        let half = 0.5 * (x[i + 1] - x[i]);
        w[i] += half;
        w[i + 1] += half;
    }
    w
}

/// Weights of the composite Simpson rule on (possibly non-uniform)
/// abscissae `x`.
///
/// Pairs of sub-intervals are integrated with the three-point rule; with an
/// even number of points the last interval falls back to the trapezoid.
pub fn simpson_weights(x: &[Real]) -> Vec<Real> {
    let n = x.len();
    if n < 3 {
        return trapezoid_weights(x);
    }
    let mut w = vec![0.0; n];
    let mut j = 0;
    while j + 2 < n {
        let dxj = x[j + 1] - x[j];
        let dxjp1 = x[j + 2] - x[j + 1];
        let dd = dxj + dxjp1;
        let k = dd / (6.0 * dxjp1 * dxj);
        w[j] += k * dxjp1 * (2.0 * dxj - dxjp1);
        w[j + 1] += k * dd * dd;
        w[j + 2] += k * dxj * (2.0 * dxjp1 - dxj);
        j += 2;
    }
    if n % 2 == 0 {
        let half = 0.5 * (x[n - 1] - x[n - 2]);
        w[n - 2] += half;
        w[n - 1] += half;
    }
    w
}

/// `n` equally spaced points covering `[a, b]`, both ends included.
pub fn uniform_grid(a: Real, b: Real, n: Size) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let h = (b - a) / (n - 1) as Real;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + i as Real * h })
                .collect()
        }
    }
}

fn apply<F: FnMut(Real) -> Real>(mut f: F, x: &[Real], w: &[Real]) -> IntegrationOutcome {
    let value = x.iter().zip(w).map(|(&xi, &wi)| wi * f(xi)).sum();
    IntegrationOutcome::converged(value, x.len())
}

/// Composite trapezoidal rule on a uniform grid of `evaluations` points.
///
/// Corresponds to `QuantLib::DiscreteTrapezoidIntegrator`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscreteTrapezoidIntegrator {
    evaluations: Size,
}

impl DiscreteTrapezoidIntegrator {
    /// Create a rule using `evaluations` grid points.
    pub fn new(evaluations: Size) -> Self {
        Self { evaluations }
    }

    /// Nodes and weights on `[a, b]`, nodes ascending when `a < b`.
    pub fn nodes_and_weights(&self, a: Real, b: Real) -> (Vec<Real>, Vec<Real>) {
        let x = uniform_grid(a, b, self.evaluations);
        let w = trapezoid_weights(&x);
        (x, w)
    }
}

impl Integrator for DiscreteTrapezoidIntegrator {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.evaluations >= 2, "need at least 2 evaluation points");
        let (x, w) = self.nodes_and_weights(a, b);
        Ok(apply(f, &x, &w))
    }

    fn max_evaluations(&self) -> Size {
        self.evaluations
    }
}

/// Composite Simpson rule on a uniform grid of `evaluations` points.
///
/// Corresponds to `QuantLib::DiscreteSimpsonIntegrator`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscreteSimpsonIntegrator {
    evaluations: Size,
}

impl DiscreteSimpsonIntegrator {
    /// Create a rule using `evaluations` grid points.
    pub fn new(evaluations: Size) -> Self {
        Self { evaluations }
    }

    /// Nodes and weights on `[a, b]`, nodes ascending when `a < b`.
    pub fn nodes_and_weights(&self, a: Real, b: Real) -> (Vec<Real>, Vec<Real>) {
        let x = uniform_grid(a, b, self.evaluations);
        let w = simpson_weights(&x);
        (x, w)
    }
}

impl Integrator for DiscreteSimpsonIntegrator {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.evaluations >= 3, "need at least 3 evaluation points");
        let (x, w) = self.nodes_and_weights(a, b);
        Ok(apply(f, &x, &w))
    }

    fn max_evaluations(&self) -> Size {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn dot(w: &[Real], x: &[Real], f: impl Fn(Real) -> Real) -> Real {
        w.iter().zip(x).map(|(&wi, &xi)| wi * f(xi)).sum()
    }

    #[test]
    fn trapezoid_weights_linear() {
        // ∫₀¹ x dx = 0.5, exact for linear integrands
        let x = [0.0, 0.25, 0.5, 0.75, 1.0];
        assert_abs_diff_eq!(dot(&trapezoid_weights(&x), &x, |v| v), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn simpson_weights_nonuniform_quadratic() {
        let x = [0.0, 0.3, 0.7, 0.8, 1.0];
        // two three-point panels, exact for quadratics
        assert_abs_diff_eq!(dot(&simpson_weights(&x), &x, |v| v * v), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn simpson_even_point_count_uses_trapezoid_tail() {
        let x = uniform_grid(0.0, 1.0, 4);
        let w = simpson_weights(&x);
        // Simpson on [0, 2/3] plus a trapezoid on [2/3, 1]
        let expected = (2.0_f64 / 3.0).powi(3) / 3.0 + 0.5 / 3.0 * ((2.0_f64 / 3.0).powi(2) + 1.0);
        assert_abs_diff_eq!(dot(&w, &x, |v| v * v), expected, epsilon = 1e-14);
    }

    #[test]
    fn integrators_use_exactly_their_evaluations() {
        let simpson = DiscreteSimpsonIntegrator::new(101);
        let out = simpson.integrate(|x| x * x * x, 0.0, 1.0).unwrap();
        assert_eq!(out.evaluations, 101);
        assert!(out.converged);
        assert_abs_diff_eq!(out.value, 0.25, epsilon = 1e-12);

        let trapezoid = DiscreteTrapezoidIntegrator::new(10_001);
        let out = trapezoid.integrate(|x| x.sin(), 0.0, PI).unwrap();
        assert_eq!(out.evaluations, 10_001);
        assert_abs_diff_eq!(out.value, 2.0, epsilon = 1e-7);
    }

    #[test]
    fn too_few_points_is_rejected() {
        assert!(DiscreteSimpsonIntegrator::new(2).integrate(|x| x, 0.0, 1.0).is_err());
        assert!(DiscreteTrapezoidIntegrator::new(1).integrate(|x| x, 0.0, 1.0).is_err());
    }
}
