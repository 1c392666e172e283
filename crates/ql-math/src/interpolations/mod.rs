//! 1D interpolation trait and implementations (translates
//! `ql/math/interpolation.hpp` and `ql/math/interpolations/`).

use ql_core::{ensure, errors::Result, Real};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
///
/// Corresponds to `QuantLib::Interpolation`.
pub trait Interpolation1D: std::fmt::Debug + Send + Sync {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
///
/// Outside `[x_min, x_max]` the first or last segment is extended.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, fewer than 2
    /// points, or `xs` is not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ensure!(xs.len() >= 2, "need at least 2 points for interpolation");
        ensure!(xs.len() == ys.len(), "xs and ys must have the same length");
        ensure!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "xs must be strictly increasing"
        );
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    fn locate(&self, x: Real) -> usize {
        let n = self.xs.len();
        // index of the first node strictly above x, clamped to a valid segment
        let upper = self.xs.partition_point(|&xi| xi <= x);
        upper.clamp(1, n - 1) - 1
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let i = self.locate(x);
        let dx = self.xs[i + 1] - self.xs[i];
        self.ys[i] + (x - self.xs[i]) * (self.ys[i + 1] - self.ys[i]) / dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_hits_nodes_and_midpoints() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 3.0], &[1.0, 3.0, 2.0]).unwrap();
        assert_abs_diff_eq!(interp.operator(0.0), 1.0);
        assert_abs_diff_eq!(interp.operator(1.0), 3.0);
        assert_abs_diff_eq!(interp.operator(3.0), 2.0);
        assert_abs_diff_eq!(interp.operator(0.5), 2.0);
        assert_abs_diff_eq!(interp.operator(2.0), 2.5);
        assert!(interp.is_in_range(2.9));
        assert!(!interp.is_in_range(3.1));
    }

    #[test]
    fn linear_extends_end_segments() {
        let interp = LinearInterpolation::new(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
        assert_abs_diff_eq!(interp.operator(2.0), 4.0);
        assert_abs_diff_eq!(interp.operator(-1.0), -2.0);
    }

    #[test]
    fn rejects_unsorted_nodes() {
        assert!(LinearInterpolation::new(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(LinearInterpolation::new(&[0.0], &[1.0]).is_err());
    }
}
