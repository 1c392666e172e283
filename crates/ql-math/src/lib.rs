//! # ql-math
//!
//! Mathematical building blocks for characteristic-function pricing:
//! quadrature rules (Gaussian families, adaptive and discrete integrators),
//! complex-logarithm branch tracking, the complex exponential integral,
//! 1D root finding, linear interpolation and the normal distribution
//! (via statrs).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Complex square roots, logarithms and branch tracking.
pub mod complex;

/// Probability distributions.
pub mod distributions;

/// The complex exponential integral E₁.
pub mod exponential_integral;

/// Numerical integration.
pub mod integrals;

/// 1D interpolation schemes.
pub mod interpolations;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use complex::BranchTracker;
pub use distributions::normal_cdf;
pub use integrals::{IntegrationOutcome, Integrator};
pub use num_complex::Complex64;
