//! Complex-valued helpers for characteristic-function pricing.
//!
//! Heston-type characteristic functions contain `ln` and `sqrt` of complex
//! expressions. The principal branch of both is discontinuous across the
//! negative real axis, so integrands built on top of them can jump by
//! multiples of `2πi` as the integration variable grows. [`BranchTracker`]
//! follows the argument of a complex curve and keeps its logarithm
//! continuous.

use num_complex::Complex64;
use ql_core::Real;
use std::f64::consts::PI;

/// Principal square root, `Re √z ≥ 0`.
#[inline]
pub fn principal_sqrt(z: Complex64) -> Complex64 {
    let r = z.sqrt();
    if r.re < 0.0 {
        -r
    } else {
        r
    }
}

/// `ln(1 + w)` without cancellation for small `|w|`.
pub fn ln_1p(w: Complex64) -> Complex64 {
    if w.norm() > 0.5 {
        return (1.0 + w).ln();
    }
    let u = 1.0 + w;
    let d = u - 1.0;
    if d.re == 0.0 && d.im == 0.0 {
        w
    } else {
        u.ln() * (w / d)
    }
}

/// `eᶻ − 1` without cancellation for small `|z|`.
pub fn exp_m1(z: Complex64) -> Complex64 {
    let half = (0.5 * z.im).sin();
    Complex64::new(
        z.re.exp_m1() * z.im.cos() - 2.0 * half * half,
        z.re.exp() * z.im.sin(),
    )
}

/// Continuous argument of a complex curve sampled at increasing parameter
/// values.
///
/// The tracker is a small `Copy` value threaded through a fold: every call
/// consumes the previous state and returns the updated one, so the same
/// tracker can never be advanced twice by accident. Whenever the principal
/// argument jumps by more than `π` between successive samples the branch
/// counter moves by one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchTracker {
    last_arg: Real,
    branch: i64,
}

impl Default for BranchTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchTracker {
    /// A tracker that starts on the principal branch.
    pub const fn new() -> Self {
        Self {
            last_arg: 0.0,
            branch: 0,
        }
    }

    /// Number of `2π` turns accumulated so far.
    pub fn branch(&self) -> i64 {
        self.branch
    }

    /// Unwrap a principal argument `arg ∈ (−π, π]`.
    pub fn unwrap_arg(self, arg: Real) -> (Real, Self) {
        let mut branch = self.branch;
        let jump = arg - self.last_arg;
        if jump > PI {
            branch -= 1;
        } else if jump < -PI {
            branch += 1;
        }
        let next = Self {
            last_arg: arg,
            branch,
        };
        (arg + 2.0 * PI * branch as Real, next)
    }

    /// Logarithm of `z` on the branch that keeps the sampled curve continuous.
    pub fn continuous_log(self, z: Complex64) -> (Complex64, Self) {
        let (arg, next) = self.unwrap_arg(z.arg());
        (Complex64::new(z.norm().ln(), arg), next)
    }
}
