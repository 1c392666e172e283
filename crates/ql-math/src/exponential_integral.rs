//! Complex exponential integral `E₁(z) = ∫_z^∞ e^{−t}/t dt`.

use num_complex::Complex64;
use num_traits::Zero;
use ql_core::Real;
use std::f64::consts::PI;

const EULER_GAMMA: Real = 0.577_215_664_901_532_9;
const MAX_TERMS: usize = 10_000;

/// Principal branch of `E₁(z)`, with the cut along the negative real axis.
///
/// Points on the cut itself are evaluated from above, i.e.
/// `E₁(−x) = −Ei(x) − iπ`.
pub fn e1(z: Complex64) -> Complex64 {
    let r = z.norm();
    if r == 0.0 {
        return Complex64::new(Real::INFINITY, 0.0);
    }
    let near_cut = z.re < 0.0 && z.im.abs() <= 0.5 * z.re.abs() && r <= 50.0;
    if r <= 4.0 || near_cut {
        e1_series(z)
    } else {
        e1_continued_fraction(z)
    }
}

/// `E₁` continued analytically along the ray `t₀ + s·d`, `s ≥ 0`.
///
/// `d` must point into the right half plane so that the integral from
/// `t₀` to infinity along the ray exists. When the ray crosses the
/// negative real axis the result differs from the principal value by
/// `±2πi`.
pub fn e1_along_ray(t0: Complex64, d: Complex64) -> Complex64 {
    let principal = e1(t0);
    if d.im == 0.0 || t0.im == 0.0 {
        return principal;
    }
    let s = -t0.im / d.im;
    if s > 0.0 && t0.re + s * d.re < 0.0 {
        let turn = Complex64::new(0.0, 2.0 * PI);
        if t0.im > 0.0 {
            principal + turn
        } else {
            principal - turn
        }
    } else {
        principal
    }
}

// −γ − ln z − Σ (−z)ⁿ / (n·n!)
fn e1_series(z: Complex64) -> Complex64 {
    let ln_z = if z.im == 0.0 && z.re < 0.0 {
        Complex64::new((-z.re).ln(), PI)
    } else {
        z.ln()
    };
    let mut sum = Complex64::zero();
    let mut term = Complex64::new(1.0, 0.0);
    for n in 1..MAX_TERMS {
        term = term * (-z) / n as Real;
        let contrib = term / n as Real;
        sum += contrib;
        if contrib.norm() <= Real::EPSILON * sum.norm() {
            break;
        }
    }
    -EULER_GAMMA - ln_z - sum
}

// Modified Lentz evaluation of
// E₁(z) = e^{−z} / (z + 1 − 1²/(z + 3 − 2²/(z + 5 − …)))
fn e1_continued_fraction(z: Complex64) -> Complex64 {
    let tiny = Complex64::new(1e-300, 0.0);
    let mut b = z + 1.0;
    let mut c = Complex64::new(1.0, 0.0) / tiny;
    let mut d = Complex64::new(1.0, 0.0) / b;
    let mut h = d;
    for i in 1..MAX_TERMS {
        let an = -((i * i) as Real);
        b += 2.0;
        d = Complex64::new(1.0, 0.0) / (d * an + b);
        c = b + c.inv() * an;
        if c.norm() == 0.0 {
            c = tiny;
        }
        let delta = c * d;
        h *= delta;
        if (delta - 1.0).norm() < Real::EPSILON {
            break;
        }
    }
    h * (-z).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn real_values() {
        // E1(1) and E1(0.5), E1(10)
        assert_relative_eq!(e1(Complex64::new(1.0, 0.0)).re, 0.219_383_934_395_520_3, max_relative = 1e-13);
        assert_relative_eq!(e1(Complex64::new(0.5, 0.0)).re, 0.559_773_594_776_160_8, max_relative = 1e-13);
        assert_relative_eq!(e1(Complex64::new(10.0, 0.0)).re, 4.156_968_929_685_324e-6, max_relative = 1e-11);
    }

    #[test]
    fn negative_axis_is_approached_from_above() {
        // E1(-1) = -Ei(1) - iπ
        let v = e1(Complex64::new(-1.0, 0.0));
        assert_relative_eq!(v.re, -1.895_117_816_355_936_8, max_relative = 1e-12);
        assert_relative_eq!(v.im, -PI, max_relative = 1e-12);
    }

    #[test]
    fn series_and_fraction_agree_away_from_the_cut() {
        for z in [Complex64::new(3.0, 4.0), Complex64::new(-1.0, 5.0), Complex64::new(4.5, -0.5)] {
            let s = e1_series(z);
            let f = e1_continued_fraction(z);
            assert!((s - f).norm() < 1e-10 * f.norm(), "z = {z}: {s} vs {f}");
        }
    }

    #[test]
    fn derivative_matches_definition() {
        // dE1/dz = −e^{−z}/z
        let z = Complex64::new(2.0, 7.0);
        let h = 1e-5;
        let num = (e1(z + h) - e1(z - h)) / (2.0 * h);
        let exact = -(-z).exp() / z;
        assert!((num - exact).norm() < 1e-8, "{num} vs {exact}");
    }

    #[test]
    fn ray_crossing_the_cut_adds_a_full_turn() {
        let t0 = Complex64::new(-2.0, 1.0);
        let down = Complex64::new(0.1, -1.0);
        let right = Complex64::new(1.0, 0.0);
        let crossed = e1_along_ray(t0, down);
        let direct = e1_along_ray(t0, right);
        assert_relative_eq!((crossed - direct).im, 2.0 * PI, max_relative = 1e-14);
        assert_relative_eq!(crossed.re, direct.re, max_relative = 1e-14);
    }
}
