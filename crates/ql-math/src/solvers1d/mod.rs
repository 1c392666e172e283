//! 1D root-finding solvers (translates `ql/math/solvers1d/`).

use ql_core::{
    errors::{Error, Result},
    Real,
};

const MAX_ITERATIONS: u32 = 100;
const DEFAULT_ACCURACY: Real = 1.0e-11;

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method for finding a root of `f(x)` in `[x_min, x_max]`.
///
/// Combines bisection, secant, and inverse quadratic interpolation.
pub fn brent<F>(f: F, x_min: Real, x_max: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let acc = if accuracy > 0.0 {
        accuracy
    } else {
        DEFAULT_ACCURACY
    };
    let mut a = x_min;
    let mut b = x_max;
    let mut fa = f(a);
    let mut fb = f(b);

    if fa * fb > 0.0 {
        return Err(Error::Precondition(format!(
            "Brent: f({a}) and f({b}) must have opposite signs"
        )));
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * acc;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                let p = 2.0 * xm * s;
                let q = 1.0 - s;
                (p, q)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                let p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                let q = (q - 1.0) * (r - 1.0) * (s - 1.0);
                (p, q)
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p < (3.0 * xm * q - (tol * q).abs()) && 2.0 * p < (e * q).abs() {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol {
            d
        } else if xm > 0.0 {
            tol
        } else {
            -tol
        };
        fb = f(b);
    }
    Err(Error::Runtime(
        "Brent solver: maximum iterations reached".into(),
    ))
}

// ── Bracketing ────────────────────────────────────────────────────────────────

/// Bracket a root above `x_min` by repeatedly doubling `guess`, then refine
/// it with [`brent`].
///
/// Corresponds to `QuantLib::Solver1D::solve` with a guess and a step.
///
/// # Errors
/// Fails when no sign change is found below `x_min + guess · 2⁶⁰`.
pub fn bracket_and_solve<F>(f: F, x_min: Real, guess: Real, accuracy: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    if guess.is_nan() || guess <= 0.0 {
        return Err(Error::Precondition(format!(
            "bracketing step must be positive, got {guess}"
        )));
    }
    let f_min = f(x_min);
    if f_min == 0.0 {
        return Ok(x_min);
    }
    let mut lo = x_min;
    let mut step = guess;
    for _ in 0..60 {
        let hi = x_min + step;
        let f_hi = f(hi);
        if f_hi.is_nan() {
            break;
        }
        if f_min * f_hi <= 0.0 {
            return brent(&f, lo, hi, accuracy);
        }
        lo = hi;
        step *= 2.0;
    }
    Err(Error::Runtime(format!(
        "unable to bracket a root above {x_min}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn brent_sqrt2() {
        let root = brent(|x| x * x - 2.0, 0.0, 2.0, 1e-12).unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn brent_opposite_signs_required() {
        assert!(matches!(
            brent(|x| x, 1.0, 2.0, 1e-10),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn bracketing_finds_a_distant_root() {
        // 0.01 u + ln u + ln(1e-25) = 0 has its root near u ≈ 4 900
        let f = |u: Real| 0.01 * u + u.ln() + 1e-25_f64.ln();
        let root = bracket_and_solve(f, 1.0, 1.0, 1e-8).unwrap();
        assert!(root > 1000.0);
        assert_abs_diff_eq!(f(root), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn bracketing_gives_up_without_a_sign_change() {
        assert!(bracket_and_solve(|x| x * x + 1.0, 0.0, 1.0, 1e-8).is_err());
        assert!(bracket_and_solve(|x| x, 0.0, -1.0, 1e-8).is_err());
    }
}
