//! Numerical integration (translates `ql/math/integrals/`).
//!
//! Adaptive rules (Simpson, trapezoid, Gauss-Kronrod, Gauss-Lobatto) work on
//! a finite interval and report how many times they evaluated the integrand
//! and whether they met their tolerance. Running out of evaluations is not
//! an error: the best estimate so far is returned with `converged = false`.
//!
//! Fixed rules ([`gaussianquadratures`], [`discrete`]) expose their nodes and
//! weights so callers can map them onto other domains.

pub mod discrete;
pub mod gaussianquadratures;

use ql_core::{ensure, errors::Result, Real, Size};

/// Value of a numerical integral together with its bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrationOutcome {
    /// The integral estimate.
    pub value: Real,
    /// Number of integrand evaluations spent.
    pub evaluations: Size,
    /// `false` when the evaluation budget ran out before the tolerance was met.
    pub converged: bool,
}

impl IntegrationOutcome {
    /// An outcome that met its tolerance.
    pub fn converged(value: Real, evaluations: Size) -> Self {
        Self {
            value,
            evaluations,
            converged: true,
        }
    }
}

/// A numerical integrator over a finite interval.
///
/// Corresponds to the abstract `QuantLib::Integrator` class. The integrand
/// is `FnMut` so that it may carry state between evaluations.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`.
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome>;

    /// Evaluation budget.
    fn max_evaluations(&self) -> Size;
}

// ── Trapezoid / Simpson ───────────────────────────────────────────────────────

// Successive halving of the trapezoid rule; `simpson` applies Richardson
// extrapolation to consecutive refinements. At least five halvings are
// carried out before convergence is accepted.
fn refine_trapezoid<F: FnMut(Real) -> Real>(
    mut f: F,
    a: Real,
    b: Real,
    absolute_accuracy: Real,
    max_evaluations: Size,
    simpson: bool,
) -> IntegrationOutcome {
    let mut trapezoid = 0.5 * (b - a) * (f(a) + f(b));
    let mut estimate = trapezoid;
    let mut evaluations = 2;
    let mut n: Size = 1;
    let mut i = 1;
    while evaluations + n <= max_evaluations {
        let h = (b - a) / n as Real;
        let mut sum = 0.0;
        let mut x = a + 0.5 * h;
        for _ in 0..n {
            sum += f(x);
            x += h;
        }
        evaluations += n;
        n *= 2;
        let refined = 0.5 * (trapezoid + h * sum);
        let next = if simpson {
            (4.0 * refined - trapezoid) / 3.0
        } else {
            refined
        };
        trapezoid = refined;
        let change = (next - estimate).abs();
        estimate = next;
        i += 1;
        if i > 5 && change <= absolute_accuracy {
            return IntegrationOutcome::converged(estimate, evaluations);
        }
    }
    IntegrationOutcome {
        value: estimate,
        evaluations,
        converged: false,
    }
}

/// Simpson's rule obtained by Richardson extrapolation of the refined
/// trapezoid rule.
///
/// Corresponds to `QuantLib::SimpsonIntegral`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpsonIntegral {
    max_evaluations: Size,
    absolute_accuracy: Real,
}

impl SimpsonIntegral {
    /// Create a new Simpson integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            max_evaluations,
            absolute_accuracy,
        }
    }
}

impl Integrator for SimpsonIntegral {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.absolute_accuracy > 0.0, "accuracy must be positive");
        ensure!(self.max_evaluations >= 2, "at least two evaluations required");
        if a == b {
            return Ok(IntegrationOutcome::converged(0.0, 0));
        }
        Ok(refine_trapezoid(
            f,
            a,
            b,
            self.absolute_accuracy,
            self.max_evaluations,
            true,
        ))
    }

    fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }
}

/// Composite trapezoidal rule with successive refinement.
///
/// Corresponds to `QuantLib::TrapezoidIntegral`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrapezoidIntegral {
    max_evaluations: Size,
    absolute_accuracy: Real,
}

impl TrapezoidIntegral {
    /// Create a new trapezoidal integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            max_evaluations,
            absolute_accuracy,
        }
    }
}

impl Integrator for TrapezoidIntegral {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.absolute_accuracy > 0.0, "accuracy must be positive");
        ensure!(self.max_evaluations >= 2, "at least two evaluations required");
        if a == b {
            return Ok(IntegrationOutcome::converged(0.0, 0));
        }
        Ok(refine_trapezoid(
            f,
            a,
            b,
            self.absolute_accuracy,
            self.max_evaluations,
            false,
        ))
    }

    fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }
}

// ── Gauss-Kronrod ─────────────────────────────────────────────────────────────

// QUADPACK 15-point Kronrod abscissae, x[0] is the outermost node.
const KRONROD_X: [Real; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];
const KRONROD_W: [Real; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];
// 7-point Gauss weights for the odd Kronrod nodes x[1], x[3], x[5], x[7].
const GAUSS_W: [Real; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// Adaptive Gauss-Kronrod integration with the 7/15-point pair.
///
/// An interval is accepted when the Kronrod and Gauss estimates differ by
/// less than the tolerance; otherwise it is bisected and each half is
/// integrated with half the tolerance. Pending intervals live on an explicit
/// work stack, and a split is only made while both halves still fit into
/// the evaluation budget, so `max_evaluations` bounds the whole integration.
///
/// Corresponds to `QuantLib::GaussKronrodAdaptive`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussKronrodAdaptive {
    absolute_accuracy: Real,
    max_evaluations: Size,
}

// An evaluated interval waiting to be accepted or bisected.
#[derive(Debug, Clone, Copy)]
struct KronrodPanel {
    a: Real,
    b: Real,
    kronrod: Real,
    error: Real,
    tolerance: Real,
}

impl GaussKronrodAdaptive {
    /// Create a new integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            absolute_accuracy,
            max_evaluations,
        }
    }

    // 15 evaluations
    fn panel<F: FnMut(Real) -> Real>(f: &mut F, a: Real, b: Real, tolerance: Real) -> KronrodPanel {
        let half = 0.5 * (b - a);
        let center = 0.5 * (a + b);

        let fc = f(center);
        let mut gauss = fc * GAUSS_W[3];
        let mut kronrod = fc * KRONROD_W[7];
        for j in 0..7 {
            let dx = half * KRONROD_X[j];
            let pair = f(center - dx) + f(center + dx);
            kronrod += KRONROD_W[j] * pair;
            if j % 2 == 1 {
                gauss += GAUSS_W[j / 2] * pair;
            }
        }
        KronrodPanel {
            a,
            b,
            kronrod: kronrod * half,
            error: ((kronrod - gauss) * half).abs(),
            tolerance,
        }
    }
}

impl Integrator for GaussKronrodAdaptive {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        mut f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.absolute_accuracy > 0.0, "accuracy must be positive");
        ensure!(
            self.max_evaluations >= 15,
            "required at least 15 evaluations, {} allowed",
            self.max_evaluations
        );
        let mut evaluations = 15;
        let mut converged = true;
        let mut value = 0.0;
        let mut stack = vec![Self::panel(&mut f, a, b, self.absolute_accuracy)];
        while let Some(panel) = stack.pop() {
            if panel.error < panel.tolerance {
                value += panel.kronrod;
                continue;
            }
            if evaluations + 30 > self.max_evaluations {
                converged = false;
                value += panel.kronrod;
                continue;
            }
            let center = 0.5 * (panel.a + panel.b);
            let tolerance = 0.5 * panel.tolerance;
            let left = Self::panel(&mut f, panel.a, center, tolerance);
            let right = Self::panel(&mut f, center, panel.b, tolerance);
            evaluations += 30;
            stack.push(right);
            stack.push(left);
        }
        Ok(IntegrationOutcome {
            value,
            evaluations,
            converged,
        })
    }

    fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }
}

// ── Gauss-Lobatto ─────────────────────────────────────────────────────────────

const LOBATTO_ALPHA: Real = 0.816_496_580_927_726_032_732_428_024_901_963_8; // √(2/3)
const LOBATTO_BETA: Real = 0.447_213_595_499_957_939_281_834_733_746_255_2; // 1/√5
const LOBATTO_X1: Real = 0.942_882_415_695_479_719_056_351_758_431_857_202_32;
const LOBATTO_X2: Real = 0.641_853_342_345_781_305_781_235_541_329_031_883_54;
const LOBATTO_X3: Real = 0.236_383_199_662_149_880_282_223_773_492_052_925_99;

/// Adaptive Gauss-Lobatto integration (Gander & Gautschi).
///
/// The 4-point Lobatto rule is compared with its 7-point Kronrod extension;
/// refinement stops once the difference no longer changes a 13-point
/// estimate of the total integral in floating point. An optional relative
/// accuracy caps the absolute one at `relative · |estimate|`.
///
/// Subintervals are kept on an explicit work stack. Each pending interval
/// has its five interior evaluations reserved against the budget when it is
/// created, so the total never exceeds `max_evaluations`.
///
/// Corresponds to `QuantLib::GaussLobattoIntegral`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussLobattoIntegral {
    absolute_accuracy: Real,
    relative_accuracy: Option<Real>,
    max_evaluations: Size,
    use_convergence_estimate: bool,
}

// Endpoints and endpoint values of a pending Lobatto interval.
#[derive(Debug, Clone, Copy)]
struct LobattoPanel {
    a: Real,
    b: Real,
    fa: Real,
    fb: Real,
}

impl GaussLobattoIntegral {
    /// Create a new integrator.
    pub fn new(absolute_accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            absolute_accuracy,
            relative_accuracy: None,
            max_evaluations,
            use_convergence_estimate: true,
        }
    }

    /// Also stop when the relative accuracy is reached.
    pub fn with_relative_accuracy(mut self, relative_accuracy: Real) -> Self {
        self.relative_accuracy = Some(relative_accuracy);
        self
    }

    /// Switch the convergence-rate correction of the tolerance on or off.
    pub fn with_convergence_estimate(mut self, enabled: bool) -> Self {
        self.use_convergence_estimate = enabled;
        self
    }

    fn tolerance<F: FnMut(Real) -> Real>(&self, f: &mut F, a: Real, b: Real) -> Result<Real> {
        let m = 0.5 * (a + b);
        let h = 0.5 * (b - a);
        let y1 = f(a);
        let y3 = f(m - LOBATTO_ALPHA * h);
        let y5 = f(m - LOBATTO_BETA * h);
        let y7 = f(m);
        let y9 = f(m + LOBATTO_BETA * h);
        let y11 = f(m + LOBATTO_ALPHA * h);
        let y13 = f(b);
        let f1 = f(m - LOBATTO_X1 * h);
        let f2 = f(m + LOBATTO_X1 * h);
        let f3 = f(m - LOBATTO_X2 * h);
        let f4 = f(m + LOBATTO_X2 * h);
        let f5 = f(m - LOBATTO_X3 * h);
        let f6 = f(m + LOBATTO_X3 * h);

        let estimate = h
            * (0.015_827_191_973_480_183_1 * (y1 + y13)
                + 0.094_273_840_218_850_045_5 * (f1 + f2)
                + 0.155_071_987_336_585_396_3 * (y3 + y11)
                + 0.188_821_573_960_182_454_4 * (f3 + f4)
                + 0.199_773_405_226_858_526_8 * (y5 + y9)
                + 0.224_926_465_333_339_527_0 * (f5 + f6)
                + 0.242_611_071_901_408_733_8 * y7);

        let any_nonzero = [f1, f2, f3, f4, f5, f6].iter().any(|&v| v != 0.0);
        ensure!(
            !(estimate == 0.0 && any_nonzero),
            "can not calculate absolute accuracy from relative accuracy"
        );

        let mut r = 1.0;
        if self.use_convergence_estimate {
            let integral2 = (h / 6.0) * (y1 + y13 + 5.0 * (y5 + y9));
            let integral1 = (h / 1470.0)
                * (77.0 * (y1 + y13) + 432.0 * (y3 + y11) + 625.0 * (y5 + y9) + 672.0 * y7);
            if (integral2 - estimate).abs() != 0.0 {
                r = (integral1 - estimate).abs() / (integral2 - estimate).abs();
            }
            if r == 0.0 || r > 1.0 {
                r = 1.0;
            }
        }

        Ok(match self.relative_accuracy {
            Some(rel) => {
                let rel = rel.max(Real::EPSILON);
                self.absolute_accuracy.min(estimate.abs() * rel) / (r * Real::EPSILON)
            }
            None => self.absolute_accuracy / (r * Real::EPSILON),
        })
    }
}

impl Integrator for GaussLobattoIntegral {
    fn integrate<F: FnMut(Real) -> Real>(
        &self,
        mut f: F,
        a: Real,
        b: Real,
    ) -> Result<IntegrationOutcome> {
        ensure!(self.absolute_accuracy > 0.0, "accuracy must be positive");
        ensure!(
            self.max_evaluations >= 20,
            "required at least 20 evaluations, {} allowed",
            self.max_evaluations
        );
        if a == b {
            return Ok(IntegrationOutcome::converged(0.0, 0));
        }
        let acc = self.tolerance(&mut f, a, b)?;
        let fa = f(a);
        let fb = f(b);
        // 13 + 2 spent, 5 reserved for the first panel
        let mut committed = 20;
        let mut evaluations = 15;
        let mut converged = true;
        let mut value = 0.0;
        let mut stack = vec![LobattoPanel { a, b, fa, fb }];

        while let Some(LobattoPanel { a, b, fa, fb }) = stack.pop() {
            let h = 0.5 * (b - a);
            let m = 0.5 * (a + b);
            let mll = m - LOBATTO_ALPHA * h;
            let ml = m - LOBATTO_BETA * h;
            let mr = m + LOBATTO_BETA * h;
            let mrr = m + LOBATTO_ALPHA * h;

            let fmll = f(mll);
            let fml = f(ml);
            let fm = f(m);
            let fmr = f(mr);
            let fmrr = f(mrr);
            evaluations += 5;

            let integral2 = (h / 6.0) * (fa + fb + 5.0 * (fml + fmr));
            let integral1 = (h / 1470.0)
                * (77.0 * (fa + fb) + 432.0 * (fmll + fmrr) + 625.0 * (fml + fmr) + 672.0 * fm);

            let dist = acc + (integral1 - integral2);
            if dist == acc || mll <= a || b <= mrr {
                value += integral1;
                continue;
            }
            if committed + 30 > self.max_evaluations {
                converged = false;
                value += integral1;
                continue;
            }
            committed += 30;
            let points = [(a, fa), (mll, fmll), (ml, fml), (m, fm), (mr, fmr), (mrr, fmrr), (b, fb)];
            for w in points.windows(2).rev() {
                stack.push(LobattoPanel {
                    a: w[0].0,
                    b: w[1].0,
                    fa: w[0].1,
                    fb: w[1].1,
                });
            }
        }
        Ok(IntegrationOutcome {
            value,
            evaluations,
            converged,
        })
    }

    fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }
}
