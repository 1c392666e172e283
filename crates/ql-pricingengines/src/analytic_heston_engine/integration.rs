//! Quadrature rules for the Fourier integral over `[0, ∞)`.
//!
//! Corresponds to `QuantLib::AnalyticHestonEngine::Integration`.
//!
//! Gauss-Laguerre works on `[0, ∞)` directly. The other Gaussian rules live
//! on `[−1, 1]` and are mapped with `u = −ln((x + 1)/2)/c`. Discrete and
//! adaptive rules either run on `[0, 1]` with `u = −ln(x)/c`, or on a
//! truncated interval `[0, u_max]` when the integrand is known to have
//! decayed below a cutoff there.

use ql_core::{ensure_param, errors::Result, fail, Real, Size, Time};
use ql_math::integrals::discrete::{DiscreteSimpsonIntegrator, DiscreteTrapezoidIntegrator};
use ql_math::integrals::gaussianquadratures::{
    GaussChebyshev2ndIntegration, GaussChebyshevIntegration, GaussLaguerreIntegration,
    GaussLegendreIntegration, GaussianQuadrature,
};
use ql_math::integrals::{
    GaussKronrodAdaptive, GaussLobattoIntegral, SimpsonIntegral, TrapezoidIntegral,
};
use ql_math::solvers1d::bracket_and_solve;
use ql_math::{IntegrationOutcome, Integrator};
use ql_models::HestonParameters;
use tracing::warn;

/// Evaluation budget of the adaptive rules unless given explicitly.
pub const DEFAULT_MAX_EVALUATIONS: Size = 1000;

/// Integration rule of the Heston engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "rule", rename_all = "snake_case")
)]
pub enum Integration {
    /// Gauss-Laguerre with `order` nodes.
    GaussLaguerre {
        /// Number of nodes.
        order: Size,
    },
    /// Gauss-Legendre with `order` nodes.
    GaussLegendre {
        /// Number of nodes.
        order: Size,
    },
    /// Gauss-Chebyshev of the first kind with `order` nodes.
    GaussChebyshev {
        /// Number of nodes.
        order: Size,
    },
    /// Gauss-Chebyshev of the second kind with `order` nodes.
    GaussChebyshev2nd {
        /// Number of nodes.
        order: Size,
    },
    /// Composite Simpson rule on `evaluations` equally spaced nodes.
    DiscreteSimpson {
        /// Number of nodes.
        evaluations: Size,
    },
    /// Composite trapezoid rule on `evaluations` equally spaced nodes.
    DiscreteTrapezoid {
        /// Number of nodes.
        evaluations: Size,
    },
    /// Adaptive Gauss-Lobatto.
    GaussLobatto {
        /// Absolute tolerance, if any.
        absolute_tolerance: Option<Real>,
        /// Relative tolerance, if any.
        relative_tolerance: Option<Real>,
        /// Evaluation budget.
        max_evaluations: Size,
    },
    /// Adaptive Gauss-Kronrod (7/15 points).
    GaussKronrod {
        /// Absolute tolerance.
        absolute_tolerance: Real,
        /// Evaluation budget.
        max_evaluations: Size,
    },
    /// Adaptive Simpson rule.
    Simpson {
        /// Absolute tolerance.
        absolute_tolerance: Real,
        /// Evaluation budget.
        max_evaluations: Size,
    },
    /// Adaptive trapezoid rule.
    Trapezoid {
        /// Absolute tolerance.
        absolute_tolerance: Real,
        /// Evaluation budget.
        max_evaluations: Size,
    },
}

impl Default for Integration {
    fn default() -> Self {
        Self::GaussLaguerre { order: 128 }
    }
}

impl Integration {
    /// Gauss-Laguerre rule.
    pub fn gauss_laguerre(order: Size) -> Result<Self> {
        Self::GaussLaguerre { order }.validated()
    }

    /// Gauss-Legendre rule.
    pub fn gauss_legendre(order: Size) -> Result<Self> {
        Self::GaussLegendre { order }.validated()
    }

    /// Gauss-Chebyshev rule of the first kind.
    pub fn gauss_chebyshev(order: Size) -> Result<Self> {
        Self::GaussChebyshev { order }.validated()
    }

    /// Gauss-Chebyshev rule of the second kind.
    pub fn gauss_chebyshev_2nd(order: Size) -> Result<Self> {
        Self::GaussChebyshev2nd { order }.validated()
    }

    /// Discrete Simpson rule.
    pub fn discrete_simpson(evaluations: Size) -> Result<Self> {
        Self::DiscreteSimpson { evaluations }.validated()
    }

    /// Discrete trapezoid rule.
    pub fn discrete_trapezoid(evaluations: Size) -> Result<Self> {
        Self::DiscreteTrapezoid { evaluations }.validated()
    }

    /// Adaptive Gauss-Lobatto; at least one tolerance must be given.
    pub fn gauss_lobatto(
        absolute_tolerance: Option<Real>,
        relative_tolerance: Option<Real>,
        max_evaluations: Size,
    ) -> Result<Self> {
        Self::GaussLobatto {
            absolute_tolerance,
            relative_tolerance,
            max_evaluations,
        }
        .validated()
    }

    /// Adaptive Gauss-Kronrod.
    pub fn gauss_kronrod(absolute_tolerance: Real, max_evaluations: Size) -> Result<Self> {
        Self::GaussKronrod {
            absolute_tolerance,
            max_evaluations,
        }
        .validated()
    }

    /// Adaptive Simpson rule.
    pub fn simpson(absolute_tolerance: Real, max_evaluations: Size) -> Result<Self> {
        Self::Simpson {
            absolute_tolerance,
            max_evaluations,
        }
        .validated()
    }

    /// Adaptive trapezoid rule.
    pub fn trapezoid(absolute_tolerance: Real, max_evaluations: Size) -> Result<Self> {
        Self::Trapezoid {
            absolute_tolerance,
            max_evaluations,
        }
        .validated()
    }

    /// `true` for the rules with an error tolerance.
    pub fn is_adaptive(&self) -> bool {
        matches!(
            self,
            Self::GaussLobatto { .. }
                | Self::GaussKronrod { .. }
                | Self::Simpson { .. }
                | Self::Trapezoid { .. }
        )
    }

    /// Number of nodes of a fixed rule; `None` for adaptive rules.
    pub fn nodes(&self) -> Option<Size> {
        match *self {
            Self::GaussLaguerre { order }
            | Self::GaussLegendre { order }
            | Self::GaussChebyshev { order }
            | Self::GaussChebyshev2nd { order } => Some(order),
            Self::DiscreteSimpson { evaluations } | Self::DiscreteTrapezoid { evaluations } => {
                Some(evaluations)
            }
            _ => None,
        }
    }

    /// `true` for the rules whose nodes are mapped onto `[0, ∞)` and so
    /// never need a truncation point.
    pub fn is_gaussian(&self) -> bool {
        matches!(
            self,
            Self::GaussLaguerre { .. }
                | Self::GaussLegendre { .. }
                | Self::GaussChebyshev { .. }
                | Self::GaussChebyshev2nd { .. }
        )
    }

    /// Check node counts, tolerances and budgets.
    ///
    /// # Errors
    /// [`ql_core::Error::InvalidParameter`] for an empty rule, a missing or
    /// non-positive tolerance, or a budget below the rule's minimum.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::GaussLaguerre { order }
            | Self::GaussLegendre { order }
            | Self::GaussChebyshev { order }
            | Self::GaussChebyshev2nd { order } => {
                ensure_param!(order > 0, "integration order must be positive");
            }
            Self::DiscreteSimpson { evaluations } => {
                ensure_param!(evaluations >= 3, "discrete Simpson needs at least 3 nodes, got {evaluations}");
            }
            Self::DiscreteTrapezoid { evaluations } => {
                ensure_param!(evaluations >= 2, "discrete trapezoid needs at least 2 nodes, got {evaluations}");
            }
            Self::GaussLobatto {
                absolute_tolerance,
                relative_tolerance,
                max_evaluations,
            } => {
                ensure_param!(
                    absolute_tolerance.is_some() || relative_tolerance.is_some(),
                    "Gauss-Lobatto needs an absolute or a relative tolerance"
                );
                for tol in absolute_tolerance.into_iter().chain(relative_tolerance) {
                    ensure_param!(tol > 0.0, "tolerance must be positive, got {tol}");
                }
                ensure_param!(
                    max_evaluations >= 20,
                    "Gauss-Lobatto needs at least 20 evaluations, got {max_evaluations}"
                );
            }
            Self::GaussKronrod {
                absolute_tolerance,
                max_evaluations,
            } => {
                ensure_param!(absolute_tolerance > 0.0, "tolerance must be positive, got {absolute_tolerance}");
                ensure_param!(
                    max_evaluations >= 15,
                    "Gauss-Kronrod needs at least 15 evaluations, got {max_evaluations}"
                );
            }
            Self::Simpson {
                absolute_tolerance,
                max_evaluations,
            }
            | Self::Trapezoid {
                absolute_tolerance,
                max_evaluations,
            } => {
                ensure_param!(absolute_tolerance > 0.0, "tolerance must be positive, got {absolute_tolerance}");
                ensure_param!(
                    max_evaluations >= 3,
                    "adaptive rule needs at least 3 evaluations, got {max_evaluations}"
                );
            }
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

/// Where the integrand lives and how the rule's nodes reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Domain {
    /// Scale `c` of the exponential maps.
    pub scale: Real,
    /// Truncation point for discrete and adaptive rules; `None` maps them
    /// from `[0, 1]` instead.
    pub upper: Option<Real>,
}

/// A validated rule with its node table built once.
#[derive(Debug, Clone)]
pub(crate) struct PreparedIntegration {
    rule: Integration,
    // Gaussian nodes and weights for ∫ f(x) dx
    table: Option<(Vec<Real>, Vec<Real>)>,
}

fn plain_table(q: GaussianQuadrature) -> (Vec<Real>, Vec<Real>) {
    (q.x().to_vec(), q.plain_weights().to_vec())
}

impl PreparedIntegration {
    pub fn new(rule: Integration) -> Result<Self> {
        rule.validate()?;
        let table = match rule {
            Integration::GaussLaguerre { order } => {
                Some(plain_table(GaussLaguerreIntegration::new(order)?))
            }
            Integration::GaussLegendre { order } => {
                Some(plain_table(GaussLegendreIntegration::new(order)))
            }
            Integration::GaussChebyshev { order } => {
                Some(plain_table(GaussChebyshevIntegration::new(order)))
            }
            Integration::GaussChebyshev2nd { order } => {
                Some(plain_table(GaussChebyshev2ndIntegration::new(order)))
            }
            _ => None,
        };
        Ok(Self { rule, table })
    }

    pub fn rule(&self) -> Integration {
        self.rule
    }

    /// `∫₀^∞ f(u) du`, threading `state` through the evaluations.
    ///
    /// Fixed rules visit their nodes in increasing `u`. The outcome counts
    /// integrand evaluations, including nodes that map to `u = ∞` and
    /// contribute nothing.
    pub fn integrate<S, F>(&self, mut f: F, domain: Domain) -> Result<IntegrationOutcome>
    where
        S: Copy + Default,
        F: FnMut(Real, S) -> (Real, S),
    {
        let c = domain.scale;
        if let Some((x, w)) = &self.table {
            let laguerre = matches!(self.rule, Integration::GaussLaguerre { .. });
            let nodes = x.iter().zip(w).map(|(&xi, &wi)| {
                if laguerre {
                    (xi, wi)
                } else {
                    (-(0.5 * (xi + 1.0)).ln() / c, wi / ((xi + 1.0) * c))
                }
            });
            return Ok(fold_nodes(nodes.collect(), f));
        }

        match self.rule {
            Integration::DiscreteSimpson { evaluations } => {
                let (x, w) = DiscreteSimpsonIntegrator::new(evaluations)
                    .nodes_and_weights(0.0, domain.upper.unwrap_or(1.0));
                Ok(fold_nodes(mapped_grid(&x, &w, domain), f))
            }
            Integration::DiscreteTrapezoid { evaluations } => {
                let (x, w) = DiscreteTrapezoidIntegrator::new(evaluations)
                    .nodes_and_weights(0.0, domain.upper.unwrap_or(1.0));
                Ok(fold_nodes(mapped_grid(&x, &w, domain), f))
            }
            _ => {
                let mut state = S::default();
                let mut calls: Size = 0;
                let mut g = |x: Real| {
                    calls += 1;
                    let (u, jacobian) = match domain.upper {
                        Some(_) => (x, 1.0),
                        None if x <= 0.0 => return 0.0,
                        None => (-x.ln() / c, 1.0 / (x * c)),
                    };
                    if !jacobian.is_finite() {
                        return 0.0;
                    }
                    let (value, next) = f(u, state);
                    state = next;
                    if value == 0.0 {
                        0.0
                    } else {
                        value * jacobian
                    }
                };
                let b = domain.upper.unwrap_or(1.0);
                let outcome = match self.rule {
                    Integration::GaussLobatto {
                        absolute_tolerance,
                        relative_tolerance,
                        max_evaluations,
                    } => {
                        let mut lobatto = GaussLobattoIntegral::new(
                            absolute_tolerance.unwrap_or(Real::MAX),
                            max_evaluations,
                        );
                        if let Some(rel) = relative_tolerance {
                            lobatto = lobatto.with_relative_accuracy(rel);
                        }
                        lobatto.integrate(&mut g, 0.0, b)?
                    }
                    Integration::GaussKronrod {
                        absolute_tolerance,
                        max_evaluations,
                    } => GaussKronrodAdaptive::new(absolute_tolerance, max_evaluations)
                        .integrate(&mut g, 0.0, b)?,
                    Integration::Simpson {
                        absolute_tolerance,
                        max_evaluations,
                    } => SimpsonIntegral::new(absolute_tolerance, max_evaluations)
                        .integrate(&mut g, 0.0, b)?,
                    Integration::Trapezoid {
                        absolute_tolerance,
                        max_evaluations,
                    } => TrapezoidIntegral::new(absolute_tolerance, max_evaluations)
                        .integrate(&mut g, 0.0, b)?,
                    _ => fail!("{:?} is not an adaptive rule", self.rule),
                };
                if !outcome.converged {
                    warn!(
                        rule = ?self.rule,
                        evaluations = calls,
                        value = outcome.value,
                        "adaptive integration exhausted its evaluation budget"
                    );
                }
                Ok(IntegrationOutcome {
                    evaluations: calls,
                    ..outcome
                })
            }
        }
    }
}

// (u, weight) for a uniform grid; `None` marks x = 0 under the log map
fn mapped_grid(x: &[Real], w: &[Real], domain: Domain) -> Vec<Option<(Real, Real)>> {
    x.iter()
        .zip(w)
        .map(|(&xi, &wi)| match domain.upper {
            Some(_) => Some((xi, wi)),
            None if xi <= 0.0 => None,
            None => Some((-xi.ln() / domain.scale, wi / (xi * domain.scale))),
        })
        .collect()
}

fn fold_nodes<S, F, N>(mut nodes: Vec<N>, mut f: F) -> IntegrationOutcome
where
    S: Copy + Default,
    F: FnMut(Real, S) -> (Real, S),
    N: Into<Option<(Real, Real)>> + Copy,
{
    let evaluations = nodes.len();
    let key = |n: &N| (*n).into().map_or(Real::INFINITY, |(u, _)| u);
    nodes.sort_by(|a, b| key(a).total_cmp(&key(b)));
    let (value, _) = nodes
        .into_iter()
        .filter_map(|n| n.into())
        .fold((0.0, S::default()), |(sum, state), (u, weight)| {
            let (value, next) = f(u, state);
            (sum + weight * value, next)
        });
    IntegrationOutcome::converged(value, evaluations)
}

/// `√(1 − ρ²)(v0 + κθt)/σ`, the exponential decay rate of the integrand.
///
/// Infinite or NaN in the degenerate corners `σ = 0`, `|ρ| = 1`.
pub(crate) fn asymptotic_decay(params: &HestonParameters, t: Time) -> Real {
    let s = (1.0 - params.rho() * params.rho()).sqrt();
    s / params.sigma() * (params.v0() + params.kappa() * params.theta() * t)
}

/// Scale of the `[0, 1]` and `[−1, 1]` maps for the probability integrands.
pub(crate) fn probability_scale(params: &HestonParameters, t: Time) -> Real {
    let s = (1.0 - params.rho() * params.rho()).sqrt();
    let w = params.v0() + params.kappa() * params.theta() * t;
    // f64::max drops a NaN argument
    0.2_f64.min((s / params.sigma()).max(1e-4)) * w
}

/// Scale of the `[−1, 1]` maps for the control-variate integrands.
///
/// `min(c∞, √w)` with `w` the integrated variance floored at `1e-4`; just
/// the floored `√w` where `c∞` vanishes or is undefined.
pub(crate) fn control_variate_scale(params: &HestonParameters, t: Time) -> Real {
    let floor = params.integrated_variance(t).sqrt().max(1e-4);
    let c = asymptotic_decay(params, t);
    if c.is_finite() && c > 0.0 {
        c.min(floor)
    } else {
        floor
    }
}

/// Upper integration limit beyond which the control-variate integrand is
/// below `epsilon`.
///
/// The larger root of the exponential bound `e^{−c u}/u = ε` and the
/// Gaussian bound `e^{−½ v t u²}/u = ε`. `None` when `σ > 0` and `c∞`
/// vanishes (`|ρ| = 1`): the integrand then decays only algebraically and
/// no finite cut-off is safe.
///
/// # Errors
/// [`ql_core::Error::Runtime`] when neither bound has a root.
pub(crate) fn integration_limit(
    params: &HestonParameters,
    t: Time,
    epsilon: Real,
) -> Result<Option<Real>> {
    let ln_eps = epsilon.ln();
    let mut limit: Real = 0.0;

    let c = asymptotic_decay(params, t);
    let exponential = c.is_finite() && c > 0.0;
    if params.sigma() > 0.0 && !exponential {
        return Ok(None);
    }
    if exponential {
        let guess = -ln_eps / c;
        if let Ok(root) = bracket_and_solve(|u| c * u + u.ln() + ln_eps, 1e-12 * guess, guess, 1e-8) {
            limit = limit.max(root);
        }
    }

    let half_var = if params.v0() > 0.0 {
        0.5 * params.v0() * t
    } else {
        0.5 * params.integrated_variance(t)
    };
    if half_var > 0.0 {
        let guess = (-ln_eps / half_var).sqrt();
        let root = bracket_and_solve(
            |u| half_var * u * u + u.ln() + ln_eps,
            1e-12 * guess,
            guess,
            1e-8,
        );
        if let Ok(root) = root {
            limit = limit.max(root);
        }
    }

    if !(limit.is_finite() && limit > 0.0) {
        fail!("no integration limit found for cutoff {epsilon} at t = {t}");
    }
    Ok(Some(limit))
}
