//! # ql-pricingengines
//!
//! Semi-analytic pricing of European options under the Heston model.
//!
//! ## Engines
//!
//! - [`AnalyticHestonEngine`]: Fourier integration of the Heston
//!   characteristic function, with a choice of integrand transform
//!   ([`ComplexLogFormula`]) and quadrature rule ([`Integration`])
//! - [`black_formula`]: Black price on a forward, used for the
//!   control variates
//!
//! ## Feature flags
//!
//! - `serde`: (de)serialisation of the engine configuration and results
//! - `parallel`: rayon-backed [`AnalyticHestonEngine::price_batch`]

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_heston_engine;
pub mod black_formula;

pub use analytic_heston_engine::{
    heston_price, optimal_control_variate, select_formula, AnalyticHestonEngine,
    ComplexLogFormula, HestonCharacteristicFunction, HestonPricingResult, Integration,
    SelectorConfig,
};
pub use black_formula::{black_formula, black_formula_implied_std_dev};
