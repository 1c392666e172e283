//! # quantlib
//!
//! Semi-analytic Heston option pricing in the style of
//! [QuantLib](https://www.quantlib.org/).
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on this crate rather than the
//! individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use quantlib::instruments::{OptionType, VanillaOption};
//! use quantlib::models::{HestonModel, HestonParameters};
//! use quantlib::pricingengines::AnalyticHestonEngine;
//! use quantlib::termstructures::FlatForward;
//!
//! let params = HestonParameters::new(0.1, 4.0, 0.05, 0.4, -0.75)?;
//! let model = HestonModel::new(
//!     params,
//!     100.0,
//!     Arc::new(FlatForward::new(0.05)),
//!     Arc::new(FlatForward::new(0.075)),
//! )?;
//! let engine = AnalyticHestonEngine::new(Arc::new(model))?;
//! let put = VanillaOption::new(OptionType::Put, 100.0, 1.0)?;
//! let result = engine.price(&put)?;
//! assert!((result.npv - 10.147041515497).abs() < 1e-6);
//! # Ok::<(), quantlib::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Quadrature, root finding, complex helpers and distributions.
pub use ql_math as math;

/// Yield term structures supplying discount factors.
pub use ql_termstructures as termstructures;

/// The Heston model.
pub use ql_models as models;

/// European options and the pricing-engine seam.
pub use ql_instruments as instruments;

/// The semi-analytic Heston engine and the Black formula.
pub use ql_pricingengines as pricingengines;
