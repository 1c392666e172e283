//! # ql-models
//!
//! The Heston stochastic-volatility model: validated parameters and their
//! binding to a spot value and two yield curves.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Equity models ────────────────────────────────────────────────────────
pub mod heston_model;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use heston_model::{HestonModel, HestonParameters};
