//! # ql-core
//!
//! Core types and error definitions shared by every crate of the workspace:
//! the floating-point type aliases used throughout the pricing code and the
//! `thiserror`-based error hierarchy with its `ensure!`-style macros.
//!
//! Nothing in this crate (or anywhere in the workspace) reads global state:
//! times are plain year fractions and market inputs are passed explicitly.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `ensure_param!` / `fail!` macros.
pub mod errors;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes, node counts and evaluation counters.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
