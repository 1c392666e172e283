//! # ql-termstructures
//!
//! Yield term structures indexed by year fraction. They supply the risk-free
//! and dividend discount factors `df(t)` from which the pricing engines
//! derive forwards; dates and day counting stay with the caller.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `YieldTermStructure`: yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward`: constant forward-rate yield curve.
pub mod flat_forward;

/// `InterpolatedZeroCurve`: zero-rate interpolated yield curve.
pub mod interpolated_zero_curve;

/// `DiscountFunction`: a curve backed by an arbitrary discount function.
pub mod discount_function;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use discount_function::DiscountFunction;
pub use flat_forward::FlatForward;
pub use interpolated_zero_curve::InterpolatedZeroCurve;
pub use yield_term_structure::YieldTermStructure;
