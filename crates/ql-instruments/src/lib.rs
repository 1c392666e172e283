//! # ql-instruments
//!
//! European option specifications and the engine seam they are priced
//! through.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod instrument;
pub mod option;
pub mod payoff;

pub use instrument::{PricingEngine, PricingResults};
pub use option::VanillaOption;
pub use payoff::{OptionType, PlainVanillaPayoff};
