//! Pricing results and the pricing-engine trait.
//!
//! Translates the result/engine half of `ql/instrument.hpp` and
//! `ql/pricingengine.hpp`. Instruments are plain values: an engine receives
//! the instrument's arguments and returns freshly computed results, so no
//! results are cached and no observer wiring is needed.

use ql_core::{errors::Result, Real};
use std::collections::HashMap;

/// Results of pricing an instrument.
///
/// Contains the NPV and optionally additional named results
/// (e.g. "evaluations", "delta").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Error estimate, when the engine provides one.
    pub error_estimate: Option<Real>,
    /// Additional named results.
    pub additional_results: HashMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            error_estimate: None,
            additional_results: HashMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// Look up a named result.
    pub fn result(&self, key: &str) -> Option<Real> {
        self.additional_results.get(key).copied()
    }
}

/// Base trait for all pricing engines.
///
/// A pricing engine computes `PricingResults` for a specific instrument type.
///
/// Corresponds to `QuantLib::PricingEngine`.
pub trait PricingEngine<Args>: std::fmt::Debug + Send + Sync {
    /// Price the instrument described by `args`.
    fn calculate(&self, args: &Args) -> Result<PricingResults>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_results_builder() {
        let r = PricingResults::from_npv(42.0)
            .with_result("evaluations", 128.0)
            .with_result("converged", 1.0);
        assert!((r.npv - 42.0).abs() < 1e-15);
        assert_eq!(r.result("evaluations"), Some(128.0));
        assert_eq!(r.result("delta"), None);
    }
}
