//! Error types for the pricing workspace.
//!
//! A single `thiserror`-derived enum covers every failure mode. Parameter
//! validation fails fast with [`Error::InvalidParameter`]; numerical quality
//! problems such as an adaptive quadrature running out of evaluations are
//! *not* errors and travel as data in the integration outcome instead.

use thiserror::Error;

/// The top-level error type used throughout the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (maps to `QL_FAIL`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition of a numerical routine violated (maps to `QL_REQUIRE`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A model, market or option input lies outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Shorthand `Result` type used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Equivalent to C++ `QL_REQUIRE(condition, message)`.
///
/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Parameter validation: returns `Err(Error::InvalidParameter(...))` if
/// `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_param, errors::Error};
/// fn strike(k: f64) -> ql_core::errors::Result<f64> {
///     ensure_param!(k > 0.0, "strike must be positive, got {k}");
///     Ok(k)
/// }
/// assert!(strike(100.0).is_ok());
/// assert!(matches!(strike(0.0), Err(Error::InvalidParameter(_))));
/// ```
#[macro_export]
macro_rules! ensure_param {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::InvalidParameter(
                format!($($msg)*)
            ));
        }
    };
}

/// Equivalent to C++ `QL_FAIL(message)`.
///
/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
