//! Errors for Gaussian-process fitting and prediction (data validation,
//! hyperparameter and option checks, factorization failures, and optimizer
//! failures).
//!
//! This module defines [`GPError`] and the alias [`GPResult<T>`], used by the
//! kernel, likelihood, posterior and heteroscedastic engine. The type
//! implements `Display`/`Error` and converts to `PyErr` when the
//! `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Noise values are standard deviations and must be **finite and ≥ 0**.
//! - Optimizer failures keep their [`OptError`] payload in
//!   [`GPError::Optimization`], except for the model failures that were
//!   tunnelled through the optimizer, which come back as their GP variant.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::errors::OptError;

/// Result alias for GP operations that may produce [`GPError`].
pub type GPResult<T> = Result<T, GPError>;

/// Unified error type for GP modeling.
#[derive(Debug, Clone, PartialEq)]
pub enum GPError {
    // ---- Linear algebra ----
    /// Covariance matrix is not positive definite even after adding
    /// `jitter` to its diagonal.
    NumericalInstability { jitter: f64 },

    // ---- Input/data validation ----
    /// Shapes disagree (inputs vs labels, query vs training dimension,
    /// noise vector vs number of points, …).
    InvalidDimensionality { what: &'static str, expected: usize, found: usize },

    /// No training points, or zero input dimensions.
    EmptyData,

    /// An input, label or query value is NaN/±inf.
    NonFiniteInput { what: &'static str, index: usize, value: f64 },

    /// A noise standard deviation is negative or non-finite.
    NegativeNoise { index: usize, value: f64 },

    // ---- Hyperparameters and options ----
    /// Lengthscale, signal amplitude or hyperparameter bound is invalid.
    InvalidHyperparameter { name: &'static str, value: f64, reason: &'static str },

    /// An option of the most-likely heteroscedastic procedure is invalid.
    InvalidMLHGPOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Optimizer ----
    /// The hyperparameter optimizer failed.
    Optimization(OptError),
}

impl std::error::Error for GPError {}

impl std::fmt::Display for GPError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Linear algebra ----
            GPError::NumericalInstability { jitter } => {
                write!(f, "Covariance matrix not positive definite after adding jitter {jitter}")
            }

            // ---- Input/data validation ----
            GPError::InvalidDimensionality { what, expected, found } => {
                write!(f, "Invalid dimensionality for {what}: expected {expected}, found {found}")
            }
            GPError::EmptyData => write!(f, "Training data must have at least one point and one dimension"),
            GPError::NonFiniteInput { what, index, value } => {
                write!(f, "Non-finite value in {what} at index {index}: {value}")
            }
            GPError::NegativeNoise { index, value } => {
                write!(f, "Noise standard deviation at index {index} must be finite and non-negative, got {value}")
            }

            // ---- Hyperparameters and options ----
            GPError::InvalidHyperparameter { name, value, reason } => {
                write!(f, "Invalid hyperparameter {name} = {value}: {reason}")
            }
            GPError::InvalidMLHGPOption { name, value, reason } => {
                write!(f, "Invalid heteroscedastic option {name} = {value}: {reason}")
            }

            // ---- Optimizer ----
            GPError::Optimization(err) => write!(f, "Hyperparameter optimization failed: {err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<GPError> for PyErr {
    fn from(err: GPError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<OptError> for GPError {
    fn from(err: OptError) -> GPError {
        match err {
            OptError::NonPositiveDefinite { jitter } => GPError::NumericalInstability { jitter },
            OptError::DimensionMismatch { what, expected, found } => {
                GPError::InvalidDimensionality { what, expected, found }
            }
            OptError::BoundsDimMismatch { expected, found } => {
                GPError::InvalidDimensionality { what: "bounds", expected, found }
            }
            other => GPError::Optimization(other),
        }
    }
}

impl From<GPError> for OptError {
    fn from(err: GPError) -> OptError {
        match err {
            GPError::NumericalInstability { jitter } => OptError::NonPositiveDefinite { jitter },
            GPError::InvalidDimensionality { what, expected, found } => {
                OptError::DimensionMismatch { what, expected, found }
            }
            GPError::Optimization(inner) => inner,
            other => OptError::InvalidModelInput { text: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the round trip between `GPError` and `OptError`,
    // which lets likelihood and acquisition objectives use `?` inside the
    // optimizer without losing the failure kind.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Factorization and shape failures survive a trip through `OptError`.
    //
    // Expect
    // ------
    // - `NumericalInstability` ↔ `NonPositiveDefinite` with the same jitter.
    // - `InvalidDimensionality` ↔ `DimensionMismatch` with the same payload.
    fn gp_errors_round_trip_through_opt_error() {
        let unstable = GPError::NumericalInstability { jitter: 1e-6 };
        let shape = GPError::InvalidDimensionality { what: "x_star", expected: 2, found: 3 };

        assert_eq!(GPError::from(OptError::from(unstable.clone())), unstable);
        assert_eq!(GPError::from(OptError::from(shape.clone())), shape);
    }

    #[test]
    // Purpose
    // -------
    // Other optimizer failures are wrapped, and validation errors become
    // non-fatal model input errors on the optimizer side.
    fn other_errors_are_wrapped() {
        let backend = OptError::BackendError { text: "line search".to_string() };
        assert_eq!(GPError::from(backend.clone()), GPError::Optimization(backend));

        let opt = OptError::from(GPError::EmptyData);
        assert!(matches!(opt, OptError::InvalidModelInput { .. }));
        assert!(!opt.is_fatal());
    }
}
