//! Errors for acquisition functions and location proposals.
//!
//! [`AcqError`] covers invalid search boxes and restart options, query points
//! of the wrong dimension, and everything the surrogate fit or the bounded
//! maximizer can report underneath. With the `python-bindings` feature the
//! type converts to `PyValueError`.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};
use statrs::distribution::NormalError;

use crate::{gp::errors::GPError, optimization::errors::OptError};

/// Result alias for acquisition operations.
pub type AcqResult<T> = Result<T, AcqError>;

#[derive(Debug, Clone, PartialEq)]
pub enum AcqError {
    // ---- Search box ----
    /// A `(low, high)` pair is non-finite or not strictly increasing.
    InvalidBounds { index: usize, low: f64, high: f64, reason: &'static str },

    /// No bounds were given.
    EmptyBounds,

    // ---- ProposeOptions ----
    /// At least one restart is required.
    InvalidRestartCount { n_restarts: usize, reason: &'static str },

    /// Acceptance threshold must be finite.
    InvalidMinVal { min_val: f64, reason: &'static str },

    // ---- Expected improvement ----
    /// Exploration offset must be finite and non-negative.
    InvalidXi { xi: f64, reason: &'static str },

    /// Wrapper for statrs::distribution::NormalError
    InvalidNormalParam,

    /// Mean and standard-deviation vectors disagree in length.
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    // ---- Query ----
    /// Query points (or bounds) do not match the surrogate's input dimension.
    QueryDimMismatch { expected: usize, found: usize },

    // ---- Wrapped ----
    /// Surrogate construction or prediction failed.
    GP(GPError),

    /// The bounded maximizer failed.
    Optimization(OptError),
}

impl AcqError {
    /// Errors that abort a multi-start proposal instead of skipping a restart.
    pub fn is_fatal(&self) -> bool {
        match self {
            AcqError::Optimization(err) => err.is_fatal(),
            AcqError::GP(GPError::InvalidDimensionality { .. })
            | AcqError::GP(GPError::NumericalInstability { .. }) => true,
            AcqError::GP(_) => false,
            _ => true,
        }
    }
}

impl std::error::Error for AcqError {}

impl std::fmt::Display for AcqError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Search box ----
            AcqError::InvalidBounds { index, low, high, reason } => {
                write!(f, "Invalid bounds ({low}, {high}) for dimension {index}: {reason}")
            }
            AcqError::EmptyBounds => write!(f, "At least one (low, high) bound is required"),

            // ---- ProposeOptions ----
            AcqError::InvalidRestartCount { n_restarts, reason } => {
                write!(f, "Invalid restart count {n_restarts}: {reason}")
            }
            AcqError::InvalidMinVal { min_val, reason } => {
                write!(f, "Invalid min_val {min_val}: {reason}")
            }

            // ---- Expected improvement ----
            AcqError::InvalidXi { xi, reason } => write!(f, "Invalid xi {xi}: {reason}"),
            AcqError::InvalidNormalParam => write!(f, "Invalid standard normal parameters"),
            AcqError::LengthMismatch { what, expected, found } => {
                write!(f, "Length mismatch for {what}: expected {expected}, found {found}")
            }

            // ---- Query ----
            AcqError::QueryDimMismatch { expected, found } => {
                write!(f, "Query dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Wrapped ----
            AcqError::GP(err) => write!(f, "Surrogate error: {err}"),
            AcqError::Optimization(err) => write!(f, "Acquisition optimization failed: {err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<AcqError> for PyErr {
    fn from(err: AcqError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<NormalError> for AcqError {
    fn from(_: NormalError) -> AcqError {
        AcqError::InvalidNormalParam
    }
}

impl From<GPError> for AcqError {
    fn from(err: GPError) -> AcqError {
        match err {
            GPError::Optimization(inner) => AcqError::Optimization(inner),
            other => AcqError::GP(other),
        }
    }
}

impl From<OptError> for AcqError {
    fn from(err: OptError) -> AcqError {
        match err {
            OptError::BoundsDimMismatch { expected, found } => {
                AcqError::QueryDimMismatch { expected, found }
            }
            OptError::NonPositiveDefinite { .. } | OptError::DimensionMismatch { .. } => {
                AcqError::GP(GPError::from(err))
            }
            other => AcqError::Optimization(other),
        }
    }
}

impl From<AcqError> for OptError {
    fn from(err: AcqError) -> OptError {
        match err {
            AcqError::QueryDimMismatch { expected, found } => {
                OptError::DimensionMismatch { what: "query point", expected, found }
            }
            AcqError::GP(inner) => OptError::from(inner),
            AcqError::Optimization(inner) => inner,
            other => OptError::InvalidModelInput { text: other.to_string() },
        }
    }
}
