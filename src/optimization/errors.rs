//! optimization::errors — unified error surface for the bounded maximizer.
//!
//! Purpose
//! -------
//! Collect every failure the optimization layer can report into a single
//! enum, [`OptError`], with a shared alias [`OptResult<T>`]. Configuration
//! mistakes, invalid derivative information, argmin backend failures and the
//! model failures that objectives raise while being evaluated all surface
//! through this type.
//!
//! Key behaviors
//! -------------
//! - Describe option validation failures (tolerances, iteration caps, L-BFGS
//!   memory, line-search names, box bounds) with the offending value and a
//!   static reason.
//! - Mirror the GP failures an objective can hit mid-run
//!   (`NonPositiveDefinite`, `DimensionMismatch`, …) so `?` works inside
//!   objective implementations without losing the failure kind.
//! - Convert `argmin::core::Error` back into [`OptError`], recovering an
//!   `OptError` that was tunnelled through argmin before falling back to
//!   argmin's own error kinds.
//!
//! Conventions
//! -----------
//! - Errors are plain data (`Clone + PartialEq`) so tests can match on them.
//! - Backend errors never leak past this module as `argmin::core::Error`.
use argmin::core::{ArgminError, Error};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- OptimOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Box bounds ----
    /// A lower/upper pair is not finite or not strictly ordered.
    InvalidBounds {
        index: usize,
        lower: f64,
        upper: f64,
        reason: &'static str,
    },

    /// Starting point does not have one coordinate per bound.
    BoundsDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Model failures raised by objectives ----
    /// Covariance matrix stayed non positive-definite after jitter.
    NonPositiveDefinite {
        jitter: f64,
    },
    /// Shapes supplied to an objective disagree.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// An objective received an input it cannot evaluate.
    InvalidModelInput {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// `true` for failures that must abort a run instead of being tolerated
    /// as a non-converged restart.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OptError::DimensionMismatch { .. }
                | OptError::BoundsDimMismatch { .. }
                | OptError::InvalidBounds { .. }
                | OptError::NonPositiveDefinite { .. }
        )
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- OptimOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Box bounds ----
            OptError::InvalidBounds { index, lower, upper, reason } => {
                write!(f, "Invalid bounds [{lower}, {upper}] at index {index}: {reason}")
            }
            OptError::BoundsDimMismatch { expected, found } => {
                write!(f, "Bounds dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Model failures ----
            OptError::NonPositiveDefinite { jitter } => {
                write!(f, "Matrix not positive definite after adding jitter {jitter}")
            }
            OptError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, found {found}")
            }
            OptError::InvalidModelInput { text } => {
                write!(f, "Invalid model input: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}
