//! optimization — bounded maximizer, numerical helpers, and error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer shared by GP fitting and acquisition
//! maximization: an argmin-backed L-BFGS maximizer with box constraints,
//! guarded scalar transforms, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - `maximizer`: maximize an `Objective`, unconstrained or over a box,
//!   with line-search fallback and start-point retention on abort.
//! - `numerical_stability`: logistic/logit helpers, the box map, and the
//!   Cholesky jitter scale.
//! - `errors`: `OptError` / `OptResult<T>`, including the model failures
//!   objectives raise mid-run and the fatal/non-fatal split.
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers see finite inputs once validation has passed; failures are
//!   values, not panics.
//! - Callers never see raw argmin errors.
//!
//! Conventions
//! -----------
//! - All solvers maximize `f(θ)` by minimizing `c(θ) = -f(θ)`; outcomes
//!   report `f`.
//! - Logging uses the `log` facade only, at `warn` for aborted runs and
//!   `debug` for run diagnostics.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; end-to-end behavior is
//!   exercised by GP fitting and proposal tests.

pub mod errors;
pub mod maximizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::maximizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
