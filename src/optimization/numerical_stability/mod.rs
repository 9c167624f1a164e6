//! numerical_stability — guarded transforms and shared tolerances.
//!
//! Purpose
//! -------
//! Collect the small numerical primitives the optimizer and GP layers lean
//! on: a logistic that never overflows, its clamped inverse, the
//! affine-logistic map used to turn box constraints into an unconstrained
//! search space, and the relative jitter applied when a covariance matrix
//! fails to factorize.
//!
//! Key behaviors
//! -------------
//! - `safe_logistic` / `safe_logit` map ℝ ↔ (0, 1) without overflow and
//!   without infinite logits at the boundary.
//! - `to_box`, `from_box` and `box_jacobian` implement
//!   `x = lo + (hi - lo)·σ(z)`, its inverse and `dx/dz`, so bounded problems
//!   can be handed to an unconstrained L-BFGS run with exact chain-rule
//!   gradients.
//! - `JITTER_SCALE` and `LOGIT_EPS` are the only tolerances shared across
//!   modules.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite; bounds satisfy `lower < upper` (checked upstream by
//!   `maximizer::validation::validate_bounds`).
//! - `to_box` output always lies in the closed box, even when `σ(z)`
//!   saturates.
//!
//! Conventions
//! -----------
//! - Scalar functions only; vectorization happens at the call site with
//!   `ndarray` zips.
//! - No logging, no I/O, no panics.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] compare against naive formulas on a
//!   safe grid, check saturation, and verify `box_jacobian` with central
//!   differences.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    JITTER_SCALE, LOGIT_EPS, box_jacobian, from_box, safe_logistic, safe_logit, to_box,
};

pub mod prelude {
    pub use super::transformations::{JITTER_SCALE, safe_logistic, safe_logit};
}
