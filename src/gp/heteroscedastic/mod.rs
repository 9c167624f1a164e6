//! heteroscedastic — most-likely heteroscedastic GP.
//!
//! Purpose
//! -------
//! Learn input-dependent observation noise with two GPs: a signal GP on
//! `(X, y)` and a noise GP on `(X, log empirical variance)`. The empirical
//! variance comes from posterior samples of the signal GP; the noise GP's
//! posterior then sets the per-point noise for the next signal fit.
//!
//! Key behaviors
//! -------------
//! - [`step`] is a pure function from one [`HeteroscedasticState`] to the
//!   next, given data, options and a caller-supplied generator.
//! - [`fit_heteroscedastic`] iterates `num_iters` times (or until the
//!   optional tolerance is met) and returns a [`HeteroscedasticGP`].
//! - [`HeteroscedasticGP::predict`] gives signal mean, epistemic variance
//!   and aleatoric std; [`NoiseFunction`] evaluates the learned noise at any
//!   input.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both GPs warm-start from the previous iteration's hyperparameters.
//! - Empirical variances are clamped to `variance_floor` before the
//!   logarithm; each clamp is logged.
//! - Randomness comes only from the generator passed in.
//!
//! Testing notes
//! -------------
//! - Unit tests cover option validation, sampling moments and determinism,
//!   the single-sample step, early stopping, and prediction consistency.

pub mod engine;
pub mod prediction;
pub mod sampling;
pub mod state;

pub use self::engine::{fit_heteroscedastic, step};
pub use self::prediction::{HeteroscedasticGP, HeteroscedasticPrediction, NoiseFunction};
pub use self::state::{DEFAULT_VARIANCE_FLOOR, HeteroscedasticState, MLHGPOptions};
