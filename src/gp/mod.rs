//! gp — Gaussian-process regression, homoscedastic and heteroscedastic.
//!
//! Purpose
//! -------
//! Fit GP surrogates to noisy scalar observations and predict with them.
//! The squared-exponential kernel, Cholesky-based likelihood and posterior,
//! and the hyperparameter fit are shared by the plain GP and by both GPs of
//! the most-likely heteroscedastic procedure.
//!
//! Key behaviors
//! -------------
//! - [`kernel`]: ARD squared-exponential covariance and
//!   [`KernelHyperparameters`].
//! - [`likelihood`]: log marginal likelihood with an analytic gradient,
//!   exposed to the maximizer as an `Objective`.
//! - [`posterior`]: conditioned predictive distributions in full or
//!   diagonal covariance mode, with an optional prior mean.
//! - [`homoscedastic`]: bounded hyperparameter fit, prediction and the
//!   [`HomoscedasticGP`] bundle.
//! - [`heteroscedastic`]: the iterative two-GP noise estimation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Noise values are standard deviations; `N = diag(σ_n²)`.
//! - Hyperparameters are fitted inside `[1e-2, 900]` unless configured
//!   otherwise.
//! - A failed Cholesky is retried once with jitter; a second failure is
//!   [`GPError::NumericalInstability`].
//!
//! Conventions
//! -----------
//! - Point sets are `n × d` row-major `ndarray` matrices.
//! - Fallible operations return [`GPResult<T>`]; nothing panics on bad
//!   input.
//! - Logging goes through the `log` facade.

pub mod data;
pub mod errors;
pub mod heteroscedastic;
pub mod homoscedastic;
pub mod kernel;
pub mod likelihood;
pub mod linalg;
pub mod noise;
pub mod posterior;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::data::GPData;
pub use self::errors::{GPError, GPResult};
pub use self::heteroscedastic::{
    HeteroscedasticGP, HeteroscedasticPrediction, HeteroscedasticState, MLHGPOptions,
    NoiseFunction, fit_heteroscedastic,
};
pub use self::homoscedastic::{
    GPFit, GPFitOptions, HomoscedasticGP, fit_hyperparameters, fit_predict, predict,
};
pub use self::kernel::{KernelHyperparameters, se_kernel};
pub use self::likelihood::{LogMarginalLikelihood, neg_log_marginal_likelihood};
pub use self::noise::NoiseModel;
pub use self::posterior::{CovarianceMode, GPPosterior, PosteriorPredictive, PriorMean};
