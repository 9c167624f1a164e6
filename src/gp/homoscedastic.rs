//! gp::homoscedastic — fit kernel hyperparameters and predict.
//!
//! Purpose
//! -------
//! Fit a GP with a fixed noise model by maximizing the log marginal
//! likelihood over a box of hyperparameters, then predict with the fitted
//! hyperparameters. Despite the name, the noise model may be a per-point
//! vector; the heteroscedastic engine reuses this fit for its signal GP.
//!
//! Key behaviors
//! -------------
//! - [`fit_hyperparameters`] runs one bounded L-BFGS maximization from the
//!   caller's initial hyperparameters and returns a [`GPFit`].
//! - [`predict`] conditions a zero-mean GP and predicts at query points.
//! - [`HomoscedasticGP`] bundles a fit with its conditioned posterior for
//!   repeated predictions; [`fit_predict`] is the one-shot combination.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every component of `θ = (l_1, …, l_d, σ_f)` stays inside
//!   `[GPFitOptions::lower, GPFitOptions::upper]` (default `[1e-2, 900]`).
//! - Optimizer non-convergence is not an error: the best iterate is used,
//!   `GPFit::converged` is `false`, and a warning is logged.
use ndarray::ArrayView2;

use crate::{
    gp::{
        data::GPData,
        errors::{GPError, GPResult},
        kernel::KernelHyperparameters,
        likelihood::LogMarginalLikelihood,
        noise::NoiseModel,
        posterior::{CovarianceMode, GPPosterior, PosteriorPredictive},
    },
    optimization::maximizer::{BoxBounds, OptimOptions, maximize_bounded},
};

/// Default lower bound for every hyperparameter.
pub const DEFAULT_HYPER_LOWER: f64 = 1e-2;

/// Default upper bound for every hyperparameter.
pub const DEFAULT_HYPER_UPPER: f64 = 900.0;

/// Configuration for hyperparameter fitting.
///
/// - `lower`, `upper`: box applied to every lengthscale and to `σ_f`.
/// - `optim`: maximizer options (tolerances, line search, verbosity).
#[derive(Debug, Clone, PartialEq)]
pub struct GPFitOptions {
    pub lower: f64,
    pub upper: f64,
    pub optim: OptimOptions,
}

impl GPFitOptions {
    /// # Errors
    /// [`GPError::InvalidHyperparameter`] unless `0 < lower < upper < ∞`.
    pub fn new(lower: f64, upper: f64, optim: OptimOptions) -> GPResult<Self> {
        if !lower.is_finite() || lower <= 0.0 {
            return Err(GPError::InvalidHyperparameter {
                name: "lower bound",
                value: lower,
                reason: "Hyperparameter lower bound must be finite and positive.",
            });
        }
        if !upper.is_finite() || upper <= lower {
            return Err(GPError::InvalidHyperparameter {
                name: "upper bound",
                value: upper,
                reason: "Hyperparameter upper bound must be finite and above the lower bound.",
            });
        }
        Ok(Self { lower, upper, optim })
    }

    fn bounds(&self, dim: usize) -> GPResult<BoxBounds> {
        Ok(BoxBounds::uniform(dim + 1, self.lower, self.upper)?)
    }
}

impl Default for GPFitOptions {
    fn default() -> Self {
        Self { lower: DEFAULT_HYPER_LOWER, upper: DEFAULT_HYPER_UPPER, optim: OptimOptions::default() }
    }
}

/// Result of a hyperparameter fit.
///
/// - `hypers`: fitted hyperparameters.
/// - `nlml`: negative log marginal likelihood at `hypers`.
/// - `converged`: whether the optimizer stopped on a tolerance.
/// - `iterations`: optimizer iterations performed.
#[derive(Debug, Clone, PartialEq)]
pub struct GPFit {
    pub hypers: KernelHyperparameters,
    pub nlml: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Maximize the log marginal likelihood of `data` under `noise`, starting at
/// `init`.
///
/// # Errors
/// - [`GPError::InvalidDimensionality`] if `init.dim() != data.dim()` or the
///   noise vector length differs from `data.n()`.
/// - [`GPError::NumericalInstability`] if `K + N` cannot be factorized even
///   with jitter at some iterate.
/// - [`GPError::Optimization`] for optimizer configuration failures.
pub fn fit_hyperparameters(
    data: &GPData, noise: &NoiseModel, init: &KernelHyperparameters, opts: &GPFitOptions,
) -> GPResult<GPFit> {
    if init.dim() != data.dim() {
        return Err(GPError::InvalidDimensionality {
            what: "initial lengthscales",
            expected: data.dim(),
            found: init.dim(),
        });
    }
    let objective = LogMarginalLikelihood::new(data, noise)?;
    let bounds = opts.bounds(data.dim())?;
    let outcome = maximize_bounded(&objective, &init.to_theta(), &bounds, data, &opts.optim)?;
    if !outcome.converged {
        log::warn!(
            "hyperparameter fit did not converge after {} iterations ({})",
            outcome.iterations,
            outcome.status
        );
    }
    let hypers = KernelHyperparameters::from_theta(outcome.theta_hat.view(), data.dim())?;
    log::debug!("fitted hyperparameters {:?}, nlml = {:.6}", hypers.to_theta(), -outcome.value);
    Ok(GPFit { hypers, nlml: -outcome.value, converged: outcome.converged, iterations: outcome.iterations })
}

/// Predict at `x_star` with fixed hyperparameters and zero prior mean.
pub fn predict(
    data: &GPData, noise: &NoiseModel, hypers: &KernelHyperparameters, x_star: ArrayView2<'_, f64>,
    mode: CovarianceMode,
) -> GPResult<GPPosterior> {
    PosteriorPredictive::new(data, noise, hypers)?.predict(x_star, mode)
}

/// A fitted GP with its conditioned posterior.
#[derive(Debug, Clone)]
pub struct HomoscedasticGP {
    fit: GPFit,
    posterior: PosteriorPredictive,
}

impl HomoscedasticGP {
    /// Fit hyperparameters and condition the posterior.
    pub fn fit(
        data: &GPData, noise: &NoiseModel, init: &KernelHyperparameters, opts: &GPFitOptions,
    ) -> GPResult<Self> {
        let fit = fit_hyperparameters(data, noise, init, opts)?;
        let posterior = PosteriorPredictive::new(data, noise, &fit.hypers)?;
        Ok(Self { fit, posterior })
    }

    pub fn fit_result(&self) -> &GPFit {
        &self.fit
    }

    pub fn hypers(&self) -> &KernelHyperparameters {
        &self.fit.hypers
    }

    pub fn posterior(&self) -> &PosteriorPredictive {
        &self.posterior
    }

    pub fn predict(&self, x_star: ArrayView2<'_, f64>, mode: CovarianceMode) -> GPResult<GPPosterior> {
        self.posterior.predict(x_star, mode)
    }
}

/// Fit on `data`, then predict at `x_star`.
pub fn fit_predict(
    data: &GPData, noise: &NoiseModel, init: &KernelHyperparameters, x_star: ArrayView2<'_, f64>,
    opts: &GPFitOptions, mode: CovarianceMode,
) -> GPResult<(GPFit, GPPosterior)> {
    let gp = HomoscedasticGP::fit(data, noise, init, opts)?;
    let post = gp.predict(x_star, mode)?;
    Ok((gp.fit, post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::likelihood::neg_log_marginal_likelihood;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The small 1-D fit/predict scenario (three points, noise 0.1).
    // - Fitted hyperparameters staying in the box and not worsening the NLML.
    // - Option validation and dimension checks.
    // -------------------------------------------------------------------------

    fn scenario_a() -> GPData {
        GPData::new(array![[1.0], [2.0], [3.0]], array![0.1, 0.9, 0.05]).expect("valid")
    }

    #[test]
    // Purpose
    // -------
    // Fit then predict at the training inputs follows the labels.
    //
    // Given
    // -----
    // - X = [[1], [2], [3]], y = [0.1, 0.9, 0.05], noise 0.1, l = σ_f = 1.
    //
    // Expect
    // ------
    // - |μ(x_i) - y_i| < 0.5 and var(x_i) ≥ 0.
    fn fit_predict_follows_labels() {
        // Arrange
        let data = scenario_a();
        let noise = NoiseModel::constant(0.1).expect("valid");
        let init = KernelHyperparameters::isotropic(1, 1.0, 1.0).expect("valid");

        // Act
        let (fit, post) = fit_predict(
            &data,
            &noise,
            &init,
            data.x().view(),
            &GPFitOptions::default(),
            CovarianceMode::Full,
        )
        .expect("fit and predict");

        // Assert
        assert!(fit.nlml.is_finite());
        for i in 0..3 {
            assert!((post.mean()[i] - data.y()[i]).abs() < 0.5, "i = {i}: {}", post.mean()[i]);
            assert!(post.variance()[i] >= 0.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // The fit stays inside the box and improves on the starting NLML.
    fn fit_stays_in_bounds_and_improves_nlml() {
        let data = GPData::new(
            array![[0.0], [0.5], [1.0], [1.5], [2.0], [2.5]],
            array![0.0, 0.48, 0.84, 1.0, 0.91, 0.6],
        )
        .expect("valid");
        let noise = NoiseModel::constant(0.05).expect("valid");
        let init = KernelHyperparameters::isotropic(1, 5.0, 3.0).expect("valid");
        let opts = GPFitOptions::default();

        let fit = fit_hyperparameters(&data, &noise, &init, &opts).expect("fit");

        let start = neg_log_marginal_likelihood(&data, &noise, &init).expect("nlml");
        assert!(fit.nlml <= start + 1e-9, "{} vs {start}", fit.nlml);
        for &v in fit.hypers.to_theta().iter() {
            assert!((DEFAULT_HYPER_LOWER..=DEFAULT_HYPER_UPPER).contains(&v));
        }
    }

    #[test]
    // Purpose
    // -------
    // Bad boxes and mismatched initial hyperparameters are rejected.
    fn fit_rejects_bad_options_and_dimensions() {
        assert!(GPFitOptions::new(0.0, 1.0, OptimOptions::default()).is_err());
        assert!(GPFitOptions::new(2.0, 1.0, OptimOptions::default()).is_err());

        let data = scenario_a();
        let init = KernelHyperparameters::isotropic(2, 1.0, 1.0).expect("valid");
        let err = fit_hyperparameters(&data, &NoiseModel::Constant(0.1), &init, &GPFitOptions::default())
            .expect_err("2-D init for 1-D data");
        assert!(matches!(err, GPError::InvalidDimensionality { expected: 1, found: 2, .. }));
    }
}
