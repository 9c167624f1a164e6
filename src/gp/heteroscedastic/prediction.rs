//! Prediction with a fitted heteroscedastic GP.
use ndarray::{Array1, ArrayView2};

use crate::gp::{
    data::GPData,
    errors::GPResult,
    heteroscedastic::state::HeteroscedasticState,
    noise::NoiseModel,
    posterior::{CovarianceMode, PosteriorPredictive},
};

/// Learned noise standard deviation as a function of input location.
///
/// Wraps the noise GP's posterior on log-variance and returns
/// `sqrt(exp(μ_2(x)))`.
#[derive(Debug, Clone)]
pub struct NoiseFunction {
    posterior: PosteriorPredictive,
}

impl NoiseFunction {
    pub fn new(posterior: PosteriorPredictive) -> Self {
        Self { posterior }
    }

    /// Predicted log noise variance at each row of `x`.
    pub fn log_variance(&self, x: ArrayView2<'_, f64>) -> GPResult<Array1<f64>> {
        self.posterior.predict_mean(x)
    }

    /// Predicted noise standard deviation at each row of `x`.
    pub fn std_dev(&self, x: ArrayView2<'_, f64>) -> GPResult<Array1<f64>> {
        Ok(self.log_variance(x)?.mapv(|m| (0.5 * m).exp()))
    }
}

/// Heteroscedastic predictive distribution at a batch of query points.
///
/// - `mean`: signal GP predictive mean.
/// - `epistemic_variance`: signal GP predictive variance (latent function).
/// - `aleatoric_std`: learned noise standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct HeteroscedasticPrediction {
    pub mean: Array1<f64>,
    pub epistemic_variance: Array1<f64>,
    pub aleatoric_std: Array1<f64>,
}

impl HeteroscedasticPrediction {
    /// `epistemic + aleatoric²`, the variance of a new noisy observation.
    pub fn total_variance(&self) -> Array1<f64> {
        &self.epistemic_variance + &self.aleatoric_std.mapv(|s| s * s)
    }

    pub fn total_std(&self) -> Array1<f64> {
        self.total_variance().mapv(f64::sqrt)
    }
}

/// A fitted most-likely heteroscedastic GP.
///
/// Holds the signal GP conditioned on the final per-point noise, the noise
/// function, and the final state snapshot.
#[derive(Debug, Clone)]
pub struct HeteroscedasticGP {
    signal: PosteriorPredictive,
    noise_fn: NoiseFunction,
    state: HeteroscedasticState,
    gp2_noise: f64,
}

impl HeteroscedasticGP {
    /// Condition both GPs from a state snapshot.
    ///
    /// # Errors
    /// Shape, noise and factorization errors from conditioning either GP.
    pub fn from_state(data: &GPData, state: HeteroscedasticState, gp2_noise: f64) -> GPResult<Self> {
        let signal = PosteriorPredictive::new(data, &state.noise, &state.gp1_hypers)?;
        let noise_data = data.with_labels(state.log_variance.clone())?;
        let noise_posterior =
            PosteriorPredictive::new(&noise_data, &NoiseModel::constant(gp2_noise)?, &state.gp2_hypers)?;
        Ok(Self { signal, noise_fn: NoiseFunction::new(noise_posterior), state, gp2_noise })
    }

    /// Signal mean, epistemic variance and aleatoric std at `x_star`.
    pub fn predict(&self, x_star: ArrayView2<'_, f64>) -> GPResult<HeteroscedasticPrediction> {
        let (mean, epistemic_variance, _) =
            self.signal.predict(x_star, CovarianceMode::Diagonal)?.into_parts();
        let aleatoric_std = self.noise_fn.std_dev(x_star)?;
        Ok(HeteroscedasticPrediction { mean, epistemic_variance, aleatoric_std })
    }

    pub fn state(&self) -> &HeteroscedasticState {
        &self.state
    }

    pub fn noise_function(&self) -> &NoiseFunction {
        &self.noise_fn
    }

    pub fn signal(&self) -> &PosteriorPredictive {
        &self.signal
    }

    /// Final noise standard deviations at the training points.
    pub fn noise(&self) -> &NoiseModel {
        &self.state.noise
    }

    pub fn gp2_noise(&self) -> f64 {
        self.gp2_noise
    }

    pub fn dim(&self) -> usize {
        self.signal.dim()
    }
}
