//! The most-likely heteroscedastic GP iteration.
//!
//! One [`step`] turns a [`HeteroscedasticState`] into the next:
//!
//! 1. fit the signal GP on `(X, y)` under the current noise, warm-started
//!    from the previous signal hyperparameters;
//! 2. take its posterior mean and full covariance at `X`;
//! 3. draw `sample_size` posterior samples and form the log empirical
//!    variance `log((1 / 2S) Σ_j (y_i - s_ij)²)`;
//! 4. fit the noise GP on `(X, log-variance)` with fixed noise `gp2_noise`,
//!    warm-started from the previous noise hyperparameters;
//! 5. set the per-point noise to `sqrt(exp(μ_2(X)))`.
//!
//! [`fit_heteroscedastic`] runs `num_iters` steps (or fewer with a
//! convergence tolerance) and returns a [`HeteroscedasticGP`] ready to
//! predict.
use ndarray::Array2;
use rand::Rng;

use crate::gp::{
    data::GPData,
    errors::GPResult,
    heteroscedastic::{
        prediction::HeteroscedasticGP,
        sampling::{sample_mvn, variance_estimator},
        state::{HeteroscedasticState, MLHGPOptions},
    },
    homoscedastic::HomoscedasticGP,
    kernel::KernelHyperparameters,
    noise::NoiseModel,
    posterior::CovarianceMode,
};

/// Advance the procedure by one iteration.
///
/// # Errors
/// - [`MLHGPOptions::validate`] errors.
/// - [`GPError::InvalidDimensionality`](crate::gp::errors::GPError::InvalidDimensionality)
///   if `state` does not match `data`.
/// - [`GPError::NumericalInstability`](crate::gp::errors::GPError::NumericalInstability)
///   if a covariance cannot be factorized even with jitter.
/// - [`GPError::NegativeNoise`](crate::gp::errors::GPError::NegativeNoise)
///   if the updated noise overflows.
pub fn step<R: Rng + ?Sized>(
    state: &HeteroscedasticState, data: &GPData, opts: &MLHGPOptions, rng: &mut R,
) -> GPResult<HeteroscedasticState> {
    opts.validate()?;
    let signal = HomoscedasticGP::fit(data, &state.noise, &state.gp1_hypers, &opts.fit)?;
    let (mean, variance, cov) = signal.predict(data.x().view(), CovarianceMode::Full)?.into_parts();
    let cov = cov.unwrap_or_else(|| Array2::from_diag(&variance));

    let samples = sample_mvn(&mean, &cov, opts.sample_size, rng)?;
    let (var, clamped) = variance_estimator(data.y(), &samples, opts.variance_floor);
    if clamped > 0 {
        log::warn!(
            "iteration {}: {clamped} empirical variance(s) clamped to {:e}",
            state.iteration + 1,
            opts.variance_floor
        );
    }
    let log_variance = var.mapv(f64::ln);

    let noise_data = data.with_labels(log_variance.clone())?;
    let noise_gp = HomoscedasticGP::fit(
        &noise_data,
        &NoiseModel::constant(opts.gp2_noise)?,
        &state.gp2_hypers,
        &opts.fit,
    )?;
    let log_noise_var = noise_gp.posterior().predict_mean(data.x().view())?;
    let noise = NoiseModel::per_point(log_noise_var.mapv(|m| (0.5 * m).exp()))?;

    log::debug!(
        "iteration {}: signal nlml = {:.6}, noise nlml = {:.6}",
        state.iteration + 1,
        signal.fit_result().nlml,
        noise_gp.fit_result().nlml
    );
    Ok(HeteroscedasticState {
        gp1_hypers: signal.hypers().clone(),
        gp2_hypers: noise_gp.hypers().clone(),
        log_variance,
        noise,
        iteration: state.iteration + 1,
    })
}

/// Run the procedure from an initial noise model and hyperparameters.
///
/// Stops after `opts.num_iters` steps, or earlier when
/// `opts.convergence_tol` is set and the largest absolute change of the
/// log-variance estimator between two consecutive steps falls below it.
///
/// # Errors
/// - [`MLHGPOptions::validate`] errors.
/// - Anything [`HeteroscedasticState::initial`] or [`step`] returns.
pub fn fit_heteroscedastic<R: Rng + ?Sized>(
    data: &GPData, noise: NoiseModel, gp1_init: KernelHyperparameters,
    gp2_init: KernelHyperparameters, opts: &MLHGPOptions, rng: &mut R,
) -> GPResult<HeteroscedasticGP> {
    opts.validate()?;
    let mut state = HeteroscedasticState::initial(data, noise, gp1_init, gp2_init, opts)?;
    for _ in 0..opts.num_iters {
        let next = step(&state, data, opts, rng)?;
        let change = (&next.log_variance - &state.log_variance)
            .iter()
            .fold(0.0_f64, |acc, d| acc.max(d.abs()));
        let settled = state.iteration > 0 && opts.convergence_tol.is_some_and(|tol| change < tol);
        state = next;
        if settled {
            log::debug!("log-variance settled after {} iterations (change {change:e})", state.iteration);
            break;
        }
    }
    HeteroscedasticGP::from_state(data, state, opts.gp2_noise)
}
