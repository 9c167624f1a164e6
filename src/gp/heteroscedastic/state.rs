//! Options and per-iteration state of the most-likely heteroscedastic GP.
use ndarray::Array1;

use crate::gp::{
    data::GPData,
    errors::{GPError, GPResult},
    homoscedastic::GPFitOptions,
    kernel::KernelHyperparameters,
    noise::NoiseModel,
};

/// Configuration of the most-likely heteroscedastic GP procedure.
///
/// - `num_iters`: outer iterations (≥ 1).
/// - `sample_size`: posterior samples per iteration for the variance
///   estimator (≥ 1).
/// - `gp2_noise`: fixed noise standard deviation of the noise GP (≥ 0).
/// - `variance_floor`: lower clamp applied to the empirical variance before
///   the logarithm (> 0).
/// - `convergence_tol`: optional early stop once the largest change of the
///   log-variance estimator between consecutive iterations falls below it;
///   `None` runs exactly `num_iters` iterations.
/// - `fit`: hyperparameter box and optimizer options shared by both GPs.
///
/// Default: `num_iters = 10`, `sample_size = 100`, `gp2_noise = 1.0`,
/// `variance_floor = 1e-12`, `convergence_tol = None`, default fit options.
#[derive(Debug, Clone, PartialEq)]
pub struct MLHGPOptions {
    pub num_iters: usize,
    pub sample_size: usize,
    pub gp2_noise: f64,
    pub variance_floor: f64,
    pub convergence_tol: Option<f64>,
    pub fit: GPFitOptions,
}

/// Default empirical-variance floor.
pub const DEFAULT_VARIANCE_FLOOR: f64 = 1e-12;

impl MLHGPOptions {
    /// # Errors
    /// [`GPError::InvalidMLHGPOption`] for a zero count or a negative or
    /// non-finite `gp2_noise`.
    pub fn new(num_iters: usize, sample_size: usize, gp2_noise: f64) -> GPResult<Self> {
        let opts = Self { num_iters, sample_size, gp2_noise, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    /// Check every field, including those set through a struct literal.
    ///
    /// # Errors
    /// [`GPError::InvalidMLHGPOption`] naming the first offending field.
    pub fn validate(&self) -> GPResult<()> {
        if self.num_iters == 0 {
            return Err(GPError::InvalidMLHGPOption {
                name: "num_iters",
                value: 0.0,
                reason: "At least one iteration is required.",
            });
        }
        if self.sample_size == 0 {
            return Err(GPError::InvalidMLHGPOption {
                name: "sample_size",
                value: 0.0,
                reason: "At least one sample is required.",
            });
        }
        if !self.gp2_noise.is_finite() || self.gp2_noise < 0.0 {
            return Err(GPError::InvalidMLHGPOption {
                name: "gp2_noise",
                value: self.gp2_noise,
                reason: "Noise standard deviation must be finite and non-negative.",
            });
        }
        if !self.variance_floor.is_finite() || self.variance_floor <= 0.0 {
            return Err(GPError::InvalidMLHGPOption {
                name: "variance_floor",
                value: self.variance_floor,
                reason: "Variance floor must be finite and positive.",
            });
        }
        if let Some(t) = self.convergence_tol {
            if !t.is_finite() || t <= 0.0 {
                return Err(GPError::InvalidMLHGPOption {
                    name: "convergence_tol",
                    value: t,
                    reason: "Convergence tolerance must be finite and positive.",
                });
            }
        }
        Ok(())
    }

    /// # Errors
    /// [`GPError::InvalidMLHGPOption`] unless `floor` is finite and > 0.
    pub fn with_variance_floor(mut self, floor: f64) -> GPResult<Self> {
        if !floor.is_finite() || floor <= 0.0 {
            return Err(GPError::InvalidMLHGPOption {
                name: "variance_floor",
                value: floor,
                reason: "Variance floor must be finite and positive.",
            });
        }
        self.variance_floor = floor;
        Ok(self)
    }

    /// # Errors
    /// [`GPError::InvalidMLHGPOption`] unless `tol` is `None` or finite and > 0.
    pub fn with_convergence_tol(mut self, tol: Option<f64>) -> GPResult<Self> {
        if let Some(t) = tol {
            if !t.is_finite() || t <= 0.0 {
                return Err(GPError::InvalidMLHGPOption {
                    name: "convergence_tol",
                    value: t,
                    reason: "Convergence tolerance must be finite and positive.",
                });
            }
        }
        self.convergence_tol = tol;
        Ok(self)
    }

    pub fn with_fit_options(mut self, fit: GPFitOptions) -> Self {
        self.fit = fit;
        self
    }
}

impl Default for MLHGPOptions {
    fn default() -> Self {
        Self {
            num_iters: 10,
            sample_size: 100,
            gp2_noise: 1.0,
            variance_floor: DEFAULT_VARIANCE_FLOOR,
            convergence_tol: None,
            fit: GPFitOptions::default(),
        }
    }
}

/// Snapshot of the procedure after `iteration` steps.
///
/// Each step builds a new snapshot from the previous one; nothing is
/// updated in place.
///
/// - `gp1_hypers`: signal GP hyperparameters (warm start for the next fit).
/// - `gp2_hypers`: noise GP hyperparameters (warm start for the next fit).
/// - `log_variance`: log empirical variance at each training point.
/// - `noise`: noise standard deviations used by the next signal fit.
/// - `iteration`: completed steps (0 for the initial snapshot).
#[derive(Debug, Clone, PartialEq)]
pub struct HeteroscedasticState {
    pub gp1_hypers: KernelHyperparameters,
    pub gp2_hypers: KernelHyperparameters,
    pub log_variance: Array1<f64>,
    pub noise: NoiseModel,
    pub iteration: usize,
}

impl HeteroscedasticState {
    /// Initial snapshot: the caller's noise and hyperparameters, with the
    /// log-variance set to `log(max(σ_n², variance_floor))`.
    ///
    /// # Errors
    /// - [`GPError::InvalidDimensionality`] if either hyperparameter set or
    ///   the noise vector does not match `data`.
    /// - Noise validation errors.
    pub fn initial(
        data: &GPData, noise: NoiseModel, gp1_hypers: KernelHyperparameters,
        gp2_hypers: KernelHyperparameters, opts: &MLHGPOptions,
    ) -> GPResult<Self> {
        noise.validate_for(data.n())?;
        for (what, h) in [("signal GP lengthscales", &gp1_hypers), ("noise GP lengthscales", &gp2_hypers)] {
            if h.dim() != data.dim() {
                return Err(GPError::InvalidDimensionality { what, expected: data.dim(), found: h.dim() });
            }
        }
        let floor = opts.variance_floor;
        let log_variance = noise.variances(data.n()).mapv(|v| v.max(floor).ln());
        Ok(Self { gp1_hypers, gp2_hypers, log_variance, noise, iteration: 0 })
    }
}
