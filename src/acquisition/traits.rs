//! The [`Acquisition`] interface and the [`AcquisitionContext`] surrogates
//! are fitted from.
use ndarray::{Array1, Array2, ArrayView2};

use crate::{
    acquisition::errors::{AcqError, AcqResult},
    gp::{
        data::GPData, errors::GPError, homoscedastic::GPFitOptions, kernel::KernelHyperparameters, noise::NoiseModel,
    },
};

/// A fitted acquisition function.
///
/// Implementors fit their surrogate once at construction and are immutable
/// afterwards, so `evaluate` is deterministic and may be called from several
/// threads at once.
pub trait Acquisition: Sync {
    /// Input dimension of the query points.
    fn dim(&self) -> usize;

    /// Acquisition value at each row of `x` (`m × dim`).
    fn evaluate(&self, x: ArrayView2<'_, f64>) -> AcqResult<Array1<f64>>;

    /// Reject query batches of the wrong width.
    fn check_query(&self, x: ArrayView2<'_, f64>) -> AcqResult<()> {
        if x.ncols() != self.dim() {
            return Err(AcqError::QueryDimMismatch { expected: self.dim(), found: x.ncols() });
        }
        Ok(())
    }
}

/// Observations and initial settings shared by every surrogate fit.
///
/// - `data`: sample locations and observed values.
/// - `noise`: observation noise standard deviation(s).
/// - `init`: initial signal-GP hyperparameters.
/// - `fit`: hyperparameter fit options.
/// - `xi`: exploration offset subtracted from the improvement (default 0).
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionContext {
    pub data: GPData,
    pub noise: NoiseModel,
    pub init: KernelHyperparameters,
    pub fit: GPFitOptions,
    pub xi: f64,
}

impl AcquisitionContext {
    /// # Errors
    /// - Data validation errors from [`GPData::new`].
    /// - [`GPError::InvalidDimensionality`](crate::gp::errors::GPError::InvalidDimensionality)
    ///   if the noise or the initial lengthscales do not fit the samples.
    pub fn new(
        x_sample: Array2<f64>, y_sample: Array1<f64>, noise: NoiseModel, init: KernelHyperparameters,
    ) -> AcqResult<Self> {
        let data = GPData::new(x_sample, y_sample)?;
        noise.validate_for(data.n())?;
        if init.dim() != data.dim() {
            return Err(GPError::InvalidDimensionality {
                what: "initial lengthscales",
                expected: data.dim(),
                found: init.dim(),
            }
            .into());
        }
        Ok(Self { data, noise, init, fit: GPFitOptions::default(), xi: 0.0 })
    }

    pub fn with_fit_options(mut self, fit: GPFitOptions) -> Self {
        self.fit = fit;
        self
    }

    /// # Errors
    /// [`AcqError::InvalidXi`] unless `xi` is finite and `≥ 0`.
    pub fn with_xi(mut self, xi: f64) -> AcqResult<Self> {
        if !xi.is_finite() || xi < 0.0 {
            return Err(AcqError::InvalidXi { xi, reason: "Exploration offset must be finite and non-negative." });
        }
        self.xi = xi;
        Ok(self)
    }

    pub fn dim(&self) -> usize {
        self.data.dim()
    }
}
