//! gp::kernel — squared-exponential (ARD) covariance.
//!
//! Purpose
//! -------
//! Build covariance matrices
//! `k(a, b) = σ_f² · exp(-½ Σ_i ((a_i - b_i) / l_i)²)`
//! between two point sets, and hold the hyperparameters `(l_1..l_d, σ_f)`.
//!
//! Key behaviors
//! -------------
//! - [`se_kernel`] computes the full cross-covariance from lengthscale-scaled
//!   inputs via `‖a‖² + ‖b‖² - 2 a·bᵀ`, clamped at zero, with one matrix
//!   product instead of per-pair loops.
//! - [`se_kernel_diag`] returns the prior variance `σ_f²` for each query point.
//! - [`squared_differences`] gives the per-dimension matrices
//!   `D_k[i, j] = (x_ik - x_jk)²` used by the analytic likelihood gradient.
//!
//! Invariants & assumptions
//! ------------------------
//! - Lengthscales and `σ_f` are finite and strictly positive
//!   (enforced by [`KernelHyperparameters::new`]).
//! - `k(X, X)` is symmetric with diagonal exactly `σ_f²`.
//!
//! Conventions
//! -----------
//! - Point sets are row-major: one point per row.
//! - Optimizer packing is `θ = (l_1, …, l_d, σ_f)`.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};

use crate::gp::errors::{GPError, GPResult};

/// Lengthscales (one per input dimension) and signal amplitude `σ_f`.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelHyperparameters {
    lengthscales: Array1<f64>,
    sigma_f: f64,
}

impl KernelHyperparameters {
    /// # Errors
    /// [`GPError::InvalidHyperparameter`] if there are no lengthscales or any
    /// value is non-finite or ≤ 0.
    pub fn new(lengthscales: Array1<f64>, sigma_f: f64) -> GPResult<Self> {
        if lengthscales.is_empty() {
            return Err(GPError::InvalidHyperparameter {
                name: "lengthscales",
                value: 0.0,
                reason: "At least one lengthscale is required.",
            });
        }
        for &l in lengthscales.iter() {
            check_positive("lengthscale", l)?;
        }
        check_positive("sigma_f", sigma_f)?;
        Ok(Self { lengthscales, sigma_f })
    }

    /// Same lengthscale `l` broadcast across `dim` input dimensions.
    pub fn isotropic(dim: usize, l: f64, sigma_f: f64) -> GPResult<Self> {
        Self::new(Array1::from_elem(dim, l), sigma_f)
    }

    /// Unpack `θ = (l_1, …, l_d, σ_f)`.
    ///
    /// # Errors
    /// - [`GPError::InvalidDimensionality`] if `θ.len() != dim + 1`.
    /// - Anything [`KernelHyperparameters::new`] returns.
    pub fn from_theta(theta: ArrayView1<'_, f64>, dim: usize) -> GPResult<Self> {
        if theta.len() != dim + 1 {
            return Err(GPError::InvalidDimensionality {
                what: "hyperparameter vector",
                expected: dim + 1,
                found: theta.len(),
            });
        }
        Self::new(theta.slice(ndarray::s![..dim]).to_owned(), theta[dim])
    }

    /// Pack into `θ = (l_1, …, l_d, σ_f)`.
    pub fn to_theta(&self) -> Array1<f64> {
        let mut theta = Array1::zeros(self.dim() + 1);
        theta.slice_mut(ndarray::s![..self.dim()]).assign(&self.lengthscales);
        theta[self.dim()] = self.sigma_f;
        theta
    }

    pub fn dim(&self) -> usize {
        self.lengthscales.len()
    }

    pub fn lengthscales(&self) -> &Array1<f64> {
        &self.lengthscales
    }

    pub fn sigma_f(&self) -> f64 {
        self.sigma_f
    }

    /// Prior variance `σ_f²`.
    pub fn signal_variance(&self) -> f64 {
        self.sigma_f * self.sigma_f
    }
}

fn check_positive(name: &'static str, value: f64) -> GPResult<()> {
    if !value.is_finite() {
        return Err(GPError::InvalidHyperparameter { name, value, reason: "Must be finite." });
    }
    if value <= 0.0 {
        return Err(GPError::InvalidHyperparameter { name, value, reason: "Must be positive." });
    }
    Ok(())
}

/// Cross-covariance `K[i, j] = k(a_i, b_j)`.
///
/// # Errors
/// [`GPError::InvalidDimensionality`] if either point set does not have
/// `hypers.dim()` columns.
pub fn se_kernel(
    a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, hypers: &KernelHyperparameters,
) -> GPResult<Array2<f64>> {
    check_columns("first point set", a, hypers.dim())?;
    check_columns("second point set", b, hypers.dim())?;

    let a_scaled = &a / hypers.lengthscales();
    let b_scaled = &b / hypers.lengthscales();
    let a_sq = a_scaled.mapv(|v| v * v).sum_axis(Axis(1));
    let b_sq = b_scaled.mapv(|v| v * v).sum_axis(Axis(1));
    let mut k = a_scaled.dot(&b_scaled.t());

    let variance = hypers.signal_variance();
    Zip::indexed(&mut k).for_each(|(i, j), cross| {
        let sqdist = (a_sq[i] + b_sq[j] - 2.0 * *cross).max(0.0);
        *cross = variance * (-0.5 * sqdist).exp();
    });
    Ok(k)
}

/// Prior variances `k(x, x) = σ_f²` for `n` points.
pub fn se_kernel_diag(n: usize, hypers: &KernelHyperparameters) -> Array1<f64> {
    Array1::from_elem(n, hypers.signal_variance())
}

/// Per-dimension squared differences `D_k[i, j] = (x_ik - x_jk)²`.
pub fn squared_differences(x: ArrayView2<'_, f64>) -> Vec<Array2<f64>> {
    let n = x.nrows();
    x.axis_iter(Axis(1))
        .map(|col| Array2::from_shape_fn((n, n), |(i, j)| (col[i] - col[j]).powi(2)))
        .collect()
}

fn check_columns(what: &'static str, x: ArrayView2<'_, f64>, dim: usize) -> GPResult<()> {
    if x.ncols() != dim {
        return Err(GPError::InvalidDimensionality { what, expected: dim, found: x.ncols() });
    }
    Ok(())
}
