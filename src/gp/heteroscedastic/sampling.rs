//! Multivariate-normal sampling and the empirical variance estimator.
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::{RandomExt, rand_distr::StandardNormal};
use rand::Rng;

use crate::gp::{
    errors::{GPError, GPResult},
    linalg::CholeskyFactor,
};

/// Draw `n_samples` columns from `N(mean, cov)`.
///
/// Uses `mean + L Z` with `L` the (jittered) Cholesky factor of `cov` and
/// `Z` standard normal draws from `rng`. The result is `n × n_samples`.
///
/// # Errors
/// - [`GPError::InvalidDimensionality`] if `cov` is not `n × n`.
/// - [`GPError::NumericalInstability`] if `cov` cannot be factorized.
pub fn sample_mvn<R: Rng + ?Sized>(
    mean: &Array1<f64>, cov: &Array2<f64>, n_samples: usize, rng: &mut R,
) -> GPResult<Array2<f64>> {
    let n = mean.len();
    if cov.dim() != (n, n) {
        return Err(GPError::InvalidDimensionality { what: "sample covariance", expected: n, found: cov.nrows() });
    }
    let l = CholeskyFactor::new(cov)?.lower();
    let z: Array2<f64> = Array2::random_using((n, n_samples), StandardNormal, rng);
    Ok(l.dot(&z) + &mean.view().insert_axis(Axis(1)))
}

/// Empirical noise variance `var_i = (1 / 2S) Σ_j (y_i - s_ij)²`, clamped
/// below at `floor`.
///
/// Returns the clamped estimator and how many entries were clamped
/// (non-finite entries count as clamped).
pub fn variance_estimator(y: &Array1<f64>, samples: &Array2<f64>, floor: f64) -> (Array1<f64>, usize) {
    let s = samples.ncols() as f64;
    let residual = samples - &y.view().insert_axis(Axis(1));
    let raw = residual.mapv(|r| r * r).sum_axis(Axis(1)) * (0.5 / s);
    let mut clamped = 0;
    let var = raw.mapv(|v| {
        if v.is_finite() && v >= floor {
            v
        } else {
            clamped += 1;
            floor
        }
    });
    (var, clamped)
}
