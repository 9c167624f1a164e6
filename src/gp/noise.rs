//! Observation noise models.
//!
//! Noise is always expressed as a **standard deviation** `σ_n`; the matrix
//! added to the kernel is `N = diag(σ_n²)`.
use ndarray::Array1;

use crate::gp::errors::{GPError, GPResult};

/// Constant or per-training-point noise standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseModel {
    /// Same `σ_n` at every training point (homoscedastic).
    Constant(f64),
    /// One `σ_n` per training point (heteroscedastic).
    PerPoint(Array1<f64>),
}

impl NoiseModel {
    /// # Errors
    /// [`GPError::NegativeNoise`] if `std` is negative or non-finite.
    pub fn constant(std: f64) -> GPResult<Self> {
        check_std(0, std)?;
        Ok(NoiseModel::Constant(std))
    }

    /// # Errors
    /// [`GPError::NegativeNoise`] for the first negative or non-finite entry.
    pub fn per_point(stds: Array1<f64>) -> GPResult<Self> {
        for (index, &value) in stds.iter().enumerate() {
            check_std(index, value)?;
        }
        Ok(NoiseModel::PerPoint(stds))
    }

    /// Check the model against `n` training points.
    ///
    /// # Errors
    /// - [`GPError::InvalidDimensionality`] if a per-point vector has the
    ///   wrong length.
    /// - [`GPError::NegativeNoise`] for invalid values (variants can be
    ///   built directly, bypassing the constructors).
    pub fn validate_for(&self, n: usize) -> GPResult<()> {
        match self {
            NoiseModel::Constant(std) => check_std(0, *std),
            NoiseModel::PerPoint(stds) => {
                if stds.len() != n {
                    return Err(GPError::InvalidDimensionality {
                        what: "noise vector",
                        expected: n,
                        found: stds.len(),
                    });
                }
                for (index, &value) in stds.iter().enumerate() {
                    check_std(index, value)?;
                }
                Ok(())
            }
        }
    }

    /// Diagonal of `N` for `n` training points.
    pub fn variances(&self, n: usize) -> Array1<f64> {
        match self {
            NoiseModel::Constant(std) => Array1::from_elem(n, std * std),
            NoiseModel::PerPoint(stds) => stds.mapv(|s| s * s),
        }
    }

    /// Noise standard deviations broadcast to `n` training points.
    pub fn std_devs(&self, n: usize) -> Array1<f64> {
        match self {
            NoiseModel::Constant(std) => Array1::from_elem(n, *std),
            NoiseModel::PerPoint(stds) => stds.clone(),
        }
    }
}

fn check_std(index: usize, value: f64) -> GPResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GPError::NegativeNoise { index, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Noise values are standard deviations: `variances` squares them and
    // invalid values are rejected.
    fn noise_model_squares_stds_and_rejects_negatives() {
        let c = NoiseModel::constant(0.1).expect("valid");
        assert!((c.variances(3)[2] - 0.01).abs() < 1e-15);

        let p = NoiseModel::per_point(array![0.0, 2.0]).expect("valid");
        assert_eq!(p.variances(2), array![0.0, 4.0]);
        assert!(p.validate_for(3).is_err());

        assert!(matches!(NoiseModel::constant(-1.0), Err(GPError::NegativeNoise { .. })));
        assert!(matches!(
            NoiseModel::per_point(array![0.1, f64::NAN]),
            Err(GPError::NegativeNoise { index: 1, .. })
        ));
    }
}
