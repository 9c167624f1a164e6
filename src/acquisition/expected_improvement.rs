//! Expected Improvement from a Gaussian predictive distribution.
//!
//! For predictive mean `μ`, standard deviation `σ`, incumbent `f⁺` and
//! exploration offset `ξ ≥ 0`:
//!
//! ```text
//! imp = μ - f⁺ - ξ,   Z = imp / σ,   EI = imp · Φ(Z) + σ · φ(Z)
//! ```
//!
//! with `EI = 0` wherever `σ = 0`. `Φ` and `φ` are the standard normal CDF
//! and PDF from `statrs`.
use ndarray::{Array1, Zip};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::acquisition::errors::{AcqError, AcqResult};

/// Pointwise Expected Improvement over `incumbent`.
///
/// # Errors
/// - [`AcqError::LengthMismatch`] if `mean` and `std` differ in length.
/// - [`AcqError::InvalidXi`] if `xi` is negative or non-finite.
pub fn expected_improvement(
    mean: &Array1<f64>, std: &Array1<f64>, incumbent: f64, xi: f64,
) -> AcqResult<Array1<f64>> {
    if std.len() != mean.len() {
        return Err(AcqError::LengthMismatch { what: "predictive std", expected: mean.len(), found: std.len() });
    }
    if !xi.is_finite() || xi < 0.0 {
        return Err(AcqError::InvalidXi { xi, reason: "Exploration offset must be finite and non-negative." });
    }
    let normal = Normal::new(0.0, 1.0)?;
    let mut ei = Array1::zeros(mean.len());
    Zip::from(&mut ei).and(mean).and(std).for_each(|e, &mu, &sigma| {
        if sigma > 0.0 {
            let imp = mu - incumbent - xi;
            let z = imp / sigma;
            *e = imp * normal.cdf(z) + sigma * normal.pdf(z);
        }
    });
    Ok(ei)
}

/// Risk-averse adjustment: subtract the aleatoric std pointwise, then
/// re-zero wherever the predictive `std` is zero.
///
/// # Errors
/// [`AcqError::LengthMismatch`] if the three vectors differ in length.
pub fn risk_averse(ei: &Array1<f64>, aleatoric_std: &Array1<f64>, std: &Array1<f64>) -> AcqResult<Array1<f64>> {
    for (what, len) in [("aleatoric std", aleatoric_std.len()), ("predictive std", std.len())] {
        if len != ei.len() {
            return Err(AcqError::LengthMismatch { what, expected: ei.len(), found: len });
        }
    }
    let mut out = ei - aleatoric_std;
    Zip::from(&mut out).and(std).for_each(|e, &sigma| {
        if sigma <= 0.0 {
            *e = 0.0;
        }
    });
    Ok(out)
}

/// Largest predictive mean at the sample locations.
pub(crate) fn incumbent(mean_at_samples: &Array1<f64>) -> f64 {
    mean_at_samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
