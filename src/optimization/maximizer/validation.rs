//! Validation helpers for objective maximization.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`].
//! - **Gradient validation**: [`validate_grad`] enforces dimension and
//!   finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`].
//! - **Objective values**: [`validate_value`].
//! - **Box bounds**: [`validate_bounds`] checks every `[lower, upper]` pair.
use crate::optimization::{
    errors::{OptError, OptResult},
    maximizer::{Grad, Theta},
};

/// Validate the optional gradient‐norm tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost‐change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate a list of `(lower, upper)` box bounds.
///
/// Each pair must be finite with `lower < upper`; the list must not be empty.
///
/// # Errors
/// - [`OptError::BoundsDimMismatch`] for an empty list.
/// - [`OptError::InvalidBounds`] for the first offending pair.
pub fn validate_bounds(bounds: &[(f64, f64)]) -> OptResult<()> {
    if bounds.is_empty() {
        return Err(OptError::BoundsDimMismatch { expected: 1, found: 0 });
    }
    for (index, &(lower, upper)) in bounds.iter().enumerate() {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(OptError::InvalidBounds {
                index,
                lower,
                upper,
                reason: "Bounds must be finite.",
            });
        }
        if lower >= upper {
            return Err(OptError::InvalidBounds {
                index,
                lower,
                upper,
                reason: "Lower bound must be strictly below the upper bound.",
            });
        }
    }
    Ok(())
}
