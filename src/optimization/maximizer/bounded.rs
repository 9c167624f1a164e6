//! maximizer::bounded — box-constrained maximization via reparameterization.
//!
//! Purpose
//! -------
//! Maximize an [`Objective`] over a box `Π [lo_i, hi_i]` with the
//! unconstrained L-BFGS in [`maximize`]. Each coordinate is written as
//! `x_i = lo_i + (hi_i - lo_i)·σ(z_i)` and the solver works on `z`.
//!
//! Key behaviors
//! -------------
//! - [`BoxBounds`] validates and stores the box.
//! - [`BoundedObjective`] presents `g(z) = f(x(z))` to the solver and turns
//!   an analytic `∇f(x)` into `∇g(z)` through the diagonal Jacobian
//!   `dx_i/dz_i`. When `f` has no analytic gradient neither does `g`, and
//!   the adapter finite-differences `g` in `z`.
//! - [`maximize_bounded`] maps the start into `z`, runs the solver and maps
//!   the optimum back, so callers only ever see points inside the box.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every returned `theta_hat` satisfies `lo_i ≤ x_i ≤ hi_i`.
//! - Start points on or outside the boundary are pulled into the open box
//!   by the clamped logit; they never cause an error.
use ndarray::Zip;

use crate::optimization::{
    errors::{OptError, OptResult},
    maximizer::{
        Grad, OptimOptions, OptimOutcome, Theta, api::maximize, traits::Objective,
        validation::validate_bounds,
    },
    numerical_stability::{box_jacobian, from_box, to_box},
};

/// Validated per-coordinate `[lower, upper]` bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBounds {
    pub lower: Theta,
    pub upper: Theta,
}

impl BoxBounds {
    /// Build bounds from `(lower, upper)` pairs.
    ///
    /// # Errors
    /// - [`OptError::BoundsDimMismatch`] for an empty list.
    /// - [`OptError::InvalidBounds`] for a non-finite or unordered pair.
    pub fn new(bounds: &[(f64, f64)]) -> OptResult<Self> {
        validate_bounds(bounds)?;
        let lower = bounds.iter().map(|&(lo, _)| lo).collect();
        let upper = bounds.iter().map(|&(_, hi)| hi).collect();
        Ok(Self { lower, upper })
    }

    /// Same lower/upper pair for all `dim` coordinates.
    pub fn uniform(dim: usize, lower: f64, upper: f64) -> OptResult<Self> {
        Self::new(&vec![(lower, upper); dim])
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// `x(z)`, always inside the closed box.
    pub fn to_box(&self, z: &Theta) -> Theta {
        Zip::from(z)
            .and(&self.lower)
            .and(&self.upper)
            .map_collect(|&zi, &lo, &hi| to_box(zi, lo, hi))
    }

    /// `z(x)`, finite for any finite `x`.
    pub fn from_box(&self, x: &Theta) -> Theta {
        Zip::from(x)
            .and(&self.lower)
            .and(&self.upper)
            .map_collect(|&xi, &lo, &hi| from_box(xi, lo, hi))
    }

    /// Diagonal of `dx/dz` at `z`.
    pub fn jacobian(&self, z: &Theta) -> Theta {
        Zip::from(z)
            .and(&self.lower)
            .and(&self.upper)
            .map_collect(|&zi, &lo, &hi| box_jacobian(zi, lo, hi))
    }

    /// `true` if `x` has the box's dimension and lies inside it.
    pub fn contains(&self, x: &Theta) -> bool {
        x.len() == self.dim()
            && Zip::from(x)
                .and(&self.lower)
                .and(&self.upper)
                .all(|&xi, &lo, &hi| lo <= xi && xi <= hi)
    }

    fn check_dim(&self, found: usize) -> OptResult<()> {
        if found != self.dim() {
            return Err(OptError::BoundsDimMismatch { expected: self.dim(), found });
        }
        Ok(())
    }
}

/// An objective seen through the box reparameterization.
pub struct BoundedObjective<'a, F: Objective> {
    pub inner: &'a F,
    pub bounds: &'a BoxBounds,
}

impl<'a, F: Objective> BoundedObjective<'a, F> {
    pub fn new(inner: &'a F, bounds: &'a BoxBounds) -> Self {
        Self { inner, bounds }
    }
}

impl<'a, F: Objective> Objective for BoundedObjective<'a, F> {
    type Data = F::Data;

    fn value(&self, z: &Theta, data: &Self::Data) -> OptResult<f64> {
        self.inner.value(&self.bounds.to_box(z), data)
    }

    fn check(&self, z: &Theta, data: &Self::Data) -> OptResult<()> {
        self.bounds.check_dim(z.len())?;
        self.inner.check(&self.bounds.to_box(z), data)
    }

    fn grad(&self, z: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let x = self.bounds.to_box(z);
        let gx = self.inner.grad(&x, data)?;
        Ok(gx * self.bounds.jacobian(z))
    }
}

/// Maximize `f` over `bounds` starting from `x0`.
///
/// `x0` is mapped into the unconstrained space with the clamped logit,
/// [`maximize`] runs there (including its line-search fallback), and the
/// outcome's `theta_hat` is mapped back into the box. `value` and the
/// diagnostics are passed through unchanged.
///
/// # Errors
/// - [`OptError::BoundsDimMismatch`] if `x0.len() != bounds.dim()`.
/// - Anything [`maximize`] returns.
pub fn maximize_bounded<F: Objective>(
    f: &F, x0: &Theta, bounds: &BoxBounds, data: &F::Data, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    bounds.check_dim(x0.len())?;
    let objective = BoundedObjective::new(f, bounds);
    let z0 = bounds.from_box(x0);
    let mut outcome = maximize(&objective, z0, data, opts)?;
    outcome.theta_hat = bounds.to_box(&outcome.theta_hat);
    Ok(outcome)
}
