//! maximizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the bounded
//! maximizer so the rest of the crate stays agnostic to `ndarray` and argmin
//! generics.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` are column vectors whose length is the number of
//!   free parameters (GP hyperparameters or acquisition query coordinates).
//! - `Cost` is the scalar argmin minimizes, always `c(θ) = -f(θ)`.
//! - `DEFAULT_LBFGS_MEM` is the history size used when options leave it
//!   unset.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same shape as `Theta`.
pub type Grad = Array1<f64>;

/// Scalar objective value handed to argmin.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
