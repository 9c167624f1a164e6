//! maximizer — argmin-powered L-BFGS maximization, plain or box-bounded.
//!
//! Purpose
//! -------
//! Provide the single optimization engine the crate uses: GP hyperparameter
//! fitting maximizes a log marginal likelihood, and location proposal
//! maximizes an acquisition function. Callers implement [`Objective`] and
//! call [`maximize`] (unconstrained) or [`maximize_bounded`] (box
//! constraints).
//!
//! Key behaviors
//! -------------
//! - Convert objectives `f(θ)` into argmin cost functions `c(θ) = -f(θ)` via
//!   [`adapter::ArgMinAdapter`], with finite-difference gradients when no
//!   analytic gradient exists.
//! - Build L-BFGS with More–Thuente or Hager–Zhang line search
//!   ([`builders`]) and run it ([`run::run_lbfgs`]).
//! - Retry an aborted run once with the other line search, then fall back
//!   to the start point as a non-converged [`OptimOutcome`].
//! - Handle box constraints by the logistic reparameterization in
//!   [`bounded`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes**; objectives return `f` and `∇f`,
//!   never the cost.
//! - [`Objective::value`] and [`Objective::grad`] report invalid inputs as
//!   [`OptError`](crate::optimization::errors::OptError) values, not panics.
//! - `OptimOutcome::converged` is `true` only on tolerance-based
//!   termination.
//!
//! Conventions
//! -----------
//! - Parameters are [`Theta`] (`Array1<f64>`).
//! - Errors bubble up as `OptResult<T>`; nothing in this module panics on
//!   bad input.
//! - Warnings about aborted runs go through the `log` facade; the argmin
//!   slog observer is attached only with the `obs_slog` feature and
//!   `OptimOptions::verbose`.
//!
//! Downstream usage
//! ----------------
//! - `gp` implements [`Objective`] for the negative log marginal likelihood
//!   on hyperparameters and calls [`maximize_bounded`].
//! - `acquisition` implements [`Objective`] for expected improvement on the
//!   query point and calls [`maximize_bounded`] once per restart.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions in [`adapter`], solver
//!   wiring in [`builders`], option and outcome invariants in [`traits`],
//!   the fallback chain in [`api`], and the box map in [`bounded`].

pub mod adapter;
pub mod api;
pub mod bounded;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::bounded::{BoundedObjective, BoxBounds, maximize_bounded};
pub use self::traits::{LineSearcher, Objective, OptimOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::bounded::{BoxBounds, maximize_bounded};
    pub use super::traits::{LineSearcher, Objective, OptimOptions, OptimOutcome, Tolerances};
    pub use super::types::{Grad, Theta};
}
