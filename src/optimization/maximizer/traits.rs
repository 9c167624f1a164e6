//! Public API surface for objective maximization.
//!
//! - [`Objective`]: trait implemented by everything the crate maximizes
//!   (GP log marginal likelihoods, acquisition functions).
//! - [`OptimOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by the maximizers.
//!
//! Convention: we *maximize* an objective `f(θ)` by minimizing the cost
//! `c(θ) = -f(θ)`. If an analytic gradient is provided, it should be the
//! gradient of the objective (`∇f(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    maximizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented objective interface.
///
/// You maximize `f(θ)`; internally we minimize the cost `c(θ) = -f(θ)`.
/// If you provide an analytic gradient, return `∇f(θ)` (the adapter flips
/// the sign to match the cost).
///
/// - `type Data`: payload carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `f(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject obviously invalid
///   `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇f(θ)`.
///   If not implemented, finite differences are used automatically.
pub trait Objective {
    type Data;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`). Unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl LineSearcher {
    /// The other line search, used as a one-shot fallback when a run aborts.
    pub fn alternate(self) -> Self {
        match self {
            LineSearcher::MoreThuente => LineSearcher::HagerZhang,
            LineSearcher::HagerZhang => LineSearcher::MoreThuente,
        }
    }
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an argmin slog observer (behind
///   the `obs_slog` feature).
/// - `lbfgs_mem: Option<usize>` — L-BFGS history, `None` uses
///   [`DEFAULT_LBFGS_MEM`](crate::optimization::maximizer::DEFAULT_LBFGS_MEM).
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = 1e-10`, `max_iter = 200`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl OptimOptions {
    /// Create a new set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem })
    }

    /// Toggle the argmin observer.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for OptimOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: Some(1e-10), max_iter: Some(200) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by the maximizers.
///
/// - `theta_hat`: best parameter vector found (in the caller's space; the
///   bounded maximizer maps it back into the box).
/// - `value`: best **objective** value `f(θ̂)` (not the cost).
/// - `converged`: `true` only when the solver stopped on a tolerance; an
///   exhausted iteration budget or an aborted run leaves it `false`.
/// - `aborted`: `true` when the solver exited early on its own (argmin's
///   `SolverExit`, e.g. a line search hitting a non-finite cost) or when the
///   maximizer fell back to an earlier iterate.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub aborted: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, aborted, status) = match &termination {
            TerminationStatus::NotTerminated => (false, false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                let aborted = matches!(reason, TerminationReason::SolverExit(_));
                (converged, aborted, format!("{reason:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, aborted, status, iterations, fn_evals, grad_norm })
    }

    /// Outcome for a run that aborted before producing an iterate: the
    /// starting point is retained and reported as not converged.
    pub fn retained(theta_hat: Theta, value: f64, status: String) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(Some(theta_hat))?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            converged: false,
            aborted: true,
            status,
            iterations: 0,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation rules of `Tolerances::new` and `OptimOptions::new`.
    // - Line-search parsing and the alternate fallback.
    // - Mapping of argmin termination states onto `converged`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // At least one stopping rule must be configured.
    //
    // Expect
    // ------
    // - All-`None` tolerances are rejected with `NoTolerancesProvided`.
    fn tolerances_reject_all_none() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
    }

    #[test]
    // Purpose
    // -------
    // Non-positive or zero limits are configuration errors.
    //
    // Expect
    // ------
    // - Negative `tol_grad`, NaN `tol_cost` and `max_iter == 0` are rejected.
    fn tolerances_reject_invalid_values() {
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(Tolerances::new(None, None, Some(0)), Err(OptError::InvalidMaxIter { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Zero L-BFGS memory cannot build a solver.
    //
    // Expect
    // ------
    // - `OptimOptions::new` returns `InvalidLBFGSMem` for `Some(0)`.
    fn optim_options_reject_zero_memory() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");
        let res = OptimOptions::new(tols, LineSearcher::MoreThuente, Some(0));
        assert!(matches!(res, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
    }

    #[test]
    // Purpose
    // -------
    // Names parse case-insensitively and the fallback swaps searchers.
    fn line_searcher_parses_and_alternates() {
        assert_eq!("hagerZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!("backtracking".parse::<LineSearcher>().is_err());
        assert_eq!(LineSearcher::MoreThuente.alternate(), LineSearcher::HagerZhang);
        assert_eq!(LineSearcher::HagerZhang.alternate(), LineSearcher::MoreThuente);
    }

    #[test]
    // Purpose
    // -------
    // Running out of iterations is not convergence.
    //
    // Given
    // -----
    // - Termination by `MaxItersReached` and by `SolverConverged`.
    //
    // Expect
    // ------
    // - Only the latter reports `converged == true`.
    fn outcome_distinguishes_max_iters_from_convergence() {
        let theta = Theta::from(vec![1.0, 2.0]);
        let capped = OptimOutcome::new(
            Some(theta.clone()),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            10,
            FnEvalMap::new(),
            None,
        )
        .expect("valid outcome");
        let converged = OptimOutcome::new(
            Some(theta),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            3,
            FnEvalMap::new(),
            Some(Grad::from(vec![3.0, 4.0])),
        )
        .expect("valid outcome");

        assert!(!capped.converged);
        assert!(!capped.aborted);
        assert!(converged.converged);
        assert_eq!(converged.grad_norm, Some(5.0));
    }

    #[test]
    // Purpose
    // -------
    // A solver that exits on its own (argmin reports line-search failures
    // this way rather than as an error) is flagged as aborted.
    //
    // Expect
    // ------
    // - `aborted == true`, `converged == false`, the reason kept in `status`.
    fn outcome_flags_solver_exit_as_aborted() {
        let out = OptimOutcome::new(
            Some(Theta::from(vec![0.0])),
            -1.0,
            TerminationStatus::Terminated(TerminationReason::SolverExit(
                "Line search terminated with: 'Non-finite cost value: NaN'".to_string(),
            )),
            1,
            FnEvalMap::new(),
            None,
        )
        .expect("valid outcome");

        assert!(out.aborted);
        assert!(!out.converged);
        assert!(out.status.contains("Non-finite cost"));
    }
}
