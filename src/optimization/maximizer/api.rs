//! High-level entry point for maximizing a user-provided [`Objective`].
//!
//! Selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the objective in an `ArgMinAdapter` (which *minimizes*
//! `-f(θ)`), and delegates the run to `run_lbfgs`. A run that aborts (a
//! recoverable error, or argmin's `SolverExit`) is retried once with the other
//! line search; if that also aborts, the best iterate seen (or the starting
//! point) is returned as a non-converged outcome.
use crate::optimization::{
    errors::OptResult,
    maximizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, Objective, OptimOptions},
    },
};

/// Maximize an objective `f(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Runs L-BFGS with `opts.line_searcher`.
/// - On a non-fatal abort, logs a warning and retries once with
///   [`LineSearcher::alternate`]. An abort is either a recoverable error or a
///   run that argmin ends with `SolverExit` (how it reports line-search
///   failures such as a non-finite cost).
/// - If the retry aborts too, returns the best iterate either run reached
///   when it improves on `f(theta0)`, otherwise [`OptimOutcome::retained`];
///   both are reported as aborted and not converged.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates fatal errors ([`OptError::is_fatal`](crate::optimization::errors::OptError::is_fatal))
///   raised during either run.
/// - Propagates the error of evaluating `f(theta0)` when falling back.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use hetero_bo::optimization::errors::OptResult;
/// use hetero_bo::optimization::maximizer::{maximize, Objective, OptimOptions, Theta};
///
/// struct Concave;
/// impl Objective for Concave {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Concave, array![0.1, -0.2, 0.3], &(), &OptimOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), hetero_bo::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let (first, first_reason) = match attempt(f, &theta0, data, opts, opts.line_searcher)? {
        Attempt::Finished(outcome) => return Ok(outcome),
        Attempt::Aborted { partial, reason } => (partial, reason),
    };
    let alternate = opts.line_searcher.alternate();
    log::warn!("L-BFGS run aborted ({first_reason}); retrying with {alternate:?} line search");
    let (second, second_reason) = match attempt(f, &theta0, data, opts, alternate)? {
        Attempt::Finished(outcome) => return Ok(outcome),
        Attempt::Aborted { partial, reason } => (partial, reason),
    };
    let status = format!(
        "Aborted: {:?} ({first_reason}); {alternate:?} ({second_reason})",
        opts.line_searcher
    );
    let value0 = f.value(&theta0, data)?;
    let best = [first, second]
        .into_iter()
        .flatten()
        .filter(|outcome| outcome.value > value0)
        .max_by(|a, b| a.value.total_cmp(&b.value));
    match best {
        Some(mut outcome) => {
            log::warn!("L-BFGS retry aborted ({second_reason}); keeping the best iterate reached");
            outcome.converged = false;
            outcome.aborted = true;
            outcome.status = status;
            Ok(outcome)
        }
        None => {
            log::warn!("L-BFGS retry aborted ({second_reason}); keeping the starting point");
            OptimOutcome::retained(theta0, value0, status)
        }
    }
}

/// Result of one L-BFGS run, with recoverable failures folded into
/// `Aborted`.
enum Attempt {
    Finished(OptimOutcome),
    Aborted { partial: Option<OptimOutcome>, reason: String },
}

fn attempt<F: Objective>(
    f: &F, theta0: &Theta, data: &F::Data, opts: &OptimOptions, line_searcher: LineSearcher,
) -> OptResult<Attempt> {
    match run_with(f, theta0.clone(), data, opts, line_searcher) {
        Ok(outcome) if outcome.aborted => {
            Ok(Attempt::Aborted { reason: outcome.status.clone(), partial: Some(outcome) })
        }
        Ok(outcome) => Ok(Attempt::Finished(outcome)),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => Ok(Attempt::Aborted { partial: None, reason: err.to_string() }),
    }
}

fn run_with<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OptimOptions, line_searcher: LineSearcher,
) -> OptResult<OptimOutcome> {
    let problem = ArgMinAdapter::new(f, data);
    match line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
