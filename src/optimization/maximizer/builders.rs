//! maximizer::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Build L-BFGS solvers for either line search with the crate's numeric
//! types and apply the tolerances from [`OptimOptions`]. Initial parameters
//! and the iteration cap are runtime concerns applied by
//! [`run_lbfgs`](crate::optimization::maximizer::run::run_lbfgs).
//!
//! Conventions
//! -----------
//! - History size is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - Tolerances argmin rejects surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<argmin::core::Error>` conversion.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    maximizer::{
        traits::OptimOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
};

/// L-BFGS with Hager–Zhang line search and the configured tolerances.
pub fn build_optimizer_hager_zhang(opts: &OptimOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with More–Thuente line search and the configured tolerances.
pub fn build_optimizer_more_thuente(opts: &OptimOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient and cost-change tolerances to an L-BFGS solver,
/// whatever its line search. `None` leaves argmin's default in place.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OptimOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::maximizer::traits::{LineSearcher, Tolerances};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover solver construction for both line searches, with and
    // without an explicit L-BFGS memory, and tolerance wiring. Executor
    // behavior is covered by the runner and bounded-maximizer tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both builders succeed with default memory and valid tolerances.
    fn builders_succeed_with_default_memory() {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).expect("valid tolerances");
        let hz = OptimOptions::new(tols, LineSearcher::HagerZhang, None).expect("valid options");
        let mt = OptimOptions::new(tols, LineSearcher::MoreThuente, None).expect("valid options");

        assert!(build_optimizer_hager_zhang(&hz).is_ok());
        assert!(build_optimizer_more_thuente(&mt).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // An explicit history size is accepted by both builders.
    fn builders_respect_explicit_memory() {
        let tols = Tolerances::new(Some(1e-6), None, Some(25)).expect("valid tolerances");
        let opts = OptimOptions::new(tols, LineSearcher::HagerZhang, Some(11)).expect("valid");

        assert!(build_optimizer_hager_zhang(&opts).is_ok());
        assert!(build_optimizer_more_thuente(&opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Absent tolerances keep argmin defaults and still build.
    fn configure_lbfgs_respects_absent_tolerances() {
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).expect("valid tolerances");
        let opts = OptimOptions::new(tols, LineSearcher::MoreThuente, None).expect("valid");

        assert!(configure_lbfgs(raw, &opts).is_ok());
    }
}
