//! Multi-start maximization of an acquisition function over a box.
//!
//! Start points are drawn uniformly inside the bounds from the caller's
//! generator, all of them before any restart runs. Each restart maximizes
//! the acquisition with the bounded L-BFGS maximizer (finite-difference
//! gradients). The restarts are independent and run in parallel with rayon
//! unless disabled; the reduction keeps the smallest negative acquisition
//! strictly below `min_val`, ties broken by lexicographic location, so the
//! result does not depend on the order restarts finish in.
use std::cmp::Ordering;

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::Rng;
use rayon::prelude::*;

use crate::{
    acquisition::{
        errors::{AcqError, AcqResult},
        heteroscedastic::HeteroscedasticEI,
        homoscedastic::HomoscedasticEI,
        traits::{Acquisition, AcquisitionContext},
    },
    gp::{heteroscedastic::MLHGPOptions, kernel::KernelHyperparameters},
    optimization::{
        errors::{OptError, OptResult},
        maximizer::{BoxBounds, Objective, OptimOptions, OptimOutcome, Theta, maximize_bounded},
    },
};

/// Default number of restarts.
pub const DEFAULT_N_RESTARTS: usize = 25;

/// Default acceptance threshold on the negative acquisition.
pub const DEFAULT_MIN_VAL: f64 = 1.0;

/// Configuration for [`propose_location`].
///
/// - `n_restarts`: number of uniform start points (`≥ 1`).
/// - `min_val`: a restart is accepted only if its negative acquisition is
///   strictly below this value.
/// - `parallel`: dispatch restarts with rayon.
/// - `optim`: options for each local maximization.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposeOptions {
    pub n_restarts: usize,
    pub min_val: f64,
    pub parallel: bool,
    pub optim: OptimOptions,
}

impl ProposeOptions {
    /// # Errors
    /// - [`AcqError::InvalidRestartCount`] if `n_restarts == 0`.
    /// - [`AcqError::InvalidMinVal`] if `min_val` is NaN.
    pub fn new(n_restarts: usize, min_val: f64, parallel: bool, optim: OptimOptions) -> AcqResult<Self> {
        let opts = Self { n_restarts, min_val, parallel, optim };
        opts.validate()?;
        Ok(opts)
    }

    /// Check the fields, including those set through a struct literal.
    ///
    /// # Errors
    /// Same as [`ProposeOptions::new`].
    pub fn validate(&self) -> AcqResult<()> {
        if self.n_restarts == 0 {
            return Err(AcqError::InvalidRestartCount {
                n_restarts: self.n_restarts,
                reason: "At least one restart is required.",
            });
        }
        if self.min_val.is_nan() {
            return Err(AcqError::InvalidMinVal { min_val: self.min_val, reason: "Threshold must not be NaN." });
        }
        Ok(())
    }
}

impl Default for ProposeOptions {
    fn default() -> Self {
        Self {
            n_restarts: DEFAULT_N_RESTARTS,
            min_val: DEFAULT_MIN_VAL,
            parallel: true,
            optim: OptimOptions::default(),
        }
    }
}

/// Best accepted restart.
///
/// - `location`: proposed input, inside the bounds.
/// - `value`: negative acquisition at `location`.
/// - `restarts_run`: restarts that produced an outcome.
/// - `restarts_failed`: restarts skipped because their optimizer failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub location: Array1<f64>,
    pub value: f64,
    pub restarts_run: usize,
    pub restarts_failed: usize,
}

/// One-point view of an acquisition for the maximizer.
struct AcquisitionObjective<'a, A: Acquisition> {
    acq: &'a A,
}

impl<'a, A: Acquisition> Objective for AcquisitionObjective<'a, A> {
    type Data = ();

    fn value(&self, x: &Theta, _: &()) -> OptResult<f64> {
        let row = x.view().insert_axis(Axis(0));
        let values = self.acq.evaluate(row)?;
        values.first().copied().ok_or_else(|| OptError::InvalidModelInput {
            text: "acquisition returned no value".to_string(),
        })
    }

    fn check(&self, x: &Theta, _: &()) -> OptResult<()> {
        if x.len() != self.acq.dim() {
            return Err(OptError::DimensionMismatch {
                what: "start point",
                expected: self.acq.dim(),
                found: x.len(),
            });
        }
        Ok(())
    }
}

/// Validate `(low, high)` pairs and build the search box.
///
/// # Errors
/// - [`AcqError::EmptyBounds`] for an empty list.
/// - [`AcqError::InvalidBounds`] for a non-finite pair or `low >= high`.
pub fn search_box(bounds: &[(f64, f64)]) -> AcqResult<BoxBounds> {
    if bounds.is_empty() {
        return Err(AcqError::EmptyBounds);
    }
    for (index, &(low, high)) in bounds.iter().enumerate() {
        if !low.is_finite() || !high.is_finite() {
            return Err(AcqError::InvalidBounds { index, low, high, reason: "Bounds must be finite." });
        }
        if low >= high {
            return Err(AcqError::InvalidBounds { index, low, high, reason: "Lower bound must be below upper bound." });
        }
    }
    Ok(BoxBounds::new(bounds)?)
}

/// Draw `n` points uniformly inside `bounds`, one per row.
pub fn uniform_starts<R: Rng + ?Sized>(bounds: &BoxBounds, n: usize, rng: &mut R) -> Array2<f64> {
    let unit: Array2<f64> = Array2::random_using((n, bounds.dim()), Uniform::new(0.0, 1.0), rng);
    let width = &bounds.upper - &bounds.lower;
    unit * &width + &bounds.lower
}

/// Maximize `acq` inside `bounds` from `opts.n_restarts` random starts.
///
/// Returns `Ok(None)` when no restart reached a negative acquisition below
/// `opts.min_val` (including when every restart failed).
///
/// # Errors
/// - Bounds validation errors from [`search_box`].
/// - [`AcqError::QueryDimMismatch`] if `bounds` do not match `acq.dim()`.
/// - Fatal restart failures (shape errors, factorization failures); other
///   restart failures are counted and skipped.
pub fn propose_location<A: Acquisition, R: Rng + ?Sized>(
    acq: &A, bounds: &[(f64, f64)], opts: &ProposeOptions, rng: &mut R,
) -> AcqResult<Option<Proposal>> {
    opts.validate()?;
    let bounds = search_box(bounds)?;
    if bounds.dim() != acq.dim() {
        return Err(AcqError::QueryDimMismatch { expected: acq.dim(), found: bounds.dim() });
    }
    let starts: Vec<Array1<f64>> =
        uniform_starts(&bounds, opts.n_restarts, rng).outer_iter().map(|row| row.to_owned()).collect();

    let run = |(k, x0): (usize, &Array1<f64>)| -> (usize, OptResult<OptimOutcome>) {
        let objective = AcquisitionObjective { acq };
        let outcome = maximize_bounded(&objective, x0, &bounds, &(), &opts.optim);
        (k, outcome)
    };
    let outcomes: Vec<(usize, OptResult<OptimOutcome>)> = if opts.parallel {
        starts.par_iter().enumerate().map(run).collect()
    } else {
        starts.iter().enumerate().map(run).collect()
    };

    let mut best: Option<(Array1<f64>, f64)> = None;
    let mut restarts_failed = 0;
    for (k, outcome) in outcomes {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                let err = AcqError::from(err);
                if err.is_fatal() {
                    return Err(err);
                }
                log::debug!("restart {k} failed: {err}");
                restarts_failed += 1;
                continue;
            }
        };
        let value = -outcome.value;
        log::debug!(
            "restart {k}: value {value:.6e} at {:?} ({}, {} iterations)",
            outcome.theta_hat.as_slice(),
            outcome.status,
            outcome.iterations
        );
        if value >= opts.min_val {
            continue;
        }
        let better = match &best {
            None => true,
            Some((loc, v)) => candidate_order(value, &outcome.theta_hat, *v, loc) == Ordering::Less,
        };
        if better {
            best = Some((outcome.theta_hat, value));
        }
    }

    let restarts_run = opts.n_restarts - restarts_failed;
    if restarts_failed > 0 {
        log::warn!("{restarts_failed} of {} restarts failed", opts.n_restarts);
    }
    Ok(best.map(|(location, value)| Proposal { location, value, restarts_run, restarts_failed }))
}

/// Smaller value first, then lexicographically smaller location.
fn candidate_order(value: f64, location: &Array1<f64>, other_value: f64, other: &Array1<f64>) -> Ordering {
    value.total_cmp(&other_value).then_with(|| {
        location
            .iter()
            .zip(other.iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    })
}

/// Fit a homoscedastic EI on the context and propose its maximizer.
pub fn homoscedastic_propose_location<R: Rng + ?Sized>(
    ctx: &AcquisitionContext, bounds: &[(f64, f64)], opts: &ProposeOptions, rng: &mut R,
) -> AcqResult<Option<Proposal>> {
    let acq = HomoscedasticEI::fit(ctx)?;
    propose_location(&acq, bounds, opts, rng)
}

/// Fit a heteroscedastic EI on the context and propose its maximizer.
///
/// The same generator drives the heteroscedastic fit and then the start
/// points.
#[allow(clippy::too_many_arguments)]
pub fn heteroscedastic_propose_location<R: Rng + ?Sized>(
    ctx: &AcquisitionContext, gp2_init: &KernelHyperparameters, mlhgp: &MLHGPOptions, risk_averse: bool,
    bounds: &[(f64, f64)], opts: &ProposeOptions, rng: &mut R,
) -> AcqResult<Option<Proposal>> {
    let acq = HeteroscedasticEI::fit(ctx, gp2_init, mlhgp, risk_averse, rng)?;
    propose_location(&acq, bounds, opts, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayView2, array};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Bounds and option validation, including struct-literal options.
    // - Proposals staying inside the box for any restart count.
    // - Identical results with and without parallel restarts.
    // - Seed determinism for a single restart on [0, 10].
    // - The min_val threshold rejecting every restart.
    // -------------------------------------------------------------------------

    /// a(x) = 1 - Σ (x_i - c_i)², maximized at `c`.
    struct Peak {
        center: Array1<f64>,
    }

    impl Acquisition for Peak {
        fn dim(&self) -> usize {
            self.center.len()
        }

        fn evaluate(&self, x: ArrayView2<'_, f64>) -> AcqResult<Array1<f64>> {
            self.check_query(x)?;
            Ok(x.outer_iter().map(|row| 1.0 - (&row - &self.center).mapv(|d| d * d).sum()).collect())
        }
    }

    fn sequential(n_restarts: usize) -> ProposeOptions {
        ProposeOptions::new(n_restarts, DEFAULT_MIN_VAL, false, OptimOptions::default()).expect("valid")
    }

    #[test]
    // Purpose
    // -------
    // Bad boxes and restart counts are rejected before any work happens.
    fn invalid_bounds_and_options_are_rejected() {
        assert!(matches!(search_box(&[]), Err(AcqError::EmptyBounds)));
        assert!(matches!(search_box(&[(1.0, 1.0)]), Err(AcqError::InvalidBounds { index: 0, .. })));
        assert!(matches!(
            search_box(&[(0.0, 1.0), (0.0, f64::INFINITY)]),
            Err(AcqError::InvalidBounds { index: 1, .. })
        ));
        assert!(matches!(
            ProposeOptions::new(0, 1.0, true, OptimOptions::default()),
            Err(AcqError::InvalidRestartCount { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Options assembled with a struct literal are validated by
    // `propose_location` itself.
    //
    // Given
    // -----
    // - `n_restarts = 0` and, separately, a NaN `min_val`, set directly.
    //
    // Expect
    // ------
    // - Errors instead of a silent `None`.
    fn struct_literal_options_are_validated() {
        let acq = Peak { center: array![1.0] };
        let no_restarts = ProposeOptions { n_restarts: 0, ..ProposeOptions::default() };
        let nan_threshold = ProposeOptions { min_val: f64::NAN, ..ProposeOptions::default() };
        let mut rng = Xoshiro256Plus::seed_from_u64(9);

        let restarts_err = propose_location(&acq, &[(0.0, 2.0)], &no_restarts, &mut rng).expect_err("zero");
        let threshold_err = propose_location(&acq, &[(0.0, 2.0)], &nan_threshold, &mut rng).expect_err("NaN");

        assert!(matches!(restarts_err, AcqError::InvalidRestartCount { n_restarts: 0, .. }));
        assert!(matches!(threshold_err, AcqError::InvalidMinVal { .. }));
    }

    #[test]
    // Purpose
    // -------
    // The proposal lies inside the bounds and near the peak.
    //
    // Given
    // -----
    // - Peak centered at (2, -1) on [0, 5] × [-3, 3], 5 restarts, seed 1.
    fn proposal_is_within_bounds_and_near_optimum() {
        let acq = Peak { center: array![2.0, -1.0] };
        let bounds = [(0.0, 5.0), (-3.0, 3.0)];

        let proposal = propose_location(&acq, &bounds, &sequential(5), &mut Xoshiro256Plus::seed_from_u64(1))
            .expect("propose")
            .expect("a proposal");

        for (i, &(lo, hi)) in bounds.iter().enumerate() {
            assert!(proposal.location[i] >= lo && proposal.location[i] <= hi);
        }
        assert!((proposal.location[0] - 2.0).abs() < 1e-2, "{:?}", proposal.location);
        assert!((proposal.location[1] + 1.0).abs() < 1e-2, "{:?}", proposal.location);
        assert!(proposal.value < 0.0);
        assert_eq!(proposal.restarts_run + proposal.restarts_failed, 5);
    }

    #[test]
    // Purpose
    // -------
    // Any restart count, including one, yields a location inside the box,
    // even when the unconstrained optimum lies outside it.
    fn any_restart_count_stays_in_bounds() {
        let acq = Peak { center: array![12.0] };
        for n in [1, 2, 7] {
            let opts = ProposeOptions { min_val: f64::INFINITY, ..sequential(n) };
            let p = propose_location(&acq, &[(0.0, 10.0)], &opts, &mut Xoshiro256Plus::seed_from_u64(n as u64))
                .expect("propose")
                .expect("a proposal");
            assert!(p.location[0] >= 0.0 && p.location[0] <= 10.0, "{:?}", p.location);
        }
    }

    #[test]
    // Purpose
    // -------
    // Parallel and sequential dispatch agree for the same seed.
    fn parallel_and_sequential_agree() {
        let acq = Peak { center: array![0.3, 0.7] };
        let bounds = [(0.0, 1.0), (0.0, 1.0)];
        let parallel = ProposeOptions { parallel: true, ..sequential(8) };

        let a = propose_location(&acq, &bounds, &sequential(8), &mut Xoshiro256Plus::seed_from_u64(4)).expect("a");
        let b = propose_location(&acq, &bounds, &parallel, &mut Xoshiro256Plus::seed_from_u64(4)).expect("b");

        assert_eq!(a, b);
    }

    #[test]
    // Purpose
    // -------
    // One restart on [0, 10] with a fixed seed proposes the same location
    // on every run.
    fn single_restart_is_deterministic_for_a_seed() {
        let acq = Peak { center: array![3.0] };
        let opts = ProposeOptions::new(1, DEFAULT_MIN_VAL, true, OptimOptions::default()).expect("valid");

        let a = propose_location(&acq, &[(0.0, 10.0)], &opts, &mut Xoshiro256Plus::seed_from_u64(42)).expect("a");
        let b = propose_location(&acq, &[(0.0, 10.0)], &opts, &mut Xoshiro256Plus::seed_from_u64(42)).expect("b");

        assert_eq!(a.expect("proposal a").location, b.expect("proposal b").location);
    }

    #[test]
    // Purpose
    // -------
    // A threshold no restart can beat gives "no improvement found".
    fn threshold_can_reject_every_restart() {
        let acq = Peak { center: array![1.0] };
        let opts = ProposeOptions::new(3, -2.0, false, OptimOptions::default()).expect("valid");

        let out = propose_location(&acq, &[(0.0, 2.0)], &opts, &mut Xoshiro256Plus::seed_from_u64(0)).expect("ok");

        assert!(out.is_none());
    }

    #[test]
    // Purpose
    // -------
    // Bounds of the wrong dimension are a fatal error.
    fn bounds_dimension_mismatch_is_fatal() {
        let acq = Peak { center: array![1.0, 1.0] };
        let err = propose_location(&acq, &[(0.0, 2.0)], &sequential(2), &mut Xoshiro256Plus::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, AcqError::QueryDimMismatch { expected: 2, found: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Ties are broken by the lexicographically smaller location.
    fn ties_prefer_lexicographically_smaller_location() {
        let a = array![0.5, 1.0];
        let b = array![0.5, 2.0];
        assert_eq!(candidate_order(-1.0, &a, -1.0, &b), Ordering::Less);
        assert_eq!(candidate_order(-2.0, &b, -1.0, &a), Ordering::Less);
    }
}
