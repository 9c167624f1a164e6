//! acquisition — Expected Improvement and location proposals.
//!
//! Purpose
//! -------
//! Turn a GP surrogate of the samples seen so far into the next point to
//! evaluate. Surrogates are fitted once per acquisition; the fitted
//! acquisition is then maximized over a box from many random starts.
//!
//! Key behaviors
//! -------------
//! - [`expected_improvement`](expected_improvement::expected_improvement):
//!   the EI formula with an optional exploration offset, zero where the
//!   predictive std is zero.
//! - [`HomoscedasticEI`] / [`HeteroscedasticEI`]: fitted acquisitions
//!   implementing [`Acquisition`]; the heteroscedastic one optionally
//!   penalizes noisy regions (risk averse).
//! - [`propose_location`]: multi-start bounded maximization with a
//!   deterministic reduction; [`homoscedastic_propose_location`] and
//!   [`heteroscedastic_propose_location`] fit and propose in one call.
//!
//! Invariants & assumptions
//! ------------------------
//! - The incumbent is the largest predictive mean at the sample locations,
//!   for both surrogates.
//! - Heteroscedastic EI uses `sqrt(epistemic + aleatoric²)` as its std.
//! - Proposals always lie inside the bounds; `None` means no restart beat
//!   `min_val`.
//! - Randomness comes only from the caller's generator, and start points
//!   are drawn before any restart runs, so parallel and sequential runs
//!   agree for a seed.
//!
//! Conventions
//! -----------
//! - Query batches are `m × d` matrices; acquisition values are length `m`.
//! - Proposal values are *negative* acquisition values (smaller is better).

pub mod errors;
pub mod expected_improvement;
pub mod heteroscedastic;
pub mod homoscedastic;
pub mod propose;
pub mod traits;

pub use self::errors::{AcqError, AcqResult};
pub use self::expected_improvement::{expected_improvement, risk_averse};
pub use self::heteroscedastic::{HeteroscedasticEI, heteroscedastic_expected_improvement};
pub use self::homoscedastic::{HomoscedasticEI, homoscedastic_expected_improvement};
pub use self::propose::{
    DEFAULT_MIN_VAL, DEFAULT_N_RESTARTS, Proposal, ProposeOptions, heteroscedastic_propose_location,
    homoscedastic_propose_location, propose_location,
};
pub use self::traits::{Acquisition, AcquisitionContext};
