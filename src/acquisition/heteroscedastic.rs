//! Expected Improvement on a most-likely heteroscedastic GP surrogate.
//!
//! The predictive std used in EI is `sqrt(epistemic + aleatoric²)`, the
//! spread of a new noisy observation. With `risk_averse` set, the learned
//! aleatoric std is subtracted from EI so that noisy regions are penalized.
use ndarray::{Array1, ArrayView2};
use rand::Rng;

use crate::{
    acquisition::{
        errors::AcqResult,
        expected_improvement::{expected_improvement, incumbent, risk_averse},
        traits::{Acquisition, AcquisitionContext},
    },
    gp::{
        data::validate_query,
        heteroscedastic::{HeteroscedasticGP, MLHGPOptions, fit_heteroscedastic},
        kernel::KernelHyperparameters,
    },
};

#[derive(Debug, Clone)]
pub struct HeteroscedasticEI {
    gp: HeteroscedasticGP,
    incumbent: f64,
    xi: f64,
    risk_averse: bool,
}

impl HeteroscedasticEI {
    /// Run the heteroscedastic fit on the context's samples and fix the
    /// incumbent at the largest predictive mean there.
    ///
    /// `ctx.init` seeds the signal GP, `gp2_init` the noise GP; `ctx.noise`
    /// is the initial noise. `ctx.fit` overrides the fit options in `opts`.
    ///
    /// # Errors
    /// Anything [`fit_heteroscedastic`] or prediction returns.
    pub fn fit<R: Rng + ?Sized>(
        ctx: &AcquisitionContext, gp2_init: &KernelHyperparameters, opts: &MLHGPOptions,
        risk_averse: bool, rng: &mut R,
    ) -> AcqResult<Self> {
        let opts = opts.clone().with_fit_options(ctx.fit.clone());
        let gp = fit_heteroscedastic(
            &ctx.data,
            ctx.noise.clone(),
            ctx.init.clone(),
            gp2_init.clone(),
            &opts,
            rng,
        )?;
        Self::from_model(gp, ctx, risk_averse)
    }

    /// Wrap an already fitted model.
    pub fn from_model(gp: HeteroscedasticGP, ctx: &AcquisitionContext, risk_averse: bool) -> AcqResult<Self> {
        let at_samples = gp.predict(ctx.data.x().view())?;
        let incumbent = incumbent(&at_samples.mean);
        log::debug!("heteroscedastic EI incumbent = {incumbent:.6} (risk averse: {risk_averse})");
        Ok(Self { gp, incumbent, xi: ctx.xi, risk_averse })
    }

    pub fn gp(&self) -> &HeteroscedasticGP {
        &self.gp
    }

    pub fn incumbent(&self) -> f64 {
        self.incumbent
    }

    pub fn is_risk_averse(&self) -> bool {
        self.risk_averse
    }
}

impl Acquisition for HeteroscedasticEI {
    fn dim(&self) -> usize {
        self.gp.dim()
    }

    fn evaluate(&self, x: ArrayView2<'_, f64>) -> AcqResult<Array1<f64>> {
        self.check_query(x)?;
        validate_query(x, self.dim())?;
        let pred = self.gp.predict(x)?;
        let std = pred.total_std();
        let ei = expected_improvement(&pred.mean, &std, self.incumbent, self.xi)?;
        if self.risk_averse { risk_averse(&ei, &pred.aleatoric_std, &std) } else { Ok(ei) }
    }
}

/// Fit the heteroscedastic surrogate, then evaluate EI at `x`.
pub fn heteroscedastic_expected_improvement<R: Rng + ?Sized>(
    x: ArrayView2<'_, f64>, ctx: &AcquisitionContext, gp2_init: &KernelHyperparameters,
    opts: &MLHGPOptions, risk_averse: bool, rng: &mut R,
) -> AcqResult<Array1<f64>> {
    HeteroscedasticEI::fit(ctx, gp2_init, opts, risk_averse, rng)?.evaluate(x)
}
