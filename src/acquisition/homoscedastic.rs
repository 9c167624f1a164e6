//! Expected Improvement on a homoscedastic GP surrogate.
use ndarray::{Array1, ArrayView2};

use crate::{
    acquisition::{
        errors::AcqResult,
        expected_improvement::{expected_improvement, incumbent},
        traits::{Acquisition, AcquisitionContext},
    },
    gp::{data::validate_query, homoscedastic::HomoscedasticGP, posterior::CovarianceMode},
};

/// EI on a GP whose hyperparameters were fitted once from an
/// [`AcquisitionContext`].
///
/// The incumbent is the largest predictive mean at the sample locations.
#[derive(Debug, Clone)]
pub struct HomoscedasticEI {
    gp: HomoscedasticGP,
    incumbent: f64,
    xi: f64,
}

impl HomoscedasticEI {
    /// Fit the surrogate and fix the incumbent.
    ///
    /// # Errors
    /// Fit and prediction errors from [`HomoscedasticGP`].
    pub fn fit(ctx: &AcquisitionContext) -> AcqResult<Self> {
        let gp = HomoscedasticGP::fit(&ctx.data, &ctx.noise, &ctx.init, &ctx.fit)?;
        let at_samples = gp.posterior().predict_mean(ctx.data.x().view())?;
        let incumbent = incumbent(&at_samples);
        log::debug!("homoscedastic EI incumbent = {incumbent:.6}");
        Ok(Self { gp, incumbent, xi: ctx.xi })
    }

    pub fn gp(&self) -> &HomoscedasticGP {
        &self.gp
    }

    pub fn incumbent(&self) -> f64 {
        self.incumbent
    }
}

impl Acquisition for HomoscedasticEI {
    fn dim(&self) -> usize {
        self.gp.posterior().dim()
    }

    fn evaluate(&self, x: ArrayView2<'_, f64>) -> AcqResult<Array1<f64>> {
        self.check_query(x)?;
        validate_query(x, self.dim())?;
        let post = self.gp.predict(x, CovarianceMode::Diagonal)?;
        expected_improvement(post.mean(), &post.std_dev(), self.incumbent, self.xi)
    }
}

/// Fit on the context's samples, then evaluate EI at `x`.
pub fn homoscedastic_expected_improvement(
    x: ArrayView2<'_, f64>, ctx: &AcquisitionContext,
) -> AcqResult<Array1<f64>> {
    HomoscedasticEI::fit(ctx)?.evaluate(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::{kernel::KernelHyperparameters, noise::NoiseModel};
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover EI on a fitted homoscedastic surrogate: finiteness
    // and sign, higher values where the model is uncertain, and query
    // dimension checks.
    // -------------------------------------------------------------------------

    fn context() -> AcquisitionContext {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.1, 0.9, 0.05, -0.4];
        AcquisitionContext::new(
            x,
            y,
            NoiseModel::Constant(0.1),
            KernelHyperparameters::isotropic(1, 1.0, 1.0).expect("valid"),
        )
        .expect("valid context")
    }

    #[test]
    // Purpose
    // -------
    // EI over a grid is finite and non-negative, and the one-shot function
    // agrees with the fitted struct.
    fn ei_is_finite_and_non_negative() {
        // Arrange
        let ctx = context();
        let grid = Array2::from_shape_fn((21, 1), |(i, _)| i as f64 * 0.25);

        // Act
        let acq = HomoscedasticEI::fit(&ctx).expect("fit");
        let ei = acq.evaluate(grid.view()).expect("ei");
        let one_shot = homoscedastic_expected_improvement(grid.view(), &ctx).expect("one-shot");

        // Assert
        assert!(ei.iter().all(|v| v.is_finite() && *v >= 0.0), "{ei:?}");
        for (a, b) in ei.iter().zip(one_shot.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(acq.incumbent().is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Query points with the wrong number of columns are rejected.
    fn wrong_query_dimension_is_rejected() {
        let acq = HomoscedasticEI::fit(&context()).expect("fit");
        let err = acq.evaluate(array![[1.0, 2.0]].view()).unwrap_err();
        assert!(err.is_fatal(), "{err}");
    }
}
