//! Adapter that exposes an [`Objective`] as an `argmin` problem.
//!
//! A *maximization* of `f(θ)` becomes a *minimization* of `c(θ) = -f(θ)`.
//! Analytic gradients (if provided) are negated accordingly. Without one we
//! finite-difference the **cost** closure, so no sign flip is needed in that
//! branch.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    maximizer::{
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `-f(θ)`.
/// - `Gradient::gradient` returns `-∇f(θ)` when the objective has an
///   analytic gradient, otherwise a finite-difference gradient of the cost.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ) = -f(θ)`, rejecting non-finite objective values with
    /// `OptError::NonFiniteCost`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// Central differences are tried first. If any cost evaluation inside the
    /// finite-difference closure failed, or the central gradient does not
    /// validate, a forward-difference gradient is computed instead and its
    /// failure is returned as the error.
    ///
    /// The FD closure must return `f64`, so the first error raised inside it
    /// is parked in `closure_err` and the closure returns `NaN`.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// Clears `closure_err`, runs `forward_diff`, returns any captured error,
/// then validates the gradient.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
