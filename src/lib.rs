//! hetero_bo — Gaussian-process surrogates and Expected Improvement for
//! Bayesian optimization under input-dependent noise.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the GP fits and location proposals to Python via the `_hetero_bo`
//! extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: [`gp`] (homoscedastic and most-likely
//!   heteroscedastic GPs), [`acquisition`] (Expected Improvement and
//!   multi-start proposals) and [`optimization`] (the bounded L-BFGS
//!   maximizer they share).
//! - With `python-bindings`, define the `#[pyclass]` wrappers and the
//!   `#[pymodule]` initializer, with `gp` and `acquisition` submodules
//!   registered in `sys.modules` for dotted imports.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file only converts
//!   inputs, calls them, and maps errors.
//! - Python entry points that draw random numbers take an optional `seed`;
//!   without one the generator is seeded from the OS.
//!
//! Conventions
//! -----------
//! - Noise arguments are standard deviations (scalar or one per sample).
//! - Point sets may be passed as `n × d` arrays or, for one-dimensional
//!   problems, as flat sequences.
//! - Core errors convert to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - A BO driver owns the outer loop: propose a location, evaluate the
//!   objective there, append the observation, repeat.
//! - Native Rust code should use the inner modules directly and can ignore
//!   the items behind `python-bindings`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   the end-to-end pipeline tests under `tests/`.

pub mod acquisition;
pub mod gp;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

#[cfg(feature = "python-bindings")]
use crate::{
    acquisition::{
        AcquisitionContext, ProposeOptions, heteroscedastic_propose_location,
        homoscedastic_propose_location,
    },
    gp::{
        GPData, GPFit, GPFitOptions, HeteroscedasticGP, MLHGPOptions, fit_heteroscedastic,
        fit_hyperparameters, posterior::CovarianceMode,
    },
    utils::{
        extract_bounds, extract_hypers, extract_noise, extract_optim_opts, extract_points,
        extract_vector, make_rng,
    },
};

/// GPFitResult — fitted hyperparameters returned to Python.
///
/// Exposes the lengthscales, signal amplitude, negative log marginal
/// likelihood and optimizer diagnostics of a [`GPFit`].
#[cfg(feature = "python-bindings")]
#[pyclass(module = "hetero_bo.gp", name = "GPFitResult")]
pub struct PyGPFit {
    inner: GPFit,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyGPFit {
    #[getter]
    pub fn lengthscales(&self) -> Vec<f64> {
        self.inner.hypers.lengthscales().to_vec()
    }

    #[getter]
    pub fn sigma_f(&self) -> f64 {
        self.inner.hypers.sigma_f()
    }

    #[getter]
    pub fn nlml(&self) -> f64 {
        self.inner.nlml
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }
}

/// HeteroscedasticGP — Python-facing wrapper for a fitted most-likely
/// heteroscedastic GP.
///
/// Constructed only by `fit_heteroscedastic_gp`. `predict` returns the
/// signal mean, epistemic variance and aleatoric std at query points.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "hetero_bo.gp", name = "HeteroscedasticGP")]
pub struct PyHeteroscedasticGP {
    inner: HeteroscedasticGP,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyHeteroscedasticGP {
    #[pyo3(text_signature = "(self, x_star, /)")]
    pub fn predict<'py>(
        &self, py: Python<'py>, x_star: &Bound<'py, PyAny>,
    ) -> PyResult<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        let x_star = extract_points(py, x_star, "x_star")?;
        let pred = self.inner.predict(x_star.view())?;
        Ok((pred.mean.to_vec(), pred.epistemic_variance.to_vec(), pred.aleatoric_std.to_vec()))
    }

    /// Final per-sample noise standard deviations.
    #[getter]
    pub fn noise(&self) -> Vec<f64> {
        self.inner.state().noise.std_devs(self.inner.state().log_variance.len()).to_vec()
    }

    #[getter]
    pub fn variance_estimator(&self) -> Vec<f64> {
        self.inner.state().log_variance.mapv(f64::exp).to_vec()
    }

    #[getter]
    pub fn signal_hypers(&self) -> (Vec<f64>, f64) {
        let h = &self.inner.state().gp1_hypers;
        (h.lengthscales().to_vec(), h.sigma_f())
    }

    #[getter]
    pub fn noise_hypers(&self) -> (Vec<f64>, f64) {
        let h = &self.inner.state().gp2_hypers;
        (h.lengthscales().to_vec(), h.sigma_f())
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.state().iteration
    }
}

/// Fit a homoscedastic GP by maximizing the log marginal likelihood.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (
    x_sample, y_sample, noise, l_init = None, sigma_f_init = 1.0,
    tol_grad = None, tol_cost = None, max_iter = None, line_searcher = None, lbfgs_mem = None,
))]
#[allow(clippy::too_many_arguments)]
pub fn fit_homoscedastic_gp<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    noise: &Bound<'py, PyAny>, l_init: Option<&Bound<'py, PyAny>>, sigma_f_init: f64,
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<PyGPFit> {
    let data = GPData::new(extract_points(py, x_sample, "x_sample")?, extract_vector(py, y_sample, "y_sample")?)?;
    let noise = extract_noise(py, noise)?;
    let init = init_hypers(py, l_init, sigma_f_init, data.dim())?;
    let optim = extract_optim_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
    let opts = GPFitOptions { optim, ..GPFitOptions::default() };
    let fit = fit_hyperparameters(&data, &noise, &init, &opts)?;
    Ok(PyGPFit { inner: fit })
}

/// Predictive mean and variance at `x_star` with fixed hyperparameters.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (x_sample, y_sample, x_star, noise, lengthscales, sigma_f))]
pub fn predict_homoscedastic_gp<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    x_star: &Bound<'py, PyAny>, noise: &Bound<'py, PyAny>, lengthscales: &Bound<'py, PyAny>,
    sigma_f: f64,
) -> PyResult<(Vec<f64>, Vec<f64>)> {
    let data = GPData::new(extract_points(py, x_sample, "x_sample")?, extract_vector(py, y_sample, "y_sample")?)?;
    let noise = extract_noise(py, noise)?;
    let hypers = extract_hypers(py, lengthscales, sigma_f, data.dim())?;
    let x_star = extract_points(py, x_star, "x_star")?;
    let post = crate::gp::predict(&data, &noise, &hypers, x_star.view(), CovarianceMode::Diagonal)?;
    Ok((post.mean().to_vec(), post.variance().to_vec()))
}

/// Run the most-likely heteroscedastic GP procedure.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (
    x_sample, y_sample, noise, l_init = None, sigma_f_init = 1.0, l_noise_init = None,
    sigma_f_noise_init = 1.0, gp2_noise = 1.0, num_iters = 10, sample_size = 100, seed = None,
))]
#[allow(clippy::too_many_arguments)]
pub fn fit_heteroscedastic_gp<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    noise: &Bound<'py, PyAny>, l_init: Option<&Bound<'py, PyAny>>, sigma_f_init: f64,
    l_noise_init: Option<&Bound<'py, PyAny>>, sigma_f_noise_init: f64, gp2_noise: f64,
    num_iters: usize, sample_size: usize, seed: Option<u64>,
) -> PyResult<PyHeteroscedasticGP> {
    let data = GPData::new(extract_points(py, x_sample, "x_sample")?, extract_vector(py, y_sample, "y_sample")?)?;
    let noise = extract_noise(py, noise)?;
    let gp1 = init_hypers(py, l_init, sigma_f_init, data.dim())?;
    let gp2 = init_hypers(py, l_noise_init, sigma_f_noise_init, data.dim())?;
    let opts = MLHGPOptions::new(num_iters, sample_size, gp2_noise)?;
    let mut rng = make_rng(seed);
    let inner = fit_heteroscedastic(&data, noise, gp1, gp2, &opts, &mut rng)?;
    Ok(PyHeteroscedasticGP { inner })
}

/// Propose the next location by maximizing homoscedastic EI.
///
/// Returns `None` when no restart beat `min_val`.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "propose_location")]
#[pyo3(signature = (
    x_sample, y_sample, noise, bounds, l_init = None, sigma_f_init = 1.0,
    n_restarts = 25, min_val = 1.0, xi = 0.0, seed = None,
))]
#[allow(clippy::too_many_arguments)]
pub fn propose_location_py<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    noise: &Bound<'py, PyAny>, bounds: &Bound<'py, PyAny>, l_init: Option<&Bound<'py, PyAny>>,
    sigma_f_init: f64, n_restarts: usize, min_val: f64, xi: f64, seed: Option<u64>,
) -> PyResult<Option<Vec<f64>>> {
    let ctx = context(py, x_sample, y_sample, noise, l_init, sigma_f_init, xi)?;
    let bounds = extract_bounds(bounds)?;
    let defaults = ProposeOptions::default();
    let opts = ProposeOptions::new(n_restarts, min_val, defaults.parallel, defaults.optim)?;
    let mut rng = make_rng(seed);
    let proposal = py.allow_threads(|| homoscedastic_propose_location(&ctx, &bounds, &opts, &mut rng))?;
    Ok(proposal.map(|p| p.location.to_vec()))
}

/// Propose the next location by maximizing heteroscedastic EI.
///
/// With `risk_averse` (default) the learned noise std is subtracted from EI.
#[cfg(feature = "python-bindings")]
#[pyfunction(name = "heteroscedastic_propose_location")]
#[pyo3(signature = (
    x_sample, y_sample, noise, bounds, l_init = None, sigma_f_init = 1.0, l_noise_init = None,
    sigma_f_noise_init = 1.0, gp2_noise = 1.0, num_iters = 10, sample_size = 100,
    risk_averse = true, n_restarts = 25, min_val = 1.0, xi = 0.0, seed = None,
))]
#[allow(clippy::too_many_arguments)]
pub fn heteroscedastic_propose_location_py<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    noise: &Bound<'py, PyAny>, bounds: &Bound<'py, PyAny>, l_init: Option<&Bound<'py, PyAny>>,
    sigma_f_init: f64, l_noise_init: Option<&Bound<'py, PyAny>>, sigma_f_noise_init: f64,
    gp2_noise: f64, num_iters: usize, sample_size: usize, risk_averse: bool, n_restarts: usize,
    min_val: f64, xi: f64, seed: Option<u64>,
) -> PyResult<Option<Vec<f64>>> {
    let ctx = context(py, x_sample, y_sample, noise, l_init, sigma_f_init, xi)?;
    let gp2 = init_hypers(py, l_noise_init, sigma_f_noise_init, ctx.dim())?;
    let mlhgp = MLHGPOptions::new(num_iters, sample_size, gp2_noise)?;
    let bounds = extract_bounds(bounds)?;
    let defaults = ProposeOptions::default();
    let opts = ProposeOptions::new(n_restarts, min_val, defaults.parallel, defaults.optim)?;
    let mut rng = make_rng(seed);
    let proposal = py.allow_threads(|| {
        heteroscedastic_propose_location(&ctx, &gp2, &mlhgp, risk_averse, &bounds, &opts, &mut rng)
    })?;
    Ok(proposal.map(|p| p.location.to_vec()))
}

#[cfg(feature = "python-bindings")]
fn init_hypers<'py>(
    py: Python<'py>, l: Option<&Bound<'py, PyAny>>, sigma_f: f64, dim: usize,
) -> PyResult<crate::gp::KernelHyperparameters> {
    match l {
        Some(l) => extract_hypers(py, l, sigma_f, dim),
        None => Ok(crate::gp::KernelHyperparameters::isotropic(dim, 1.0, sigma_f)?),
    }
}

#[cfg(feature = "python-bindings")]
fn context<'py>(
    py: Python<'py>, x_sample: &Bound<'py, PyAny>, y_sample: &Bound<'py, PyAny>,
    noise: &Bound<'py, PyAny>, l_init: Option<&Bound<'py, PyAny>>, sigma_f_init: f64, xi: f64,
) -> PyResult<AcquisitionContext> {
    let x = extract_points(py, x_sample, "x_sample")?;
    let y = extract_vector(py, y_sample, "y_sample")?;
    let init = init_hypers(py, l_init, sigma_f_init, x.ncols())?;
    let noise = extract_noise(py, noise)?;
    Ok(AcquisitionContext::new(x, y, noise, init)?.with_xi(xi)?)
}

/// _hetero_bo — PyO3 module initializer for the Python extension.
///
/// Creates the `gp` and `acquisition` submodules, attaches them to the
/// parent module and registers them in `sys.modules` so that
/// `hetero_bo.gp` and `hetero_bo.acquisition` import with dotted paths.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _hetero_bo<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let gp_mod = PyModule::new(_py, "gp")?;
    let acquisition_mod = PyModule::new(_py, "acquisition")?;
    gp_module(_py, m, &gp_mod)?;
    acquisition_module(_py, m, &acquisition_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("hetero_bo.gp", gp_mod)?;
    _py.import("sys")?.getattr("modules")?.set_item("hetero_bo.acquisition", acquisition_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn gp_module<'py>(_py: Python, parent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<PyGPFit>()?;
    m.add_class::<PyHeteroscedasticGP>()?;
    m.add_function(wrap_pyfunction!(fit_homoscedastic_gp, m)?)?;
    m.add_function(wrap_pyfunction!(predict_homoscedastic_gp, m)?)?;
    m.add_function(wrap_pyfunction!(fit_heteroscedastic_gp, m)?)?;
    parent.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn acquisition_module<'py>(
    _py: Python, parent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(propose_location_py, m)?)?;
    m.add_function(wrap_pyfunction!(heteroscedastic_propose_location_py, m)?)?;
    parent.add_submodule(m)?;
    Ok(())
}
