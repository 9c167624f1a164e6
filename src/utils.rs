//! Conversions from Python inputs to the crate's Rust types.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! is used by the PyO3 layer in `lib.rs`. Array-likes are accepted as numpy
//! arrays, pandas objects (via `to_numpy`) or plain nested sequences.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2, Axis};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use rand::SeedableRng;
#[cfg(feature = "python-bindings")]
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "python-bindings")]
use crate::{
    gp::{kernel::KernelHyperparameters, noise::NoiseModel},
    optimization::maximizer::{LineSearcher, OptimOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// One-dimensional array-like as an owned `Array1`.
#[cfg(feature = "python-bindings")]
pub fn extract_vector<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr
        .as_slice()
        .map_err(|_| PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence")))?;
    Ok(Array1::from(slice.to_vec()))
}

/// Point set as an `n × d` matrix.
///
/// A 2-D array or nested sequence is taken as is; a 1-D array-like is read
/// as `n` one-dimensional points.
#[cfg(feature = "python-bindings")]
pub fn extract_points<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }
    if let Ok(rows) = raw.extract::<Vec<Vec<f64>>>() {
        let n = rows.len();
        let d = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != d) {
            return Err(PyValueError::new_err(format!("{name} rows must all have the same length")));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        return Array2::from_shape_vec((n, d), flat)
            .map_err(|e| PyValueError::new_err(format!("{name}: {e}")));
    }
    Ok(extract_vector(py, raw, name)?.insert_axis(Axis(1)))
}

/// Noise as a scalar standard deviation or one value per training point.
#[cfg(feature = "python-bindings")]
pub fn extract_noise<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<NoiseModel> {
    if let Ok(std) = raw.extract::<f64>() {
        return Ok(NoiseModel::constant(std)?);
    }
    let stds = extract_vector(py, raw, "noise")?;
    Ok(NoiseModel::per_point(stds)?)
}

/// Lengthscales given as a scalar (shared by every dimension) or a vector.
#[cfg(feature = "python-bindings")]
pub fn extract_hypers<'py>(
    py: Python<'py>, l: &Bound<'py, PyAny>, sigma_f: f64, dim: usize,
) -> PyResult<KernelHyperparameters> {
    if let Ok(l) = l.extract::<f64>() {
        return Ok(KernelHyperparameters::isotropic(dim, l, sigma_f)?);
    }
    let lengthscales = extract_vector(py, l, "lengthscales")?;
    Ok(KernelHyperparameters::new(lengthscales, sigma_f)?)
}

/// `[[low, high], ...]` pairs.
#[cfg(feature = "python-bindings")]
pub fn extract_bounds<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Vec<(f64, f64)>> {
    if let Ok(pairs) = raw.extract::<Vec<(f64, f64)>>() {
        return Ok(pairs);
    }
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        let arr = arr.as_array();
        if arr.ncols() == 2 {
            return Ok(arr.outer_iter().map(|row| (row[0], row[1])).collect());
        }
    }
    Err(PyValueError::new_err("bounds must be a sequence of (low, high) pairs"))
}

#[cfg(feature = "python-bindings")]
pub fn extract_optim_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<OptimOptions> {
    use std::str::FromStr;

    let defaults = OptimOptions::default().tols;
    let tols = Tolerances::new(
        tol_grad.or(defaults.tol_grad),
        tol_cost.or(defaults.tol_cost),
        max_iter.or(defaults.max_iter),
    )?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => LineSearcher::MoreThuente,
    };
    Ok(OptimOptions::new(tols, ls, lbfgs_mem)?)
}

/// Seeded generator, or one seeded from the OS when `seed` is `None`.
#[cfg(feature = "python-bindings")]
pub fn make_rng(seed: Option<u64>) -> Xoshiro256Plus {
    seed.map_or_else(Xoshiro256Plus::from_entropy, Xoshiro256Plus::seed_from_u64)
}
