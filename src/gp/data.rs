//! Validated training data for GP models.
use ndarray::{Array1, Array2, ArrayView2};

use crate::gp::errors::{GPError, GPResult};

/// Training inputs `X` (n × d) and labels `y` (length n).
///
/// Construction checks `n ≥ 1`, `d ≥ 1`, `len(y) == n` and that every entry
/// is finite. The struct owns its arrays; fitted models keep their own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct GPData {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl GPData {
    /// # Errors
    /// - [`GPError::EmptyData`] if `X` has no rows or no columns.
    /// - [`GPError::InvalidDimensionality`] if `len(y) != n`.
    /// - [`GPError::NonFiniteInput`] for the first NaN/±inf entry (`X` is
    ///   indexed in row-major order).
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> GPResult<Self> {
        let (n, d) = x.dim();
        if n == 0 || d == 0 {
            return Err(GPError::EmptyData);
        }
        if y.len() != n {
            return Err(GPError::InvalidDimensionality { what: "labels", expected: n, found: y.len() });
        }
        check_finite("inputs", x.iter())?;
        check_finite("labels", y.iter())?;
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// Number of training points.
    pub fn n(&self) -> usize {
        self.x.nrows()
    }

    /// Input dimensionality.
    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    /// Same inputs, new labels (used for the log-variance dataset of the
    /// noise GP).
    pub fn with_labels(&self, y: Array1<f64>) -> GPResult<Self> {
        Self::new(self.x.clone(), y)
    }
}

/// Check that query points have the training dimensionality and are finite.
pub fn validate_query(x_star: ArrayView2<'_, f64>, dim: usize) -> GPResult<()> {
    if x_star.ncols() != dim {
        return Err(GPError::InvalidDimensionality {
            what: "query points",
            expected: dim,
            found: x_star.ncols(),
        });
    }
    check_finite("query points", x_star.iter())
}

fn check_finite<'a>(what: &'static str, values: impl Iterator<Item = &'a f64>) -> GPResult<()> {
    for (index, &value) in values.enumerate() {
        if !value.is_finite() {
            return Err(GPError::NonFiniteInput { what, index, value });
        }
    }
    Ok(())
}
