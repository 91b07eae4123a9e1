//! utils — PyO3 extraction helpers for the Python bridge.
//!
//! Converts Python inputs (a `dict` of columns, optimizer knobs, period
//! bounds) into the crate's Rust types. Everything here is compiled only
//! with the `python-bindings` feature.

#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    data::{Column, Dataset, Period},
    optimization::lbfgs::{FitOptions, LineSearcher, Tolerances},
    propensity::{LogisticPropensity, PropensityError},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
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
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build a column from one dict value: float data first, then strings.
#[cfg(feature = "python-bindings")]
fn extract_column<'py>(
    py: Python<'py>, name: &str, raw: &Bound<'py, PyAny>,
) -> PyResult<Column> {
    if let Ok(arr) = extract_f64_array(py, raw) {
        let values = arr.as_slice().map_err(|_| {
            PyValueError::new_err(format!("column {name:?} must be a contiguous 1-D array"))
        })?;
        return Ok(Column::Numeric(values.to_vec().into()));
    }
    let listed = match raw.call_method0("tolist") {
        Ok(obj) => obj,
        Err(_) => raw.clone(),
    };
    listed.extract::<Vec<String>>().map(Column::Text).map_err(|_| {
        PyTypeError::new_err(format!(
            "column {name:?} must be a sequence of floats or a sequence of strings"
        ))
    })
}

/// Convert a `dict[str, sequence]` into a [`Dataset`], preserving key order.
#[cfg(feature = "python-bindings")]
pub fn extract_dataset<'py>(py: Python<'py>, columns: &Bound<'py, PyDict>) -> PyResult<Dataset> {
    let mut dataset = Dataset::new();
    for (key, value) in columns.iter() {
        let name: String = key
            .extract()
            .map_err(|_| PyTypeError::new_err("column names must be strings"))?;
        let column = extract_column(py, &name, &value)?;
        dataset = dataset.with_column(&name, column)?;
    }
    Ok(dataset)
}

/// Inclusive period from a `(start, end)` pair of ISO-8601 strings.
#[cfg(feature = "python-bindings")]
pub fn extract_period(bounds: (String, String)) -> PyResult<Period> {
    Ok(Period::parse(&bounds.0, &bounds.1)?)
}

#[cfg(feature = "python-bindings")]
fn extract_fit_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<FitOptions> {
    // OptError -> PropensityError -> PyErr
    let defaults = Tolerances::default();
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter).map_err(PropensityError::from)?
    };
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(PropensityError::from)?,
        None => LineSearcher::MoreThuente,
    };
    let opts = FitOptions::new(tols, ls, false, lbfgs_mem).map_err(PropensityError::from)?;
    Ok(opts)
}

/// Logistic propensity model from the optional Python keyword arguments.
#[cfg(feature = "python-bindings")]
pub fn build_propensity_model(
    c: Option<f64>, standardize: Option<bool>, tol_grad: Option<f64>, tol_cost: Option<f64>,
    max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<LogisticPropensity> {
    let opts = extract_fit_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
    Ok(LogisticPropensity::new(opts, c.unwrap_or(1.0), standardize.unwrap_or(true))?)
}
