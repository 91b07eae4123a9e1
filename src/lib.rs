//! causal_toolkit — causal-effect estimators over in-memory tabular data.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the estimators to Python via the `_causal_toolkit` extension
//! module. When the `python-bindings` feature is enabled, this module defines
//! the Python-facing functions used by a thin Python presentation layer.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`data`, `estimators`, `propensity`,
//!   `optimization`) as the public crate surface.
//! - Define `#[pyfunction]` wrappers and the `#[pymodule]` initializer for
//!   the `_causal_toolkit` Python extension: `ab_summary`, `run_psm`,
//!   `run_did` and `run_synth_control`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion, and result-to-dict mapping.
//! - Python results carry the same field names as the serialized Rust
//!   results (`ATE_psm`, `DID_effect`, `post_period_ATE`, ...).
//!
//! Conventions
//! -----------
//! - Python callers pass a `dict[str, sequence]` of columns; float-convertible
//!   sequences become numeric columns, anything else must be strings.
//! - Errors from core Rust code are converted to `ValueError` (or
//!   `TypeError` for unconvertible inputs) at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on `estimators::prelude` and can ignore
//!   the items guarded by `python-bindings`.
//!
//! Testing notes
//! -------------
//! - Estimator behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_causal_pipeline.rs`; the bindings add no logic of
//!   their own beyond conversion.

pub mod data;
pub mod estimators;
pub mod optimization;
pub mod propensity;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyDict};

#[cfg(feature = "python-bindings")]
use crate::{
    data::parse_timestamp,
    estimators::{DidOptions, Estimate, PeriodPolicy, SynthControlEstimate},
    utils::{build_propensity_model, extract_dataset, extract_period},
};

/// Copy every canonical scalar of `estimate` into a fresh dict.
#[cfg(feature = "python-bindings")]
fn scalars_dict<'py, E: Estimate>(py: Python<'py>, estimate: &E) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (name, value) in estimate.scalars() {
        dict.set_item(name, value)?;
    }
    Ok(dict)
}

/// ab_summary(columns, metric, denom, group) — two-proportion z-test.
///
/// Returns a dict with `rate_treatment`, `rate_control`, `lift`, `z` and
/// `p_value`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "ab_summary", signature = (columns, metric, denom, group))]
fn py_ab_summary<'py>(
    py: Python<'py>, columns: &Bound<'py, PyDict>, metric: &str, denom: &str, group: &str,
) -> PyResult<Bound<'py, PyDict>> {
    let dataset = extract_dataset(py, columns)?;
    let out = estimators::ab_summary(&dataset, metric, denom, group)?;
    scalars_dict(py, &out)
}

/// Propensity-score matching.
///
/// Python signature: `run_psm(columns, outcome, treatment, covariates, *,
/// c=None, standardize=None, tol_grad=None, tol_cost=None, max_iter=None,
/// line_searcher=None, lbfgs_mem=None)`.
///
/// Returns a dict with `ATE_psm`, `n_pairs` and `n_unique_controls`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "run_psm",
    signature = (
        columns, outcome, treatment, covariates, *, c = None, standardize = None,
        tol_grad = None, tol_cost = None, max_iter = None, line_searcher = None,
        lbfgs_mem = None
    )
)]
#[allow(clippy::too_many_arguments)]
fn py_run_psm<'py>(
    py: Python<'py>, columns: &Bound<'py, PyDict>, outcome: &str, treatment: &str,
    covariates: Vec<String>, c: Option<f64>, standardize: Option<bool>, tol_grad: Option<f64>,
    tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
    lbfgs_mem: Option<usize>,
) -> PyResult<Bound<'py, PyDict>> {
    let dataset = extract_dataset(py, columns)?;
    let model = build_propensity_model(
        c,
        standardize,
        tol_grad,
        tol_cost,
        max_iter,
        line_searcher,
        lbfgs_mem,
    )?;
    let out = estimators::run_psm_with(
        &dataset,
        outcome,
        treatment,
        &covariates,
        &model,
        &propensity::SortedScan,
    )?;
    let dict = PyDict::new(py);
    dict.set_item("ATE_psm", out.ate_psm)?;
    dict.set_item("n_pairs", out.n_pairs)?;
    dict.set_item("n_unique_controls", out.n_unique_controls)?;
    Ok(dict)
}

/// 2×2 difference-in-differences.
///
/// Python signature: `run_did(columns, outcome, treatment, time, pre_period,
/// post_period, *, reject_overlap=False)`.
///
/// Periods are `(start, end)` tuples of ISO-8601 strings, both inclusive.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "run_did",
    signature = (columns, outcome, treatment, time, pre_period, post_period, *, reject_overlap = false)
)]
#[allow(clippy::too_many_arguments)]
fn py_run_did<'py>(
    py: Python<'py>, columns: &Bound<'py, PyDict>, outcome: &str, treatment: &str, time: &str,
    pre_period: (String, String), post_period: (String, String), reject_overlap: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let dataset = extract_dataset(py, columns)?;
    let opts = DidOptions {
        period_policy: if reject_overlap { PeriodPolicy::Reject } else { PeriodPolicy::Warn },
    };
    let out = estimators::run_did_with(
        &dataset,
        outcome,
        treatment,
        time,
        extract_period(pre_period)?,
        extract_period(post_period)?,
        &opts,
    )?;
    let dict = scalars_dict(py, &out)?;
    let counts = PyDict::new(py);
    counts.set_item("pre_treated", out.cell_counts.pre_treated)?;
    counts.set_item("pre_control", out.cell_counts.pre_control)?;
    counts.set_item("post_treated", out.cell_counts.post_treated)?;
    counts.set_item("post_control", out.cell_counts.post_control)?;
    dict.set_item("cell_counts", counts)?;
    Ok(dict)
}

/// Column-oriented trajectory (`time`, `treated`, `synthetic`, `gap`).
#[cfg(feature = "python-bindings")]
fn trajectory_dict<'py>(
    py: Python<'py>, out: &SynthControlEstimate,
) -> PyResult<Bound<'py, PyDict>> {
    let points = &out.trajectory;
    let dict = PyDict::new(py);
    dict.set_item("time", points.iter().map(|p| p.time.to_string()).collect::<Vec<_>>())?;
    dict.set_item("treated", points.iter().map(|p| p.treated).collect::<Vec<_>>())?;
    dict.set_item("synthetic", points.iter().map(|p| p.synthetic).collect::<Vec<_>>())?;
    dict.set_item("gap", points.iter().map(|p| p.gap).collect::<Vec<_>>())?;
    Ok(dict)
}

/// Synthetic control with NNLS donor weights.
///
/// Python signature: `run_synth_control(columns, outcome, unit, time,
/// treated_unit, treat_start)`.
///
/// Returns a dict with `weights` (donor → weight), `post_period_ATE`,
/// `pre_period_rmspe` and a column-oriented `trajectory`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "run_synth_control",
    signature = (columns, outcome, unit, time, treated_unit, treat_start)
)]
fn py_run_synth_control<'py>(
    py: Python<'py>, columns: &Bound<'py, PyDict>, outcome: &str, unit: &str, time: &str,
    treated_unit: &str, treat_start: &str,
) -> PyResult<Bound<'py, PyDict>> {
    let dataset = extract_dataset(py, columns)?;
    let start = parse_timestamp(treat_start)?;
    let out = estimators::run_synth_control(&dataset, outcome, unit, time, treated_unit, start)?;

    let dict = PyDict::new(py);
    let weights = PyDict::new(py);
    for (donor, w) in &out.weights {
        weights.set_item(donor, *w)?;
    }
    dict.set_item("weights", weights)?;
    dict.set_item("post_period_ATE", out.post_period_ate)?;
    dict.set_item("pre_period_rmspe", out.pre_period_rmspe)?;
    dict.set_item("trajectory", trajectory_dict(py, &out)?)?;
    Ok(dict)
}

/// _causal_toolkit — PyO3 module initializer.
///
/// Registers the four estimator functions. Invoked by Python when the
/// compiled extension is imported.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _causal_toolkit<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_ab_summary, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_psm, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_did, m)?)?;
    m.add_function(wrap_pyfunction!(py_run_synth_control, m)?)?;
    Ok(())
}
