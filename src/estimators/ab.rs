//! estimators::ab — two-proportion z-test on grouped sums.
//!
//! Purpose
//! -------
//! Compare a conversion-style rate between a treatment (`group == 1`) and a
//! control (`group == 0`) arm, where each row contributes successes
//! (`metric`) and exposures (`denom`).
//!
//! Key behaviors
//! -------------
//! - Rates are computed on the *summed* metric and denominator per arm,
//!   so rows may be pre-aggregated (one row per day, per cohort, ...).
//! - `z` uses the pooled proportion; `p_value` is two-sided from the
//!   standard normal survival function.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every denominator (`n1`, `n0`, `n1 + n0`) is floored at `EPS = 1e-9`
//!   and `EPS` is added under the square root, so zero exposures give
//!   `z = 0`, `p_value = 1` instead of NaN.
//! - Rates are expected to be proportions. A pooled rate outside `[0, 1]`
//!   makes the variance negative; the resulting non-finite `z` is reported
//!   as `CausalError::Numerical`.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    data::Dataset,
    estimators::{
        Estimate,
        errors::{CausalError, CausalResult},
        validation::{EPS, require_group},
    },
};

/// AbSummary — rates, lift and test statistic of an A/B comparison.
///
/// Scalar fields (exposed through [`Estimate`]): `rate_treatment`,
/// `rate_control`, `lift`, `z`, `p_value`. The raw per-arm sums are carried
/// alongside for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbSummary {
    pub rate_treatment: f64,
    pub rate_control: f64,
    pub lift: f64,
    pub z: f64,
    pub p_value: f64,
    pub conversions_treatment: f64,
    pub conversions_control: f64,
    pub exposures_treatment: f64,
    pub exposures_control: f64,
}

impl Estimate for AbSummary {
    fn scalars(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("rate_treatment", self.rate_treatment),
            ("rate_control", self.rate_control),
            ("lift", self.lift),
            ("z", self.z),
            ("p_value", self.p_value),
        ]
    }
}

/// Two-proportion z-test of `metric_column / denom_column` between groups.
///
/// Parameters
/// ----------
/// - `dataset`: input rows.
/// - `metric_column`: numeric successes per row.
/// - `denom_column`: numeric exposures per row.
/// - `group_column`: 0/1 indicator, `1` = treatment.
///
/// Returns
/// -------
/// `AbSummary` with
/// - `rate_* = Σmetric / max(Σdenom, ε)` per arm,
/// - `z = (p1 − p0) / sqrt(p(1 − p)(1/n1 + 1/n0) + ε)` with pooled `p`,
/// - `p_value = 2·(1 − Φ(|z|))`,
/// - `lift = (p1 − p0) / (p0 + ε)`.
///
/// Errors
/// ------
/// - `CausalError::Data` for missing, non-numeric, non-finite or non-binary
///   columns.
/// - `CausalError::MissingGroup` if either arm has no rows.
/// - `CausalError::Numerical` if `z` is not finite.
///
/// Examples
/// --------
/// ```rust
/// use causal_toolkit::data::Dataset;
/// use causal_toolkit::estimators::ab::ab_summary;
///
/// let ds = Dataset::new()
///     .with_numeric("clicks", vec![30.0, 30.0, 25.0, 25.0]).unwrap()
///     .with_numeric("views", vec![500.0, 500.0, 500.0, 500.0]).unwrap()
///     .with_numeric("arm", vec![1.0, 1.0, 0.0, 0.0]).unwrap();
///
/// let summary = ab_summary(&ds, "clicks", "views", "arm").unwrap();
/// assert!((summary.rate_treatment - 0.06).abs() < 1e-12);
/// assert!((summary.rate_control - 0.05).abs() < 1e-12);
/// ```
pub fn ab_summary(
    dataset: &Dataset, metric_column: &str, denom_column: &str, group_column: &str,
) -> CausalResult<AbSummary> {
    let metric = dataset.finite_numeric(metric_column)?;
    let denom = dataset.finite_numeric(denom_column)?;
    let treated = dataset.indicator(group_column)?;
    let n_treated = require_group(group_column, &treated, 1)?;
    let n_control = require_group(group_column, &treated, 0)?;

    let (mut c1, mut n1, mut c0, mut n0) = (0.0, 0.0, 0.0, 0.0);
    for ((&is_treated, &m), &d) in treated.iter().zip(metric.iter()).zip(denom.iter()) {
        if is_treated {
            c1 += m;
            n1 += d;
        } else {
            c0 += m;
            n0 += d;
        }
    }
    log::debug!(
        "ab_summary: {n_treated} treatment rows ({c1}/{n1}), {n_control} control rows ({c0}/{n0})"
    );

    let p1 = c1 / f64::max(n1, EPS);
    let p0 = c0 / f64::max(n0, EPS);
    let pooled = (c1 + c0) / f64::max(n1 + n0, EPS);
    let variance =
        pooled * (1.0 - pooled) * (1.0 / f64::max(n1, EPS) + 1.0 / f64::max(n0, EPS));
    let z = (p1 - p0) / (variance + EPS).sqrt();
    if !z.is_finite() {
        return Err(CausalError::Numerical {
            reason: format!("z-statistic is {z}; pooled rate {pooled} is not a proportion"),
        });
    }

    let normal =
        Normal::new(0.0, 1.0).map_err(|e| CausalError::Numerical { reason: e.to_string() })?;
    let p_value = 2.0 * normal.sf(z.abs());
    let lift = (p1 - p0) / (p0 + EPS);

    Ok(AbSummary {
        rate_treatment: p1,
        rate_control: p0,
        lift,
        z,
        p_value,
        conversions_treatment: c1,
        conversions_control: c0,
        exposures_treatment: n1,
        exposures_control: n0,
    })
}
