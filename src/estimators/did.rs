//! estimators::did — two-period, two-group difference-in-differences.
//!
//! Purpose
//! -------
//! Estimate a treatment effect as the change over time in the treated group
//! minus the change over time in the control group, using plain cell means.
//!
//! Key behaviors
//! -------------
//! - Each of the four period × group cells is the mean outcome of the rows
//!   whose timestamp lies in the (inclusive) period and whose treatment flag
//!   equals the group.
//! - `DID_effect = (post_treated − pre_treated) − (post_control − pre_control)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A cell with no rows is an error (`EmptyWindow`), never a zero mean.
//! - Period ordering is the caller's responsibility by default: overlapping
//!   or out-of-order periods are logged and the computation continues.
//!   `PeriodPolicy::Reject` turns that into `OverlappingPeriods`.
//! - A row may fall in both periods when they overlap; it then contributes
//!   to both cells.

use serde::Serialize;

use crate::{
    data::{Dataset, Period},
    estimators::{
        Estimate,
        errors::{CausalError, CausalResult},
    },
};

/// What to do when the post period does not start strictly after the pre
/// period ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodPolicy {
    #[default]
    Warn,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DidOptions {
    pub period_policy: PeriodPolicy,
}

/// Row counts behind each cell mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellCounts {
    pub pre_treated: usize,
    pub pre_control: usize,
    pub post_treated: usize,
    pub post_control: usize,
}

/// DidEstimate — cell means and the double difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DidEstimate {
    pub pre_treated_mean: f64,
    pub pre_control_mean: f64,
    pub post_treated_mean: f64,
    pub post_control_mean: f64,
    #[serde(rename = "DID_effect")]
    pub did_effect: f64,
    pub cell_counts: CellCounts,
}

impl Estimate for DidEstimate {
    fn scalars(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("pre_treated_mean", self.pre_treated_mean),
            ("pre_control_mean", self.pre_control_mean),
            ("post_treated_mean", self.post_treated_mean),
            ("post_control_mean", self.post_control_mean),
            ("DID_effect", self.did_effect),
        ]
    }
}

/// Difference-in-differences with the default [`DidOptions`]
/// (overlapping periods are warned about, not rejected).
///
/// See [`run_did_with`] for parameters and errors.
pub fn run_did(
    dataset: &Dataset, outcome_column: &str, treatment_column: &str, time_column: &str,
    pre_period: Period, post_period: Period,
) -> CausalResult<DidEstimate> {
    run_did_with(
        dataset,
        outcome_column,
        treatment_column,
        time_column,
        pre_period,
        post_period,
        &DidOptions::default(),
    )
}

/// Difference-in-differences with explicit options.
///
/// Parameters
/// ----------
/// - `outcome_column`: numeric outcome.
/// - `treatment_column`: 0/1 indicator, `1` = treated.
/// - `time_column`: timestamp column, or text column of ISO-8601 strings.
/// - `pre_period`, `post_period`: inclusive windows.
/// - `opts`: period-ordering policy.
///
/// Errors
/// ------
/// - `CausalError::Data` for missing or incompatible columns and
///   unparseable timestamps.
/// - `CausalError::OverlappingPeriods` under `PeriodPolicy::Reject` when
///   `post_period.start() <= pre_period.end()`.
/// - `CausalError::EmptyWindow` naming the first empty period × group cell.
///
/// Examples
/// --------
/// ```rust
/// use causal_toolkit::data::{Dataset, Period};
/// use causal_toolkit::estimators::did::run_did;
///
/// let ds = Dataset::new()
///     .with_numeric("y", vec![10.0, 10.0, 18.0, 12.0]).unwrap()
///     .with_numeric("t", vec![1.0, 0.0, 1.0, 0.0]).unwrap()
///     .with_text("day", ["2025-01-01", "2025-01-01", "2025-02-01", "2025-02-01"]).unwrap();
/// let pre = Period::parse("2025-01-01", "2025-01-31").unwrap();
/// let post = Period::parse("2025-02-01", "2025-02-28").unwrap();
///
/// let out = run_did(&ds, "y", "t", "day", pre, post).unwrap();
/// assert_eq!(out.did_effect, 6.0);
/// ```
pub fn run_did_with(
    dataset: &Dataset, outcome_column: &str, treatment_column: &str, time_column: &str,
    pre_period: Period, post_period: Period, opts: &DidOptions,
) -> CausalResult<DidEstimate> {
    check_period_order(&pre_period, &post_period, opts.period_policy)?;

    let outcome = dataset.finite_numeric(outcome_column)?;
    let treated = dataset.indicator(treatment_column)?;
    let times = dataset.timestamps(time_column)?;

    let mut cells = [Cell::default(); 4];
    for ((&t, &is_treated), &y) in times.iter().zip(treated.iter()).zip(outcome.iter()) {
        let group = if is_treated { 0 } else { 1 };
        if pre_period.contains(t) {
            cells[group].push(y);
        }
        if post_period.contains(t) {
            cells[2 + group].push(y);
        }
    }

    let [pre_treated, pre_control, post_treated, post_control] = cells;
    let pre_treated_mean = pre_treated.mean("pre-period treated", &pre_period)?;
    let pre_control_mean = pre_control.mean("pre-period control", &pre_period)?;
    let post_treated_mean = post_treated.mean("post-period treated", &post_period)?;
    let post_control_mean = post_control.mean("post-period control", &post_period)?;
    let did_effect =
        (post_treated_mean - pre_treated_mean) - (post_control_mean - pre_control_mean);

    let cell_counts = CellCounts {
        pre_treated: pre_treated.n,
        pre_control: pre_control.n,
        post_treated: post_treated.n,
        post_control: post_control.n,
    };
    log::debug!("run_did: cell counts {cell_counts:?}, DID_effect = {did_effect}");

    Ok(DidEstimate {
        pre_treated_mean,
        pre_control_mean,
        post_treated_mean,
        post_control_mean,
        did_effect,
        cell_counts,
    })
}

fn check_period_order(pre: &Period, post: &Period, policy: PeriodPolicy) -> CausalResult<()> {
    if post.start() > pre.end() {
        return Ok(());
    }
    match policy {
        PeriodPolicy::Warn => {
            log::warn!("run_did: post period {post} does not start after pre period {pre}");
            Ok(())
        }
        PeriodPolicy::Reject => Err(CausalError::OverlappingPeriods {
            pre: pre.to_string(),
            post: post.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    sum: f64,
    n: usize,
}

impl Cell {
    fn push(&mut self, y: f64) {
        self.sum += y;
        self.n += 1;
    }

    fn mean(&self, label: &str, period: &Period) -> CausalResult<f64> {
        if self.n == 0 {
            return Err(CausalError::EmptyWindow { window: format!("{label} {period}") });
        }
        Ok(self.sum / self.n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataError;
    use chrono::{NaiveDate, NaiveDateTime};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The double difference on a hand-computed four-cell example.
    // - Inclusive period bounds and text/timestamp time columns.
    // - Empty cells, the period policy, and unparseable times.
    // -------------------------------------------------------------------------

    fn day(m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, m, d).and_then(|x| x.and_hms_opt(0, 0, 0)).unwrap()
    }

    fn periods() -> (Period, Period) {
        let pre = Period::parse("2025-01-01", "2025-01-31").unwrap();
        let post = Period::parse("2025-02-01", "2025-02-28").unwrap();
        (pre, post)
    }

    fn dataset(y: Vec<f64>, t: Vec<f64>, when: Vec<NaiveDateTime>) -> Dataset {
        Dataset::new()
            .with_numeric("y", y)
            .and_then(|d| d.with_numeric("t", t))
            .and_then(|d| d.with_timestamps("when", when))
            .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Cell means are averaged within period and group before differencing.
    //
    // Given
    // -----
    // - Pre: treated {9, 11}, control {10}. Post: treated {18}, control
    //   {11, 13}. One row outside both periods.
    //
    // Expect
    // ------
    // - Means 10 / 10 / 18 / 12, DID_effect = 6, counts 2 / 1 / 1 / 2.
    fn averages_cells_and_takes_double_difference() {
        // Arrange
        let ds = dataset(
            vec![9.0, 11.0, 10.0, 18.0, 11.0, 13.0, 100.0],
            vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![day(1, 1), day(1, 31), day(1, 15), day(2, 1), day(2, 10), day(2, 28), day(3, 1)],
        );
        let (pre, post) = periods();

        // Act
        let out = run_did(&ds, "y", "t", "when", pre, post).unwrap();

        // Assert
        assert_eq!(out.pre_treated_mean, 10.0);
        assert_eq!(out.pre_control_mean, 10.0);
        assert_eq!(out.post_treated_mean, 18.0);
        assert_eq!(out.post_control_mean, 12.0);
        assert_eq!(out.did_effect, 6.0);
        assert_eq!(out.cell_counts, CellCounts {
            pre_treated: 2,
            pre_control: 1,
            post_treated: 1,
            post_control: 2
        });
    }

    #[test]
    // Purpose
    // -------
    // ISO-8601 text times are parsed the same way as timestamp columns.
    fn accepts_text_time_column() {
        let ds = Dataset::new()
            .with_numeric("y", vec![1.0, 2.0, 5.0, 3.0])
            .and_then(|d| d.with_numeric("t", vec![1.0, 0.0, 1.0, 0.0]))
            .and_then(|d| {
                d.with_text("when", [
                    "2025-01-05",
                    "2025-01-05T08:00:00",
                    "2025-02-03",
                    "2025-02-03",
                ])
            })
            .unwrap();
        let (pre, post) = periods();

        let out = run_did(&ds, "y", "t", "when", pre, post).unwrap();

        assert_eq!(out.did_effect, (5.0 - 1.0) - (3.0 - 2.0));
    }

    #[test]
    // Purpose
    // -------
    // An empty cell is reported with its period and group, not read as 0.
    fn empty_cell_is_an_error() {
        let ds = dataset(vec![1.0, 2.0, 3.0], vec![1.0, 0.0, 1.0], vec![
            day(1, 3),
            day(1, 4),
            day(2, 5),
        ]);
        let (pre, post) = periods();

        match run_did(&ds, "y", "t", "when", pre, post) {
            Err(CausalError::EmptyWindow { window }) => {
                assert!(window.starts_with("post-period control"), "got: {window}")
            }
            other => panic!("expected EmptyWindow, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Overlapping periods are accepted under `Warn` and rejected under
    // `Reject`.
    fn period_policy_controls_overlap_handling() {
        let ds = dataset(vec![1.0, 2.0, 3.0, 4.0], vec![1.0, 0.0, 1.0, 0.0], vec![
            day(1, 10),
            day(1, 10),
            day(1, 20),
            day(1, 20),
        ]);
        let pre = Period::parse("2025-01-01", "2025-01-20").unwrap();
        let post = Period::parse("2025-01-15", "2025-01-31").unwrap();
        let reject = DidOptions { period_policy: PeriodPolicy::Reject };

        let warned = run_did(&ds, "y", "t", "when", pre, post).unwrap();
        let rejected = run_did_with(&ds, "y", "t", "when", pre, post, &reject);

        assert_eq!(warned.cell_counts.pre_treated, 2);
        assert_eq!(warned.cell_counts.post_treated, 1);
        assert!(matches!(rejected, Err(CausalError::OverlappingPeriods { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A numeric time column is not coercible to timestamps.
    fn numeric_time_column_is_rejected() {
        let ds = Dataset::new()
            .with_numeric("y", vec![1.0])
            .and_then(|d| d.with_numeric("t", vec![1.0]))
            .and_then(|d| d.with_numeric("when", vec![20250101.0]))
            .unwrap();
        let (pre, post) = periods();

        assert!(matches!(
            run_did(&ds, "y", "t", "when", pre, post),
            Err(CausalError::Data(DataError::TypeMismatch { .. }))
        ));
    }
}
