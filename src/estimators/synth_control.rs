//! estimators::synth_control — synthetic control with NNLS donor weights.
//!
//! Purpose
//! -------
//! Build a counterfactual for a single treated unit as a non-negative,
//! normalized combination of donor units, fitted on the pre-treatment
//! window, and report the treated − synthetic gap over time.
//!
//! Key behaviors
//! -------------
//! - The long-format input is pivoted into a unit × time panel; duplicate
//!   (unit, time) observations are averaged. Times are sorted ascending and
//!   units lexicographically by label.
//! - Donor weights solve `min ‖X₀w − y₁‖², w ≥ 0` over pre-treatment times
//!   (`time < treat_start`) and are renormalized to sum to one when their
//!   sum is positive.
//! - The synthetic path `X₀w` is produced for every time; `post_period_ATE`
//!   is the mean gap over `time >= treat_start`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Weights are non-negative and sum to 1, except in the degenerate case
//!   where NNLS returns all zeros; the weights then stay zero (synthetic
//!   path ≡ 0) and a warning is logged.
//! - Every unit must be observed at every time; gaps in the panel are an
//!   error rather than NaN in the fit.
//!
//! Conventions
//! -----------
//! - Unit labels come from `Dataset::labels`, so a numeric unit column is
//!   matched against `treated_unit` in its rendered form (`3.0` → `"3"`).

use chrono::NaiveDateTime;
use ndarray::{Array1, Array2, Axis, s};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    data::Dataset,
    estimators::{
        Estimate,
        errors::{CausalError, CausalResult},
        validation::mean,
    },
    optimization::nnls::{LawsonHanson, NnlsSolver},
};

/// One time step of the treated, synthetic and gap paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub time: NaiveDateTime,
    pub treated: f64,
    pub synthetic: f64,
    pub gap: f64,
}

/// SynthControlEstimate — donor weights, effect and full trajectory.
///
/// Fields
/// ------
/// - `weights`: every donor label → weight (0 for unused donors).
/// - `post_period_ate`: mean gap over post-treatment times.
/// - `pre_period_rmspe`: root mean squared pre-treatment gap (fit quality).
/// - `trajectory`: ascending by time, covering both windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthControlEstimate {
    pub weights: BTreeMap<String, f64>,
    #[serde(rename = "post_period_ATE")]
    pub post_period_ate: f64,
    pub pre_period_rmspe: f64,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl Estimate for SynthControlEstimate {
    fn scalars(&self) -> Vec<(&'static str, f64)> {
        vec![("post_period_ATE", self.post_period_ate)]
    }
}

/// Synthetic control with the default [`LawsonHanson`] NNLS solver.
///
/// See [`run_synth_control_with`] for parameters and errors.
pub fn run_synth_control(
    dataset: &Dataset, outcome_column: &str, unit_column: &str, time_column: &str,
    treated_unit: &str, treat_start: NaiveDateTime,
) -> CausalResult<SynthControlEstimate> {
    run_synth_control_with(
        dataset,
        outcome_column,
        unit_column,
        time_column,
        treated_unit,
        treat_start,
        &LawsonHanson::default(),
    )
}

/// Synthetic control with an explicit NNLS solver.
///
/// Parameters
/// ----------
/// - `outcome_column`: numeric outcome.
/// - `unit_column`: unit labels (text, or numeric rendered as labels).
/// - `time_column`: timestamp column or ISO-8601 text.
/// - `treated_unit`: label of the single treated unit.
/// - `treat_start`: first post-treatment instant.
/// - `solver`: any [`NnlsSolver`].
///
/// Errors
/// ------
/// - `CausalError::Data` for missing or incompatible columns.
/// - `CausalError::UnknownUnit` if `treated_unit` does not occur.
/// - `CausalError::InsufficientDonors` if it is the only unit.
/// - `CausalError::EmptyWindow("pre-treatment" | "post-treatment")` if no
///   time falls on one side of `treat_start`.
/// - `CausalError::IncompletePanel` for a missing (unit, time) cell.
/// - `CausalError::ModelFit { model: "donor weights", .. }` if NNLS fails.
pub fn run_synth_control_with<S>(
    dataset: &Dataset, outcome_column: &str, unit_column: &str, time_column: &str,
    treated_unit: &str, treat_start: NaiveDateTime, solver: &S,
) -> CausalResult<SynthControlEstimate>
where
    S: NnlsSolver + ?Sized,
{
    let outcome = dataset.finite_numeric(outcome_column)?;
    let units = dataset.labels(unit_column)?;
    let times = dataset.timestamps(time_column)?;

    let panel = Panel::pivot(&units, &times, outcome.iter().copied());
    let Some(treated_idx) = panel.units.iter().position(|u| u == treated_unit) else {
        return Err(CausalError::UnknownUnit {
            column: unit_column.to_string(),
            unit: treated_unit.to_string(),
        });
    };
    if panel.units.len() < 2 {
        return Err(CausalError::InsufficientDonors { column: unit_column.to_string() });
    }
    let n_pre = panel.times.partition_point(|t| *t < treat_start);
    if n_pre == 0 {
        return Err(empty_window("pre-treatment"));
    }
    if n_pre == panel.times.len() {
        return Err(empty_window("post-treatment"));
    }

    let grid = panel.grid()?;
    let treated_path = grid.column(treated_idx).to_owned();
    let donor_cols: Vec<usize> = (0..panel.units.len()).filter(|&j| j != treated_idx).collect();
    let donors = grid.select(Axis(1), &donor_cols);

    let raw = solver.solve(donors.slice(s![..n_pre, ..]), treated_path.slice(s![..n_pre]))?;
    let weights = normalize(raw);

    let synthetic = donors.dot(&weights);
    let gap = &treated_path - &synthetic;
    let post_period_ate = mean(gap.slice(s![n_pre..]).iter().copied()).unwrap_or(f64::NAN);
    let pre_period_rmspe =
        mean(gap.slice(s![..n_pre]).iter().map(|g| g * g)).unwrap_or(f64::NAN).sqrt();

    let trajectory = panel
        .times
        .iter()
        .enumerate()
        .map(|(i, &time)| TrajectoryPoint {
            time,
            treated: treated_path[i],
            synthetic: synthetic[i],
            gap: gap[i],
        })
        .collect();
    let weights = donor_cols
        .iter()
        .map(|&j| panel.units[j].clone())
        .zip(weights.iter().copied())
        .collect();

    log::debug!(
        "run_synth_control: {} donors, {} pre / {} post times, RMSPE = {pre_period_rmspe:.6}",
        donor_cols.len(),
        n_pre,
        panel.times.len() - n_pre
    );
    Ok(SynthControlEstimate { weights, post_period_ate, pre_period_rmspe, trajectory })
}

fn empty_window(window: &str) -> CausalError {
    CausalError::EmptyWindow { window: window.to_string() }
}

fn normalize(raw: Array1<f64>) -> Array1<f64> {
    let total = raw.sum();
    if total > 0.0 {
        raw / total
    } else {
        log::warn!("run_synth_control: all donor weights are zero; synthetic path is zero");
        raw
    }
}

/// Long-format observations aggregated by (unit, time).
struct Panel {
    units: Vec<String>,
    times: Vec<NaiveDateTime>,
    cells: BTreeMap<(usize, usize), (f64, usize)>,
}

impl Panel {
    fn pivot(
        units: &[String], times: &[NaiveDateTime], outcome: impl Iterator<Item = f64>,
    ) -> Self {
        let unit_axis: Vec<String> =
            units.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        let time_axis: Vec<NaiveDateTime> =
            times.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let mut cells = BTreeMap::<(usize, usize), (f64, usize)>::new();
        for ((unit, time), y) in units.iter().zip(times.iter()).zip(outcome) {
            if let (Ok(u), Ok(t)) = (unit_axis.binary_search(unit), time_axis.binary_search(time))
            {
                let cell = cells.entry((u, t)).or_insert((0.0, 0));
                cell.0 += y;
                cell.1 += 1;
            }
        }
        Self { units: unit_axis, times: time_axis, cells }
    }

    /// Dense time × unit matrix of cell means.
    fn grid(&self) -> CausalResult<Array2<f64>> {
        let mut grid = Array2::<f64>::zeros((self.times.len(), self.units.len()));
        for (u, unit) in self.units.iter().enumerate() {
            for (t, time) in self.times.iter().enumerate() {
                let &(sum, n) = self.cells.get(&(u, t)).ok_or_else(|| {
                    CausalError::IncompletePanel { unit: unit.clone(), time: time.to_string() }
                })?;
                grid[[t, u]] = sum / n as f64;
            }
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::parse_timestamp,
        optimization::{errors::OptResult, nnls::NnlsOptions},
    };
    use ndarray::{ArrayView1, ArrayView2};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact recovery of a donor that matches the treated unit.
    // - Post-period divergence showing up in `post_period_ATE`.
    // - Averaging of duplicate observations.
    // - The all-zero weight case.
    // - Unknown unit, missing donors, empty windows, incomplete panels and
    //   solver failures.
    // -------------------------------------------------------------------------

    const DAYS: [&str; 5] = ["2025-03-01", "2025-03-02", "2025-03-03", "2025-03-04", "2025-03-05"];

    /// Long-format dataset from `(unit, path)` pairs over `DAYS`.
    fn panel(paths: &[(&str, [f64; 5])]) -> Dataset {
        let mut units = Vec::new();
        let mut days = Vec::new();
        let mut ys = Vec::new();
        for (unit, path) in paths {
            for (day, y) in DAYS.iter().zip(path) {
                units.push(unit.to_string());
                days.push(day.to_string());
                ys.push(*y);
            }
        }
        Dataset::new()
            .with_text("unit", units)
            .and_then(|d| d.with_text("day", days))
            .and_then(|d| d.with_numeric("y", ys))
            .unwrap()
    }

    fn start() -> NaiveDateTime {
        parse_timestamp("2025-03-04").unwrap()
    }

    #[test]
    // Purpose
    // -------
    // A donor equal to the treated unit in the pre period receives all the
    // weight; equal post paths give a zero effect.
    //
    // Given
    // -----
    // - Donors A, B, C with linearly independent pre paths; treated T = B.
    //
    // Expect
    // ------
    // - w_B = 1, w_A = w_C = 0, post_period_ATE = 0, RMSPE = 0.
    fn exact_donor_match_gets_full_weight() {
        // Arrange
        let ds = panel(&[
            ("A", [1.0, 3.0, 2.0, 4.0, 5.0]),
            ("B", [2.0, 1.0, 4.0, 3.0, 3.0]),
            ("C", [5.0, 2.0, 1.0, 1.0, 2.0]),
            ("T", [2.0, 1.0, 4.0, 3.0, 3.0]),
        ]);

        // Act
        let out = run_synth_control(&ds, "y", "unit", "day", "T", start()).unwrap();

        // Assert
        assert!((out.weights["B"] - 1.0).abs() < 1e-9, "{:?}", out.weights);
        assert!(out.weights["A"].abs() < 1e-9 && out.weights["C"].abs() < 1e-9);
        assert!(out.post_period_ate.abs() < 1e-9);
        assert!(out.pre_period_rmspe < 1e-9);
        assert_eq!(out.trajectory.len(), 5);
        assert!(out.trajectory.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    // Purpose
    // -------
    // A post-period shift of the treated unit becomes the estimated effect.
    fn post_period_shift_is_the_effect() {
        let ds = panel(&[
            ("A", [1.0, 3.0, 2.0, 4.0, 5.0]),
            ("B", [2.0, 1.0, 4.0, 3.0, 3.0]),
            ("C", [5.0, 2.0, 1.0, 1.0, 2.0]),
            ("T", [2.0, 1.0, 4.0, 8.0, 10.0]),
        ]);

        let out = run_synth_control(&ds, "y", "unit", "day", "T", start()).unwrap();

        assert!((out.post_period_ate - 6.0).abs() < 1e-9, "ATE = {}", out.post_period_ate);
        let total: f64 = out.weights.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(out.weights.values().all(|&w| w >= 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Duplicate (unit, time) rows are averaged before fitting.
    fn duplicate_observations_are_averaged() {
        let ds = Dataset::new()
            .with_text("unit", ["T", "T", "D", "T", "D", "T", "D"])
            .and_then(|d| {
                d.with_text("day", [
                    "2025-03-01",
                    "2025-03-01",
                    "2025-03-01",
                    "2025-03-02",
                    "2025-03-02",
                    "2025-03-04",
                    "2025-03-04",
                ])
            })
            .and_then(|d| d.with_numeric("y", vec![1.0, 3.0, 2.0, 4.0, 4.0, 7.0, 5.0]))
            .unwrap();

        let out = run_synth_control(&ds, "y", "unit", "day", "T", start()).unwrap();

        assert_eq!(out.trajectory[0].treated, 2.0);
        assert!((out.weights["D"] - 1.0).abs() < 1e-12);
        assert!((out.post_period_ate - 2.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // When no non-negative combination helps, weights stay all zero and the
    // synthetic path is identically zero.
    fn all_zero_weights_are_left_unnormalized() {
        let ds = panel(&[
            ("A", [1.0, 2.0, 1.0, 2.0, 1.0]),
            ("B", [2.0, 1.0, 2.0, 1.0, 2.0]),
            ("T", [-1.0, -2.0, -1.5, -1.0, -1.0]),
        ]);

        let out = run_synth_control(&ds, "y", "unit", "day", "T", start()).unwrap();

        assert!(out.weights.values().all(|&w| w == 0.0));
        assert!(out.trajectory.iter().all(|p| p.synthetic == 0.0 && p.gap == p.treated));
        assert_eq!(out.post_period_ate, -1.0);
    }

    #[test]
    // Purpose
    // -------
    // Selector and panel problems map to their documented errors.
    fn invalid_configurations_are_rejected() {
        let ds = panel(&[("A", [1.0; 5]), ("T", [2.0; 5])]);
        let lonely = panel(&[("T", [2.0; 5])]);

        assert_eq!(
            run_synth_control(&ds, "y", "unit", "day", "Z", start()),
            Err(CausalError::UnknownUnit { column: "unit".into(), unit: "Z".into() })
        );
        assert_eq!(
            run_synth_control(&lonely, "y", "unit", "day", "T", start()),
            Err(CausalError::InsufficientDonors { column: "unit".into() })
        );
        assert_eq!(
            run_synth_control(&ds, "y", "unit", "day", "T", parse_timestamp("2025-03-01").unwrap()),
            Err(CausalError::EmptyWindow { window: "pre-treatment".into() })
        );
        assert_eq!(
            run_synth_control(&ds, "y", "unit", "day", "T", parse_timestamp("2025-04-01").unwrap()),
            Err(CausalError::EmptyWindow { window: "post-treatment".into() })
        );
    }

    #[test]
    // Purpose
    // -------
    // A unit missing one time step makes the panel incomplete.
    fn missing_cell_is_incomplete_panel() {
        let ds = Dataset::new()
            .with_text("unit", ["T", "T", "D"])
            .and_then(|d| d.with_text("day", ["2025-03-01", "2025-03-05", "2025-03-01"]))
            .and_then(|d| d.with_numeric("y", vec![1.0, 2.0, 3.0]))
            .unwrap();

        match run_synth_control(&ds, "y", "unit", "day", "T", start()) {
            Err(CausalError::IncompletePanel { unit, .. }) => assert_eq!(unit, "D"),
            other => panic!("expected IncompletePanel, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Solver failures surface as a donor-weight `ModelFit`.
    fn solver_failure_is_model_fit() {
        struct Exhausted;
        impl NnlsSolver for Exhausted {
            fn solve(&self, _: ArrayView2<'_, f64>, _: ArrayView1<'_, f64>) -> OptResult<Array1<f64>> {
                LawsonHanson::new(NnlsOptions::new(Some(1), None)?)
                    .solve(Array2::eye(3).view(), ndarray::array![1.0, 2.0, 3.0].view())
            }
        }
        let ds = panel(&[("A", [1.0; 5]), ("T", [2.0; 5])]);

        assert!(matches!(
            run_synth_control_with(&ds, "y", "unit", "day", "T", start(), &Exhausted),
            Err(CausalError::ModelFit { model: "donor weights", .. })
        ));
    }
}
