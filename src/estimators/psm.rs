//! estimators::psm — propensity-score matching.
//!
//! Purpose
//! -------
//! Estimate the average effect on treated units by pairing each treated row
//! with the control row whose propensity score is closest, then averaging
//! the outcome differences.
//!
//! Key behaviors
//! -------------
//! - The propensity model is fitted on *all* rows; scores are then split by
//!   group.
//! - Matching is 1-NN **with replacement**: a control may be matched to
//!   several treated rows. `n_unique_controls` reports how many distinct
//!   controls were used.
//! - Ties in score distance go to the lowest control row index.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_pairs` equals the number of treated rows.
//! - Point estimate only; no standard error is computed.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    data::Dataset,
    estimators::{
        Estimate,
        errors::{CausalError, CausalResult},
        validation::{mean, require_group},
    },
    propensity::{LogisticPropensity, NeighborSearch, PropensityModel, SortedScan},
};

/// Share of treated rows above which a single control being reused is
/// worth a warning.
const HEAVY_REUSE_SHARE: f64 = 0.5;

/// PsmEstimate — matched-pairs effect on the treated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsmEstimate {
    #[serde(rename = "ATE_psm")]
    pub ate_psm: f64,
    pub n_pairs: usize,
    pub n_unique_controls: usize,
}

impl Estimate for PsmEstimate {
    fn scalars(&self) -> Vec<(&'static str, f64)> {
        vec![("ATE_psm", self.ate_psm), ("n_pairs", self.n_pairs as f64)]
    }
}

/// Propensity-score matching with the default strategies
/// ([`LogisticPropensity::default`] and [`SortedScan`]).
///
/// See [`run_psm_with`] for parameters and errors.
pub fn run_psm(
    dataset: &Dataset, outcome_column: &str, treatment_column: &str, covariate_columns: &[String],
) -> CausalResult<PsmEstimate> {
    run_psm_with(
        dataset,
        outcome_column,
        treatment_column,
        covariate_columns,
        &LogisticPropensity::default(),
        &SortedScan,
    )
}

/// Propensity-score matching with explicit strategies.
///
/// Parameters
/// ----------
/// - `outcome_column`: numeric outcome.
/// - `treatment_column`: 0/1 indicator, `1` = treated.
/// - `covariate_columns`: numeric columns fed to the propensity model.
/// - `model`: any [`PropensityModel`].
/// - `search`: any [`NeighborSearch`].
///
/// Errors
/// ------
/// - `CausalError::Data` for missing, non-numeric, non-finite or non-binary
///   columns.
/// - `CausalError::MissingGroup { group: 1 }` when no row is treated.
/// - `CausalError::InsufficientDonors` when no row is a control.
/// - `CausalError::ModelFit { model: "propensity", .. }` when the model
///   fails (degenerate covariates, non-convergence, ...).
pub fn run_psm_with<M, S>(
    dataset: &Dataset, outcome_column: &str, treatment_column: &str, covariate_columns: &[String],
    model: &M, search: &S,
) -> CausalResult<PsmEstimate>
where
    M: PropensityModel + ?Sized,
    S: NeighborSearch + ?Sized,
{
    let outcome = dataset.finite_numeric(outcome_column)?;
    let treated = dataset.indicator(treatment_column)?;
    let covariates = dataset.numeric_matrix(covariate_columns)?;
    let n_treated = require_group(treatment_column, &treated, 1)?;
    if !treated.iter().any(|&t| !t) {
        return Err(CausalError::InsufficientDonors { column: treatment_column.to_string() });
    }

    let scores = model.fit_scores(covariates.view(), &treated)?;
    if scores.len() != treated.len() {
        return Err(CausalError::ModelFit {
            model: "propensity",
            reason: format!("expected {} scores, got {}", treated.len(), scores.len()),
        });
    }

    let (treated_rows, control_rows): (Vec<usize>, Vec<usize>) =
        (0..treated.len()).partition(|&i| treated[i]);
    let treated_scores: Vec<f64> = treated_rows.iter().map(|&i| scores[i]).collect();
    let control_scores: Vec<f64> = control_rows.iter().map(|&i| scores[i]).collect();

    let matches = search.nearest(&control_scores, &treated_scores);
    if matches.len() != treated_rows.len() || matches.iter().any(|&k| k >= control_rows.len()) {
        return Err(CausalError::ModelFit {
            model: "nearest-neighbor",
            reason: "search returned out-of-range or missing matches".to_string(),
        });
    }

    let effects = treated_rows
        .iter()
        .zip(matches.iter())
        .map(|(&t, &k)| outcome[t] - outcome[control_rows[k]]);
    let ate_psm = mean(effects).ok_or_else(|| CausalError::MissingGroup {
        column: treatment_column.to_string(),
        group: 1,
    })?;
    let n_unique_controls = matches.iter().collect::<BTreeSet<_>>().len();

    warn_on_heavy_reuse(&matches, n_treated);
    log::debug!(
        "run_psm: {n_treated} treated, {} controls, {n_unique_controls} distinct matches",
        control_rows.len()
    );

    Ok(PsmEstimate { ate_psm, n_pairs: n_treated, n_unique_controls })
}

fn warn_on_heavy_reuse(matches: &[usize], n_treated: usize) {
    let mut counts = BTreeMap::<usize, usize>::new();
    for &k in matches {
        *counts.entry(k).or_default() += 1;
    }
    if let Some((&control, &uses)) = counts.iter().max_by_key(|(_, &c)| c) {
        if n_treated > 1 && uses as f64 > HEAVY_REUSE_SHARE * n_treated as f64 {
            log::warn!(
                "run_psm: control #{control} is matched to {uses} of {n_treated} treated rows"
            );
        }
    }
}
