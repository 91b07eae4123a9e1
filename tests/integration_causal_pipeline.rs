//! Integration tests for the causal estimators.
//!
//! Purpose
//! -------
//! - Validate each estimator end to end: from a `Dataset` built the way a
//!   caller would build it, through the public entry points, to the
//!   serialized result.
//! - Exercise sampled data (seeded `StdRng`) in addition to hand-computed
//!   examples.
//!
//! Coverage
//! --------
//! - `estimators::ab`: rate recovery on Bernoulli draws, centered p-values
//!   under the null, p-value shrinking with sample size.
//! - `estimators::psm`: effect recovery on a confounded sample, empty
//!   control arm.
//! - `estimators::did`: the four-cell example and parallel trends.
//! - `estimators::synth_control`: exact donor recovery with a numeric unit
//!   column, unknown treated unit.
//! - Determinism of repeated calls and canonical serialized field names.
//!
//! Exclusions
//! ----------
//! - Optimizer and NNLS internals; those are covered by unit tests.
//! - Python bindings.
use causal_toolkit::{
    data::{Dataset, Period, Row, Value, parse_timestamp},
    estimators::prelude::*,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Bernoulli, Distribution, Normal};

fn row(values: Vec<(&str, Value)>) -> Row {
    values.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Per-user A/B rows: one exposure each, conversion drawn with rate `p`.
fn ab_rows(rng: &mut StdRng, n: usize, p1: f64, p0: f64) -> Dataset {
    let treat = Bernoulli::new(p1).unwrap();
    let control = Bernoulli::new(p0).unwrap();
    let mut conv = Vec::with_capacity(2 * n);
    let mut arm = Vec::with_capacity(2 * n);
    for _ in 0..n {
        conv.push(if treat.sample(rng) { 1.0 } else { 0.0 });
        arm.push(1.0);
        conv.push(if control.sample(rng) { 1.0 } else { 0.0 });
        arm.push(0.0);
    }
    Dataset::new()
        .with_numeric("converted", conv)
        .and_then(|d| d.with_numeric("exposed", vec![1.0; 2 * n]))
        .and_then(|d| d.with_numeric("arm", arm))
        .unwrap()
}

#[test]
fn ab_recovers_sampled_rates() {
    let mut rng = StdRng::seed_from_u64(42);
    let ds = ab_rows(&mut rng, 20_000, 0.12, 0.10);

    let out = ab_summary(&ds, "converted", "exposed", "arm").unwrap();

    assert!((out.rate_treatment - 0.12).abs() < 0.01, "p1 = {}", out.rate_treatment);
    assert!((out.rate_control - 0.10).abs() < 0.01, "p0 = {}", out.rate_control);
    assert!(out.z > 0.0);
    assert!(out.p_value < 0.05, "p = {}", out.p_value);
}

#[test]
fn ab_under_the_null_has_centered_p_values() {
    let mut rng = StdRng::seed_from_u64(2024);
    let draws = 200;

    let (mut p_sum, mut lift_sum) = (0.0, 0.0);
    for _ in 0..draws {
        let ds = ab_rows(&mut rng, 2_000, 0.1, 0.1);
        let out = ab_summary(&ds, "converted", "exposed", "arm").unwrap();
        p_sum += out.p_value;
        lift_sum += out.lift;
    }

    let mean_p = p_sum / draws as f64;
    let mean_lift = lift_sum / draws as f64;
    assert!((0.4..0.6).contains(&mean_p), "mean p = {mean_p}");
    assert!(mean_lift.abs() < 0.02, "mean lift = {mean_lift}");
}

#[test]
fn ab_p_value_shrinks_with_sample_size() {
    let aggregated = |scale: f64| {
        Dataset::new()
            .with_numeric("clicks", vec![60.0 * scale, 50.0 * scale])
            .and_then(|d| d.with_numeric("views", vec![1000.0 * scale, 1000.0 * scale]))
            .and_then(|d| d.with_numeric("arm", vec![1.0, 0.0]))
            .unwrap()
    };

    let p_values: Vec<f64> = [1.0, 4.0, 16.0]
        .iter()
        .map(|&s| ab_summary(&aggregated(s), "clicks", "views", "arm").unwrap().p_value)
        .collect();

    assert!(p_values.windows(2).all(|w| w[1] < w[0]), "{p_values:?}");
}

#[test]
fn psm_recovers_constant_effect_under_confounding() {
    let mut rng = StdRng::seed_from_u64(7);
    let x_dist = Normal::new(0.0, 1.0).unwrap();
    let noise = Normal::new(0.0, 0.1).unwrap();
    let mut rows = Vec::new();
    for _ in 0..400 {
        let x: f64 = x_dist.sample(&mut rng);
        let p_treat = 1.0 / (1.0 + (-x).exp());
        let t = if rng.gen::<f64>() < p_treat { 1.0 } else { 0.0 };
        let y = 3.0 * x + 2.0 * t + noise.sample(&mut rng);
        rows.push(row(vec![("y", y.into()), ("t", t.into()), ("x", x.into())]));
    }
    let ds = Dataset::from_rows(rows).unwrap();
    let y = ds.numeric("y").unwrap();
    let t = ds.indicator("t").unwrap();
    let arm_mean = |arm: bool| {
        let picked: Vec<f64> =
            y.iter().zip(&t).filter(|&(_, &ti)| ti == arm).map(|(&v, _)| v).collect();
        picked.iter().sum::<f64>() / picked.len() as f64
    };
    let naive = arm_mean(true) - arm_mean(false);

    let out = run_psm(&ds, "y", "t", &["x".to_string()]).unwrap();

    assert!((out.ate_psm - 2.0).abs() < 0.5, "ATE = {}", out.ate_psm);
    assert!((naive - 2.0).abs() > (out.ate_psm - 2.0).abs());
    assert_eq!(out.n_pairs, t.iter().filter(|&&ti| ti).count());
    assert!(out.n_unique_controls <= out.n_pairs);
}

#[test]
fn psm_without_controls_is_insufficient_donors() {
    let ds = Dataset::new()
        .with_numeric("y", vec![1.0, 2.0, 3.0])
        .and_then(|d| d.with_numeric("t", vec![1.0, 1.0, 1.0]))
        .and_then(|d| d.with_numeric("x", vec![0.1, 0.2, 0.3]))
        .unwrap();

    assert_eq!(
        run_psm(&ds, "y", "t", &["x".to_string()]),
        Err(CausalError::InsufficientDonors { column: "t".to_string() })
    );
}

fn did_dataset(pre: (f64, f64), post: (f64, f64)) -> Dataset {
    let mut rows = Vec::new();
    for (day, (treated, control)) in [("2025-01-15", pre), ("2025-02-15", post)] {
        for _ in 0..3 {
            let ts = parse_timestamp(day).unwrap();
            rows.push(row(vec![("y", treated.into()), ("t", 1.0.into()), ("day", ts.into())]));
            rows.push(row(vec![("y", control.into()), ("t", 0.0.into()), ("day", ts.into())]));
        }
    }
    Dataset::from_rows(rows).unwrap()
}

fn periods() -> (Period, Period) {
    (
        Period::parse("2025-01-01", "2025-01-31").unwrap(),
        Period::parse("2025-02-01", "2025-02-28").unwrap(),
    )
}

#[test]
fn did_four_cell_example() {
    let ds = did_dataset((10.0, 10.0), (18.0, 12.0));
    let (pre, post) = periods();

    let out = run_did(&ds, "y", "t", "day", pre, post).unwrap();

    assert_eq!(out.did_effect, 6.0);
    assert_eq!(out.cell_counts.post_control, 3);
    assert_eq!(out.get("DID_effect"), Some(6.0));
}

#[test]
fn did_parallel_trends_give_zero_effect() {
    let ds = did_dataset((10.0, 4.0), (15.0, 9.0));
    let (pre, post) = periods();

    let out = run_did(&ds, "y", "t", "day", pre, post).unwrap();

    assert_eq!(out.did_effect, 0.0);
}

/// Numeric unit ids 1..=4 over six months; unit 4 copies unit 2 until
/// `2024-04-01`, then jumps by 3.
fn synth_dataset() -> Dataset {
    let paths: [(i64, [f64; 6]); 4] = [
        (1, [1.0, 3.0, 2.0, 4.0, 5.0, 4.0]),
        (2, [2.0, 1.0, 4.0, 3.0, 3.0, 2.0]),
        (3, [5.0, 2.0, 1.0, 1.0, 2.0, 6.0]),
        (4, [2.0, 1.0, 4.0, 6.0, 6.0, 5.0]),
    ];
    let months =
        ["2024-01-01", "2024-02-01", "2024-03-01", "2024-04-01", "2024-05-01", "2024-06-01"];
    let mut rows = Vec::new();
    for (unit, path) in paths {
        for (month, y) in months.iter().zip(path) {
            rows.push(row(vec![
                ("unit", unit.into()),
                ("month", (*month).into()),
                ("sales", y.into()),
            ]));
        }
    }
    Dataset::from_rows(rows).unwrap()
}

#[test]
fn synth_control_recovers_matching_donor() {
    let ds = synth_dataset();
    let start = parse_timestamp("2024-04-01").unwrap();

    let out = run_synth_control(&ds, "sales", "unit", "month", "4", start).unwrap();

    assert_eq!(out.weights.keys().collect::<Vec<_>>(), ["1", "2", "3"]);
    assert!((out.weights["2"] - 1.0).abs() < 1e-9, "{:?}", out.weights);
    assert!((out.post_period_ate - 3.0).abs() < 1e-9);
    assert!(out.pre_period_rmspe < 1e-9);
    assert_eq!(out.trajectory.len(), 6);
}

#[test]
fn synth_control_unknown_unit() {
    let ds = synth_dataset();
    let start = parse_timestamp("2024-04-01").unwrap();

    assert_eq!(
        run_synth_control(&ds, "sales", "unit", "month", "9", start),
        Err(CausalError::UnknownUnit { column: "unit".to_string(), unit: "9".to_string() })
    );
}

#[test]
fn repeated_calls_are_identical() {
    let ds = synth_dataset();
    let start = parse_timestamp("2024-04-01").unwrap();
    let did = did_dataset((10.0, 10.0), (18.0, 12.0));
    let (pre, post) = periods();

    assert_eq!(
        run_synth_control(&ds, "sales", "unit", "month", "4", start),
        run_synth_control(&ds, "sales", "unit", "month", "4", start)
    );
    assert_eq!(
        run_did(&did, "y", "t", "day", pre, post),
        run_did(&did, "y", "t", "day", pre, post)
    );
}

#[test]
fn serialized_results_use_canonical_field_names() {
    let did = did_dataset((10.0, 10.0), (18.0, 12.0));
    let (pre, post) = periods();
    let synth = synth_dataset();
    let start = parse_timestamp("2024-04-01").unwrap();
    let psm = Dataset::new()
        .with_numeric("y", vec![5.0, 3.0])
        .and_then(|d| d.with_numeric("t", vec![1.0, 0.0]))
        .and_then(|d| d.with_numeric("x", vec![0.5, 0.4]))
        .unwrap();

    let did_json =
        serde_json::to_value(run_did(&did, "y", "t", "day", pre, post).unwrap()).unwrap();
    let synth_json = serde_json::to_value(
        run_synth_control(&synth, "sales", "unit", "month", "4", start).unwrap(),
    )
    .unwrap();
    let psm_json =
        serde_json::to_value(run_psm(&psm, "y", "t", &["x".to_string()]).unwrap()).unwrap();

    assert_eq!(did_json["DID_effect"], 6.0);
    assert!(synth_json.get("post_period_ATE").is_some());
    assert!(synth_json["weights"].get("2").is_some());
    assert_eq!(psm_json["ATE_psm"], 2.0);
    assert_eq!(psm_json["n_pairs"], 1);
}
