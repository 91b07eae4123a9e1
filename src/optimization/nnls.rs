//! nnls — non-negative least squares `min ‖A·x − b‖₂ subject to x ≥ 0`.
//!
//! Purpose
//! -------
//! Fit non-negative donor weights for the synthetic-control estimator. The
//! solver sits behind the [`NnlsSolver`] trait so callers can substitute
//! another implementation without touching the estimator.
//!
//! Key behaviors
//! -------------
//! - [`LawsonHanson`] is the classic active-set method: grow a passive set
//!   one column at a time along the steepest feasible direction, solve the
//!   unconstrained problem on that set, and step back toward feasibility
//!   whenever a passive coefficient would turn non-positive.
//! - The passive-set subproblem is solved with a nalgebra SVD, so
//!   rank-deficient designs (collinear donors) yield the minimum-norm
//!   solution instead of failing.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs must be finite and `A.nrows() == b.len()`; violations are
//!   reported before any iteration.
//! - Every returned coefficient is `>= 0`; coefficients outside the passive
//!   set are exactly `0.0`.
//! - Deterministic: ties in the dual vector are broken toward the lowest
//!   column index.
//!
//! Conventions
//! -----------
//! - The iteration budget counts passive-set solves. Exhausting it is
//!   `OptError::NnlsNotConverged`, not a silently truncated answer.
//! - The default tolerance is `10 · ε · ‖A‖₁ · max(m, n)`.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::optimization::errors::{OptError, OptResult};

/// Capability: solve `min ‖A·x − b‖₂, x ≥ 0`.
pub trait NnlsSolver {
    fn solve(&self, a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> OptResult<Array1<f64>>;
}

/// NnlsOptions — iteration budget and optimality tolerance.
///
/// - `max_iter = None` uses `max(3·n, 30)` for an `n`-column design.
/// - `tol = None` uses `10 · ε · ‖A‖₁ · max(m, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NnlsOptions {
    pub max_iter: Option<usize>,
    pub tol: Option<f64>,
}

impl NnlsOptions {
    /// # Errors
    /// - `OptError::InvalidMaxIter` when `max_iter == Some(0)`.
    /// - `OptError::InvalidNnlsTol` when `tol` is negative or non-finite.
    pub fn new(max_iter: Option<usize>, tol: Option<f64>) -> OptResult<Self> {
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "NNLS iteration budget must be greater than zero.",
            });
        }
        if let Some(tol) = tol {
            if !tol.is_finite() || tol < 0.0 {
                return Err(OptError::InvalidNnlsTol { tol });
            }
        }
        Ok(Self { max_iter, tol })
    }

    fn budget(&self, n_cols: usize) -> usize {
        self.max_iter.unwrap_or_else(|| (3 * n_cols).max(30))
    }

    fn tolerance(&self, a: ArrayView2<'_, f64>) -> f64 {
        self.tol.unwrap_or_else(|| {
            let norm_1 = a
                .columns()
                .into_iter()
                .map(|col| col.iter().map(|v| v.abs()).sum::<f64>())
                .fold(0.0_f64, f64::max);
            10.0 * f64::EPSILON * norm_1 * a.nrows().max(a.ncols()) as f64
        })
    }
}

/// Lawson–Hanson active-set NNLS.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LawsonHanson {
    pub opts: NnlsOptions,
}

impl LawsonHanson {
    pub fn new(opts: NnlsOptions) -> Self {
        Self { opts }
    }
}

impl NnlsSolver for LawsonHanson {
    /// Errors
    /// ------
    /// - `NnlsDimMismatch` / `NnlsNonFiniteInput` for malformed input.
    /// - `NnlsNotConverged` when the iteration budget runs out.
    /// - `NnlsSubproblemFailed` if the passive-set SVD solve fails.
    fn solve(&self, a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> OptResult<Array1<f64>> {
        validate_inputs(a, b)?;
        let (m, n) = a.dim();
        let budget = self.opts.budget(n);
        let tol = self.opts.tolerance(a);

        let mut x = Array1::<f64>::zeros(n);
        let mut passive = vec![false; n];
        let mut iterations = 0usize;

        loop {
            let dual = a.t().dot(&(&b - &a.dot(&x)));
            let entering = (0..n)
                .filter(|&j| !passive[j] && dual[j] > tol)
                .fold(None, |best: Option<usize>, j| match best {
                    Some(k) if dual[k] >= dual[j] => Some(k),
                    _ => Some(j),
                });
            let Some(t) = entering else { break };
            passive[t] = true;

            loop {
                iterations += 1;
                if iterations > budget {
                    return Err(OptError::NnlsNotConverged { iterations: budget });
                }
                let s = passive_least_squares(a, b, &passive, m)?;

                let blocking: Vec<usize> =
                    (0..n).filter(|&j| passive[j] && s[j] <= tol).collect();
                if blocking.is_empty() {
                    x = s;
                    break;
                }

                let alpha = blocking
                    .iter()
                    .map(|&j| x[j] / (x[j] - s[j]))
                    .fold(f64::INFINITY, f64::min);
                x = &x + &((&s - &x) * alpha);
                for j in 0..n {
                    if passive[j] && x[j] <= tol {
                        passive[j] = false;
                        x[j] = 0.0;
                    }
                }
            }
        }

        log::debug!(
            "NNLS converged after {iterations} passive-set solves ({} active columns)",
            passive.iter().filter(|&&p| p).count()
        );
        Ok(x)
    }
}

fn validate_inputs(a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>) -> OptResult<()> {
    if a.nrows() != b.len() {
        return Err(OptError::NnlsDimMismatch { rows: a.nrows(), target_len: b.len() });
    }
    if let Some(((row, col), &value)) = a.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::NnlsNonFiniteInput { row, col: Some(col), value });
    }
    if let Some((row, &value)) = b.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::NnlsNonFiniteInput { row, col: None, value });
    }
    Ok(())
}

/// Unconstrained least squares restricted to the passive columns, scattered
/// back into a full-length vector (zeros off the passive set).
fn passive_least_squares(
    a: ArrayView2<'_, f64>, b: ArrayView1<'_, f64>, passive: &[bool], m: usize,
) -> OptResult<Array1<f64>> {
    let cols: Vec<usize> = (0..passive.len()).filter(|&j| passive[j]).collect();
    let sub = DMatrix::from_fn(m, cols.len(), |i, k| a[[i, cols[k]]]);
    let rhs = DVector::from_iterator(m, b.iter().copied());

    let svd = sub.svd(true, true);
    let cutoff = svd.singular_values.max() * f64::EPSILON * m.max(cols.len()) as f64;
    let coef = svd
        .solve(&rhs, cutoff)
        .map_err(|reason| OptError::NnlsSubproblemFailed { reason: reason.to_string() })?;

    let mut full = Array1::<f64>::zeros(passive.len());
    for (k, &j) in cols.iter().enumerate() {
        full[j] = coef[k];
    }
    Ok(full)
}
