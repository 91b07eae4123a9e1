//! Shared input checks and small aggregation helpers for the estimators.

use crate::estimators::errors::{CausalError, CausalResult};

/// Guard value used wherever a denominator could be zero.
pub const EPS: f64 = 1e-9;

/// Count rows in `group` (`1` = treated, `0` = control).
///
/// # Errors
/// - `CausalError::MissingGroup` if no row belongs to `group`.
pub fn require_group(column: &str, treated: &[bool], group: u8) -> CausalResult<usize> {
    let want = group == 1;
    let count = treated.iter().filter(|&&t| t == want).count();
    if count == 0 {
        return Err(CausalError::MissingGroup { column: column.to_string(), group });
    }
    Ok(count)
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
