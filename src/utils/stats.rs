//! NaN-aware statistical helpers.
//!
//! Missing observations are stored as NaN throughout the crate. These helpers
//! skip them explicitly instead of relying on any library-level NaN handling.

/// Number of non-NaN values.
pub fn count_valid(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

/// Sum of the non-NaN values; NaN when there are none.
pub fn nan_sum(values: &[f64]) -> f64 {
    if count_valid(values) == 0 {
        return f64::NAN;
    }
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Mean of the non-NaN values; NaN when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let n = count_valid(values);
    if n == 0 {
        return f64::NAN;
    }
    values.iter().filter(|v| !v.is_nan()).sum::<f64>() / n as f64
}

/// Last non-NaN value; NaN when there is none.
pub fn last_valid(values: &[f64]) -> f64 {
    values
        .iter()
        .rev()
        .copied()
        .find(|v| !v.is_nan())
        .unwrap_or(f64::NAN)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Range `first..=last` of positions holding non-NaN values.
pub fn valid_span(values: &[f64]) -> Option<(usize, usize)> {
    let first = values.iter().position(|v| !v.is_nan())?;
    let last = values.iter().rposition(|v| !v.is_nan())?;
    Some((first, last))
}

/// Least-squares slope and intercept of `values` against `0..n`.
pub fn linear_fit(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    let slope = num / den;
    Some((slope, y_mean - slope * x_mean))
}
