//! Fixed-size window kernels.
//!
//! Windows require a full set of observations: a window that is incomplete
//! at the start of the series, or that contains a missing value, yields NaN.

/// Compute rolling sum.
pub fn rolling_sum(series: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(series, window, false, |s| s.iter().sum())
}

/// Compute rolling mean (moving average).
///
/// # Arguments
/// * `series` - Input series
/// * `window` - Window size
/// * `center` - If true, center the window; otherwise the window trails
pub fn rolling_mean(series: &[f64], window: usize, center: bool) -> Vec<f64> {
    rolling_apply(series, window, center, |s| {
        s.iter().sum::<f64>() / s.len() as f64
    })
}

/// Generic rolling window application.
///
/// `f` only sees complete windows without NaN values.
pub fn rolling_apply<F>(series: &[f64], window: usize, center: bool, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if series.is_empty() || window == 0 {
        return vec![f64::NAN; series.len()];
    }

    let n = series.len();
    let mut result = vec![f64::NAN; n];
    let half = window / 2;

    for i in 0..n {
        let (start, end) = if center {
            if i < half || i + window - half > n {
                continue;
            }
            (i - half, i + window - half)
        } else {
            if i + 1 < window {
                continue;
            }
            (i + 1 - window, i + 1)
        };

        let segment = &series[start..end];
        if segment.iter().all(|v| !v.is_nan()) {
            result[i] = f(segment);
        }
    }

    result
}

/// Centered moving average for a seasonal period.
///
/// Odd periods use a plain centered mean; even periods use the 2x`period`
/// average (weights 1/2 at both ends), so the result is aligned on
/// observations rather than between them.
pub fn centered_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    if period % 2 == 1 {
        return rolling_mean(series, period, true);
    }

    let n = series.len();
    let half = period / 2;
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    for i in half..n - half {
        let segment = &series[i - half..=i + half];
        if segment.iter().any(|v| v.is_nan()) {
            continue;
        }
        let inner: f64 = segment[1..period].iter().sum();
        let ends = (segment[0] + segment[period]) / 2.0;
        result[i] = (inner + ends) / period as f64;
    }

    result
}
