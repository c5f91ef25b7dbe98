//! Classical additive decomposition, the "moving_average" method.

use super::Components;
use crate::error::{Result, TransformError};
use crate::transform::window::centered_moving_average;
use crate::utils::stats::{linear_fit, nan_mean, valid_span};

/// Decompose `series` with a centered moving average trend and a fixed
/// seasonal index per position in the cycle.
///
/// The moving average leaves `period / 2` missing values at each end; those
/// are filled by a straight line fitted to the nearest `period` trend values.
pub fn classical_decompose(series: &[f64], period: usize) -> Result<Components> {
    let n = series.len();
    let needed = 2 * period;
    if period < 2 || n < needed {
        return Err(TransformError::InsufficientData {
            needed: needed.max(4),
            got: n,
        });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(TransformError::ComputationError(
            "moving-average decomposition needs a series without missing values".to_string(),
        ));
    }

    let mut trend = centered_moving_average(series, period);
    extrapolate_edges(&mut trend, period)?;

    let detrended: Vec<f64> = series.iter().zip(&trend).map(|(y, t)| y - t).collect();
    let mut index: Vec<f64> = (0..period)
        .map(|pos| {
            let values: Vec<f64> = detrended.iter().skip(pos).step_by(period).copied().collect();
            nan_mean(&values)
        })
        .collect();
    let centre = nan_mean(&index);
    for s in &mut index {
        *s -= centre;
    }

    let seasonally_adjusted = series
        .iter()
        .enumerate()
        .map(|(i, y)| y - index[i % period])
        .collect();

    Ok(Components {
        trend,
        seasonally_adjusted,
    })
}

fn extrapolate_edges(trend: &mut [f64], period: usize) -> Result<()> {
    let (first, last) = valid_span(trend).ok_or_else(|| {
        TransformError::ComputationError("moving average produced no values".to_string())
    })?;
    let width = period.min(last - first + 1);

    if let Some((slope, intercept)) = linear_fit(&trend[first..first + width]) {
        for i in 0..first {
            trend[i] = intercept + slope * (i as f64 - first as f64);
        }
    }

    let tail_start = last + 1 - width;
    if let Some((slope, intercept)) = linear_fit(&trend[tail_start..=last]) {
        for (i, value) in trend.iter_mut().enumerate().skip(last + 1) {
            *value = intercept + slope * (i - tail_start) as f64;
        }
    }
    Ok(())
}
