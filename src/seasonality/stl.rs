//! STL (Seasonal-Trend decomposition using LOESS), the "loess" method.
//!
//! STL splits a series into:
//! - Trend: the smooth long-term movement
//! - Seasonal: the pattern repeating every `seasonal_period` observations
//! - Remainder: what is left after removing both

use super::Components;
use crate::error::{Result, TransformError};

/// Result of STL decomposition.
#[derive(Debug, Clone)]
pub struct STLResult {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub remainder: Vec<f64>,
}

impl STLResult {
    /// Trend and seasonally adjusted series (trend plus remainder).
    pub fn components(&self) -> Components {
        Components {
            trend: self.trend.clone(),
            seasonally_adjusted: self
                .trend
                .iter()
                .zip(&self.remainder)
                .map(|(t, r)| t + r)
                .collect(),
        }
    }
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct STL {
    seasonal_period: usize,
    /// Seasonal LOESS span (ns).
    seasonal_smoothness: usize,
    /// Trend LOESS span (nt).
    trend_smoothness: usize,
    /// Low-pass LOESS span (nl).
    low_pass_smoothness: usize,
    inner_iterations: usize,
    outer_iterations: usize,
    robust: bool,
}

impl STL {
    /// Create a decomposer for the given seasonal period.
    pub fn new(seasonal_period: usize) -> Self {
        // Cleveland et al. (1990) defaults
        let period = seasonal_period.max(2);
        let nt = (1.5 * period as f64 / (1.0 - 1.5 / (period | 1) as f64)).ceil() as usize;

        Self {
            seasonal_period: period,
            seasonal_smoothness: odd(period),
            trend_smoothness: odd(nt),
            low_pass_smoothness: odd(period),
            inner_iterations: 2,
            outer_iterations: 0,
            robust: false,
        }
    }

    pub fn with_seasonal_smoothness(mut self, ns: usize) -> Self {
        self.seasonal_smoothness = odd(ns);
        self
    }

    pub fn with_trend_smoothness(mut self, nt: usize) -> Self {
        self.trend_smoothness = odd(nt);
        self
    }

    /// Downweight outliers with six bisquare passes.
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self.outer_iterations = 6;
        self
    }

    pub fn with_inner_iterations(mut self, n: usize) -> Self {
        self.inner_iterations = n.max(1);
        self
    }

    /// Decompose `series`, which must have no missing values and cover at
    /// least two full seasonal cycles.
    pub fn decompose(&self, series: &[f64]) -> Result<STLResult> {
        let n = series.len();
        let needed = 2 * self.seasonal_period;
        if n < needed {
            return Err(TransformError::InsufficientData { needed, got: n });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(TransformError::ComputationError(
                "STL needs a series without missing values".to_string(),
            ));
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        let outer_iters = if self.robust {
            self.outer_iterations.max(1)
        } else {
            1
        };

        for _ in 0..outer_iters {
            for _ in 0..self.inner_iterations {
                let detrended: Vec<f64> =
                    series.iter().zip(&trend).map(|(y, t)| y - t).collect();

                let cycle_subseries = self.smooth_cycle_subseries(&detrended, &weights);
                let low_pass = self.low_pass_filter(&cycle_subseries);
                for i in 0..n {
                    seasonal[i] = cycle_subseries[i] - low_pass[i];
                }

                let deseasonalized: Vec<f64> =
                    series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = tricube_smooth(&deseasonalized, self.trend_smoothness, &weights);
            }

            if self.robust {
                let remainder = remainder(series, &seasonal, &trend);
                weights = robustness_weights(&remainder);
            }
        }

        let remainder = remainder(series, &seasonal, &trend);
        Ok(STLResult {
            trend,
            seasonal,
            remainder,
        })
    }

    /// Smooth each cycle-subseries (all Januaries, all Februaries, ...).
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let period = self.seasonal_period;
        let mut result = vec![0.0; detrended.len()];

        for cycle_pos in 0..period {
            let positions: Vec<usize> = (cycle_pos..detrended.len()).step_by(period).collect();
            let values: Vec<f64> = positions.iter().map(|&i| detrended[i]).collect();
            let sub_weights: Vec<f64> = positions.iter().map(|&i| weights[i]).collect();

            let smoothed = tricube_smooth(&values, self.seasonal_smoothness, &sub_weights);
            for (&i, v) in positions.iter().zip(smoothed) {
                result[i] = v;
            }
        }

        result
    }

    /// MA(period), MA(period), MA(3), then LOESS.
    fn low_pass_filter(&self, series: &[f64]) -> Vec<f64> {
        let ma1 = truncated_moving_average(series, self.seasonal_period);
        let ma2 = truncated_moving_average(&ma1, self.seasonal_period);
        let ma3 = truncated_moving_average(&ma2, 3);
        tricube_smooth(&ma3, self.low_pass_smoothness, &vec![1.0; series.len()])
    }
}

impl Default for STL {
    fn default() -> Self {
        Self::new(12)
    }
}

fn odd(n: usize) -> usize {
    n | 1
}

fn remainder(series: &[f64], seasonal: &[f64], trend: &[f64]) -> Vec<f64> {
    series
        .iter()
        .zip(seasonal)
        .zip(trend)
        .map(|((y, s), t)| y - s - t)
        .collect()
}

/// Centered moving average that shrinks its window at the edges.
fn truncated_moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            series[start..end].iter().sum::<f64>() / (end - start) as f64
        })
        .collect()
}

/// Locally weighted mean with tricube kernel over `span` neighbours.
fn tricube_smooth(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    let half_span = span / 2;
    let max_dist = half_span as f64 + 1.0;

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half_span);
            let end = (i + half_span + 1).min(n);

            let mut sum_weights = 0.0;
            let mut sum_values = 0.0;
            for j in start..end {
                let u = (i as f64 - j as f64).abs() / max_dist;
                let w = (1.0 - u.powi(3)).powi(3) * weights[j];
                sum_weights += w;
                sum_values += w * values[j];
            }

            if sum_weights > 0.0 {
                sum_values / sum_weights
            } else {
                values[i]
            }
        })
        .collect()
}

/// Bisquare weights from the remainder's median absolute value.
fn robustness_weights(remainder: &[f64]) -> Vec<f64> {
    let n = remainder.len();
    let mut sorted: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let h = 6.0 * median;

    remainder
        .iter()
        .map(|r| {
            if h < 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}
