//! Trend and seasonally adjusted series for every column of a dataset.
//!
//! Each column is decomposed on its own, following a fixed list of attempts
//! (X13 with the requested flags, relaxed X13 runs when retries are forced,
//! then the fallback method). A column whose attempts all fail comes back as
//! missing values with a warning; it never aborts the other columns.

use super::classical::classical_decompose;
use super::stl::STL;
use super::x13::{Unavailable, X13Backend, X13Binary, X13Flags};
use super::Components;
use crate::config::{DecomposeOptions, X13Config};
use crate::core::{interpolate_series, Dataset, Frequency, MetadataUpdate, TransformStep};
use crate::error::{Result, TransformError};
use crate::transform::policy::apply_checked_multi;
use crate::utils::stats::valid_span;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which outputs to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Trend,
    SeasonallyAdjusted,
    #[default]
    Both,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Trend => "trend",
            Component::SeasonallyAdjusted => "seas",
            Component::Both => "both",
        })
    }
}

impl FromStr for Component {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "trend" => Ok(Component::Trend),
            "seas" | "sa" | "seasonally_adjusted" => Ok(Component::SeasonallyAdjusted),
            "both" => Ok(Component::Both),
            other => Err(TransformError::InvalidParameter(format!(
                "component must be 'trend', 'seas' or 'both', got '{other}'"
            ))),
        }
    }
}

/// Primary decomposition method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionMethod {
    #[default]
    X13,
    Loess,
    MovingAverage,
}

impl fmt::Display for DecompositionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecompositionMethod::X13 => "x13",
            DecompositionMethod::Loess => "loess",
            DecompositionMethod::MovingAverage => "moving_average",
        })
    }
}

impl FromStr for DecompositionMethod {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x13" => Ok(DecompositionMethod::X13),
            "loess" => Ok(DecompositionMethod::Loess),
            "moving_average" | "ma" => Ok(DecompositionMethod::MovingAverage),
            other => Err(TransformError::InvalidParameter(format!(
                "method must be 'x13', 'loess' or 'moving_average', got '{other}'"
            ))),
        }
    }
}

/// Method used when X13 fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMethod {
    #[default]
    Loess,
    MovingAverage,
}

impl fmt::Display for FallbackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackMethod::Loess => "loess",
            FallbackMethod::MovingAverage => "moving_average",
        })
    }
}

impl FromStr for FallbackMethod {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "loess" => Ok(FallbackMethod::Loess),
            "moving_average" | "ma" => Ok(FallbackMethod::MovingAverage),
            other => Err(TransformError::InvalidParameter(format!(
                "fallback must be 'loess' or 'moving_average', got '{other}'"
            ))),
        }
    }
}

/// One step of a column's decomposition plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    X13(X13Flags),
    Loess,
    MovingAverage,
}

impl From<FallbackMethod> for Attempt {
    fn from(method: FallbackMethod) -> Self {
        match method {
            FallbackMethod::Loess => Attempt::Loess,
            FallbackMethod::MovingAverage => Attempt::MovingAverage,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::X13(flags) => write!(f, "{flags}"),
            Attempt::Loess => f.write_str("loess"),
            Attempt::MovingAverage => f.write_str("moving_average"),
        }
    }
}

/// The ordered attempts for one column. Exhausting the list means the
/// column failed.
///
/// With X13 and `force_retry`, outlier detection is dropped first and then
/// trading days; identical consecutive flag sets are tried once.
pub fn cascade(options: &DecomposeOptions) -> Vec<Attempt> {
    match options.method {
        DecompositionMethod::Loess => vec![Attempt::Loess],
        DecompositionMethod::MovingAverage => vec![Attempt::MovingAverage],
        DecompositionMethod::X13 => {
            let mut plan = vec![Attempt::X13(X13Flags {
                outlier: options.outlier,
                trading_days: options.trading_days,
            })];
            if options.force_retry {
                for flags in [
                    X13Flags {
                        outlier: false,
                        trading_days: options.trading_days,
                    },
                    X13Flags {
                        outlier: false,
                        trading_days: false,
                    },
                ] {
                    if plan.last() != Some(&Attempt::X13(flags)) {
                        plan.push(Attempt::X13(flags));
                    }
                }
            }
            plan.push(options.fallback.into());
            plan
        }
    }
}

/// Outputs of [`decompose`]; a component not requested is `None`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub trend: Option<Dataset>,
    pub seasonally_adjusted: Option<Dataset>,
}

/// Decompose every column of a monthly or quarterly dataset.
///
/// Columns already tagged `"Trend"` or `"SA"` go through the error policy.
/// Outputs keep the input's full index and are tagged `"Trend"` and `"SA"`.
pub fn decompose<B>(dataset: &Dataset, options: &DecomposeOptions, backend: &B) -> Result<Decomposition>
where
    B: X13Backend + ?Sized,
{
    let failures = dataset
        .descriptors()
        .iter()
        .map(|d| {
            let adjustment = d
                .seasonal_adjustment()
                .ok_or_else(|| TransformError::missing("seasonal_adjustment", d.indicator()))?;
            Ok(matches!(adjustment, "Trend" | "SA")
                .then(|| format!("already seasonally adjusted ('{adjustment}')")))
        })
        .collect::<Result<Vec<_>>>()?;

    let frequency = dataset.frequency();
    let period = match frequency {
        Frequency::Monthly => 12,
        Frequency::Quarterly => 4,
        other => {
            return Err(TransformError::UnsupportedFrequency {
                operation: "decompose",
                expected: "monthly or quarterly",
                frequency: other.code().to_string(),
            })
        }
    };
    let plan = cascade(options);

    let mut outputs = apply_checked_multi(dataset, &failures, options.errors, 2, |part| {
        decompose_group(part, frequency, period, &plan, backend)
    })?;

    let step = TransformStep::new("decompose")
        .param("component", options.component)
        .param("method", options.method)
        .param("force_retry", options.force_retry)
        .param("fallback", options.fallback)
        .param("outlier", options.outlier)
        .param("trading_days", options.trading_days)
        .param("errors", options.errors);
    let seasonally_adjusted = outputs.pop().map(|d| d.with_step(step.clone()));
    let trend = outputs.pop().map(|d| d.with_step(step));

    Ok(match options.component {
        Component::Trend => Decomposition {
            trend,
            seasonally_adjusted: None,
        },
        Component::SeasonallyAdjusted => Decomposition {
            trend: None,
            seasonally_adjusted,
        },
        Component::Both => Decomposition {
            trend,
            seasonally_adjusted,
        },
    })
}

/// [`decompose`] with the X13 binary located from `config`. If it cannot be
/// found, X13 attempts fail and the fallback is used.
pub fn decompose_with_binary(
    dataset: &Dataset,
    options: &DecomposeOptions,
    config: &X13Config,
) -> Result<Decomposition> {
    if options.method != DecompositionMethod::X13 {
        let unused = Unavailable(TransformError::BinaryNotFound("not needed".to_string()));
        return decompose(dataset, options, &unused);
    }
    match X13Binary::locate(config) {
        Ok(binary) => decompose(dataset, options, &binary),
        Err(e) => {
            tracing::warn!(error = %e, "X13 binary unavailable, decomposition will use the fallback");
            decompose(dataset, options, &Unavailable(e))
        }
    }
}

fn decompose_group<B>(
    part: &Dataset,
    frequency: Frequency,
    period: usize,
    plan: &[Attempt],
    backend: &B,
) -> Result<Vec<Dataset>>
where
    B: X13Backend + ?Sized,
{
    let n = part.len();
    let mut trends = Vec::with_capacity(part.width());
    let mut adjusted = Vec::with_capacity(part.width());

    for (position, column) in part.values_by_column().iter().enumerate() {
        let indicator = part.descriptor(position)?.indicator();
        let mut trend = vec![f64::NAN; n];
        let mut sa = vec![f64::NAN; n];

        match valid_span(column) {
            None => tracing::warn!(indicator, "column has no observations to decompose"),
            Some((first, last)) => {
                let span = &column[first..=last];
                let filled = interpolate_series(span, false);
                let input = ColumnInput {
                    indicator,
                    index: &part.index()[first..=last],
                    values: &filled,
                    frequency,
                    period,
                };
                if let Some(components) = run_plan(&input, plan, backend) {
                    for (offset, original) in span.iter().enumerate() {
                        if original.is_nan() {
                            continue;
                        }
                        trend[first + offset] = components.trend[offset];
                        sa[first + offset] = components.seasonally_adjusted[offset];
                    }
                }
            }
        }
        trends.push(trend);
        adjusted.push(sa);
    }

    Ok(vec![
        part.with_values(trends)?
            .with_metadata(&MetadataUpdate::new().seasonal_adjustment("Trend"))?,
        part.with_values(adjusted)?
            .with_metadata(&MetadataUpdate::new().seasonal_adjustment("SA"))?,
    ])
}

struct ColumnInput<'a> {
    indicator: &'a str,
    index: &'a [NaiveDate],
    values: &'a [f64],
    frequency: Frequency,
    period: usize,
}

/// Walk `plan` until an attempt succeeds.
fn run_plan<B>(input: &ColumnInput<'_>, plan: &[Attempt], backend: &B) -> Option<Components>
where
    B: X13Backend + ?Sized,
{
    for (i, attempt) in plan.iter().enumerate() {
        match run_attempt(input, *attempt, backend) {
            Ok(components) => {
                if i > 0 {
                    tracing::info!(
                        indicator = input.indicator,
                        %attempt,
                        "decomposed after earlier attempts failed"
                    );
                }
                return Some(components);
            }
            Err(e) => tracing::warn!(
                indicator = input.indicator,
                %attempt,
                error = %e,
                "decomposition attempt failed"
            ),
        }
    }
    tracing::warn!(
        indicator = input.indicator,
        "every decomposition attempt failed, returning missing values"
    );
    None
}

fn run_attempt<B>(input: &ColumnInput<'_>, attempt: Attempt, backend: &B) -> Result<Components>
where
    B: X13Backend + ?Sized,
{
    let components = match attempt {
        Attempt::X13(flags) => backend.adjust(input.index, input.values, input.frequency, flags)?,
        Attempt::Loess => STL::new(input.period).decompose(input.values)?.components(),
        Attempt::MovingAverage => classical_decompose(input.values, input.period)?,
    };
    let n = input.values.len();
    if components.trend.len() != n || components.seasonally_adjusted.len() != n {
        return Err(TransformError::DimensionMismatch {
            expected: n,
            got: components.trend.len().min(components.seasonally_adjusted.len()),
        });
    }
    Ok(components)
}
