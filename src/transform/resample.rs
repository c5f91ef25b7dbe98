//! Frequency conversion that respects stock/flow semantics.
//!
//! Observations are assigned to the period of the target frequency that
//! contains them and labelled with that period's end date. Stocks always keep
//! the last observation of each period; flows are summed, averaged, sampled
//! or interpolated depending on the requested operation.

use super::policy::per_metadata_group;
use crate::core::{
    forward_fill_series, interpolate_series, Dataset, Frequency, MetadataUpdate, SeriesType,
    TransformStep,
};
use crate::error::{Result, TransformError};
use crate::utils::stats::{count_valid, last_valid, nan_mean, nan_sum};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// How flow observations falling in the same target period are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleOperation {
    Sum,
    Mean,
    /// Last observation in the period, for rates recorded as flows.
    Last,
    /// Move to a finer frequency, filling new periods by interpolation.
    Upsample,
}

impl fmt::Display for ResampleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResampleOperation::Sum => "sum",
            ResampleOperation::Mean => "mean",
            ResampleOperation::Last => "last",
            ResampleOperation::Upsample => "upsample",
        })
    }
}

impl FromStr for ResampleOperation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(ResampleOperation::Sum),
            "mean" | "average" => Ok(ResampleOperation::Mean),
            "last" => Ok(ResampleOperation::Last),
            "upsample" => Ok(ResampleOperation::Upsample),
            other => Err(TransformError::InvalidParameter(format!(
                "operation must be 'sum', 'mean', 'last' or 'upsample', got '{other}'"
            ))),
        }
    }
}

/// Gap filling applied after upsampling and to stock series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Straight line between the surrounding observations.
    #[default]
    Linear,
    /// Repeat the previous observation.
    ForwardFill,
    /// Leave gaps missing.
    Disabled,
}

impl Interpolation {
    fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self {
            Interpolation::Linear => interpolate_series(values, false),
            Interpolation::ForwardFill => forward_fill_series(values),
            Interpolation::Disabled => values.to_vec(),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interpolation::Linear => "linear",
            Interpolation::ForwardFill => "ffill",
            Interpolation::Disabled => "none",
        })
    }
}

impl FromStr for Interpolation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Interpolation::Linear),
            "ffill" | "pad" => Ok(Interpolation::ForwardFill),
            "none" => Ok(Interpolation::Disabled),
            other => Err(TransformError::InvalidParameter(format!(
                "interpolation must be 'linear', 'ffill' or 'none', got '{other}'"
            ))),
        }
    }
}

/// Change the frequency of `dataset` to `target`.
///
/// Every column needs `series_type` and `cumulative_periods`. Unspecified
/// series types are treated as flows. When downsampling with `Sum`, `Mean`
/// or `Last` (and always for stocks), periods that do not contain every
/// expected source observation are set to missing. Rows missing in every
/// column are dropped.
///
/// Flows with `cumulative_periods` above 1 keep covering the same span:
/// when downsampling the count is divided by the number of source periods
/// per target period (never below 1), when upsampling it is multiplied.
/// A 12-month trailing sum resampled to quarters therefore reports 4.
pub fn resample(
    dataset: &Dataset,
    target: Frequency,
    operation: ResampleOperation,
    interpolation: Interpolation,
) -> Result<Dataset> {
    if target == Frequency::Unknown {
        return Err(TransformError::UnknownFrequency(target.code().to_string()));
    }
    for descriptor in dataset.descriptors() {
        descriptor.require_series_type()?;
        descriptor.require_cumulative_periods()?;
    }

    let output = per_metadata_group(dataset, |part| {
        resample_group(part, target, operation, interpolation)
    })?;

    Ok(output.with_step(
        TransformStep::new("resample")
            .param("target", target)
            .param("operation", operation)
            .param("interpolation", interpolation),
    ))
}

fn resample_group(
    part: &Dataset,
    target: Frequency,
    operation: ResampleOperation,
    interpolation: Interpolation,
) -> Result<Dataset> {
    let descriptor = part.descriptor(0)?;
    let cumulative_periods = descriptor.require_cumulative_periods()?;
    let series_type = match descriptor.require_series_type()? {
        SeriesType::Unspecified => {
            tracing::warn!(
                indicator = descriptor.indicator(),
                "series type is unspecified, resampling as a flow"
            );
            SeriesType::Flow
        }
        other => other,
    };

    if part.is_empty() {
        return Ok(part.clone());
    }

    let bins = Bins::new(part.index(), target)?;
    let source = part.frequency();
    let downsampling = match (source.periods_per_year(), target.periods_per_year()) {
        (Ok(from), Ok(to)) => Some(to < from),
        _ => None,
    };

    let trims = match (series_type, operation) {
        (SeriesType::Stock, _) => true,
        (_, ResampleOperation::Upsample) => false,
        _ => true,
    };

    let mut values = Vec::with_capacity(part.width());
    for column in part.values_by_column() {
        let aggregated = match (series_type, operation) {
            (SeriesType::Stock, _) => {
                interpolation.apply(&bins.aggregate(column, last_valid))
            }
            (_, ResampleOperation::Sum) => bins.aggregate(column, nan_sum),
            (_, ResampleOperation::Mean) => bins.aggregate(column, nan_mean),
            (_, ResampleOperation::Last) => bins.aggregate(column, last_valid),
            (_, ResampleOperation::Upsample) => {
                interpolation.apply(&bins.aggregate(column, last_valid))
            }
        };
        values.push(aggregated);
    }

    let new_cumulative = if series_type != SeriesType::Stock && cumulative_periods != 1 {
        let input = count_valid(&part.values_by_column()[0]);
        let output = count_valid(&values[0]);
        adjust_cumulative_periods(cumulative_periods, input, output)
    } else {
        cumulative_periods
    };

    if trims {
        match downsampling {
            Some(true) => {
                for (column, resampled) in part.values_by_column().iter().zip(values.iter_mut()) {
                    bins.mask_incomplete(column, resampled, source, target);
                }
            }
            Some(false) => {}
            None => tracing::warn!(
                indicator = descriptor.indicator(),
                source = %source,
                target = %target,
                "no bin trimming performed because frequencies could not be compared"
            ),
        }
    }

    let resampled = part
        .with_index_and_values(bins.ends.clone(), values)?
        .drop_empty_rows()?;
    resampled.with_metadata(&MetadataUpdate::new().cumulative_periods(new_cumulative))
}

/// Rescale cumulative periods by how many output observations each input
/// observation turned into, keeping the result at least 1.
fn adjust_cumulative_periods(cumulative_periods: u32, input: usize, output: usize) -> u32 {
    if input == 0 || output == 0 {
        return cumulative_periods;
    }
    if output >= input {
        let factor = (output as f64 / input as f64).round() as u32;
        cumulative_periods * factor.max(1)
    } else {
        let factor = (input as f64 / output as f64).round() as u32;
        (cumulative_periods / factor.max(1)).max(1)
    }
}

/// Aggregate every column into `target` periods without completeness
/// trimming or metadata changes. Every period between the first and last
/// observation is kept, empty ones as missing.
pub(crate) fn aggregate_bins(
    dataset: &Dataset,
    target: Frequency,
    operation: ResampleOperation,
) -> Result<Dataset> {
    if dataset.is_empty() {
        return Ok(dataset.clone());
    }
    let bins = Bins::new(dataset.index(), target)?;
    let reducer: fn(&[f64]) -> f64 = match operation {
        ResampleOperation::Sum => nan_sum,
        ResampleOperation::Mean => nan_mean,
        ResampleOperation::Last | ResampleOperation::Upsample => last_valid,
    };
    let values = dataset
        .values_by_column()
        .iter()
        .map(|column| bins.aggregate(column, reducer))
        .collect();
    dataset.with_index_and_values(bins.ends.clone(), values)
}

/// Assignment of source rows to target periods.
struct Bins {
    ends: Vec<NaiveDate>,
    /// Target period position of each source row.
    assignment: Vec<usize>,
}

impl Bins {
    fn new(index: &[NaiveDate], target: Frequency) -> Result<Self> {
        let (Some(first), Some(last)) = (index.first(), index.last()) else {
            return Err(TransformError::EmptyData);
        };
        let ends = target.grid(*first, *last);
        let assignment = index
            .iter()
            .map(|date| {
                target
                    .period_end(*date)
                    .and_then(|end| ends.binary_search(&end).ok())
                    .ok_or_else(|| {
                        TransformError::ComputationError(format!(
                            "no {target} period for {date}"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ends, assignment })
    }

    fn buckets(&self, column: &[f64]) -> Vec<Vec<f64>> {
        let mut buckets = vec![Vec::new(); self.ends.len()];
        for (&bin, &value) in self.assignment.iter().zip(column) {
            buckets[bin].push(value);
        }
        buckets
    }

    fn aggregate(&self, column: &[f64], reducer: fn(&[f64]) -> f64) -> Vec<f64> {
        self.buckets(column).iter().map(|b| reducer(b)).collect()
    }

    /// Mask periods holding fewer valid observations than `source` periods
    /// fit inside them.
    fn mask_incomplete(
        &self,
        column: &[f64],
        resampled: &mut [f64],
        source: Frequency,
        target: Frequency,
    ) {
        for ((bucket, end), value) in self
            .buckets(column)
            .iter()
            .zip(&self.ends)
            .zip(resampled.iter_mut())
        {
            let Some(start) = target.period_start(*end) else {
                continue;
            };
            let expected = source.periods_within(start, *end);
            if count_valid(bucket) < expected {
                *value = f64::NAN;
            }
        }
    }
}
