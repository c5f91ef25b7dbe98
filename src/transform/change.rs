//! Percent changes and differences over a lag.

use super::policy::per_metadata_group;
use super::rolling::{rolling, RollingOperation};
use crate::core::{Dataset, Frequency, MetadataUpdate, TransformStep};
use crate::error::{Result, TransformError};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOperation {
    /// Percent change, times 100.
    Chg,
    /// Absolute difference.
    Diff,
}

/// Which earlier observation a change is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePeriod {
    /// Previous period.
    Last,
    /// Same period one year earlier.
    Inter,
    /// Same period one year earlier, comparing trailing annual totals for
    /// flows.
    Annual,
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeOperation::Chg => "chg",
            ChangeOperation::Diff => "diff",
        })
    }
}

impl FromStr for ChangeOperation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chg" => Ok(ChangeOperation::Chg),
            "diff" => Ok(ChangeOperation::Diff),
            other => Err(TransformError::InvalidParameter(format!(
                "operation must be 'chg' or 'diff', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChangePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangePeriod::Last => "last",
            ChangePeriod::Inter => "inter",
            ChangePeriod::Annual => "annual",
        })
    }
}

impl FromStr for ChangePeriod {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "last" => Ok(ChangePeriod::Last),
            "inter" => Ok(ChangePeriod::Inter),
            "annual" => Ok(ChangePeriod::Annual),
            other => Err(TransformError::InvalidParameter(format!(
                "period must be 'last', 'inter' or 'annual', got '{other}'"
            ))),
        }
    }
}

fn unit_label(operation: ChangeOperation, period: ChangePeriod) -> &'static str {
    match (operation, period) {
        (ChangeOperation::Chg, ChangePeriod::Last) => "% change",
        (ChangeOperation::Diff, ChangePeriod::Last) => "Change",
        (ChangeOperation::Chg, ChangePeriod::Inter) => "% change interannual",
        (ChangeOperation::Diff, ChangePeriod::Inter) => "Change interannual",
        (ChangeOperation::Chg, ChangePeriod::Annual) => "% change annual",
        (ChangeOperation::Diff, ChangePeriod::Annual) => "Change annual",
    }
}

/// Percent change or difference against a lagged observation.
///
/// Needs monthly, quarterly or annual data. For `Annual`, non-stock series
/// are first turned into trailing annual sums.
pub fn chg_diff(
    dataset: &Dataset,
    operation: ChangeOperation,
    period: ChangePeriod,
) -> Result<Dataset> {
    for descriptor in dataset.descriptors() {
        descriptor.require_series_type()?;
    }
    let frequency = dataset.frequency();
    if !matches!(
        frequency,
        Frequency::Monthly | Frequency::Quarterly | Frequency::Annual
    ) {
        return Err(TransformError::UnsupportedFrequency {
            operation: "chg_diff",
            expected: "monthly, quarterly or annual",
            frequency: frequency.code().to_string(),
        });
    }
    let lag = match period {
        ChangePeriod::Last => 1,
        ChangePeriod::Inter | ChangePeriod::Annual => frequency.periods_per_year()? as usize,
    };

    let output = per_metadata_group(dataset, |part| change_group(part, operation, period, lag))?;
    Ok(output.with_step(
        TransformStep::new("chg_diff")
            .param("operation", operation)
            .param("period", period),
    ))
}

fn change_group(
    part: &Dataset,
    operation: ChangeOperation,
    period: ChangePeriod,
    lag: usize,
) -> Result<Dataset> {
    let series_type = part.descriptor(0)?.require_series_type()?;
    let base = if period == ChangePeriod::Annual && !series_type.is_stock() {
        rolling(part, None, RollingOperation::Sum)?
    } else {
        part.clone()
    };

    let values = base
        .values_by_column()
        .iter()
        .map(|column| lagged_change(column, lag, operation))
        .collect();

    base.with_values(values)?
        .with_metadata(&MetadataUpdate::new().unit(unit_label(operation, period)))
}

/// Change of each observation against the one `lag` positions earlier.
pub fn lagged_change(series: &[f64], lag: usize, operation: ChangeOperation) -> Vec<f64> {
    (0..series.len())
        .map(|i| {
            if i < lag {
                return f64::NAN;
            }
            let (current, previous) = (series[i], series[i - lag]);
            match operation {
                ChangeOperation::Chg => (current / previous - 1.0) * 100.0,
                ChangeOperation::Diff => current - previous,
            }
        })
        .collect()
}
