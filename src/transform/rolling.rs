//! Rolling-window aggregation.

use super::policy::per_metadata_group;
use super::window::{rolling_mean, rolling_sum};
use crate::core::{Dataset, MetadataUpdate, TransformStep};
use crate::error::{Result, TransformError};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingOperation {
    Sum,
    Mean,
}

impl fmt::Display for RollingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RollingOperation::Sum => "sum",
            RollingOperation::Mean => "mean",
        })
    }
}

impl FromStr for RollingOperation {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(RollingOperation::Sum),
            "mean" | "average" => Ok(RollingOperation::Mean),
            other => Err(TransformError::InvalidParameter(format!(
                "operation must be 'sum' or 'mean', got '{other}'"
            ))),
        }
    }
}

/// Trailing rolling sum or mean over `window` periods.
///
/// Without a window, one year of the dataset's frequency is used. The first
/// `window - 1` rows are missing. `cumulative_periods` becomes `window`.
pub fn rolling(
    dataset: &Dataset,
    window: Option<usize>,
    operation: RollingOperation,
) -> Result<Dataset> {
    for descriptor in dataset.descriptors() {
        descriptor.require_series_type()?;
    }
    let window = match window {
        Some(0) => {
            return Err(TransformError::InvalidParameter(
                "window must be at least 1".to_string(),
            ))
        }
        Some(w) => w,
        None => dataset.frequency().periods_per_year()? as usize,
    };

    let output = per_metadata_group(dataset, |part| rolling_group(part, window, operation))?;
    Ok(output.with_step(
        TransformStep::new("rolling")
            .param("window", window)
            .param("operation", operation),
    ))
}

fn rolling_group(part: &Dataset, window: usize, operation: RollingOperation) -> Result<Dataset> {
    let descriptor = part.descriptor(0)?;
    if descriptor.require_series_type()?.is_stock() {
        tracing::warn!(
            indicator = descriptor.indicator(),
            "rolling operations shouldn't be calculated on stock variables"
        );
    }

    let values = part
        .values_by_column()
        .iter()
        .map(|column| match operation {
            RollingOperation::Sum => rolling_sum(column, window),
            RollingOperation::Mean => rolling_mean(column, window, false),
        })
        .collect();

    let cumulative_periods = u32::try_from(window)
        .map_err(|_| TransformError::InvalidParameter(format!("window {window} is too large")))?;
    part.with_values(values)?
        .with_metadata(&MetadataUpdate::new().cumulative_periods(cumulative_periods))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Frequency, SeriesType};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn quarterly(values: Vec<f64>, series_type: SeriesType) -> Dataset {
        let index = Frequency::Quarterly
            .grid(
                NaiveDate::from_ymd_opt(2018, 3, 31).unwrap(),
                NaiveDate::from_ymd_opt(2040, 1, 1).unwrap(),
            )
            .into_iter()
            .take(values.len())
            .collect();
        Dataset::from_columns(index, vec![("gdp", values)])
            .unwrap()
            .with_metadata(
                &MetadataUpdate::new()
                    .series_type(series_type)
                    .cumulative_periods(1),
            )
            .unwrap()
    }

    #[test]
    fn default_window_is_one_year() {
        let ds = quarterly((1..=8).map(|v| v as f64).collect(), SeriesType::Flow);
        let out = rolling(&ds, None, RollingOperation::Sum).unwrap();
        let values = out.values(0).unwrap();

        assert!(values[..3].iter().all(|v| v.is_nan()));
        assert_relative_eq!(values[3], 10.0, epsilon = 1e-10);
        assert_relative_eq!(values[7], 26.0, epsilon = 1e-10);
        assert_eq!(out.descriptor(0).unwrap().cumulative_periods(), Some(4));
    }

    #[test]
    fn explicit_window_mean() {
        let ds = quarterly(vec![2.0, 4.0, 6.0, 8.0], SeriesType::Flow);
        let out = rolling(&ds, Some(2), RollingOperation::Mean).unwrap();
        assert_relative_eq!(out.values(0).unwrap()[1], 3.0, epsilon = 1e-10);
        assert_eq!(out.descriptor(0).unwrap().cumulative_periods(), Some(2));
    }

    #[test]
    fn stock_series_still_computes() {
        let ds = quarterly(vec![1.0, 1.0, 1.0], SeriesType::Stock);
        let out = rolling(&ds, Some(2), RollingOperation::Sum).unwrap();
        assert_relative_eq!(out.values(0).unwrap()[2], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn invalid_windows_are_rejected() {
        let ds = quarterly(vec![1.0, 2.0, 3.0], SeriesType::Flow);
        assert!(matches!(
            rolling(&ds, Some(0), RollingOperation::Sum),
            Err(TransformError::InvalidParameter(_))
        ));

        let short = quarterly(vec![1.0, 2.0], SeriesType::Flow);
        assert!(matches!(
            rolling(&short, None, RollingOperation::Sum),
            Err(TransformError::UnknownFrequency(_))
        ));
    }

    #[test]
    fn operation_names_parse() {
        assert_eq!("average".parse::<RollingOperation>().unwrap(), RollingOperation::Mean);
        assert!("median".parse::<RollingOperation>().is_err());
    }
}
