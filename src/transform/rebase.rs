//! Rebasing series so a reference period equals a chosen base.

use super::policy::per_metadata_group;
use crate::core::{Dataset, MetadataUpdate, TransformStep};
use crate::error::{Result, TransformError};
use crate::utils::stats::nan_mean;
use chrono::NaiveDate;

/// Reference rows resolved against a dataset's index.
///
/// A single date snaps to the nearest index date. A range keeps exactly the
/// rows dated within `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BasePeriod {
    pub start: usize,
    pub end: usize,
    /// `YYYY-MM`, or `YYYY-MM_YYYY-MM` when the ends fall in different months.
    pub label: String,
}

impl BasePeriod {
    pub(crate) fn resolve(
        dataset: &Dataset,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self> {
        let Some(end_date) = end_date else {
            let start = dataset.nearest_position(start_date)?;
            let label = dataset.index()[start].format("%Y-%m").to_string();
            return Ok(Self {
                start,
                end: start,
                label,
            });
        };

        if end_date < start_date {
            return Err(TransformError::InvalidParameter(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }
        let index = dataset.index();
        let start = index.partition_point(|d| *d < start_date);
        let stop = index.partition_point(|d| *d <= end_date);
        if start >= stop {
            return Err(TransformError::InvalidParameter(format!(
                "no observations between {start_date} and {end_date}"
            )));
        }

        let start_label = start_date.format("%Y-%m").to_string();
        let end_label = end_date.format("%Y-%m").to_string();
        let label = if start_label == end_label {
            start_label
        } else {
            format!("{start_label}_{end_label}")
        };
        Ok(Self {
            start,
            end: stop - 1,
            label,
        })
    }

    /// Single value, or mean over the range, of `column` at this period.
    pub(crate) fn reference(&self, column: &[f64]) -> f64 {
        if self.start == self.end {
            column[self.start]
        } else {
            nan_mean(&column[self.start..=self.end])
        }
    }
}

/// Render a base value, dropping the decimal point for whole numbers.
pub(crate) fn format_base(base: f64) -> String {
    if base.is_finite() && base.fract() == 0.0 && base.abs() < 1e15 {
        format!("{}", base as i64)
    } else {
        format!("{base}")
    }
}

/// Rescale every column so its value at `start_date` (or its mean over
/// `start_date..=end_date`) equals `base`.
///
/// A single date snaps to the nearest index date; a range averages the rows
/// dated within it. The unit becomes `"<period>=<base>"`, e.g.
/// `"2010-12=100"` or `"2020-01_2020-12=100"`.
pub fn rebase(
    dataset: &Dataset,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    base: f64,
) -> Result<Dataset> {
    if dataset.is_empty() {
        return Err(TransformError::EmptyData);
    }
    let period = BasePeriod::resolve(dataset, start_date, end_date)?;
    let unit = format!("{}={}", period.label, format_base(base));

    let output = per_metadata_group(dataset, |part| {
        let values = part
            .values_by_column()
            .iter()
            .map(|column| {
                let reference = period.reference(column);
                column.iter().map(|v| v / reference * base).collect()
            })
            .collect();
        part.with_values(values)?
            .with_metadata(&MetadataUpdate::new().unit(unit.clone()))
    })?;

    let mut step = TransformStep::new("rebase")
        .param("start_date", start_date)
        .param("base", format_base(base));
    if let Some(end) = end_date {
        step = step.param("end_date", end);
    }
    Ok(output.with_step(step))
}
