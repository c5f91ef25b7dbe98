//! Per-column descriptors and partial metadata updates.

use super::frequency::Frequency;
use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a series measures a point in time or an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeriesType {
    /// Point-in-time quantity (end-of-month reserves). Aggregates by last value.
    Stock,
    /// Interval quantity (monthly exports). Aggregates by sum or mean.
    Flow,
    /// Not classified; rendered as `-`.
    Unspecified,
}

impl SeriesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Stock => "Stock",
            SeriesType::Flow => "Flow",
            SeriesType::Unspecified => "-",
        }
    }

    pub fn is_stock(&self) -> bool {
        matches!(self, SeriesType::Stock)
    }
}

impl fmt::Display for SeriesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Stock" | "stock" => Ok(SeriesType::Stock),
            "Flow" | "flow" | "Flujo" => Ok(SeriesType::Flow),
            "-" => Ok(SeriesType::Unspecified),
            other => Err(TransformError::InvalidParameter(format!(
                "series type must be 'Stock', 'Flow' or '-', got '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for SeriesType {
    type Error = TransformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SeriesType> for String {
    fn from(value: SeriesType) -> Self {
        value.as_str().to_string()
    }
}

/// Metadata attached to one indicator column.
///
/// Fields other than `indicator` and `frequency` are optional. The frequency
/// is owned by the dataset and refreshed from its index on every write, so
/// there is no public way to set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    indicator: String,
    area: Option<String>,
    frequency: Frequency,
    currency: Option<String>,
    inflation_adjustment: Option<String>,
    unit: Option<String>,
    seasonal_adjustment: Option<String>,
    series_type: Option<SeriesType>,
    cumulative_periods: Option<u32>,
}

impl Descriptor {
    /// Empty descriptor for `indicator`.
    pub fn new(indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            area: None,
            frequency: Frequency::Unknown,
            currency: None,
            inflation_adjustment: None,
            unit: None,
            seasonal_adjustment: None,
            series_type: None,
            cumulative_periods: None,
        }
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn inflation_adjustment(&self) -> Option<&str> {
        self.inflation_adjustment.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn seasonal_adjustment(&self) -> Option<&str> {
        self.seasonal_adjustment.as_deref()
    }

    pub fn series_type(&self) -> Option<SeriesType> {
        self.series_type
    }

    pub fn cumulative_periods(&self) -> Option<u32> {
        self.cumulative_periods
    }

    /// Series type, or a missing-metadata error naming this indicator.
    pub fn require_series_type(&self) -> Result<SeriesType> {
        self.series_type
            .ok_or_else(|| TransformError::missing("series_type", &self.indicator))
    }

    /// Cumulative periods, or a missing-metadata error naming this indicator.
    pub fn require_cumulative_periods(&self) -> Result<u32> {
        self.cumulative_periods
            .ok_or_else(|| TransformError::missing("cumulative_periods", &self.indicator))
    }

    /// True when every field except `indicator` is equal.
    pub fn same_fields_as(&self, other: &Descriptor) -> bool {
        self.area == other.area
            && self.frequency == other.frequency
            && self.currency == other.currency
            && self.inflation_adjustment == other.inflation_adjustment
            && self.unit == other.unit
            && self.seasonal_adjustment == other.seasonal_adjustment
            && self.series_type == other.series_type
            && self.cumulative_periods == other.cumulative_periods
    }

    pub(crate) fn renamed(&self, indicator: impl Into<String>) -> Descriptor {
        Descriptor {
            indicator: indicator.into(),
            ..self.clone()
        }
    }

    pub(crate) fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
    }

    /// Overwrite only the fields set in `update`.
    pub(crate) fn apply(&mut self, update: &MetadataUpdate) {
        if let Some(area) = &update.area {
            self.area = Some(area.clone());
        }
        if let Some(currency) = &update.currency {
            self.currency = Some(currency.clone());
        }
        if let Some(adjustment) = &update.inflation_adjustment {
            self.inflation_adjustment = Some(adjustment.clone());
        }
        if let Some(unit) = &update.unit {
            self.unit = Some(unit.clone());
        }
        if let Some(seasonal) = &update.seasonal_adjustment {
            self.seasonal_adjustment = Some(seasonal.clone());
        }
        if let Some(series_type) = update.series_type {
            self.series_type = Some(series_type);
        }
        if let Some(cum) = update.cumulative_periods {
            self.cumulative_periods = Some(cum);
        }
    }
}

/// A partial set of descriptor fields to write.
///
/// Unset fields leave the existing value untouched. Frequency is not part of
/// an update: it is always re-inferred from the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataUpdate {
    area: Option<String>,
    currency: Option<String>,
    inflation_adjustment: Option<String>,
    unit: Option<String>,
    seasonal_adjustment: Option<String>,
    series_type: Option<SeriesType>,
    cumulative_periods: Option<u32>,
}

impl MetadataUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn inflation_adjustment(mut self, adjustment: impl Into<String>) -> Self {
        self.inflation_adjustment = Some(adjustment.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn seasonal_adjustment(mut self, seasonal: impl Into<String>) -> Self {
        self.seasonal_adjustment = Some(seasonal.into());
        self
    }

    pub fn series_type(mut self, series_type: SeriesType) -> Self {
        self.series_type = Some(series_type);
        self
    }

    pub fn cumulative_periods(mut self, cum: u32) -> Self {
        self.cumulative_periods = Some(cum);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.cumulative_periods == Some(0) {
            return Err(TransformError::InvalidParameter(
                "cumulative_periods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
