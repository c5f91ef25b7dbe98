//! Dataset data structure: a date index, named numeric columns and one
//! descriptor per column.

use super::frequency::Frequency;
use super::metadata::{Descriptor, MetadataUpdate};
use crate::error::{Result, TransformError};
use chrono::NaiveDate;
use serde::Serialize;

/// Layout of multi-column data passed to the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueLayout {
    /// Each inner vector is a column (column-major).
    #[default]
    Column,
    /// Each inner vector is an observation across columns (row-major).
    Row,
}

/// One entry of a dataset's transformation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformStep {
    operation: String,
    parameters: Vec<(String, String)>,
}

impl TransformStep {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.push((name.into(), value.to_string()));
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Value of a named parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A table of macroeconomic series sharing one date index.
///
/// Every transform returns a new `Dataset`; inputs are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    index: Vec<NaiveDate>,
    /// Values stored in column-major format: values[column][observation]
    values: Vec<Vec<f64>>,
    descriptors: Vec<Descriptor>,
    frequency: Frequency,
    history: Vec<TransformStep>,
}

/// Builder for constructing a Dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    index: Vec<NaiveDate>,
    values: Vec<Vec<f64>>,
    layout: ValueLayout,
    labels: Vec<String>,
    metadata: MetadataUpdate,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index: Vec<NaiveDate>) -> Self {
        self.index = index;
        self
    }

    /// Append one named column.
    pub fn column(mut self, label: impl Into<String>, values: Vec<f64>) -> Self {
        if self.layout == ValueLayout::Row && !self.values.is_empty() {
            self.values = transpose(&self.values);
        }
        self.layout = ValueLayout::Column;
        self.labels.push(label.into());
        self.values.push(values);
        self
    }

    /// Set all values at once with the given layout.
    pub fn values(mut self, values: Vec<Vec<f64>>, layout: ValueLayout) -> Self {
        self.values = values;
        self.layout = layout;
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Metadata written to every column after construction.
    pub fn metadata(mut self, update: MetadataUpdate) -> Self {
        self.metadata = update;
        self
    }

    pub fn build(self) -> Result<Dataset> {
        let dataset = Dataset::new(self.index, self.values, self.layout, self.labels)?;
        if self.metadata.is_empty() {
            Ok(dataset)
        } else {
            dataset.with_metadata(&self.metadata)
        }
    }
}

impl Dataset {
    /// Create a dataset with empty descriptors.
    ///
    /// The index must be strictly increasing, there must be one label per
    /// column and labels must be unique.
    pub fn new(
        index: Vec<NaiveDate>,
        values: Vec<Vec<f64>>,
        layout: ValueLayout,
        labels: Vec<String>,
    ) -> Result<Self> {
        if let Some(w) = index.windows(2).find(|w| w[1] <= w[0]) {
            return Err(TransformError::IndexError(format!(
                "dates must be strictly increasing, found {} after {}",
                w[1], w[0]
            )));
        }

        let values = match layout {
            ValueLayout::Column => {
                for column in &values {
                    if column.len() != index.len() {
                        return Err(TransformError::DimensionMismatch {
                            expected: index.len(),
                            got: column.len(),
                        });
                    }
                }
                values
            }
            ValueLayout::Row => {
                if values.len() != index.len() {
                    return Err(TransformError::DimensionMismatch {
                        expected: index.len(),
                        got: values.len(),
                    });
                }
                let width = values.first().map_or(labels.len(), |row| row.len());
                for row in &values {
                    if row.len() != width {
                        return Err(TransformError::DimensionMismatch {
                            expected: width,
                            got: row.len(),
                        });
                    }
                }
                if values.is_empty() {
                    vec![Vec::new(); width]
                } else {
                    transpose(&values)
                }
            }
        };

        if labels.len() != values.len() {
            return Err(TransformError::DimensionMismatch {
                expected: values.len(),
                got: labels.len(),
            });
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(TransformError::InvalidParameter(format!(
                    "duplicate indicator '{label}'"
                )));
            }
        }

        let frequency = Frequency::infer(&index);
        let descriptors = labels
            .into_iter()
            .map(|label| {
                let mut descriptor = Descriptor::new(label);
                descriptor.set_frequency(frequency);
                descriptor
            })
            .collect();

        Ok(Self {
            index,
            values,
            descriptors,
            frequency,
            history: Vec::new(),
        })
    }

    /// Create a dataset from `(label, values)` pairs.
    pub fn from_columns<S: Into<String>>(
        index: Vec<NaiveDate>,
        columns: Vec<(S, Vec<f64>)>,
    ) -> Result<Self> {
        let (labels, values): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(label, values)| (label.into(), values))
            .unzip();
        Self::new(index, values, ValueLayout::Column, labels)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of indicator columns.
    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Indicator names in column order.
    pub fn indicators(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.indicator()).collect()
    }

    /// Frequency inferred from the index at the last metadata write.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Values of the column at `position`.
    pub fn values(&self, position: usize) -> Result<&[f64]> {
        self.values
            .get(position)
            .map(|v| v.as_slice())
            .ok_or(TransformError::IndexOutOfBounds {
                index: position,
                size: self.values.len(),
            })
    }

    /// Values of the column named `indicator`.
    pub fn column(&self, indicator: &str) -> Result<&[f64]> {
        self.values(self.position(indicator)?)
    }

    pub fn values_by_column(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Observation at `row` across all columns.
    pub fn row(&self, row: usize) -> Result<Vec<f64>> {
        if row >= self.len() {
            return Err(TransformError::IndexOutOfBounds {
                index: row,
                size: self.len(),
            });
        }
        Ok(self.values.iter().map(|column| column[row]).collect())
    }

    /// Column position of `indicator`.
    pub fn position(&self, indicator: &str) -> Result<usize> {
        self.descriptors
            .iter()
            .position(|d| d.indicator() == indicator)
            .ok_or_else(|| TransformError::UnknownIndicator(indicator.to_string()))
    }

    pub fn descriptor(&self, position: usize) -> Result<&Descriptor> {
        self.descriptors
            .get(position)
            .ok_or(TransformError::IndexOutOfBounds {
                index: position,
                size: self.descriptors.len(),
            })
    }

    pub fn descriptor_for(&self, indicator: &str) -> Result<&Descriptor> {
        self.descriptor(self.position(indicator)?)
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Transformations applied to reach this dataset, oldest first.
    pub fn history(&self) -> &[TransformStep] {
        &self.history
    }

    /// True iff every column's descriptor is identical except `indicator`.
    pub fn fields_match_across_columns(&self) -> bool {
        match self.descriptors.split_first() {
            Some((first, rest)) => rest.iter().all(|d| first.same_fields_as(d)),
            None => true,
        }
    }

    /// Return a copy with `update` written to every column.
    ///
    /// Only fields set in `update` change. Frequency is always re-inferred
    /// from the index; a warning is emitted when it cannot be.
    pub fn attach(&self, update: &MetadataUpdate) -> Result<Dataset> {
        self.clone().with_metadata(update)
    }

    /// Consuming form of [`Dataset::attach`].
    pub fn with_metadata(mut self, update: &MetadataUpdate) -> Result<Dataset> {
        self.apply_metadata(update)?;
        Ok(self)
    }

    pub(crate) fn apply_metadata(&mut self, update: &MetadataUpdate) -> Result<()> {
        update.validate()?;
        self.refresh_frequency();
        if self.frequency == Frequency::Unknown {
            tracing::warn!(
                indicators = ?self.indicators(),
                observations = self.len(),
                "could not infer frequency, setting it to '-'"
            );
        }
        for descriptor in &mut self.descriptors {
            descriptor.apply(update);
        }
        Ok(())
    }

    fn refresh_frequency(&mut self) {
        self.frequency = Frequency::infer(&self.index);
        for descriptor in &mut self.descriptors {
            descriptor.set_frequency(self.frequency);
        }
    }

    /// Columns at `positions`, in that order.
    pub(crate) fn select_positions(&self, positions: &[usize]) -> Dataset {
        Dataset {
            index: self.index.clone(),
            values: positions.iter().map(|&p| self.values[p].clone()).collect(),
            descriptors: positions
                .iter()
                .map(|&p| self.descriptors[p].clone())
                .collect(),
            frequency: self.frequency,
            history: self.history.clone(),
        }
    }

    /// Columns named in `indicators`, in that order.
    pub fn select(&self, indicators: &[&str]) -> Result<Dataset> {
        let positions = indicators
            .iter()
            .map(|name| self.position(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.select_positions(&positions))
    }

    /// Copy with the same index and descriptors but new column values.
    pub fn with_values(&self, values: Vec<Vec<f64>>) -> Result<Dataset> {
        self.with_index_and_values(self.index.clone(), values)
    }

    /// Copy with a new index and new column values; descriptors are kept
    /// and the frequency is re-inferred.
    pub fn with_index_and_values(
        &self,
        index: Vec<NaiveDate>,
        values: Vec<Vec<f64>>,
    ) -> Result<Dataset> {
        let mut dataset = Dataset::new(index, values, ValueLayout::Column, self.labels())?;
        dataset.descriptors = self.descriptors.clone();
        dataset.history = self.history.clone();
        dataset.refresh_frequency();
        Ok(dataset)
    }

    /// Align to `index`: matching dates keep their values, new dates get NaN.
    pub fn reindex(&self, index: &[NaiveDate]) -> Result<Dataset> {
        let positions: Vec<Option<usize>> = index
            .iter()
            .map(|d| self.index.binary_search(d).ok())
            .collect();
        let values = self
            .values
            .iter()
            .map(|column| {
                positions
                    .iter()
                    .map(|p| p.map_or(f64::NAN, |i| column[i]))
                    .collect()
            })
            .collect();
        self.with_index_and_values(index.to_vec(), values)
    }

    /// Drop rows where every column is missing.
    pub fn drop_empty_rows(&self) -> Result<Dataset> {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.values.iter().any(|column| !column[i].is_nan()))
            .collect();
        if keep.len() == self.len() {
            return Ok(self.clone());
        }
        let index = keep.iter().map(|&i| self.index[i]).collect();
        let values = self
            .values
            .iter()
            .map(|column| keep.iter().map(|&i| column[i]).collect())
            .collect();
        self.with_index_and_values(index, values)
    }

    /// Side-by-side concatenation over the union of the indexes.
    ///
    /// Columns keep the order of `parts`; history is taken from the first part.
    pub fn concat(parts: &[Dataset]) -> Result<Dataset> {
        let first = parts.first().ok_or(TransformError::EmptyData)?;
        if parts.len() == 1 {
            return Ok(first.clone());
        }

        let mut index: Vec<NaiveDate> = parts.iter().flat_map(|p| p.index.clone()).collect();
        index.sort_unstable();
        index.dedup();

        let mut values = Vec::new();
        let mut descriptors = Vec::new();
        for part in parts {
            let aligned = part.reindex(&index)?;
            values.extend(aligned.values);
            descriptors.extend(part.descriptors.iter().cloned());
        }
        let labels = descriptors
            .iter()
            .map(|d: &Descriptor| d.indicator().to_string())
            .collect();

        let mut dataset = Dataset::new(index, values, ValueLayout::Column, labels)?;
        dataset.descriptors = descriptors;
        dataset.history = first.history.clone();
        dataset.refresh_frequency();
        Ok(dataset)
    }

    /// Rows `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Dataset> {
        if start > end {
            return Err(TransformError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(TransformError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }
        let values = self
            .values
            .iter()
            .map(|column| column[start..end].to_vec())
            .collect();
        self.with_index_and_values(self.index[start..end].to_vec(), values)
    }

    /// Same shape and metadata, every value missing.
    pub fn coerced(&self) -> Dataset {
        Dataset {
            values: vec![vec![f64::NAN; self.len()]; self.width()],
            ..self.clone()
        }
    }

    /// Position of the index date closest to `date`; ties go to the earlier date.
    pub fn nearest_position(&self, date: NaiveDate) -> Result<usize> {
        if self.index.is_empty() {
            return Err(TransformError::EmptyData);
        }
        match self.index.binary_search(&date) {
            Ok(i) => Ok(i),
            Err(0) => Ok(0),
            Err(i) if i == self.index.len() => Ok(i - 1),
            Err(i) => {
                let before = (date - self.index[i - 1]).num_days();
                let after = (self.index[i] - date).num_days();
                Ok(if after < before { i } else { i - 1 })
            }
        }
    }

    /// Check if any column has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|column| column.iter().any(|v| v.is_nan() || v.is_infinite()))
    }

    /// Return a copy with linear interpolation for NaN values.
    pub fn interpolated(&self, fill_edges: bool) -> Dataset {
        Dataset {
            values: self
                .values
                .iter()
                .map(|column| interpolate_series(column, fill_edges))
                .collect(),
            ..self.clone()
        }
    }

    /// Descriptor table as a JSON array, one object per indicator.
    pub fn metadata_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.descriptors)
            .map_err(|e| TransformError::ComputationError(e.to_string()))
    }

    pub(crate) fn with_step(mut self, step: TransformStep) -> Dataset {
        self.history.push(step);
        self
    }

    pub(crate) fn map_descriptors(mut self, f: impl Fn(&mut Descriptor)) -> Dataset {
        self.descriptors.iter_mut().for_each(f);
        self
    }

    fn labels(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .map(|d| d.indicator().to_string())
            .collect()
    }
}

fn transpose(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = rows.first().map_or(0, |r| r.len());
    (0..width)
        .map(|c| rows.iter().map(|row| row[c]).collect())
        .collect()
}

/// Linear interpolation for a series with NaN values.
pub(crate) fn interpolate_series(values: &[f64], fill_edges: bool) -> Vec<f64> {
    if values.is_empty() {
        return vec![];
    }

    let mut result = values.to_vec();
    let n = result.len();

    let mut i = 0;
    while i < n {
        if result[i].is_nan() {
            let start = i;
            while i < n && result[i].is_nan() {
                i += 1;
            }
            let end = i;

            let left = if start > 0 {
                Some(result[start - 1])
            } else {
                None
            };
            let right = if end < n { Some(result[end]) } else { None };

            match (left, right) {
                (Some(l), Some(r)) => {
                    // Gap is from left boundary to right boundary: (end - start + 1) segments
                    let segments = (end - start + 1) as f64;
                    for (j, idx) in (start..end).enumerate() {
                        let t = (j + 1) as f64 / segments;
                        result[idx] = l + t * (r - l);
                    }
                }
                (Some(l), None) if fill_edges => {
                    result[start..end].fill(l);
                }
                (None, Some(r)) if fill_edges => {
                    result[start..end].fill(r);
                }
                _ => {}
            }
        } else {
            i += 1;
        }
    }

    result
}

/// Carry the last valid value forward over NaN gaps.
pub(crate) fn forward_fill_series(values: &[f64]) -> Vec<f64> {
    let mut last_valid = None;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                last_valid.unwrap_or(v)
            } else {
                last_valid = Some(v);
                v
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::SeriesType;
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month_ends(n: usize) -> Vec<NaiveDate> {
        Frequency::Monthly
            .grid(ymd(2020, 1, 31), ymd(2040, 1, 1))
            .into_iter()
            .take(n)
            .collect()
    }

    #[test]
    fn dataset_constructs_from_columns() {
        let ds = Dataset::from_columns(
            month_ends(3),
            vec![("Exports", vec![1.0, 2.0, 3.0]), ("Imports", vec![4.0, 5.0, 6.0])],
        )
        .unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.width(), 2);
        assert_eq!(ds.indicators(), vec!["Exports", "Imports"]);
        assert_eq!(ds.column("Imports").unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(ds.row(1).unwrap(), vec![2.0, 5.0]);
        assert_eq!(ds.frequency(), Frequency::Monthly);
        assert_eq!(ds.descriptor(0).unwrap().frequency(), Frequency::Monthly);
    }

    #[test]
    fn builder_handles_row_layout_and_metadata() {
        let ds = DatasetBuilder::new()
            .index(month_ends(3))
            .values(
                vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]],
                ValueLayout::Row,
            )
            .labels(vec!["a".to_string(), "b".to_string()])
            .metadata(
                MetadataUpdate::new()
                    .currency("UYU")
                    .series_type(SeriesType::Flow)
                    .cumulative_periods(1),
            )
            .build()
            .unwrap();

        assert_eq!(ds.values(1).unwrap(), &[4.0, 5.0, 6.0]);
        assert_eq!(ds.descriptor(1).unwrap().currency(), Some("UYU"));
        assert!(ds.fields_match_across_columns());
    }

    #[test]
    fn dataset_validates_constructor_input() {
        let result = Dataset::from_columns(month_ends(3), vec![("a", vec![1.0, 2.0])]);
        assert!(matches!(
            result,
            Err(TransformError::DimensionMismatch { expected: 3, got: 2 })
        ));

        let result = Dataset::from_columns(
            month_ends(2),
            vec![("a", vec![1.0, 2.0]), ("a", vec![3.0, 4.0])],
        );
        assert!(matches!(result, Err(TransformError::InvalidParameter(_))));

        let backwards = vec![ymd(2020, 2, 29), ymd(2020, 1, 31)];
        let result = Dataset::from_columns(backwards, vec![("a", vec![1.0, 2.0])]);
        assert!(matches!(result, Err(TransformError::IndexError(_))));

        let duplicated = vec![ymd(2020, 1, 31), ymd(2020, 1, 31)];
        let result = Dataset::from_columns(duplicated, vec![("a", vec![1.0, 2.0])]);
        assert!(matches!(result, Err(TransformError::IndexError(_))));
    }

    #[test]
    fn attach_leaves_input_untouched() {
        let ds = Dataset::from_columns(month_ends(4), vec![("a", vec![1.0; 4])]).unwrap();
        let tagged = ds.attach(&MetadataUpdate::new().unit("Millions")).unwrap();
        assert_eq!(tagged.descriptor(0).unwrap().unit(), Some("Millions"));
        assert_eq!(ds.descriptor(0).unwrap().unit(), None);
    }

    #[test]
    fn short_index_gets_unknown_frequency() {
        let ds = Dataset::from_columns(month_ends(2), vec![("a", vec![1.0, 2.0])]).unwrap();
        let tagged = ds.attach(&MetadataUpdate::new()).unwrap();
        assert_eq!(tagged.frequency(), Frequency::Unknown);
        assert_eq!(tagged.descriptor(0).unwrap().frequency().code(), "-");
    }

    #[test]
    fn mixed_metadata_is_detected() {
        let ds = Dataset::from_columns(
            month_ends(3),
            vec![("a", vec![1.0; 3]), ("b", vec![2.0; 3])],
        )
        .unwrap()
        .with_metadata(&MetadataUpdate::new().currency("UYU"))
        .unwrap();
        assert!(ds.fields_match_across_columns());

        let usd = ds
            .select(&["b"])
            .unwrap()
            .with_metadata(&MetadataUpdate::new().currency("USD"))
            .unwrap();
        let mixed = Dataset::concat(&[ds.select(&["a"]).unwrap(), usd]).unwrap();
        assert!(!mixed.fields_match_across_columns());
        assert_eq!(mixed.indicators(), vec!["a", "b"]);
    }

    #[test]
    fn reindex_and_concat_align_on_dates() {
        let idx = month_ends(4);
        let a = Dataset::from_columns(idx[..3].to_vec(), vec![("a", vec![1.0, 2.0, 3.0])]).unwrap();
        let b = Dataset::from_columns(idx[1..].to_vec(), vec![("b", vec![5.0, 6.0, 7.0])]).unwrap();

        let joined = Dataset::concat(&[a, b]).unwrap();
        assert_eq!(joined.len(), 4);
        assert!(joined.values(0).unwrap()[3].is_nan());
        assert!(joined.values(1).unwrap()[0].is_nan());
        assert_eq!(joined.frequency(), Frequency::Monthly);
    }

    #[test]
    fn drop_empty_rows_keeps_partial_rows() {
        let ds = Dataset::from_columns(
            month_ends(3),
            vec![
                ("a", vec![f64::NAN, 2.0, f64::NAN]),
                ("b", vec![f64::NAN, f64::NAN, 3.0]),
            ],
        )
        .unwrap();
        let trimmed = ds.drop_empty_rows().unwrap();
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.index()[0], ymd(2020, 2, 29));
    }

    #[test]
    fn nearest_position_snaps_to_closest_date() {
        let ds = Dataset::from_columns(month_ends(3), vec![("a", vec![1.0, 2.0, 3.0])]).unwrap();
        assert_eq!(ds.nearest_position(ymd(2020, 2, 29)).unwrap(), 1);
        assert_eq!(ds.nearest_position(ymd(2020, 2, 1)).unwrap(), 0);
        assert_eq!(ds.nearest_position(ymd(2020, 2, 20)).unwrap(), 1);
        assert_eq!(ds.nearest_position(ymd(2019, 1, 1)).unwrap(), 0);
        assert_eq!(ds.nearest_position(ymd(2030, 1, 1)).unwrap(), 2);
    }

    #[test]
    fn coerced_keeps_shape_and_metadata() {
        let ds = Dataset::from_columns(month_ends(3), vec![("a", vec![1.0, 2.0, 3.0])])
            .unwrap()
            .with_metadata(&MetadataUpdate::new().currency("USD"))
            .unwrap();
        let coerced = ds.coerced();
        assert_eq!(coerced.len(), 3);
        assert!(coerced.values(0).unwrap().iter().all(|v| v.is_nan()));
        assert_eq!(coerced.descriptor(0).unwrap().currency(), Some("USD"));
    }

    #[test]
    fn linear_interpolation_fills_gaps() {
        let result = interpolate_series(&[1.0, f64::NAN, f64::NAN, 4.0, 5.0], true);
        assert_relative_eq!(result[1], 2.0, epsilon = 1e-10);
        assert_relative_eq!(result[2], 3.0, epsilon = 1e-10);

        let edges = interpolate_series(&[f64::NAN, 3.0, 4.0, f64::NAN], false);
        assert!(edges[0].is_nan());
        assert!(edges[3].is_nan());

        let filled = forward_fill_series(&[f64::NAN, 1.0, f64::NAN, 3.0, f64::NAN]);
        assert!(filled[0].is_nan());
        assert_eq!(&filled[1..], &[1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn metadata_json_lists_every_indicator() {
        let ds = Dataset::from_columns(
            month_ends(3),
            vec![("a", vec![1.0; 3]), ("b", vec![2.0; 3])],
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&ds.metadata_json().unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["indicator"], "b");
        assert_eq!(json[0]["frequency"], "M");
    }

    #[test]
    fn history_records_steps_in_order() {
        let ds = Dataset::from_columns(month_ends(3), vec![("a", vec![1.0; 3])]).unwrap();
        let stepped = ds
            .clone()
            .with_step(TransformStep::new("rolling").param("window", 3))
            .with_step(TransformStep::new("rebase"));
        assert!(ds.history().is_empty());
        assert_eq!(stepped.history().len(), 2);
        assert_eq!(stepped.history()[0].parameter("window"), Some("3"));
    }
}
