//! Revision of previously stored data with freshly retrieved data.
//!
//! Sources revise their most recent observations, so when new data arrives
//! the trailing rows of the stored copy are discarded and replaced.

use super::dataset::Dataset;
use super::frequency::Frequency;
use crate::error::{Result, TransformError};
use std::str::FromStr;

/// How many trailing rows of previous data are replaced by new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionPolicy {
    /// Merge both datasets, keeping the newest row for each date.
    NoDuplicates,
    /// Pick the number of rows from the frequency of the previous data.
    Auto,
    /// Replace exactly this many rows.
    Rows(usize),
}

impl FromStr for RevisionPolicy {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nodup" => Ok(RevisionPolicy::NoDuplicates),
            "auto" => Ok(RevisionPolicy::Auto),
            other => other.parse::<usize>().map(RevisionPolicy::Rows).map_err(|_| {
                TransformError::InvalidParameter(format!(
                    "revision policy must be 'nodup', 'auto' or a row count, got '{other}'"
                ))
            }),
        }
    }
}

/// Resolve the number of trailing rows of previous data to discard.
///
/// `NoDuplicates` discards nothing positionally (duplicates are resolved by
/// date instead) and resolves to 0.
pub fn resolve_revision_count(
    policy: RevisionPolicy,
    frequency: Frequency,
    prior_len: usize,
    new_len: usize,
) -> usize {
    match policy {
        RevisionPolicy::NoDuplicates => 0,
        RevisionPolicy::Rows(n) => n,
        RevisionPolicy::Auto => match frequency {
            Frequency::Annual => 3,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            _ if prior_len <= 12 || new_len <= 12 => 3,
            _ => 12,
        },
    }
}

/// Combine previously stored data with newly retrieved data.
///
/// Both datasets must carry the same indicators. The new data's descriptors
/// win.
pub fn revise(previous: &Dataset, new: &Dataset, policy: RevisionPolicy) -> Result<Dataset> {
    if previous.is_empty() {
        return Ok(new.clone());
    }
    if previous.width() != new.width() {
        return Err(TransformError::DimensionMismatch {
            expected: new.width(),
            got: previous.width(),
        });
    }

    let mut rows: Vec<(chrono::NaiveDate, Vec<f64>)> = Vec::new();
    match policy {
        RevisionPolicy::NoDuplicates => {
            rows.extend(row_pairs(previous));
            for (date, row) in row_pairs(new) {
                match rows.iter_mut().find(|(d, _)| *d == date) {
                    Some(existing) => existing.1 = row,
                    None => rows.push((date, row)),
                }
            }
            rows.sort_by_key(|(d, _)| *d);
        }
        RevisionPolicy::Auto | RevisionPolicy::Rows(_) => {
            let count =
                resolve_revision_count(policy, previous.frequency(), previous.len(), new.len());
            let keep = previous.len().saturating_sub(count);
            rows.extend(row_pairs(previous).take(keep));
            rows.extend(row_pairs(new).skip(keep));
        }
    }

    tracing::debug!(
        previous = previous.len(),
        new = new.len(),
        revised = rows.len(),
        "revised dataset"
    );

    let index: Vec<_> = rows.iter().map(|(d, _)| *d).collect();
    let values: Vec<Vec<f64>> = (0..new.width())
        .map(|col| rows.iter().map(|(_, row)| row[col]).collect())
        .collect();
    new.with_index_and_values(index, values)
}

fn row_pairs(dataset: &Dataset) -> impl Iterator<Item = (chrono::NaiveDate, Vec<f64>)> + '_ {
    dataset.index().iter().enumerate().map(move |(i, d)| {
        let row = dataset
            .values_by_column()
            .iter()
            .map(|column| column[i])
            .collect();
        (*d, row)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn monthly(start_month: u32, values: Vec<f64>) -> Dataset {
        let index = Frequency::Monthly
            .grid(
                NaiveDate::from_ymd_opt(2020, start_month, 1).unwrap(),
                NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            )
            .into_iter()
            .take(values.len())
            .collect();
        Dataset::from_columns(index, vec![("Exports", values)]).unwrap()
    }

    #[test]
    fn auto_policy_uses_frequency_table() {
        let auto = RevisionPolicy::Auto;
        assert_eq!(resolve_revision_count(auto, Frequency::Monthly, 50, 50), 12);
        assert_eq!(resolve_revision_count(auto, Frequency::Quarterly, 50, 50), 4);
        assert_eq!(resolve_revision_count(auto, Frequency::Annual, 50, 50), 3);
        assert_eq!(resolve_revision_count(auto, Frequency::Daily, 50, 50), 12);
        assert_eq!(resolve_revision_count(auto, Frequency::Daily, 12, 50), 3);
        assert_eq!(resolve_revision_count(auto, Frequency::Unknown, 50, 5), 3);
    }

    #[test]
    fn explicit_and_nodup_policies() {
        assert_eq!(
            resolve_revision_count(RevisionPolicy::Rows(6), Frequency::Monthly, 50, 50),
            6
        );
        assert_eq!(
            resolve_revision_count(RevisionPolicy::NoDuplicates, Frequency::Monthly, 50, 50),
            0
        );
        assert_eq!("nodup".parse::<RevisionPolicy>().unwrap(), RevisionPolicy::NoDuplicates);
        assert_eq!("7".parse::<RevisionPolicy>().unwrap(), RevisionPolicy::Rows(7));
        assert!("sometimes".parse::<RevisionPolicy>().is_err());
    }

    #[test]
    fn nodup_keeps_newest_rows() {
        let previous = monthly(1, vec![1.0, 2.0, 3.0]);
        let new = monthly(2, vec![20.0, 30.0, 40.0]);
        let revised = revise(&previous, &new, RevisionPolicy::NoDuplicates).unwrap();
        assert_eq!(revised.len(), 4);
        assert_eq!(revised.values(0).unwrap(), &[1.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn row_policy_replaces_trailing_rows() {
        let previous = monthly(1, vec![1.0, 2.0, 3.0, 4.0]);
        let new = monthly(1, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        let revised = revise(&previous, &new, RevisionPolicy::Rows(2)).unwrap();
        assert_eq!(revised.values(0).unwrap(), &[1.0, 2.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn empty_previous_returns_new() {
        let previous = Dataset::from_columns(Vec::new(), vec![("Exports", Vec::new())]).unwrap();
        let new = monthly(1, vec![1.0, 2.0, 3.0]);
        let revised = revise(&previous, &new, RevisionPolicy::Auto).unwrap();
        assert_eq!(revised.len(), 3);
    }
}
