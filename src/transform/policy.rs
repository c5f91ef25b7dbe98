//! Error policy for columns whose metadata rules out an operation, and the
//! split/transform/reassemble machinery shared by every transform.

use crate::core::Dataset;
use crate::error::{Result, TransformError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do with columns an operation does not apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Fail, naming the first offending column.
    #[default]
    Raise,
    /// Replace offending columns with missing values.
    Coerce,
    /// Pass offending columns through unchanged.
    Ignore,
}

impl ErrorPolicy {
    /// Apply the policy to a dataset made only of offending columns.
    pub fn handle(&self, dataset: &Dataset, reason: &str) -> Result<Dataset> {
        match self {
            ErrorPolicy::Raise => {
                let indicator = dataset.indicators().first().map_or("", |s| *s).to_string();
                Err(TransformError::not_applicable(&indicator, reason))
            }
            ErrorPolicy::Coerce => Ok(dataset.coerced()),
            ErrorPolicy::Ignore => Ok(dataset.clone()),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorPolicy::Raise => "raise",
            ErrorPolicy::Coerce => "coerce",
            ErrorPolicy::Ignore => "ignore",
        })
    }
}

impl FromStr for ErrorPolicy {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raise" => Ok(ErrorPolicy::Raise),
            "coerce" => Ok(ErrorPolicy::Coerce),
            "ignore" => Ok(ErrorPolicy::Ignore),
            other => Err(TransformError::InvalidParameter(format!(
                "errors must be 'raise', 'coerce' or 'ignore', got '{other}'"
            ))),
        }
    }
}

/// Run `f` over `dataset`, one column at a time when descriptors differ.
pub(crate) fn per_metadata_group<F>(dataset: &Dataset, f: F) -> Result<Dataset>
where
    F: FnMut(&Dataset) -> Result<Dataset>,
{
    let failures = vec![None; dataset.width()];
    apply_checked(dataset, &failures, ErrorPolicy::Raise, f)
}

/// Single-output form of [`apply_checked_multi`].
pub(crate) fn apply_checked<F>(
    dataset: &Dataset,
    failures: &[Option<String>],
    policy: ErrorPolicy,
    mut f: F,
) -> Result<Dataset>
where
    F: FnMut(&Dataset) -> Result<Dataset>,
{
    let mut outputs = apply_checked_multi(dataset, failures, policy, 1, |part| {
        f(part).map(|out| vec![out])
    })?;
    outputs.pop().ok_or(TransformError::EmptyData)
}

/// Split `dataset` by applicability, transform what passes and apply
/// `policy` to the rest.
///
/// `failures[i]` holds the reason column `i` cannot be transformed. `f`
/// returns `outputs` datasets per call (trend and seasonally adjusted, for
/// instance) and is called once on all passing columns when their
/// descriptors match, or once per passing column otherwise. Each output is
/// reassembled in the original column order.
pub(crate) fn apply_checked_multi<F>(
    dataset: &Dataset,
    failures: &[Option<String>],
    policy: ErrorPolicy,
    outputs: usize,
    mut f: F,
) -> Result<Vec<Dataset>>
where
    F: FnMut(&Dataset) -> Result<Vec<Dataset>>,
{
    if failures.len() != dataset.width() {
        return Err(TransformError::DimensionMismatch {
            expected: dataset.width(),
            got: failures.len(),
        });
    }
    if dataset.width() == 0 {
        return Err(TransformError::EmptyData);
    }

    let passing: Vec<usize> = (0..dataset.width())
        .filter(|&i| failures[i].is_none())
        .collect();
    let failing: Vec<(usize, &str)> = failures
        .iter()
        .enumerate()
        .filter_map(|(i, reason)| reason.as_deref().map(|r| (i, r)))
        .collect();

    if let Some(&(position, reason)) = failing.first() {
        if policy == ErrorPolicy::Raise {
            let indicator = dataset.descriptor(position)?.indicator();
            return Err(TransformError::not_applicable(indicator, reason));
        }
    }

    if failing.is_empty() && dataset.fields_match_across_columns() {
        let results = f(dataset)?;
        check_output_count(&results, outputs)?;
        return Ok(results);
    }

    let mut parts: Vec<Vec<Dataset>> = vec![Vec::new(); outputs];

    if !passing.is_empty() {
        let selected = dataset.select_positions(&passing);
        let groups: Vec<Dataset> = if selected.fields_match_across_columns() {
            vec![selected]
        } else {
            (0..selected.width())
                .map(|i| selected.select_positions(&[i]))
                .collect()
        };
        for group in &groups {
            let results = f(group)?;
            check_output_count(&results, outputs)?;
            for (slot, result) in parts.iter_mut().zip(results) {
                slot.push(result);
            }
        }
    }

    for &(position, reason) in &failing {
        let handled = policy.handle(&dataset.select_positions(&[position]), reason)?;
        for slot in parts.iter_mut() {
            slot.push(handled.clone());
        }
    }

    let order = dataset.indicators();
    parts
        .iter()
        .map(|slot| Dataset::concat(slot)?.select(&order))
        .collect()
}

fn check_output_count(results: &[Dataset], outputs: usize) -> Result<()> {
    if results.len() != outputs {
        return Err(TransformError::DimensionMismatch {
            expected: outputs,
            got: results.len(),
        });
    }
    Ok(())
}
