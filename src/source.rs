//! Access to auxiliary series (exchange rates, CPI, GDP).
//!
//! Conversions never fetch data themselves: callers pass something that can
//! produce a [`Dataset`] for a logical series name.

use crate::core::Dataset;
use crate::error::{Result, TransformError};
use std::collections::HashMap;

/// Produces datasets by logical name.
pub trait SeriesSource {
    /// Retrieve the series registered under `name`.
    fn get(&self, name: &str) -> Result<Dataset>;
}

impl<F> SeriesSource for F
where
    F: Fn(&str) -> Result<Dataset>,
{
    fn get(&self, name: &str) -> Result<Dataset> {
        self(name)
    }
}

/// A [`SeriesSource`] backed by datasets held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, Dataset>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        self.insert(name, dataset);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.series.insert(name.into(), dataset);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SeriesSource for InMemorySource {
    fn get(&self, name: &str) -> Result<Dataset> {
        self.series
            .get(name)
            .cloned()
            .ok_or_else(|| TransformError::Source {
                name: name.to_string(),
                message: "no such series".to_string(),
            })
    }
}
