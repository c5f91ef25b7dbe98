//! Core data structures for metadata-tagged macroeconomic series.

mod dataset;
mod frequency;
mod metadata;
mod revision;

pub(crate) use dataset::{forward_fill_series, interpolate_series};
pub use dataset::{Dataset, DatasetBuilder, TransformStep, ValueLayout};
pub use frequency::{month_end, periods_per_year, Frequency};
pub use metadata::{Descriptor, MetadataUpdate, SeriesType};
pub use revision::{resolve_revision_count, revise, RevisionPolicy};
