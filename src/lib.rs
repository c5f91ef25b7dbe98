//! # econuy-transform
//!
//! Transformations for macroeconomic time series that carry their own
//! metadata.
//!
//! Every column of a [`Dataset`](core::Dataset) has a descriptor (area,
//! currency, inflation adjustment, unit, seasonal adjustment, stock or flow,
//! cumulative periods). Transforms read those descriptors to decide how to
//! aggregate, convert or decompose a column, and return a new dataset with
//! the descriptors updated and the step appended to its history.
//!
//! - [`transform::resample`], [`transform::rolling`], [`transform::chg_diff`]
//!   and [`transform::rebase`] work on the data alone.
//! - [`transform::convert_usd`], [`transform::convert_real`] and
//!   [`transform::convert_gdp`] pull exchange rates, CPI or GDP from a
//!   [`SeriesSource`](source::SeriesSource).
//! - [`seasonality::decompose`] produces trend and seasonally adjusted
//!   datasets, through X13 with LOESS or moving-average fallbacks.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod seasonality;
pub mod source;
pub mod transform;
pub mod utils;

pub use error::{Result, TransformError};

pub mod prelude {
    pub use crate::config::{ConversionConfig, DecomposeOptions, X13Config};
    pub use crate::core::{Dataset, Frequency, MetadataUpdate, SeriesType};
    pub use crate::error::{Result, TransformError};
    pub use crate::seasonality::{decompose, Component, DecompositionMethod, FallbackMethod};
    pub use crate::source::{InMemorySource, SeriesSource};
    pub use crate::transform::{
        chg_diff, convert_gdp, convert_real, convert_usd, rebase, resample, rolling,
        ChangeOperation, ChangePeriod, ErrorPolicy, Interpolation, ResampleOperation,
        RollingOperation,
    };
}
