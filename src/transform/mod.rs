//! Metadata-aware transformations of [`Dataset`](crate::core::Dataset)s.
//!
//! Every transform reads the descriptors of the columns it touches, splits
//! the dataset when those descriptors differ, and records itself in the
//! dataset history.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use econuy_transform::core::{Dataset, Frequency, MetadataUpdate, SeriesType};
//! use econuy_transform::transform::{chg_diff, ChangeOperation, ChangePeriod};
//!
//! let index = Frequency::Monthly.grid(
//!     NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
//!     NaiveDate::from_ymd_opt(2020, 4, 30).unwrap(),
//! );
//! let dataset = Dataset::from_columns(index, vec![("sales", vec![100.0, 110.0, 121.0, 133.1])])
//!     .unwrap()
//!     .with_metadata(&MetadataUpdate::new().series_type(SeriesType::Flow).cumulative_periods(1))
//!     .unwrap();
//!
//! let changes = chg_diff(&dataset, ChangeOperation::Chg, ChangePeriod::Last).unwrap();
//! assert_eq!(changes.descriptor(0).unwrap().unit(), Some("% change"));
//! ```

pub mod change;
pub mod convert;
pub mod policy;
pub mod rebase;
pub mod resample;
pub mod rolling;
pub mod window;

pub use change::{chg_diff, lagged_change, ChangeOperation, ChangePeriod};
pub use convert::{convert_gdp, convert_real, convert_usd};
pub use policy::ErrorPolicy;
pub use rebase::rebase;
pub use resample::{resample, Interpolation, ResampleOperation};
pub use rolling::{rolling, RollingOperation};
pub use window::{centered_moving_average, rolling_apply, rolling_mean, rolling_sum};
