//! Utility functions shared by the transforms.

pub mod stats;

pub use stats::{count_valid, last_valid, nan_mean, nan_sum};
