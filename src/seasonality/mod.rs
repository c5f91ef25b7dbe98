//! Seasonal decomposition.
//!
//! - X13-ARIMA-SEATS through an external binary ([`X13Binary`])
//! - STL: Seasonal-Trend decomposition using LOESS
//! - Classical moving-average decomposition
//!
//! [`decompose`] runs these per column with a fallback cascade.

pub mod binary;
mod classical;
mod decompose;
mod stl;
pub mod x13;

pub use classical::classical_decompose;
pub use decompose::{
    cascade, decompose, decompose_with_binary, Attempt, Component, Decomposition,
    DecompositionMethod, FallbackMethod,
};
pub use stl::{STLResult, STL};
pub use x13::{Unavailable, X13Backend, X13Binary, X13Flags};

/// Trend and seasonally adjusted versions of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    pub trend: Vec<f64>,
    pub seasonally_adjusted: Vec<f64>,
}
