//! Configuration for conversions and seasonal decomposition.

use crate::seasonality::{Component, DecompositionMethod, FallbackMethod};
use crate::transform::ErrorPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Names and column positions of the auxiliary series used by conversions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Exchange-rate series name.
    pub exchange_rate: String,
    /// CPI series name.
    pub cpi: String,
    /// GDP series name.
    pub gdp: String,
    /// Column holding the period-average sell rate.
    pub fx_average_column: usize,
    /// Column holding the end-of-period sell rate.
    pub fx_end_of_period_column: usize,
    pub cpi_column: usize,
    /// Column holding GDP in local currency.
    pub gdp_local_column: usize,
    /// Column holding GDP in US dollars.
    pub gdp_usd_column: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            exchange_rate: "nxr_monthly".to_string(),
            cpi: "cpi".to_string(),
            gdp: "_monthly_interpolated_gdp".to_string(),
            fx_average_column: 0,
            fx_end_of_period_column: 1,
            cpi_column: 0,
            gdp_local_column: 0,
            gdp_usd_column: 1,
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchange_rate(mut self, name: impl Into<String>) -> Self {
        self.exchange_rate = name.into();
        self
    }

    pub fn with_cpi(mut self, name: impl Into<String>) -> Self {
        self.cpi = name.into();
        self
    }

    pub fn with_gdp(mut self, name: impl Into<String>) -> Self {
        self.gdp = name.into();
        self
    }

    /// Set the average and end-of-period exchange-rate columns.
    pub fn with_fx_columns(mut self, average: usize, end_of_period: usize) -> Self {
        self.fx_average_column = average;
        self.fx_end_of_period_column = end_of_period;
        self
    }

    pub fn with_cpi_column(mut self, column: usize) -> Self {
        self.cpi_column = column;
        self
    }

    /// Set the local-currency and USD GDP columns.
    pub fn with_gdp_columns(mut self, local: usize, usd: usize) -> Self {
        self.gdp_local_column = local;
        self.gdp_usd_column = usd;
        self
    }
}

/// Where to find, or how to obtain, the X13 binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct X13Config {
    /// Use this binary and skip every lookup step.
    pub binary_path: Option<PathBuf>,
    /// Environment variable holding a binary path; also where a located
    /// binary is cached for the rest of the process.
    pub env_var: String,
    /// Directory the search starts from. Defaults to the current directory.
    pub search_root: Option<PathBuf>,
    /// How many parent levels above the search root to start searching from.
    pub search_parents: usize,
    /// Where a downloaded binary is stored. Defaults to the per-OS
    /// application data directory.
    pub download_dir: Option<PathBuf>,
    pub allow_download: bool,
    /// Run `x13as` rather than `x12a`.
    pub prefer_x13: bool,
    /// Kill the binary if a single run takes longer than this.
    pub timeout: Option<Duration>,
}

impl Default for X13Config {
    fn default() -> Self {
        Self {
            binary_path: None,
            env_var: "X13PATH".to_string(),
            search_root: None,
            search_parents: 0,
            download_dir: None,
            allow_download: true,
            prefer_x13: true,
            timeout: None,
        }
    }
}

impl X13Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    pub fn with_search_root(mut self, root: impl Into<PathBuf>, parents: usize) -> Self {
        self.search_root = Some(root.into());
        self.search_parents = parents;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn without_download(mut self) -> Self {
        self.allow_download = false;
        self
    }

    pub fn with_prefer_x13(mut self, prefer: bool) -> Self {
        self.prefer_x13 = prefer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for [`crate::seasonality::decompose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeOptions {
    pub component: Component,
    pub method: DecompositionMethod,
    /// Retry X13 without outlier detection, then without trading-day
    /// effects, before falling back.
    pub force_retry: bool,
    pub fallback: FallbackMethod,
    pub outlier: bool,
    pub trading_days: bool,
    pub errors: ErrorPolicy,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            component: Component::Both,
            method: DecompositionMethod::X13,
            force_retry: false,
            fallback: FallbackMethod::Loess,
            outlier: true,
            trading_days: true,
            errors: ErrorPolicy::Raise,
        }
    }
}

impl DecomposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.component = component;
        self
    }

    pub fn with_method(mut self, method: DecompositionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_force_retry(mut self, force_retry: bool) -> Self {
        self.force_retry = force_retry;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackMethod) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_outlier(mut self, outlier: bool) -> Self {
        self.outlier = outlier;
        self
    }

    pub fn with_trading_days(mut self, trading_days: bool) -> Self {
        self.trading_days = trading_days;
        self
    }

    pub fn with_errors(mut self, errors: ErrorPolicy) -> Self {
        self.errors = errors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_defaults_match_series_names() {
        let config = ConversionConfig::default();
        assert_eq!(config.exchange_rate, "nxr_monthly");
        assert_eq!(config.cpi, "cpi");
        assert_eq!(config.gdp, "_monthly_interpolated_gdp");
        assert_eq!(config.fx_end_of_period_column, 1);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: ConversionConfig = serde_json::from_str(r#"{"cpi": "ipc"}"#).unwrap();
        assert_eq!(config.cpi, "ipc");
        assert_eq!(config.exchange_rate, "nxr_monthly");

        let x13: X13Config = serde_json::from_str(r#"{"search_parents": 2}"#).unwrap();
        assert_eq!(x13.search_parents, 2);
        assert_eq!(x13.env_var, "X13PATH");
        assert!(x13.allow_download);
    }

    #[test]
    fn decompose_options_builder() {
        let options = DecomposeOptions::new()
            .with_component(Component::Trend)
            .with_force_retry(true)
            .with_fallback(FallbackMethod::MovingAverage)
            .with_errors(ErrorPolicy::Coerce);
        assert_eq!(options.component, Component::Trend);
        assert!(options.force_retry);
        assert!(options.outlier);
        assert_eq!(options.errors, ErrorPolicy::Coerce);

        let json = serde_json::to_string(&options).unwrap();
        let back: DecomposeOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
