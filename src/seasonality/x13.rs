//! Running the X13-ARIMA-SEATS binary.
//!
//! A spec file is written to a temporary directory, the binary is run on it,
//! and the seasonally adjusted (`d11`) and trend (`d12`) tables it saves are
//! parsed back.

use super::binary;
use super::Components;
use crate::config::X13Config;
use crate::core::Frequency;
use crate::error::{Result, TransformError};
use chrono::{Datelike, NaiveDate};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Characters of stderr kept in a failure message.
const STDERR_TAIL: usize = 500;

/// Model options passed to X13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct X13Flags {
    /// Automatic outlier detection.
    pub outlier: bool,
    /// Trading-day regressors.
    pub trading_days: bool,
}

impl fmt::Display for X13Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x13(outlier={}, trading_days={})",
            self.outlier, self.trading_days
        )
    }
}

/// Something that can seasonally adjust one gap-free series with X13.
///
/// The production implementation is [`X13Binary`]; tests substitute their
/// own.
pub trait X13Backend {
    fn adjust(
        &self,
        index: &[NaiveDate],
        values: &[f64],
        frequency: Frequency,
        flags: X13Flags,
    ) -> Result<Components>;
}

/// A backend that always fails, used when no binary could be located so
/// decomposition goes straight to its fallback.
#[derive(Debug, Clone)]
pub struct Unavailable(pub TransformError);

impl X13Backend for Unavailable {
    fn adjust(&self, _: &[NaiveDate], _: &[f64], _: Frequency, _: X13Flags) -> Result<Components> {
        Err(self.0.clone())
    }
}

/// The X13 executable on disk.
#[derive(Debug, Clone)]
pub struct X13Binary {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl X13Binary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
        }
    }

    /// Locate (or install) the binary as described by `config`.
    pub fn locate(config: &X13Config) -> Result<Self> {
        Ok(Self {
            path: binary::locate(config)?,
            timeout: config.timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the binary to completion. Stderr goes to `<output_stem>.log` so a
    /// chatty binary never blocks on a full pipe.
    fn run(&self, spec_stem: &Path, output_stem: &Path) -> Result<()> {
        let log_path = output_stem.with_extension("log");
        let log = fs::File::create(&log_path)?;
        let mut child = Command::new(&self.path)
            .arg(spec_stem)
            .arg(output_stem)
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| TransformError::X13(format!("failed to start {}: {e}", self.path.display())))?;

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => {
                let started = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(TransformError::X13(format!(
                            "timed out after {:.1}s",
                            limit.as_secs_f64()
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        };

        if !status.success() {
            let stderr = fs::read_to_string(&log_path).unwrap_or_default();
            let stderr = stderr.trim();
            let skip = stderr.chars().count().saturating_sub(STDERR_TAIL);
            let tail: String = stderr.chars().skip(skip).collect();
            return Err(TransformError::X13(format!("exited with {status}: {tail}")));
        }
        Ok(())
    }
}

impl X13Backend for X13Binary {
    fn adjust(
        &self,
        index: &[NaiveDate],
        values: &[f64],
        frequency: Frequency,
        flags: X13Flags,
    ) -> Result<Components> {
        let first = *index.first().ok_or(TransformError::EmptyData)?;
        let spec = spec_file(first, values, frequency, flags)?;

        let workdir = tempfile::tempdir()?;
        let spec_stem = workdir.path().join("series");
        let output_stem = workdir.path().join("output");
        fs::write(spec_stem.with_extension("spc"), spec)?;

        tracing::debug!(
            binary = %self.path.display(),
            observations = values.len(),
            %flags,
            "running X13"
        );
        self.run(&spec_stem, &output_stem)?;

        if let Ok(errors) = fs::read_to_string(output_stem.with_extension("err")) {
            check_errors(&errors)?;
        }
        let read = |table: &str| -> Result<Vec<f64>> {
            let text = fs::read_to_string(output_stem.with_extension(table))
                .map_err(|e| TransformError::X13(format!("missing {table} output: {e}")))?;
            parse_table(&text, values.len())
        };

        Ok(Components {
            trend: read("d12")?,
            seasonally_adjusted: read("d11")?,
        })
    }
}

/// Render the X13 spec for one series.
pub fn spec_file(
    start: NaiveDate,
    values: &[f64],
    frequency: Frequency,
    flags: X13Flags,
) -> Result<String> {
    let (period, start_period) = match frequency {
        Frequency::Monthly => (12, start.month()),
        Frequency::Quarterly => (4, (start.month() - 1) / 3 + 1),
        other => {
            return Err(TransformError::UnsupportedFrequency {
                operation: "X13",
                expected: "monthly or quarterly",
                frequency: other.code().to_string(),
            })
        }
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(TransformError::X13(
            "series contains missing values".to_string(),
        ));
    }

    let mut spec = String::new();
    let _ = writeln!(spec, "series{{");
    let _ = writeln!(spec, "  title=\"econuy\"");
    let _ = writeln!(spec, "  start={}.{}", start.year(), start_period);
    let _ = writeln!(spec, "  period={period}");
    let _ = writeln!(spec, "  data=(");
    for value in values {
        let _ = writeln!(spec, "    {value}");
    }
    let _ = writeln!(spec, "  )");
    let _ = writeln!(spec, "}}");
    let _ = writeln!(spec, "transform{{function=auto}}");
    if flags.trading_days {
        let _ = writeln!(spec, "regression{{aictest=(td)}}");
    }
    if flags.outlier {
        let _ = writeln!(spec, "outlier{{}}");
    }
    let _ = writeln!(spec, "automdl{{}}");
    let _ = writeln!(spec, "x11{{save=(d11 d12)}}");
    Ok(spec)
}

/// Fail if the `.err` output reports an error.
pub fn check_errors(text: &str) -> Result<()> {
    match text.find("ERROR:") {
        Some(start) => Err(TransformError::X13(text[start..].trim().to_string())),
        None => Ok(()),
    }
}

/// Parse a saved table: two header lines, then `date<TAB>value` rows.
pub fn parse_table(text: &str, expected_rows: usize) -> Result<Vec<f64>> {
    let values = text
        .lines()
        .skip(2)
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let field = line.split_whitespace().nth(1).ok_or_else(|| {
                TransformError::X13(format!("malformed table row '{line}'"))
            })?;
            field
                .parse::<f64>()
                .map_err(|_| TransformError::X13(format!("non-numeric table value '{field}'")))
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != expected_rows {
        return Err(TransformError::X13(format!(
            "table has {} rows, expected {expected_rows}",
            values.len()
        )));
    }
    Ok(values)
}
