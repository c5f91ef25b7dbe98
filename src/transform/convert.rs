//! Currency, inflation and GDP conversions driven by auxiliary series.
//!
//! Each conversion checks every column's metadata first. Columns that are
//! already converted (or that the conversion makes no sense for) are handled
//! by the [`ErrorPolicy`]; the rest are divided by an auxiliary series
//! aligned to the column's frequency and cumulative window.

use super::policy::{apply_checked, ErrorPolicy};
use super::rebase::BasePeriod;
use super::resample::{aggregate_bins, resample, Interpolation, ResampleOperation};
use super::rolling::{rolling, RollingOperation};
use crate::config::ConversionConfig;
use crate::core::{
    interpolate_series, Dataset, Descriptor, Frequency, MetadataUpdate, SeriesType, TransformStep,
};
use crate::error::{Result, TransformError};
use crate::source::SeriesSource;
use chrono::NaiveDate;

const LOCAL_CURRENCY: &str = "UYU";
const GDP_SHARE: &str = "% GDP";

/// Convert local-currency columns to US dollars.
///
/// Stocks are divided by the end-of-period exchange rate; flows by the
/// period-average rate, averaged over the column's cumulative window.
/// Converted columns get currency `"USD"`.
pub fn convert_usd<S>(
    dataset: &Dataset,
    source: &S,
    config: &ConversionConfig,
    errors: ErrorPolicy,
) -> Result<Dataset>
where
    S: SeriesSource + ?Sized,
{
    let failures = dataset
        .descriptors()
        .iter()
        .map(|d| {
            let currency = d
                .currency()
                .ok_or_else(|| TransformError::missing("currency", d.indicator()))?;
            Ok((currency != LOCAL_CURRENCY)
                .then(|| format!("currency is '{currency}', expected '{LOCAL_CURRENCY}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    let exchange_rate = fetch_if_needed(source, &config.exchange_rate, &failures)?;
    let output = apply_checked(dataset, &failures, errors, |part| match &exchange_rate {
        Some(fx) => usd_group(part, fx, config),
        None => Err(TransformError::EmptyData),
    })?;

    Ok(output.with_step(TransformStep::new("convert_usd").param("errors", errors)))
}

fn usd_group(part: &Dataset, exchange_rate: &Dataset, config: &ConversionConfig) -> Result<Dataset> {
    let descriptor = part.descriptor(0)?;
    let stock = descriptor.require_series_type()?.is_stock();
    let (part, frequency) = coerce_sub_monthly(part, stock, ResampleOperation::Last)?;

    let rate = if stock {
        let fx = auxiliary(exchange_rate, SeriesType::Stock)?;
        let fx = resample(&fx, frequency, ResampleOperation::Last, Interpolation::Linear)?;
        auxiliary_column(&fx, config.fx_end_of_period_column, &config.exchange_rate)?
    } else {
        let cumulative_periods = descriptor.require_cumulative_periods()?;
        let fx = auxiliary(exchange_rate, SeriesType::Flow)?;
        let fx = resample(&fx, frequency, ResampleOperation::Mean, Interpolation::Linear)?;
        let fx = auxiliary_column(&fx, config.fx_average_column, &config.exchange_rate)?;
        rolling(&fx, Some(cumulative_periods as usize), RollingOperation::Mean)?
    };
    let rate = aligned(&rate, &part)?;

    let values = part
        .values_by_column()
        .iter()
        .map(|column| column.iter().zip(&rate).map(|(v, r)| v / r).collect())
        .collect();
    part.with_values(values)?
        .with_metadata(&MetadataUpdate::new().currency("USD"))
}

/// Deflate local-currency columns by the CPI.
///
/// Without `start_date` the series are simply divided by the CPI and tagged
/// `"Const."`. With a start date (and optionally an end date) they are
/// expressed in prices of that period, tagged `"Const. YYYY-MM"` or
/// `"Const. YYYY-MM_YYYY-MM"`. Dates snap to the nearest index date.
pub fn convert_real<S>(
    dataset: &Dataset,
    source: &S,
    config: &ConversionConfig,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    errors: ErrorPolicy,
) -> Result<Dataset>
where
    S: SeriesSource + ?Sized,
{
    if start_date.is_none() && end_date.is_some() {
        return Err(TransformError::InvalidParameter(
            "end_date requires a start_date".to_string(),
        ));
    }

    let failures = dataset
        .descriptors()
        .iter()
        .map(|d| {
            let currency = d
                .currency()
                .ok_or_else(|| TransformError::missing("currency", d.indicator()))?;
            let adjustment = d
                .inflation_adjustment()
                .ok_or_else(|| TransformError::missing("inflation_adjustment", d.indicator()))?;
            Ok(if currency != LOCAL_CURRENCY {
                Some(format!("currency is '{currency}', expected '{LOCAL_CURRENCY}'"))
            } else if adjustment.contains("Const.") {
                Some(format!("already in constant prices ('{adjustment}')"))
            } else {
                None
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cpi = fetch_if_needed(source, &config.cpi, &failures)?;
    let output = apply_checked(dataset, &failures, errors, |part| match &cpi {
        Some(cpi) => real_group(part, cpi, config, start_date, end_date),
        None => Err(TransformError::EmptyData),
    })?;

    let mut step = TransformStep::new("convert_real").param("errors", errors);
    if let Some(start) = start_date {
        step = step.param("start_date", start);
    }
    if let Some(end) = end_date {
        step = step.param("end_date", end);
    }
    Ok(output.with_step(step))
}

fn real_group(
    part: &Dataset,
    cpi: &Dataset,
    config: &ConversionConfig,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Dataset> {
    let descriptor = part.descriptor(0)?;
    let stock = descriptor.require_series_type()?.is_stock();
    let cumulative_periods = descriptor.require_cumulative_periods()?;
    let (part, frequency) = coerce_sub_monthly(part, stock, ResampleOperation::Mean)?;

    let cpi = auxiliary(cpi, SeriesType::Flow)?;
    let cpi = resample(&cpi, frequency, ResampleOperation::Mean, Interpolation::Linear)?;
    let cpi = auxiliary_column(&cpi, config.cpi_column, &config.cpi)?;
    let cpi = rolling(&cpi, Some(cumulative_periods as usize), RollingOperation::Mean)?;
    let deflator = aligned(&cpi, &part)?;

    let (reference, label) = match start_date {
        None => (1.0, "Const.".to_string()),
        Some(start) => {
            let period = BasePeriod::resolve(&part, start, end_date)?;
            (period.reference(&deflator), format!("Const. {}", period.label))
        }
    };
    if !reference.is_finite() {
        tracing::warn!(
            indicator = descriptor.indicator(),
            "CPI is missing over the base period, converted values will be missing"
        );
    }

    let values = part
        .values_by_column()
        .iter()
        .map(|column| {
            column
                .iter()
                .zip(&deflator)
                .map(|(v, p)| v / p * reference)
                .collect()
        })
        .collect();
    part.with_values(values)?
        .with_metadata(&MetadataUpdate::new().inflation_adjustment(label))
}

/// Express columns as a percentage of GDP.
///
/// Monthly and quarterly flows that do not already cover a year are turned
/// into trailing annual sums before dividing. Converted columns get currency
/// `"% GDP"` and, when rolled, a cumulative window of one year. Regional and
/// global aggregates are not convertible.
pub fn convert_gdp<S>(
    dataset: &Dataset,
    source: &S,
    config: &ConversionConfig,
    errors: ErrorPolicy,
) -> Result<Dataset>
where
    S: SeriesSource + ?Sized,
{
    let failures = dataset
        .descriptors()
        .iter()
        .map(|d| {
            let area = d
                .area()
                .ok_or_else(|| TransformError::missing("area", d.indicator()))?;
            let unit = d
                .unit()
                .ok_or_else(|| TransformError::missing("unit", d.indicator()))?;
            Ok(gdp_failure(d, area, unit))
        })
        .collect::<Result<Vec<_>>>()?;

    let gdp = fetch_if_needed(source, &config.gdp, &failures)?;
    let output = apply_checked(dataset, &failures, errors, |part| match &gdp {
        Some(gdp) => gdp_group(part, gdp, config),
        None => Err(TransformError::EmptyData),
    })?;

    Ok(output.with_step(TransformStep::new("convert_gdp").param("errors", errors)))
}

fn gdp_failure(descriptor: &Descriptor, area: &str, unit: &str) -> Option<String> {
    if matches!(area, "Regional" | "Global") {
        Some(format!("area '{area}' has no GDP"))
    } else if unit.contains("% GDP") || unit.contains("%GDP") {
        Some(format!("unit '{unit}' is already a share of GDP"))
    } else if descriptor.currency() == Some(GDP_SHARE) {
        Some("already expressed as a share of GDP".to_string())
    } else {
        None
    }
}

fn gdp_group(part: &Dataset, gdp: &Dataset, config: &ConversionConfig) -> Result<Dataset> {
    let descriptor = part.descriptor(0)?;
    let stock = descriptor.require_series_type()?.is_stock();
    let cumulative_periods = descriptor.require_cumulative_periods()?;
    let column = if descriptor.currency() == Some("USD") {
        config.gdp_usd_column
    } else {
        config.gdp_local_column
    };
    let gdp = auxiliary_column(gdp, column, &config.gdp)?;
    let (part, frequency) = coerce_sub_monthly(part, stock, ResampleOperation::Mean)?;

    let gdp = match frequency {
        Frequency::Monthly => upsample_linear(&gdp, Frequency::Monthly)?,
        Frequency::Quarterly | Frequency::Annual => {
            aggregate_bins(&gdp, frequency, ResampleOperation::Last)?
        }
        other => {
            return Err(TransformError::UnsupportedFrequency {
                operation: "convert_gdp",
                expected: "annual, quarterly, monthly or finer",
                frequency: other.code().to_string(),
            })
        }
    };

    let year = frequency.periods_per_year()?;
    let (part, rolled) = if !stock && cumulative_periods < year && frequency != Frequency::Annual {
        let window = (year / cumulative_periods) as usize;
        (rolling(&part, Some(window), RollingOperation::Sum)?, true)
    } else {
        (part, false)
    };
    let denominator = aligned(&gdp, &part)?;

    let values = part
        .values_by_column()
        .iter()
        .map(|column| {
            column
                .iter()
                .zip(&denominator)
                .map(|(v, g)| v / g * 100.0)
                .collect()
        })
        .collect();
    let mut update = MetadataUpdate::new().currency(GDP_SHARE);
    if rolled {
        update = update.cumulative_periods(year);
    }
    part.with_values(values)?.with_metadata(&update)
}

/// Fetch an auxiliary series, unless no column will need it.
fn fetch_if_needed<S>(source: &S, name: &str, failures: &[Option<String>]) -> Result<Option<Dataset>>
where
    S: SeriesSource + ?Sized,
{
    if failures.iter().all(Option::is_some) {
        return Ok(None);
    }
    let dataset = source.get(name)?;
    if dataset.is_empty() {
        return Err(TransformError::Source {
            name: name.to_string(),
            message: "series is empty".to_string(),
        });
    }
    tracing::debug!(series = name, rows = dataset.len(), "loaded auxiliary series");
    Ok(Some(dataset))
}

/// Sub-monthly columns are first aggregated to months: flows are summed,
/// stocks reduced with `stock_operation`.
fn coerce_sub_monthly(
    part: &Dataset,
    stock: bool,
    stock_operation: ResampleOperation,
) -> Result<(Dataset, Frequency)> {
    let frequency = part.frequency();
    if !frequency.is_sub_monthly() {
        return Ok((part.clone(), frequency));
    }
    let operation = if stock {
        stock_operation
    } else {
        ResampleOperation::Sum
    };
    tracing::debug!(
        frequency = %frequency,
        operation = %operation,
        "aggregating sub-monthly data to monthly before converting"
    );
    let monthly = aggregate_bins(part, Frequency::Monthly, operation)?;
    Ok((monthly, Frequency::Monthly))
}

/// Tag an auxiliary series so it can go through `resample` and `rolling`.
fn auxiliary(dataset: &Dataset, series_type: SeriesType) -> Result<Dataset> {
    let mut update = MetadataUpdate::new().series_type(series_type);
    if dataset
        .descriptors()
        .iter()
        .any(|d| d.cumulative_periods().is_none())
    {
        update = update.cumulative_periods(1);
    }
    dataset.attach(&update)
}

fn auxiliary_column(dataset: &Dataset, position: usize, name: &str) -> Result<Dataset> {
    if position >= dataset.width() {
        return Err(TransformError::Source {
            name: name.to_string(),
            message: format!(
                "column {position} requested but the series has {} columns",
                dataset.width()
            ),
        });
    }
    Ok(dataset.select_positions(&[position]))
}

fn upsample_linear(dataset: &Dataset, target: Frequency) -> Result<Dataset> {
    let binned = aggregate_bins(dataset, target, ResampleOperation::Last)?;
    let values = binned
        .values_by_column()
        .iter()
        .map(|column| interpolate_series(column, false))
        .collect();
    binned.with_values(values)
}

/// The single column of `auxiliary` on the dates of `part`.
fn aligned(auxiliary: &Dataset, part: &Dataset) -> Result<Vec<f64>> {
    Ok(auxiliary.reindex(part.index())?.values(0)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use chrono::Datelike;
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_dataset(columns: Vec<(&str, Vec<f64>)>, update: MetadataUpdate) -> Dataset {
        let n = columns[0].1.len();
        let index = Frequency::Monthly
            .grid(ymd(2020, 1, 31), ymd(2030, 1, 1))
            .into_iter()
            .take(n)
            .collect();
        Dataset::from_columns(index, columns)
            .unwrap()
            .with_metadata(&update)
            .unwrap()
    }

    fn local(series_type: SeriesType) -> MetadataUpdate {
        MetadataUpdate::new()
            .area("Uruguay")
            .currency("UYU")
            .inflation_adjustment("-")
            .unit("Millions")
            .series_type(series_type)
            .cumulative_periods(1)
    }

    fn source() -> InMemorySource {
        // average rate 40, end-of-period rate 50
        let fx = monthly_dataset(
            vec![("average", vec![40.0; 24]), ("end", vec![50.0; 24])],
            MetadataUpdate::new(),
        );
        let cpi = monthly_dataset(
            vec![("cpi", (0..24).map(|i| 100.0 + i as f64).collect())],
            MetadataUpdate::new(),
        );
        let gdp = monthly_dataset(
            vec![("uyu", vec![1200.0; 24]), ("usd", vec![30.0; 24])],
            MetadataUpdate::new(),
        );
        InMemorySource::new()
            .with_series("nxr_monthly", fx)
            .with_series("cpi", cpi)
            .with_series("_monthly_interpolated_gdp", gdp)
    }

    #[test]
    fn usd_uses_end_of_period_rate_for_stocks() {
        let ds = monthly_dataset(vec![("debt", vec![500.0; 12])], local(SeriesType::Stock));
        let out = convert_usd(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        assert_relative_eq!(out.values(0).unwrap()[5], 10.0, epsilon = 1e-10);
        assert_eq!(out.descriptor(0).unwrap().currency(), Some("USD"));
        assert_eq!(out.history().last().unwrap().operation(), "convert_usd");
    }

    #[test]
    fn usd_uses_average_rate_for_flows() {
        let ds = monthly_dataset(vec![("exports", vec![400.0; 12])], local(SeriesType::Flow));
        let out = convert_usd(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        assert_relative_eq!(out.values(0).unwrap()[0], 10.0, epsilon = 1e-10);
    }

    #[test]
    fn usd_flow_with_window_averages_the_rate() {
        let fx = monthly_dataset(
            vec![
                ("average", (1..=12).map(|v| v as f64).collect()),
                ("end", vec![1.0; 12]),
            ],
            MetadataUpdate::new(),
        );
        let source = InMemorySource::new().with_series("nxr_monthly", fx);
        let ds = monthly_dataset(
            vec![("exports", vec![6.0; 12])],
            local(SeriesType::Flow).cumulative_periods(3),
        );
        let out = convert_usd(&ds, &source, &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        let values = out.values(0).unwrap();
        assert!(values[1].is_nan());
        // mean of rates 1, 2, 3 is 2
        assert_relative_eq!(values[2], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn already_converted_columns_follow_the_policy() {
        let ds = monthly_dataset(vec![("x", vec![100.0; 6])], local(SeriesType::Stock));
        let usd = ds
            .attach(&MetadataUpdate::new().currency("USD"))
            .unwrap();
        let config = ConversionConfig::default();

        assert!(matches!(
            convert_usd(&usd, &source(), &config, ErrorPolicy::Raise),
            Err(TransformError::NotApplicable { .. })
        ));
        let coerced = convert_usd(&usd, &source(), &config, ErrorPolicy::Coerce).unwrap();
        assert!(coerced.values(0).unwrap().iter().all(|v| v.is_nan()));
        let ignored = convert_usd(&usd, &source(), &config, ErrorPolicy::Ignore).unwrap();
        assert_eq!(ignored.values(0).unwrap(), ds.values(0).unwrap());
        assert_eq!(ignored.descriptor(0).unwrap().currency(), Some("USD"));
    }

    #[test]
    fn source_is_not_queried_when_nothing_converts() {
        let ds = monthly_dataset(vec![("x", vec![1.0; 6])], local(SeriesType::Flow))
            .attach(&MetadataUpdate::new().currency("USD"))
            .unwrap();
        let failing = |name: &str| -> Result<Dataset> {
            Err(TransformError::Source {
                name: name.to_string(),
                message: "offline".to_string(),
            })
        };
        let out =
            convert_usd(&ds, &failing, &ConversionConfig::default(), ErrorPolicy::Ignore).unwrap();
        assert_eq!(out.values(0).unwrap(), &[1.0; 6]);
    }

    #[test]
    fn missing_currency_is_a_metadata_error() {
        let index = Frequency::Monthly.grid(ymd(2020, 1, 31), ymd(2020, 6, 30));
        let ds = Dataset::from_columns(index, vec![("x", vec![1.0; 6])]).unwrap();
        assert!(matches!(
            convert_usd(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Ignore),
            Err(TransformError::MissingMetadata { field: "currency", .. })
        ));
    }

    #[test]
    fn daily_flows_are_summed_to_months() {
        let index = Frequency::Daily.grid(ymd(2020, 1, 1), ymd(2020, 3, 31));
        let n = index.len();
        let ds = Dataset::from_columns(index, vec![("sales", vec![4.0; n])])
            .unwrap()
            .with_metadata(&local(SeriesType::Flow))
            .unwrap();
        let out = convert_usd(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        assert_eq!(out.index(), &[ymd(2020, 1, 31), ymd(2020, 2, 29), ymd(2020, 3, 31)]);
        // January: 31 days of 4, at 40 per dollar
        assert_relative_eq!(out.values(0).unwrap()[0], 3.1, epsilon = 1e-10);
    }

    #[test]
    fn real_without_base_divides_by_cpi() {
        let ds = monthly_dataset(vec![("wages", vec![200.0; 12])], local(SeriesType::Flow));
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            None,
            None,
            ErrorPolicy::Raise,
        )
        .unwrap();
        assert_relative_eq!(out.values(0).unwrap()[0], 2.0, epsilon = 1e-10);
        assert_eq!(
            out.descriptor(0).unwrap().inflation_adjustment(),
            Some("Const.")
        );
    }

    #[test]
    fn real_with_base_month_keeps_that_month_unchanged() {
        let ds = monthly_dataset(vec![("wages", vec![200.0; 12])], local(SeriesType::Flow));
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            Some(ymd(2020, 6, 30)),
            None,
            ErrorPolicy::Raise,
        )
        .unwrap();
        assert_relative_eq!(out.values(0).unwrap()[5], 200.0, epsilon = 1e-10);
        assert_relative_eq!(out.values(0).unwrap()[0], 200.0 / 100.0 * 105.0, epsilon = 1e-10);
        assert_eq!(
            out.descriptor(0).unwrap().inflation_adjustment(),
            Some("Const. 2020-06")
        );
    }

    #[test]
    fn real_with_range_uses_mean_cpi() {
        let ds = monthly_dataset(vec![("wages", vec![100.0; 12])], local(SeriesType::Flow));
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            Some(ymd(2020, 1, 31)),
            Some(ymd(2020, 3, 31)),
            ErrorPolicy::Raise,
        )
        .unwrap();
        // mean CPI over the range is 101
        assert_relative_eq!(out.values(0).unwrap()[1], 100.0, epsilon = 1e-10);
        assert_eq!(
            out.descriptor(0).unwrap().inflation_adjustment(),
            Some("Const. 2020-01_2020-03")
        );
    }

    #[test]
    fn real_range_off_the_index_keeps_only_rows_inside() {
        let ds = monthly_dataset(vec![("wages", vec![100.0; 12])], local(SeriesType::Flow));
        // February 1st is nearest to January 31st, which is outside the range
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            Some(ymd(2020, 2, 1)),
            Some(ymd(2020, 4, 30)),
            ErrorPolicy::Raise,
        )
        .unwrap();
        // mean CPI over February to April is 102, March CPI is 102
        assert_relative_eq!(out.values(0).unwrap()[2], 100.0, epsilon = 1e-10);
        assert_eq!(
            out.descriptor(0).unwrap().inflation_adjustment(),
            Some("Const. 2020-02_2020-04")
        );
    }

    #[test]
    fn daily_stocks_are_averaged_before_deflating() {
        let index = Frequency::Daily.grid(ymd(2020, 1, 1), ymd(2020, 3, 31));
        let values: Vec<f64> = index.iter().map(|d| d.day() as f64).collect();
        let ds = Dataset::from_columns(index, vec![("deposits", values)])
            .unwrap()
            .with_metadata(&local(SeriesType::Stock))
            .unwrap();
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            None,
            None,
            ErrorPolicy::Raise,
        )
        .unwrap();
        assert_eq!(out.index(), &[ymd(2020, 1, 31), ymd(2020, 2, 29), ymd(2020, 3, 31)]);
        let values = out.values(0).unwrap();
        // mean day of January is 16 and CPI is 100; the last value would give 0.31
        assert_relative_eq!(values[0], 0.16, epsilon = 1e-10);
        // February 2020 has 29 days, mean 15, CPI 101
        assert_relative_eq!(values[1], 15.0 / 101.0, epsilon = 1e-10);
    }

    #[test]
    fn real_skips_constant_price_columns() {
        let ds = monthly_dataset(
            vec![("wages", vec![100.0; 6])],
            local(SeriesType::Flow).inflation_adjustment("Const. 2010"),
        );
        let out = convert_real(
            &ds,
            &source(),
            &ConversionConfig::default(),
            None,
            None,
            ErrorPolicy::Ignore,
        )
        .unwrap();
        assert_eq!(out.values(0).unwrap(), &[100.0; 6]);
    }

    #[test]
    fn end_date_without_start_is_rejected() {
        let ds = monthly_dataset(vec![("wages", vec![100.0; 6])], local(SeriesType::Flow));
        assert!(matches!(
            convert_real(
                &ds,
                &source(),
                &ConversionConfig::default(),
                None,
                Some(ymd(2020, 3, 31)),
                ErrorPolicy::Raise,
            ),
            Err(TransformError::InvalidParameter(_))
        ));
    }

    #[test]
    fn gdp_share_of_monthly_flow_uses_annual_sums() {
        let ds = monthly_dataset(vec![("deficit", vec![10.0; 24])], local(SeriesType::Flow));
        let out = convert_gdp(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        let values = out.values(0).unwrap();
        assert!(values[10].is_nan());
        // 120 over 1200
        assert_relative_eq!(values[11], 10.0, epsilon = 1e-10);
        let descriptor = out.descriptor(0).unwrap();
        assert_eq!(descriptor.currency(), Some("% GDP"));
        assert_eq!(descriptor.cumulative_periods(), Some(12));
    }

    #[test]
    fn gdp_share_of_stock_in_dollars_uses_usd_column() {
        let ds = monthly_dataset(
            vec![("reserves", vec![15.0; 12])],
            local(SeriesType::Stock).currency("USD"),
        );
        let out = convert_gdp(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        assert_relative_eq!(out.values(0).unwrap()[0], 50.0, epsilon = 1e-10);
    }

    #[test]
    fn gdp_share_of_quarterly_flow() {
        let index = Frequency::Quarterly.grid(ymd(2020, 3, 31), ymd(2021, 12, 31));
        let ds = Dataset::from_columns(index, vec![("deficit", vec![30.0; 8])])
            .unwrap()
            .with_metadata(&local(SeriesType::Flow))
            .unwrap();
        let out = convert_gdp(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        let values = out.values(0).unwrap();
        assert!(values[2].is_nan());
        assert_relative_eq!(values[3], 10.0, epsilon = 1e-10);
        assert_eq!(out.descriptor(0).unwrap().cumulative_periods(), Some(4));
    }

    #[test]
    fn gdp_share_of_daily_flow_sums_to_months_first() {
        let index = Frequency::Daily.grid(ymd(2021, 1, 1), ymd(2021, 12, 31));
        let n = index.len();
        let ds = Dataset::from_columns(index, vec![("spending", vec![1.2; n])])
            .unwrap()
            .with_metadata(&local(SeriesType::Flow))
            .unwrap();
        let out = convert_gdp(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise)
            .unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(out.index()[11], ymd(2021, 12, 31));
        let values = out.values(0).unwrap();
        assert!(values[10].is_nan());
        // 365 days of 1.2 over 1200
        assert_relative_eq!(values[11], 36.5, epsilon = 1e-9);
        let descriptor = out.descriptor(0).unwrap();
        assert_eq!(descriptor.currency(), Some("% GDP"));
        assert_eq!(descriptor.cumulative_periods(), Some(12));
    }

    #[test]
    fn regional_areas_are_not_convertible() {
        let ds = monthly_dataset(
            vec![("x", vec![1.0; 6])],
            local(SeriesType::Flow).area("Regional"),
        );
        assert!(matches!(
            convert_gdp(&ds, &source(), &ConversionConfig::default(), ErrorPolicy::Raise),
            Err(TransformError::NotApplicable { .. })
        ));
    }

    #[test]
    fn upsampling_fills_months_between_quarters() {
        let index = vec![ymd(2020, 3, 31), ymd(2020, 6, 30)];
        let ds = Dataset::from_columns(index, vec![("gdp", vec![3.0, 6.0])]).unwrap();
        let out = upsample_linear(&ds, Frequency::Monthly).unwrap();
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out.values(0).unwrap()[1], 4.0, epsilon = 1e-10);
    }
}
