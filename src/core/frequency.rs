//! Calendar frequencies, inference from a date index and period arithmetic.
//!
//! Observations are labelled at the **end** of the period they cover
//! (month end, quarter end, December 31st, Sunday for weeks), which is what
//! the resampling engine bins into and what inference expects to see.

use crate::error::{Result, TransformError};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar frequency of a date index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// Year end (December).
    Annual,
    /// Quarter end, December-anchored.
    Quarterly,
    /// Month end.
    Monthly,
    /// Weekly, Sunday-anchored.
    Weekly,
    /// Business days (Monday to Friday).
    BusinessDaily,
    /// Calendar days.
    Daily,
    /// Frequency could not be determined; rendered as `-`.
    #[default]
    Unknown,
}

impl Frequency {
    /// Frequency code as stored in descriptors.
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Annual => "A-DEC",
            Frequency::Quarterly => "Q-DEC",
            Frequency::Monthly => "M",
            Frequency::Weekly => "W",
            Frequency::BusinessDaily => "B",
            Frequency::Daily => "D",
            Frequency::Unknown => "-",
        }
    }

    /// Number of periods in one year.
    ///
    /// Fails with [`TransformError::UnknownFrequency`] for [`Frequency::Unknown`];
    /// callers that auto-select windows or lags must handle it.
    pub fn periods_per_year(&self) -> Result<u32> {
        match self {
            Frequency::Annual => Ok(1),
            Frequency::Quarterly => Ok(4),
            Frequency::Monthly => Ok(12),
            Frequency::Weekly => Ok(52),
            Frequency::BusinessDaily => Ok(260),
            Frequency::Daily => Ok(365),
            Frequency::Unknown => Err(TransformError::UnknownFrequency(self.code().to_string())),
        }
    }

    /// True for frequencies finer than monthly, and for unknown spacing.
    pub fn is_sub_monthly(&self) -> bool {
        matches!(
            self,
            Frequency::Weekly | Frequency::BusinessDaily | Frequency::Daily | Frequency::Unknown
        )
    }

    /// Infer the frequency of a strictly increasing date index.
    ///
    /// Needs at least three observations. Returns [`Frequency::Unknown`] when
    /// the index is too short or no regular spacing is detected.
    pub fn infer(index: &[NaiveDate]) -> Frequency {
        if index.len() < 3 {
            return Frequency::Unknown;
        }

        if index.iter().all(|d| is_month_end(*d)) {
            let steps: Vec<i32> = index
                .windows(2)
                .map(|w| month_ordinal(w[1]) - month_ordinal(w[0]))
                .collect();
            let step = steps[0];
            if steps.iter().any(|&s| s != step) {
                return Frequency::Unknown;
            }
            return match step {
                1 => Frequency::Monthly,
                3 if index.iter().all(|d| d.month() % 3 == 0) => Frequency::Quarterly,
                12 if index.iter().all(|d| d.month() == 12) => Frequency::Annual,
                _ => Frequency::Unknown,
            };
        }

        let day_steps: Vec<i64> = index
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();

        if day_steps.iter().all(|&s| s == 1) {
            return Frequency::Daily;
        }
        if day_steps.iter().all(|&s| s == 7) {
            return Frequency::Weekly;
        }
        let business = index.iter().all(|d| !is_weekend(*d))
            && index.windows(2).all(|w| next_business_day(w[0]) == w[1]);
        if business {
            return Frequency::BusinessDaily;
        }

        Frequency::Unknown
    }

    /// End of the period of this frequency that contains `date`.
    pub fn period_end(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Annual => NaiveDate::from_ymd_opt(date.year(), 12, 31),
            Frequency::Quarterly => {
                let month = (date.month() - 1) / 3 * 3 + 3;
                month_end(date.year(), month)
            }
            Frequency::Monthly => month_end(date.year(), date.month()),
            Frequency::Weekly => {
                let offset = 6 - date.weekday().num_days_from_monday() as i64;
                date.checked_add_signed(Duration::days(offset))
            }
            Frequency::BusinessDaily => match date.weekday() {
                Weekday::Sat => date.pred_opt(),
                Weekday::Sun => date.pred_opt().and_then(|d| d.pred_opt()),
                _ => Some(date),
            },
            Frequency::Daily => Some(date),
            Frequency::Unknown => None,
        }
    }

    /// First calendar day of the period ending at `end`.
    pub fn period_start(&self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Annual => NaiveDate::from_ymd_opt(end.year(), 1, 1),
            Frequency::Quarterly => {
                let month = (end.month() - 1) / 3 * 3 + 1;
                NaiveDate::from_ymd_opt(end.year(), month, 1)
            }
            Frequency::Monthly => NaiveDate::from_ymd_opt(end.year(), end.month(), 1),
            Frequency::Weekly => end.checked_sub_signed(Duration::days(6)),
            Frequency::BusinessDaily | Frequency::Daily => Some(end),
            Frequency::Unknown => None,
        }
    }

    /// Period end following the period end `end`.
    pub fn next_period_end(&self, end: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Annual => NaiveDate::from_ymd_opt(end.year() + 1, 12, 31),
            Frequency::Quarterly => {
                let (year, month) = shift_month(end.year(), end.month(), 3);
                month_end(year, month)
            }
            Frequency::Monthly => {
                let (year, month) = shift_month(end.year(), end.month(), 1);
                month_end(year, month)
            }
            Frequency::Weekly => end.checked_add_signed(Duration::days(7)),
            Frequency::BusinessDaily => Some(next_business_day(end)),
            Frequency::Daily => end.succ_opt(),
            Frequency::Unknown => None,
        }
    }

    /// All period ends from the period containing `first` to the one containing `last`.
    pub fn grid(&self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        let (Some(mut current), Some(stop)) = (self.period_end(first), self.period_end(last))
        else {
            return Vec::new();
        };

        let mut grid = Vec::new();
        while current <= stop {
            grid.push(current);
            match self.next_period_end(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        grid
    }

    /// Number of periods of this frequency whose end falls in `[start, end]`.
    pub fn periods_within(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.grid(start, end)
            .into_iter()
            .filter(|d| *d >= start && *d <= end)
            .count()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" | "A-DEC" | "Y" | "YE" | "YE-DEC" => Ok(Frequency::Annual),
            "Q" | "Q-DEC" | "QE" | "QE-DEC" => Ok(Frequency::Quarterly),
            "M" | "ME" => Ok(Frequency::Monthly),
            "W" | "W-SUN" => Ok(Frequency::Weekly),
            "B" => Ok(Frequency::BusinessDaily),
            "D" => Ok(Frequency::Daily),
            "-" => Ok(Frequency::Unknown),
            _ => Err(TransformError::UnknownFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = TransformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.code().to_string()
    }
}

/// Periods per year for a frequency code such as `"M"` or `"Q-DEC"`.
pub fn periods_per_year(code: &str) -> Result<u32> {
    code.parse::<Frequency>()?.periods_per_year()
}

/// Last calendar day of the given month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

fn shift_month(year: i32, month: u32, by: u32) -> (i32, u32) {
    let zero_based = month - 1 + by;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}

fn month_ordinal(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month() as i32
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_some_and(|next| next.month() != date.month())
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while is_weekend(next) {
        next += Duration::days(1);
    }
    next
}
