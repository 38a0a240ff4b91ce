// 📅 Period - Calendar month alignment key
//
// Every metric is keyed by a Period. Two periods are equal iff year and month
// match, and they order chronologically. Rendered externally as "YYYY-MM",
// so the year is confined to 0000..=9999.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("month {month} out of range for year {year}")]
    MonthOutOfRange { year: i32, month: u32 },

    #[error("year {0} does not fit in four digits")]
    YearOutOfRange(i32),

    #[error("cannot truncate {0:?} to a calendar month")]
    Malformed(String),
}

// ============================================================================
// PERIOD
// ============================================================================

/// Calendar month. Field order gives (year, month) ordering for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub const MIN: Period = Period { year: 0, month: 1 };
    pub const MAX: Period = Period { year: 9999, month: 12 };

    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(0..=9999).contains(&year) {
            return Err(PeriodError::YearOutOfRange(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PeriodError::MonthOutOfRange { year, month });
        }
        Ok(Period { year, month })
    }

    /// Truncate a date to its month
    pub fn from_date(date: NaiveDate) -> Result<Self, PeriodError> {
        Period::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Shift by a signed number of months, saturating at MIN and MAX
    pub fn offset(&self, months: i32) -> Self {
        let index = (self.index() + i64::from(months)).clamp(Period::MIN.index(), Period::MAX.index());
        Period {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    fn index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    pub fn succ(&self) -> Self {
        self.offset(1)
    }

    pub fn pred(&self) -> Self {
        self.offset(-1)
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month
    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Parse any warehouse/archive date rendering and truncate it to the month.
    ///
    /// Accepts "YYYY-MM", "YYYY-MM-DD", "YYYY-MM-DD HH:MM:SS" and RFC 3339.
    pub fn parse(text: &str) -> Result<Self, PeriodError> {
        let text = text.trim();
        let malformed = || PeriodError::Malformed(text.to_string());

        // chrono's %Y takes a sign, a bare year never does
        if !text.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(malformed());
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Period::from_date(date);
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
            return Period::from_date(ts.date());
        }
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(text) {
            return Period::from_date(ts.date_naive());
        }

        // "YYYY-MM" exactly, digits only
        let (year, month) = text.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;

        Period::new(year, month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s)
    }
}

impl TryFrom<NaiveDate> for Period {
    type Error = PeriodError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Period::from_date(date)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Period::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// TESTS
// ============================================================================
