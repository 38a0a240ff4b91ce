// 📈 Raw Series - What a fetcher hands to the reconciler
//
// One RawSeries per metric. Fetchers never raise: a failed fetch comes back
// as FetchOutcome::Unavailable and the orchestrator decides what to do.

use crate::period::Period;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed trailing history window
pub const LOOKBACK_YEARS: u32 = 3;

// ============================================================================
// METRIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Sales,
    Cost,
    Inventory,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Sales, Metric::Cost, Metric::Inventory];

    /// Short code used in file names and logs
    pub fn code(&self) -> &'static str {
        match self {
            Metric::Sales => "sales",
            Metric::Cost => "cost",
            Metric::Inventory => "inventory",
        }
    }

    /// Column header for the metric's value in raw archives
    pub fn value_column(&self) -> &'static str {
        match self {
            Metric::Sales => "revenue",
            Metric::Cost => "cost",
            Metric::Inventory => "inventory",
        }
    }

    /// Only sales carries a secondary item count
    pub fn has_item_count(&self) -> bool {
        matches!(self, Metric::Sales)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// RAW POINTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint {
    pub period: Period,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
}

impl RawSeriesPoint {
    pub fn new(period: Period, value: f64) -> Self {
        RawSeriesPoint {
            period,
            value,
            item_count: None,
        }
    }

    /// Builder pattern: attach the sales item count
    pub fn with_item_count(mut self, item_count: u64) -> Self {
        self.item_count = Some(item_count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub metric: Metric,
    pub points: Vec<RawSeriesPoint>,
}

impl RawSeries {
    pub fn new(metric: Metric, points: Vec<RawSeriesPoint>) -> Self {
        RawSeries { metric, points }
    }

    pub fn empty(metric: Metric) -> Self {
        RawSeries::new(metric, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.points.first().map(|p| p.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.points.last().map(|p| p.period)
    }
}

// ============================================================================
// LOOKBACK WINDOW
// ============================================================================

/// Inclusive date range a fetcher must cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// Trailing window ending at `as_of`, `years` back
    pub fn trailing_years(as_of: NaiveDate, years: u32) -> Self {
        let start = as_of
            .checked_sub_months(Months::new(years * 12))
            .unwrap_or(NaiveDate::MIN);
        LookbackWindow { start, end: as_of }
    }

    /// The standard three-year window
    pub fn standard(as_of: NaiveDate) -> Self {
        LookbackWindow::trailing_years(as_of, LOOKBACK_YEARS)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

// ============================================================================
// FETCHING
// ============================================================================

/// Result of asking a source for one metric
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(RawSeries),
    Unavailable { metric: Metric, reason: String },
}

impl FetchOutcome {
    pub fn unavailable(metric: Metric, reason: impl Into<String>) -> Self {
        FetchOutcome::Unavailable {
            metric,
            reason: reason.into(),
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchOutcome::Fetched(_))
    }
}

/// Producer of one metric's monthly series
///
/// Implementations return points ascending by period with no duplicates and
/// never panic or raise; failures are reported as `FetchOutcome::Unavailable`.
pub trait SeriesFetcher {
    fn metric(&self) -> Metric;

    fn fetch(&self, window: &LookbackWindow) -> FetchOutcome;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_codes() {
        assert_eq!(Metric::Sales.code(), "sales");
        assert_eq!(Metric::Cost.to_string(), "cost");
        assert_eq!(Metric::Inventory.value_column(), "inventory");
        assert!(Metric::Sales.has_item_count());
        assert!(!Metric::Cost.has_item_count());
    }

    #[test]
    fn test_trailing_window() {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let window = LookbackWindow::standard(as_of);

        assert_eq!(window.start, NaiveDate::from_ymd_opt(2023, 10, 16).unwrap());
        assert_eq!(window.end, as_of);
        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2023, 10, 15).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
    }

    #[test]
    fn test_trailing_window_leap_day() {
        let as_of = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let window = LookbackWindow::trailing_years(as_of, 3);
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
    }

    #[test]
    fn test_series_bounds() {
        let jan = Period::new(2023, 1).unwrap();
        let mar = Period::new(2023, 3).unwrap();
        let series = RawSeries::new(
            Metric::Cost,
            vec![RawSeriesPoint::new(jan, 1.0), RawSeriesPoint::new(mar, 2.0)],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.first_period(), Some(jan));
        assert_eq!(series.last_period(), Some(mar));
        assert!(RawSeries::empty(Metric::Sales).is_empty());
    }
}
