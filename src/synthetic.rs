// 🧪 Synthetic Fallback - Deterministic placeholder history
//
// Used when the warehouse cannot produce a metric. Same shape as a real
// series: 36 monthly points, ascending, ending at the last completed month.

use crate::period::Period;
use crate::series::{FetchOutcome, LookbackWindow, Metric, RawSeries, RawSeriesPoint, SeriesFetcher};
use chrono::{Datelike, NaiveDate};

/// Number of months generated per series
pub const SYNTHETIC_MONTHS: u32 = 36;

pub struct SyntheticFetcher {
    metric: Metric,
}

impl SyntheticFetcher {
    pub fn new(metric: Metric) -> Self {
        SyntheticFetcher { metric }
    }

    /// Generate the series ending at the last month-end on or before `as_of`
    pub fn generate(&self, as_of: NaiveDate) -> RawSeries {
        let last = last_complete_month(as_of);
        let first = last.offset(-(SYNTHETIC_MONTHS as i32 - 1));

        let points = (0..SYNTHETIC_MONTHS as u64)
            .map(|i| {
                let period = first.offset(i as i32);
                let cycle = (i % 12) as f64;
                let i_f = i as f64;

                match self.metric {
                    Metric::Sales => {
                        RawSeriesPoint::new(period, 1_000_000.0 + i_f * 50_000.0 + cycle * 20_000.0)
                            .with_item_count(100 + i * 2)
                    }
                    Metric::Cost => {
                        RawSeriesPoint::new(period, 600_000.0 + i_f * 30_000.0 + cycle * 10_000.0)
                    }
                    Metric::Inventory => {
                        RawSeriesPoint::new(period, 500_000.0 + i_f * 20_000.0 + cycle * 5_000.0)
                    }
                }
            })
            .collect();

        RawSeries::new(self.metric, points)
    }
}

impl SeriesFetcher for SyntheticFetcher {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn fetch(&self, window: &LookbackWindow) -> FetchOutcome {
        FetchOutcome::Fetched(self.generate(window.end))
    }
}

/// Month-end frequency: a month counts once its last day has been reached
fn last_complete_month(as_of: NaiveDate) -> Period {
    // Run dates outside 0000..=9999 pin to the nearest representable month
    let current = Period::from_date(as_of).unwrap_or(if as_of.year() < 0 { Period::MIN } else { Period::MAX });
    if as_of == current.last_day() {
        current
    } else {
        current.pred()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sales_series_shape() {
        let series = SyntheticFetcher::new(Metric::Sales).generate(date(2026, 10, 16));

        assert_eq!(series.metric, Metric::Sales);
        assert_eq!(series.len(), 36);
        assert_eq!(series.first_period(), Some(Period::new(2023, 10).unwrap()));
        assert_eq!(series.last_period(), Some(Period::new(2026, 9).unwrap()));

        assert_eq!(series.points[0].value, 1_000_000.0);
        assert_eq!(series.points[0].item_count, Some(100));
        // i = 13: 1_000_000 + 13 * 50_000 + 1 * 20_000
        assert_eq!(series.points[13].value, 1_670_000.0);
        assert_eq!(series.points[13].item_count, Some(126));
    }

    #[test]
    fn test_cost_and_inventory_formulas() {
        let as_of = date(2026, 10, 16);
        let cost = SyntheticFetcher::new(Metric::Cost).generate(as_of);
        let inventory = SyntheticFetcher::new(Metric::Inventory).generate(as_of);

        // i = 11
        assert_eq!(cost.points[11].value, 600_000.0 + 330_000.0 + 110_000.0);
        assert_eq!(inventory.points[11].value, 500_000.0 + 220_000.0 + 55_000.0);
        assert!(cost.points.iter().all(|p| p.item_count.is_none()));
    }

    #[test]
    fn test_month_end_includes_current_month() {
        let series = SyntheticFetcher::new(Metric::Cost).generate(date(2026, 9, 30));
        assert_eq!(series.last_period(), Some(Period::new(2026, 9).unwrap()));

        let series = SyntheticFetcher::new(Metric::Cost).generate(date(2026, 9, 29));
        assert_eq!(series.last_period(), Some(Period::new(2026, 8).unwrap()));
    }

    #[test]
    fn test_periods_strictly_ascending() {
        let series = SyntheticFetcher::new(Metric::Inventory).generate(date(2025, 1, 5));
        assert!(series.points.windows(2).all(|w| w[0].period < w[1].period));
    }

    #[test]
    fn test_fetch_always_succeeds() {
        let fetcher = SyntheticFetcher::new(Metric::Sales);
        let window = LookbackWindow::standard(date(2026, 10, 16));

        match fetcher.fetch(&window) {
            FetchOutcome::Fetched(series) => assert_eq!(series.len(), 36),
            other => panic!("expected Fetched, got {:?}", other),
        }
    }
}
