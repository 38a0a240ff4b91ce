// 🗄️ Raw Archive - Persist each fetched series unmodified
//
// One CSV per metric per run: {metric}_raw_{YYYYMMDD}.csv
// Columns: period, <metric value column>[, item_count]

use crate::period::Period;
use crate::series::{Metric, RawSeries, RawSeriesPoint};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Archive file name for a metric on a run date
pub fn raw_file_name(metric: Metric, run_date: NaiveDate) -> String {
    format!("{}_raw_{}.csv", metric.code(), run_date.format("%Y%m%d"))
}

/// Write one raw series into `dir`, returning the file path
pub fn write_raw(series: &RawSeries, dir: &Path, run_date: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create raw data directory {}", dir.display()))?;

    let path = dir.join(raw_file_name(series.metric, run_date));
    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let with_count = series.metric.has_item_count();

    if with_count {
        wtr.write_record(["period", series.metric.value_column(), "item_count"])?;
    } else {
        wtr.write_record(["period", series.metric.value_column()])?;
    }

    for point in &series.points {
        let period = point.period.to_string();
        let value = point.value.to_string();
        if with_count {
            let count = point.item_count.map(|c| c.to_string()).unwrap_or_default();
            wtr.write_record([period, value, count])?;
        } else {
            wtr.write_record([period, value])?;
        }
    }

    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Read an archived raw series back
///
/// Period text goes through `Period::parse`, so any date rendering that
/// truncates to a month is accepted and anything else fails with the line.
pub fn read_raw(metric: Metric, path: &Path) -> Result<RawSeries> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open raw file {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    if headers.get(0).map(|h| h.trim().to_lowercase()) != Some("period".to_string()) {
        bail!("{}: first column must be 'period'", path.display());
    }
    if headers.len() < 2 {
        bail!("{}: missing value column", path.display());
    }

    let mut points = Vec::new();

    for (index, record) in rdr.records().enumerate() {
        let line = index + 2;
        let record = record.with_context(|| format!("{}:{}: unreadable row", path.display(), line))?;

        let period_text = record.get(0).unwrap_or_default();
        let period = Period::parse(period_text)
            .with_context(|| format!("{}:{}: bad period", path.display(), line))?;

        let value: f64 = record
            .get(1)
            .unwrap_or_default()
            .trim()
            .parse()
            .with_context(|| format!("{}:{}: bad value", path.display(), line))?;

        let mut point = RawSeriesPoint::new(period, value);

        if metric.has_item_count() {
            if let Some(text) = record.get(2).map(str::trim).filter(|t| !t.is_empty()) {
                let count: u64 = text
                    .parse()
                    .with_context(|| format!("{}:{}: bad item_count", path.display(), line))?;
                point = point.with_item_count(count);
            }
        }

        points.push(point);
    }

    Ok(RawSeries::new(metric, points))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(year: i32, month: u32) -> Period {
        Period::new(year, month).unwrap()
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(raw_file_name(Metric::Sales, date), "sales_raw_20261016.csv");
        assert_eq!(raw_file_name(Metric::Inventory, date), "inventory_raw_20261016.csv");
    }

    #[test]
    fn test_write_then_read_sales() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let series = RawSeries::new(
            Metric::Sales,
            vec![
                RawSeriesPoint::new(p(2023, 1), 1000.5).with_item_count(12),
                RawSeriesPoint::new(p(2023, 2), 0.0).with_item_count(0),
            ],
        );

        let path = write_raw(&series, &dir.path().join("raw"), date).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "period,revenue,item_count\n2023-01,1000.5,12\n2023-02,0,0\n");

        let back = read_raw(Metric::Sales, &path).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_cost_has_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let series = RawSeries::new(Metric::Cost, vec![RawSeriesPoint::new(p(2025, 12), 600.0)]);

        let path = write_raw(&series, dir.path(), date).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "period,cost\n2025-12,600\n");
    }

    #[test]
    fn test_read_accepts_full_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        fs::write(&path, "PERIOD,INVENTORY\n2023-01-31,500000\n2023-02-28 00:00:00,520000\n").unwrap();

        let series = read_raw(Metric::Inventory, &path).unwrap();
        assert_eq!(series.points[0].period, p(2023, 1));
        assert_eq!(series.points[1].value, 520000.0);
    }

    #[test]
    fn test_read_rejects_malformed_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cost.csv");
        fs::write(&path, "period,cost\n2023-01,1\nlast month,2\n").unwrap();

        let err = read_raw(Metric::Cost, &path).unwrap_err();
        assert!(format!("{:#}", err).contains(":3: bad period"));
    }
}
