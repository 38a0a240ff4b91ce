// 🏛️ Warehouse - SQL-backed SeriesFetcher
//
// Local SQLite warehouse with one fact table per metric. Each fetch runs a
// grouped-by-month aggregate over the lookback window, filtered by brand.
// Any failure (missing table, bad row, unparseable month, a SUM that
// overflows) becomes FetchOutcome::Unavailable; nothing is raised past this module.

use crate::period::Period;
use crate::series::{FetchOutcome, LookbackWindow, Metric, RawSeries, RawSeriesPoint, SeriesFetcher};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

pub struct SqliteWarehouse {
    conn: Connection,
    brand: String,
}

impl SqliteWarehouse {
    /// Open an existing warehouse file. A missing file is a connection failure.
    pub fn open(path: &Path, brand: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open warehouse {}", path.display()))?;

        Ok(Self::from_connection(conn, brand))
    }

    pub fn from_connection(conn: Connection, brand: &str) -> Self {
        SqliteWarehouse {
            conn,
            brand: brand.to_string(),
        }
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Fetcher view of one metric
    pub fn fetcher(&self, metric: Metric) -> WarehouseFetcher<'_> {
        WarehouseFetcher {
            warehouse: self,
            metric,
        }
    }

    /// Run the monthly aggregate for one metric
    pub fn query_series(&self, metric: Metric, window: &LookbackWindow) -> Result<RawSeries> {
        let sql = monthly_query(metric);
        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare {} query", metric))?;

        // Upper bound is exclusive so timestamps on the last day still match
        let start = window.start.to_string();
        let end = window
            .end
            .succ_opt()
            .context("Lookback window has no following day")?
            .to_string();

        let rows = stmt
            .query_map(params![self.brand, start, end], |row| {
                let period: String = row.get(0)?;
                let value: f64 = row.get(1)?;
                let item_count: Option<i64> = row.get(2)?;
                Ok((period, value, item_count))
            })
            .with_context(|| format!("Failed to run {} query", metric))?;

        let mut points = Vec::new();
        for row in rows {
            let (period_text, value, item_count) =
                row.with_context(|| format!("Failed to read {} row", metric))?;

            let period = Period::parse(&period_text)
                .with_context(|| format!("Bad {} period from warehouse", metric))?;
            if !value.is_finite() {
                anyhow::bail!("{} total for {} is not finite ({})", metric, period, value);
            }

            let mut point = RawSeriesPoint::new(period, value);
            if metric.has_item_count() {
                point = point.with_item_count(item_count.unwrap_or(0).max(0) as u64);
            }
            points.push(point);
        }

        debug!(metric = %metric, points = points.len(), "warehouse query complete");
        Ok(RawSeries::new(metric, points))
    }
}

/// Borrowed per-metric fetcher over a shared warehouse connection
pub struct WarehouseFetcher<'a> {
    warehouse: &'a SqliteWarehouse,
    metric: Metric,
}

impl SeriesFetcher for WarehouseFetcher<'_> {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn fetch(&self, window: &LookbackWindow) -> FetchOutcome {
        match self.warehouse.query_series(self.metric, window) {
            Ok(series) => FetchOutcome::Fetched(series),
            Err(e) => FetchOutcome::unavailable(self.metric, format!("{:#}", e)),
        }
    }
}

fn monthly_query(metric: Metric) -> &'static str {
    match metric {
        Metric::Sales => {
            "SELECT strftime('%Y-%m', sale_date) AS period,
                    SUM(sale_amount) AS revenue,
                    COUNT(DISTINCT item_code) AS item_count
             FROM sales_facts
             WHERE brand = ?1 AND sale_date >= ?2 AND sale_date < ?3
             GROUP BY period
             ORDER BY period"
        }
        Metric::Cost => {
            "SELECT strftime('%Y-%m', cost_date) AS period,
                    SUM(cost_amount) AS cost,
                    NULL
             FROM cost_facts
             WHERE brand = ?1 AND cost_date >= ?2 AND cost_date < ?3
             GROUP BY period
             ORDER BY period"
        }
        Metric::Inventory => {
            "SELECT strftime('%Y-%m', inventory_date) AS period,
                    SUM(inventory_amount) AS inventory,
                    NULL
             FROM inventory_facts
             WHERE brand = ?1 AND inventory_date >= ?2 AND inventory_date < ?3
             GROUP BY period
             ORDER BY period"
        }
    }
}

// ============================================================================
// SCHEMA & LOADING
// ============================================================================

pub fn setup_warehouse(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sales_facts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL,
            sale_date TEXT NOT NULL,
            sale_amount REAL NOT NULL,
            item_code TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cost_facts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL,
            cost_date TEXT NOT NULL,
            cost_amount REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS inventory_facts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL,
            inventory_date TEXT NOT NULL,
            inventory_amount REAL NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sales_brand_date ON sales_facts(brand, sale_date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_cost_brand_date ON cost_facts(brand, cost_date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_inventory_brand_date ON inventory_facts(brand, inventory_date)",
        [],
    )?;

    Ok(())
}

pub fn insert_sale(
    conn: &Connection,
    brand: &str,
    date: NaiveDate,
    amount: f64,
    item_code: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sales_facts (brand, sale_date, sale_amount, item_code) VALUES (?1, ?2, ?3, ?4)",
        params![brand, date.to_string(), amount, item_code],
    )?;
    Ok(())
}

pub fn insert_cost(conn: &Connection, brand: &str, date: NaiveDate, amount: f64) -> Result<()> {
    conn.execute(
        "INSERT INTO cost_facts (brand, cost_date, cost_amount) VALUES (?1, ?2, ?3)",
        params![brand, date.to_string(), amount],
    )?;
    Ok(())
}

pub fn insert_inventory(conn: &Connection, brand: &str, date: NaiveDate, amount: f64) -> Result<()> {
    conn.execute(
        "INSERT INTO inventory_facts (brand, inventory_date, inventory_amount) VALUES (?1, ?2, ?3)",
        params![brand, date.to_string(), amount],
    )?;
    Ok(())
}

fn fact_table(metric: Metric) -> &'static str {
    match metric {
        Metric::Sales => "sales_facts",
        Metric::Cost => "cost_facts",
        Metric::Inventory => "inventory_facts",
    }
}

/// Load monthly series into the fact tables, one row per point dated the
/// last day of its month. Sales points are spread over `item_count` item codes.
///
/// Replaces the brand's existing facts for that metric, so loading the same
/// series twice leaves the warehouse unchanged. Returns the number of fact rows written.
pub fn load_series(conn: &Connection, brand: &str, series: &RawSeries) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    let table = fact_table(series.metric);
    let cleared = tx
        .execute(&format!("DELETE FROM {} WHERE brand = ?1", table), params![brand])
        .with_context(|| format!("Failed to clear {} for {}", table, brand))?;
    debug!(table, cleared, "previous facts removed");

    let mut written = 0;

    for point in &series.points {
        let date = point.period.last_day();
        match series.metric {
            Metric::Sales => {
                let items = point.item_count.unwrap_or(1).max(1);
                let share = point.value / items as f64;
                for item in 0..items {
                    insert_sale(&tx, brand, date, share, &format!("ITEM-{:05}", item))?;
                    written += 1;
                }
            }
            Metric::Cost => {
                insert_cost(&tx, brand, date, point.value)?;
                written += 1;
            }
            Metric::Inventory => {
                insert_inventory(&tx, brand, date, point.value)?;
                written += 1;
            }
        }
    }

    tx.commit()?;
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================
