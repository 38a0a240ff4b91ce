// 🚚 Pipeline - fetch → archive → reconcile → export
//
// Per metric, independently: ask the warehouse, and if it answers
// Unavailable substitute the synthetic series. The reconciler never learns
// which source a series came from.

use crate::archive;
use crate::config::PipelineConfig;
use crate::export::{self, ExportOutcome};
use crate::reconcile::{reconcile, ReconciledRecord, ReconciliationSummary};
use crate::series::{FetchOutcome, LookbackWindow, Metric, RawSeries, SeriesFetcher};
use crate::synthetic::SyntheticFetcher;
use crate::warehouse::SqliteWarehouse;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// SOURCE RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesSource {
    Warehouse,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct ResolvedSeries {
    pub series: RawSeries,
    pub source: SeriesSource,
    /// Why the warehouse was not used, when it wasn't
    pub fallback_reason: Option<String>,
}

/// Turn a fetch outcome into a usable series, falling back when needed
pub fn resolve(
    outcome: FetchOutcome,
    fallback: &dyn SeriesFetcher,
    window: &LookbackWindow,
) -> ResolvedSeries {
    match outcome {
        FetchOutcome::Fetched(series) => ResolvedSeries {
            series,
            source: SeriesSource::Warehouse,
            fallback_reason: None,
        },
        FetchOutcome::Unavailable { metric, reason } => {
            warn!(metric = %metric, reason = %reason, "warehouse unavailable, using synthetic series");

            let series = match fallback.fetch(window) {
                FetchOutcome::Fetched(series) => series,
                // Synthetic fetchers always answer; an empty series keeps the run going
                FetchOutcome::Unavailable { .. } => RawSeries::empty(metric),
            };

            ResolvedSeries {
                series,
                source: SeriesSource::Synthetic,
                fallback_reason: Some(reason),
            }
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub sources: Vec<(Metric, SeriesSource)>,
    pub raw_files: Vec<PathBuf>,
    pub records: Vec<ReconciledRecord>,
    pub export: ExportOutcome,
    pub summary: ReconciliationSummary,
}

impl PipelineReport {
    pub fn source_of(&self, metric: Metric) -> Option<SeriesSource> {
        self.sources
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, s)| *s)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One full run for the trailing window ending at `as_of`
    pub fn run(&self, as_of: NaiveDate) -> Result<PipelineReport> {
        info!(brand = %self.config.brand, %as_of, "starting historical extraction");

        let window = LookbackWindow::standard(as_of);
        let warehouse = self.connect();

        let mut resolved = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let outcome = match &warehouse {
                Some(wh) => wh.fetcher(metric).fetch(&window),
                None => FetchOutcome::unavailable(metric, "no warehouse connection"),
            };
            let r = resolve(outcome, &SyntheticFetcher::new(metric), &window);
            info!(metric = %metric, source = ?r.source, points = r.series.len(), "series ready");
            resolved.push(r);
        }

        // Raw archives are written before reconciliation, unmodified
        let mut raw_files = Vec::with_capacity(resolved.len());
        for r in &resolved {
            let path = archive::write_raw(&r.series, &self.config.raw_dir, as_of)?;
            raw_files.push(path);
        }

        let [sales, cost, inventory] = [&resolved[0], &resolved[1], &resolved[2]];
        let records = reconcile(&sales.series.points, &cost.series.points, &inventory.series.points)
            .context("Failed to reconcile series")?;

        let export = export::write_outputs(&records, &self.config.processed_dir)?;
        let summary = ReconciliationSummary::from_records(&records);
        info!("{}", summary.summary());

        Ok(PipelineReport {
            sources: resolved.iter().map(|r| (r.series.metric, r.source)).collect(),
            raw_files,
            records,
            export,
            summary,
        })
    }

    fn connect(&self) -> Option<SqliteWarehouse> {
        let path = self.config.warehouse_path.as_ref()?;
        match SqliteWarehouse::open(path, &self.config.brand) {
            Ok(wh) => {
                info!(path = %path.display(), "warehouse connected");
                Some(wh)
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(%error, "warehouse connection failed, using synthetic data");
                None
            }
        }
    }
}

// ============================================================================
// OFFLINE RECONCILIATION
// ============================================================================

/// Re-run reconciliation from archived raw files
pub fn reconcile_archives(
    sales: &Path,
    cost: &Path,
    inventory: &Path,
    out_dir: &Path,
) -> Result<(ExportOutcome, ReconciliationSummary)> {
    let sales = archive::read_raw(Metric::Sales, sales)?;
    let cost = archive::read_raw(Metric::Cost, cost)?;
    let inventory = archive::read_raw(Metric::Inventory, inventory)?;

    let records = reconcile(&sales.points, &cost.points, &inventory.points)
        .context("Failed to reconcile archived series")?;

    let export = export::write_outputs(&records, out_dir)?;
    let summary = ReconciliationSummary::from_records(&records);
    info!("{}", summary.summary());

    Ok((export, summary))
}

// ============================================================================
// TESTS
// ============================================================================
