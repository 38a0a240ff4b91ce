// Brand History ETL - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod period;
pub mod series;
pub mod synthetic;
pub mod warehouse;
pub mod reconcile;
pub mod export;
pub mod archive;
pub mod config;
pub mod pipeline;
pub mod simulation;

// Re-export commonly used types
pub use period::{Period, PeriodError};
pub use series::{
    FetchOutcome, LookbackWindow, Metric, RawSeries, RawSeriesPoint, SeriesFetcher,
    LOOKBACK_YEARS,
};
pub use synthetic::SyntheticFetcher;
pub use warehouse::{setup_warehouse, load_series, SqliteWarehouse, WarehouseFetcher};
pub use reconcile::{
    reconcile, profitability, ReconcileError, ReconciledRecord, ReconciliationSummary,
};
pub use export::{read_json, to_csv, to_json, write_outputs, ExportManifest, ExportOutcome};
pub use archive::{read_raw, write_raw};
pub use config::PipelineConfig;
pub use pipeline::{reconcile_archives, resolve, Pipeline, PipelineReport, SeriesSource};
pub use simulation::{
    simulate, MetricAssumption, ProjectedPoint, Scenario, SimulationError, SimulationInput,
    SimulationResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
