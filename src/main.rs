// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brand_history::{
    load_series, reconcile_archives, setup_warehouse, Metric, Pipeline, PipelineConfig,
    SyntheticFetcher,
};

/// Historical sales / cost / inventory extraction for one brand.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory holding raw/ and processed/ (overrides ETL_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// SQLite warehouse file (overrides ETL_WAREHOUSE_PATH)
    #[arg(long, global = true)]
    warehouse: Option<PathBuf>,

    /// Brand to extract (overrides ETL_BRAND)
    #[arg(long, global = true)]
    brand: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, archive, reconcile and export (default).
    Run {
        /// Run date (format: YYYY-MM-DD); defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Reconcile previously archived raw files.
    Reconcile {
        #[arg(long)]
        sales: PathBuf,
        #[arg(long)]
        cost: PathBuf,
        #[arg(long)]
        inventory: PathBuf,
        /// Output directory; defaults to the processed directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create the warehouse schema and load synthetic history into it.
    SeedWarehouse {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Browse the exported records in the terminal.
    #[cfg(feature = "tui")]
    View {
        /// Exported JSON; defaults to the processed historical_data.json.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // View mode owns the terminal, keep log output quiet there
    #[cfg(feature = "tui")]
    let quiet = matches!(cli.command, Some(Commands::View { .. }));
    #[cfg(not(feature = "tui"))]
    let quiet = false;

    init_tracing(quiet);

    if let Err(e) = dispatch(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn dispatch(cli: Cli) -> Result<()> {
    let mut config = PipelineConfig::from_env();
    if let Some(brand) = cli.brand {
        config.brand = brand;
    }
    if let Some(dir) = cli.data_dir {
        let warehouse = config.warehouse_path.take();
        config = PipelineConfig::with_data_dir(&config.brand, dir);
        config.warehouse_path = warehouse;
    }
    if let Some(path) = cli.warehouse {
        config.warehouse_path = Some(path);
    }

    match cli.command {
        None => run(config, None),
        Some(Commands::Run { as_of }) => run(config, as_of),
        Some(Commands::Reconcile {
            sales,
            cost,
            inventory,
            out,
        }) => {
            let out = out.unwrap_or_else(|| config.processed_dir.clone());
            let (export, summary) = reconcile_archives(&sales, &cost, &inventory, &out)?;
            println!("✅ Saved: {}", export.json_path.display());
            println!("✅ Saved: {}", export.csv_path.display());
            println!("   {}", summary.summary());
            Ok(())
        }
        Some(Commands::SeedWarehouse { as_of }) => seed_warehouse(&config, as_of.unwrap_or_else(today)),
        #[cfg(feature = "tui")]
        Some(Commands::View { input }) => {
            let path = input.unwrap_or_else(|| config.processed_dir.join(brand_history::export::JSON_FILE));
            let records = brand_history::read_json(&path)?;
            let mut app = ui::App::new(records, config.brand.clone());
            ui::run_ui(&mut app)
        }
    }
}

fn run(config: PipelineConfig, as_of: Option<NaiveDate>) -> Result<()> {
    let as_of = as_of.unwrap_or_else(today);
    let report = Pipeline::new(config).run(as_of)?;

    println!("\n📊 Processed data summary:");
    if let (Some(first), Some(last)) = (report.summary.first_period, report.summary.last_period) {
        println!("   - Period: {} ~ {}", first, last);
    }
    println!("   - Records: {}", report.summary.record_count);
    for (metric, source) in &report.sources {
        println!("   - {}: {:?}", metric, source);
    }
    println!("✅ Done!");

    Ok(())
}

fn seed_warehouse(config: &PipelineConfig, as_of: NaiveDate) -> Result<()> {
    let Some(path) = config.warehouse_path.as_ref() else {
        bail!("no warehouse path: pass --warehouse or set ETL_WAREHOUSE_PATH");
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open warehouse {}", path.display()))?;
    setup_warehouse(&conn)?;

    for metric in Metric::ALL {
        let series = SyntheticFetcher::new(metric).generate(as_of);
        let rows = load_series(&conn, &config.brand, &series)?;
        info!(metric = %metric, rows, "seeded warehouse");
    }

    println!("✅ Warehouse ready: {}", path.display());
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
