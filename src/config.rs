// ⚙️ Configuration - Explicit settings passed into the pipeline
//
// Nothing reads the environment after startup: main builds a PipelineConfig
// (from .env / environment, then CLI overrides) and hands it down.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BRAND: &str = "SERGIO TACCHINI";
pub const DEFAULT_DATA_DIR: &str = "public/data";

pub const ENV_BRAND: &str = "ETL_BRAND";
pub const ENV_DATA_DIR: &str = "ETL_DATA_DIR";
pub const ENV_WAREHOUSE_PATH: &str = "ETL_WAREHOUSE_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Brand every warehouse query filters on
    pub brand: String,

    /// Where raw per-metric archives go
    pub raw_dir: PathBuf,

    /// Where the reconciled JSON/CSV go
    pub processed_dir: PathBuf,

    /// SQLite warehouse file; None means synthetic data for every metric
    pub warehouse_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Lay out raw/ and processed/ under one data directory
    pub fn with_data_dir(brand: &str, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        PipelineConfig {
            brand: brand.to_string(),
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
            warehouse_path: None,
        }
    }

    /// Builder pattern: use a warehouse file
    pub fn with_warehouse(mut self, path: impl Into<PathBuf>) -> Self {
        self.warehouse_path = Some(path.into());
        self
    }

    /// Read `.env` (if present) and the process environment
    pub fn from_env() -> Self {
        // A missing .env file is normal outside development
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let brand = get(ENV_BRAND).unwrap_or_else(|| DEFAULT_BRAND.to_string());
        let data_dir = get(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let mut config = PipelineConfig::with_data_dir(&brand, data_dir);
        config.warehouse_path = get(ENV_WAREHOUSE_PATH).map(PathBuf::from);
        config
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::with_data_dir(DEFAULT_BRAND, DEFAULT_DATA_DIR)
    }
}

// ============================================================================
// TESTS
// ============================================================================
