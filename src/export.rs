// 📤 Exporter - JSON record array + CSV table
//
// Both formats carry the same columns in the same order:
//   period, revenue, item_count, cost, inventory, profit, profitability
//
// Payloads depend only on the records, so re-exporting the same records
// produces identical bytes. Run-specific data (run id, timestamp, digests)
// lives in a separate manifest file.

use crate::reconcile::ReconciledRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const JSON_FILE: &str = "historical_data.json";
pub const CSV_FILE: &str = "historical_data.csv";
pub const MANIFEST_FILE: &str = "historical_data.manifest.json";

/// Column order shared by both formats
pub const COLUMNS: [&str; 7] = [
    "period",
    "revenue",
    "item_count",
    "cost",
    "inventory",
    "profit",
    "profitability",
];

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Pretty JSON array, one object per record, newline-terminated
pub fn to_json(records: &[ReconciledRecord]) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")?;
    json.push('\n');
    Ok(json)
}

/// CSV with a header row of the column names
pub fn to_csv(records: &[ReconciledRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // Explicit header so an empty record set still yields the columns
    wtr.write_record(COLUMNS)?;

    for r in records {
        wtr.write_record([
            r.period.to_string(),
            r.revenue.to_string(),
            r.item_count.to_string(),
            r.cost.to_string(),
            r.inventory.to_string(),
            r.profit.to_string(),
            r.profitability.to_string(),
        ])?;
    }

    let bytes = wtr.into_inner().context("Failed to flush CSV buffer")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

/// Load an exported JSON array back into records
pub fn read_json(path: &Path) -> Result<Vec<ReconciledRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// FILE OUTPUT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub json_sha256: String,
    pub csv_sha256: String,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: ExportManifest,
}

/// Write the JSON, CSV and manifest files into `dir`
pub fn write_outputs(records: &[ReconciledRecord], dir: &Path) -> Result<ExportOutcome> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let json = to_json(records)?;
    let csv = to_csv(records)?;

    let json_path = dir.join(JSON_FILE);
    let csv_path = dir.join(CSV_FILE);
    let manifest_path = dir.join(MANIFEST_FILE);

    fs::write(&json_path, &json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!(path = %json_path.display(), "saved JSON export");

    fs::write(&csv_path, &csv)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    info!(path = %csv_path.display(), "saved CSV export");

    let manifest = ExportManifest {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        record_count: records.len(),
        json_sha256: sha256_hex(json.as_bytes()),
        csv_sha256: sha256_hex(csv.as_bytes()),
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    fs::write(&manifest_path, manifest_json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(ExportOutcome {
        json_path,
        csv_path,
        manifest_path,
        manifest,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Period;

    fn sample() -> Vec<ReconciledRecord> {
        vec![
            ReconciledRecord::derive(Period::new(2023, 1).unwrap(), 1000.0, 7, 600.0, 0.0),
            ReconciledRecord::derive(Period::new(2023, 2).unwrap(), 0.0, 0, 200.0, 50.5),
        ]
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv(&sample()).unwrap();
        assert_eq!(
            csv,
            "period,revenue,item_count,cost,inventory,profit,profitability\n\
             2023-01,1000,7,600,0,400,40\n\
             2023-02,0,0,200,50.5,-200,0\n"
        );
    }

    #[test]
    fn test_csv_empty_still_has_header() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv, "period,revenue,item_count,cost,inventory,profit,profitability\n");
    }

    #[test]
    fn test_json_fields_and_order() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value[0];
        assert_eq!(first["period"], "2023-01");
        assert_eq!(first["revenue"], 1000.0);
        assert_eq!(first["item_count"], 7);
        assert_eq!(first["profit"], 400.0);
        assert_eq!(first["profitability"], 40.0);
        assert_eq!(value[1]["profit"], -200.0);

        // Keys appear in column order
        let positions: Vec<usize> = COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{}\"", c)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_json_empty_is_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]\n");
    }

    #[test]
    fn test_write_outputs_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let records = sample();

        let first = write_outputs(&records, dir.path()).unwrap();
        let json1 = fs::read(&first.json_path).unwrap();
        let csv1 = fs::read(&first.csv_path).unwrap();

        let second = write_outputs(&records, dir.path()).unwrap();
        let json2 = fs::read(&second.json_path).unwrap();
        let csv2 = fs::read(&second.csv_path).unwrap();

        assert_eq!(json1, json2);
        assert_eq!(csv1, csv2);
        assert_eq!(first.manifest.json_sha256, second.manifest.json_sha256);
        assert_ne!(first.manifest.run_id, second.manifest.run_id);
        assert_eq!(first.manifest.json_sha256, sha256_hex(&json1));
        assert!(second.manifest_path.exists());
    }

    #[test]
    fn test_read_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = write_outputs(&sample(), dir.path()).unwrap();

        let back = read_json(&outcome.json_path).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        assert!(write_outputs(&sample(), &blocker).is_err());
    }
}
