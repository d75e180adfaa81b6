//! Historical trade dataset loading.
//!
//! Two sources:
//! 1. A CSV file with header `origin,destination,hs_code,trade_value,transport_cost,lead_time,year`
//! 2. A deterministic synthetic dataset over major economies (tagged)
//!
//! Rows with non-finite or negative numeric fields are skipped and counted,
//! so the graph build only ever sees valid rows.
//!
//! Synthetic data is a developer-only mode. Predictions built on it are
//! tagged `has_synthetic` and carry no real-world meaning.

use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use tariffcast_core::domain::{dataset_hash, DatasetHash, TradeRecord};
use tariffcast_core::rng::RngHierarchy;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open trade dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row {row} in {path}: {source}")]
    Row {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("trade dataset {path} has no valid rows ({skipped} skipped)")]
    NoValidRows { path: PathBuf, skipped: usize },
}

/// Rows plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedTradeData {
    pub records: Vec<TradeRecord>,
    /// BLAKE3 over the kept rows, in order.
    pub dataset_hash: DatasetHash,
    /// Rows dropped for invalid numeric fields.
    pub skipped_rows: usize,
    pub has_synthetic: bool,
}

impl LoadedTradeData {
    fn new(records: Vec<TradeRecord>, skipped_rows: usize, has_synthetic: bool) -> Self {
        Self {
            dataset_hash: dataset_hash(&records),
            records,
            skipped_rows,
            has_synthetic,
        }
    }
}

/// Load and validate a CSV trade dataset.
pub fn load_trade_records(path: impl AsRef<Path>) -> Result<LoadedTradeData, LoadError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (i, row) in reader.deserialize::<TradeRecord>().enumerate() {
        let record = row.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            row: i + 1,
            source,
        })?;
        if record.is_valid() {
            records.push(record);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped invalid trade rows");
    }
    if records.is_empty() {
        return Err(LoadError::NoValidRows {
            path: path.to_path_buf(),
            skipped,
        });
    }

    let loaded = LoadedTradeData::new(records, skipped, false);
    info!(
        path = %path.display(),
        rows = loaded.records.len(),
        hash = %loaded.dataset_hash,
        "trade dataset loaded"
    );
    Ok(loaded)
}

/// Economies in the synthetic dataset, with a rough size weight.
const SYNTHETIC_ECONOMIES: &[(&str, f64)] = &[
    ("United States", 1.0),
    ("China", 0.95),
    ("Germany", 0.6),
    ("Japan", 0.5),
    ("Mexico", 0.4),
    ("Canada", 0.4),
    ("South Korea", 0.35),
    ("Vietnam", 0.25),
    ("India", 0.3),
    ("United Kingdom", 0.35),
];

const SYNTHETIC_HS_CODES: &[&str] = &["8517", "8471", "8542", "8703", "7208", "1201", "3004", "6109"];

/// Deterministic synthetic dataset: every ordered pair of economies trades
/// a few HS codes each year.
pub fn synthetic_trade_records(seed: u64, years: std::ops::RangeInclusive<i32>) -> LoadedTradeData {
    warn!("generating synthetic trade data, results will be tagged as synthetic");
    let mut rng = RngHierarchy::new(seed).rng_for("synthetic_trade_records", 0);

    let mut records = Vec::new();
    for year in years {
        for (origin, wo) in SYNTHETIC_ECONOMIES {
            for (destination, wd) in SYNTHETIC_ECONOMIES {
                if origin == destination {
                    continue;
                }
                for hs in SYNTHETIC_HS_CODES {
                    if rng.gen_bool(0.5) {
                        continue;
                    }
                    records.push(TradeRecord {
                        origin: origin.to_string(),
                        destination: destination.to_string(),
                        hs_code: hs.to_string(),
                        trade_value: wo * wd * rng.gen_range(1e8..5e9),
                        transport_cost: rng.gen_range(0.02..0.15),
                        lead_time: rng.gen_range(5.0..45.0),
                        year,
                    });
                }
            }
        }
    }
    LoadedTradeData::new(records, 0, true)
}
