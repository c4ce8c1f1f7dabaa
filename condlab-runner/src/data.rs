//! Candle loading from CSV and JSON files.
//!
//! CSV files need a header with `timestamp,open,high,low,close` and an
//! optional `volume` column. Timestamps may be epoch milliseconds, RFC 3339,
//! `YYYY-MM-DD HH:MM:SS` (UTC) or a bare `YYYY-MM-DD` date.
//!
//! JSON files hold an array of candle objects or an array of
//! `[timestamp, open, high, low, close, volume?]` rows.
//!
//! Loaded histories are validated: at least one candle, timestamps strictly
//! increasing.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use condlab_core::domain::Candle;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: unreadable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: expected at least 5 values, found {found}")]
    ShortRow { row: usize, found: usize },

    #[error("cannot infer candle format from '{0}' (use .csv or .json)")]
    UnknownFormat(PathBuf),

    #[error("no candles loaded")]
    Empty,

    #[error("candle {index} at {timestamp} is not after the previous candle at {previous}")]
    OutOfOrder { index: usize, previous: i64, timestamp: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleFormat {
    Csv,
    Json,
}

impl CandleFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(CandleFormat::Csv),
            "json" => Some(CandleFormat::Json),
            _ => None,
        }
    }
}

/// Options controlling how candles are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Overrides extension-based detection.
    pub format: Option<CandleFormat>,
    /// Keep only the most recent `limit` candles.
    pub limit: Option<usize>,
}

/// Load, validate and trim a candle file.
pub fn load_candles(path: &Path, opts: &LoadOptions) -> Result<Vec<Candle>, LoadError> {
    let format = opts
        .format
        .or_else(|| CandleFormat::from_path(path))
        .ok_or_else(|| LoadError::UnknownFormat(path.to_path_buf()))?;
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut candles = match format {
        CandleFormat::Csv => read_candles_csv(file)?,
        CandleFormat::Json => read_candles_json(file)?,
    };
    validate_order(&candles)?;
    if let Some(limit) = opts.limit {
        let excess = candles.len().saturating_sub(limit);
        candles.drain(..excess);
    }
    info!(path = %path.display(), ?format, count = candles.len(), "candles loaded");
    Ok(candles)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse CSV candles from any reader.
pub fn read_candles_csv<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();
    for (row, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: record.timestamp.clone(),
        })?;
        candles.push(Candle {
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume.unwrap_or(0.0),
        });
    }
    debug!(count = candles.len(), "csv candles parsed");
    Ok(candles)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonCandle {
    Object(Candle),
    Row(Vec<f64>),
}

/// Parse JSON candles from any reader.
pub fn read_candles_json<R: Read>(reader: R) -> Result<Vec<Candle>, LoadError> {
    let items: Vec<JsonCandle> = serde_json::from_reader(reader)?;
    items
        .into_iter()
        .enumerate()
        .map(|(row, item)| match item {
            JsonCandle::Object(candle) => Ok(candle),
            JsonCandle::Row(values) if values.len() < 5 => Err(LoadError::ShortRow {
                row,
                found: values.len(),
            }),
            JsonCandle::Row(values) => Ok(Candle {
                timestamp: values[0] as i64,
                open: values[1],
                high: values[2],
                low: values[3],
                close: values[4],
                volume: values.get(5).copied().unwrap_or(0.0),
            }),
        })
        .collect()
}

/// Epoch milliseconds from the accepted timestamp spellings.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Require a non-empty, strictly increasing history.
pub fn validate_order(candles: &[Candle]) -> Result<(), LoadError> {
    if candles.is_empty() {
        return Err(LoadError::Empty);
    }
    for (index, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(LoadError::OutOfOrder {
                index: index + 1,
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// BLAKE3 hash over every candle field, for run provenance.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.to_le_bytes());
        for v in [c.open, c.high, c.low, c.close, c.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_mixed_timestamp_styles() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   1700000000000,1,2,0.5,1.5,10\n\
                   2023-11-14T22:14:00Z,1.5,2,1,1.8,\n\
                   2023-11-15 00:00:00,1.8,2.2,1.7,2.0,5\n";
        let candles = read_candles_csv(csv.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[1].timestamp, 1_700_000_040_000);
        assert_eq!(candles[1].volume, 0.0);
        assert_eq!(candles[2].timestamp, 1_700_006_400_000);
    }

    #[test]
    fn csv_without_volume_column() {
        let csv = "timestamp,open,high,low,close\n2024-01-02,10,11,9,10.5\n";
        let candles = read_candles_csv(csv.as_bytes()).unwrap();
        assert_eq!(candles[0].timestamp, 1_704_153_600_000);
        assert_eq!(candles[0].close, 10.5);
    }

    #[test]
    fn csv_bad_timestamp_names_the_row() {
        let csv = "timestamp,open,high,low,close\n1,1,1,1,1\nyesterday,1,1,1,1\n";
        match read_candles_csv(csv.as_bytes()) {
            Err(LoadError::Timestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn json_objects_and_rows() {
        let objects = r#"[{"timestamp":1,"open":1,"high":2,"low":0.5,"close":1.5,"volume":3}]"#;
        assert_eq!(read_candles_json(objects.as_bytes()).unwrap()[0].volume, 3.0);

        let rows = "[[1, 1, 2, 0.5, 1.5], [2, 1.5, 2, 1, 1.8, 7]]";
        let candles = read_candles_json(rows.as_bytes()).unwrap();
        assert_eq!(candles[1].timestamp, 2);
        assert_eq!(candles[1].volume, 7.0);

        assert!(matches!(
            read_candles_json("[[1, 2, 3]]".as_bytes()),
            Err(LoadError::ShortRow { row: 0, found: 3 })
        ));
    }

    #[test]
    fn order_validation() {
        let c = |timestamp| Candle {
            timestamp,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 0.0,
        };
        assert!(matches!(validate_order(&[]), Err(LoadError::Empty)));
        assert!(validate_order(&[c(1), c(2), c(3)]).is_ok());
        assert!(matches!(
            validate_order(&[c(1), c(3), c(3)]),
            Err(LoadError::OutOfOrder { index: 2, .. })
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(CandleFormat::from_path(Path::new("a/b.CSV")), Some(CandleFormat::Csv));
        assert_eq!(CandleFormat::from_path(Path::new("b.json")), Some(CandleFormat::Json));
        assert_eq!(CandleFormat::from_path(Path::new("b.parquet")), None);
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = read_candles_json("[[1, 1, 2, 0.5, 1.5]]".as_bytes()).unwrap();
        let b = read_candles_json("[[1, 1, 2, 0.5, 1.6]]".as_bytes()).unwrap();
        assert_eq!(dataset_hash(&a), dataset_hash(&a.clone()));
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
    }
}
