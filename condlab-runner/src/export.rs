//! Replay report export: JSON and CSV.
//!
//! - **JSON**: the full report, round-trippable, with `schemaVersion`
//! - **CSV**: one row per evaluated bar for spreadsheets and plotting
//!
//! Unknown schema versions are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::replay::{ReplayReport, SCHEMA_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &ReplayReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize replay report to JSON")
}

/// Deserialize a report, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<ReplayReport> {
    let report: ReplayReport = serde_json::from_str(json).context("failed to deserialize replay report")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: index, timestamp, datetime, result, passed_ids, intent_count,
/// intent_ids. Id lists are `;`-separated.
pub fn export_csv(report: &ReplayReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "index",
        "timestamp",
        "datetime",
        "result",
        "passed_ids",
        "intent_count",
        "intent_ids",
    ])?;
    for r in &report.records {
        let datetime = DateTime::from_timestamp_millis(r.timestamp)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let intent_ids: Vec<&str> = r.intents.iter().map(|i| i.id.as_str()).collect();
        wtr.write_record([
            r.index.to_string(),
            r.timestamp.to_string(),
            datetime,
            r.result.to_string(),
            r.passed_ids.join(";"),
            r.intents.len().to_string(),
            intent_ids.join(";"),
        ])?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

// ─── File output ────────────────────────────────────────────────────

/// Write a report to `path`, creating parent directories. The format is
/// taken from `format` or else the file extension.
pub fn write_report(report: &ReplayReport, path: &Path, format: Option<OutputFormat>) -> Result<()> {
    let Some(format) = format.or_else(|| OutputFormat::from_path(path)) else {
        bail!("cannot infer output format from '{}' (use .csv or .json)", path.display());
    };
    let body = match format {
        OutputFormat::Csv => export_csv(report)?,
        OutputFormat::Json => export_json(report)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), ?format, records = report.records.len(), "replay report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplayRecord;
    use condlab_core::fingerprint::TreeFingerprint;

    fn report() -> ReplayReport {
        ReplayReport {
            schema_version: SCHEMA_VERSION,
            fingerprint: TreeFingerprint("ab".repeat(32)),
            lookback: 50,
            start: 1,
            bars: 3,
            records: vec![
                ReplayRecord {
                    index: 1,
                    timestamp: 1_700_000_000_000,
                    result: true,
                    passed_ids: vec!["c".into(), "root".into()],
                    intents: Vec::new(),
                },
                ReplayRecord {
                    index: 2,
                    timestamp: 1_700_000_060_000,
                    result: false,
                    passed_ids: Vec::new(),
                    intents: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn json_round_trip() {
        let original = report();
        let json = export_json(&original).unwrap();
        assert!(json.contains("\"schemaVersion\": 1"));
        assert!(json.contains("\"passedIds\""));
        assert_eq!(import_json(&json).unwrap(), original);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut newer = report();
        newer.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&newer).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn csv_rows() {
        let csv = export_csv(&report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "index,timestamp,datetime,result,passed_ids,intent_count,intent_ids");
        assert_eq!(lines[1], "1,1700000000000,2023-11-14T22:13:20+00:00,true,c;root,0,");
        assert!(lines[2].starts_with("2,1700000060000,"));
        assert!(lines[2].contains(",false,,0,"));
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out/r.json")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path(Path::new("r.CSV")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("r.txt")), None);
    }
}
