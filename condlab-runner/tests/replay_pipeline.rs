//! Config-driven replay against files on disk.

use std::fs;
use std::path::Path;

use proptest::prelude::*;
use tempfile::TempDir;

use condlab_core::domain::Candle;
use condlab_core::eval::EvaluationContext;
use condlab_runner::{
    import_json, load_candles, replay, run_replay, start_index, LoadError, LoadOptions, ReplayOptions, RunConfig,
    RunError,
};

const RULES: &str = r#"{
  "root": {"kind": "group", "id": "root", "operator": "and", "children": [
    {"kind": "candle", "id": "close-over-100", "candle": {"enabled": true, "comparator": "over", "targetValue": 100}},
    {"kind": "action", "id": "buy", "action": {"kind": "buy", "orderType": "market", "amountMode": "usdt", "usdt": 25}}
  ]}
}"#;

// ── Helpers ──────────────────────────────────────────────────────────

fn write_csv(dir: &Path, closes: &[f64]) {
    let mut body = String::from("timestamp,open,high,low,close,volume\n");
    for (i, close) in closes.iter().enumerate() {
        let ts = 1_700_000_000_000_i64 + i as i64 * 60_000;
        body.push_str(&format!("{ts},{close},{},{},{close},1\n", close + 1.0, close - 1.0));
    }
    fs::write(dir.join("candles.csv"), body).unwrap();
}

fn write_config(dir: &Path, extra: &str) -> RunConfig {
    fs::write(dir.join("rules.json"), RULES).unwrap();
    let toml = format!(
        "[data]\npath = \"candles.csv\"\n\n[tree]\npath = \"rules.json\"\n\n[context]\nsymbol = \"BTCUSDT\"\n\n{extra}"
    );
    let path = dir.join("run.toml");
    fs::write(&path, toml).unwrap();
    RunConfig::load(&path).unwrap()
}

fn closes() -> Vec<f64> {
    vec![99.0, 101.0, 98.0, 102.0, 103.0, 97.0]
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[test]
fn replay_from_config_writes_json_report() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), &closes());
    let config = write_config(
        dir.path(),
        "[replay]\nintents = true\noutput = { path = \"out/report.json\" }\n",
    );

    let output = run_replay(&config).unwrap();
    assert_eq!(output.run_id, config.run_id());
    assert_eq!(output.dataset_hash.len(), 64);

    let report = &output.report;
    assert_eq!(report.bars, 6);
    assert_eq!(report.start, 1);
    let results: Vec<bool> = report.records.iter().map(|r| r.result).collect();
    assert_eq!(results, vec![true, false, true, true, false]);
    let with_intents: Vec<usize> = report
        .records
        .iter()
        .filter(|r| !r.intents.is_empty())
        .map(|r| r.index)
        .collect();
    assert_eq!(with_intents, vec![1, 3, 4]);

    let written = fs::read_to_string(dir.path().join("out/report.json")).unwrap();
    assert_eq!(&import_json(&written).unwrap(), report);
}

#[test]
fn replay_csv_output_and_limit() {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), &closes());
    fs::write(dir.path().join("rules.json"), RULES).unwrap();
    let text = "[data]\npath = \"candles.csv\"\nlimit = 3\n\n[tree]\npath = \"rules.json\"\n\n\
                [replay]\noutput = { path = \"report.csv\" }\n";
    let path = dir.path().join("run.toml");
    fs::write(&path, text).unwrap();
    let config = RunConfig::load(&path).unwrap();

    let output = run_replay(&config).unwrap();
    assert_eq!(output.report.bars, 3);
    let csv = fs::read_to_string(dir.path().join("report.csv")).unwrap();
    // header + bars 1 and 2 of the trimmed history (closes 102, 103, 97)
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().contains(",true,"));
    assert!(csv.lines().nth(2).unwrap().contains(",false,"));
}

#[test]
fn missing_candle_file_is_a_data_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    assert!(matches!(run_replay(&config), Err(RunError::Data(LoadError::Io { .. }))));
}

#[test]
fn out_of_order_candles_are_rejected() {
    let dir = TempDir::new().unwrap();
    let body = "timestamp,open,high,low,close\n2,1,1,1,1\n1,1,1,1,1\n";
    fs::write(dir.path().join("candles.csv"), body).unwrap();
    let err = load_candles(&dir.path().join("candles.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::OutOfOrder { index: 1, .. }));
}

#[test]
fn json_candles_load_with_explicit_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("candles.data");
    fs::write(&path, "[[1, 1, 2, 0.5, 1.5, 3], [2, 1.5, 2, 1, 1.8]]").unwrap();
    assert!(matches!(
        load_candles(&path, &LoadOptions::default()),
        Err(LoadError::UnknownFormat(_))
    ));
    let opts = LoadOptions {
        format: Some(condlab_runner::CandleFormat::Json),
        limit: None,
    };
    assert_eq!(load_candles(&path, &opts).unwrap().len(), 2);
}

// ── Properties ───────────────────────────────────────────────────────

fn bars(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: i as i64,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 0.0,
        })
        .collect()
}

proptest! {
    /// One record per bar from the start index on, in bar order.
    #[test]
    fn replay_covers_every_bar_from_start(
        closes in prop::collection::vec(80.0..120.0_f64, 0..80),
        start in proptest::option::of(0usize..100),
    ) {
        let tree = condlab_core::model::migrate_legacy(RULES).unwrap();
        let candles = bars(&closes);
        let opts = ReplayOptions { start, ..ReplayOptions::default() };
        let report = replay(&tree, &candles, &EvaluationContext::default(), &opts);

        let first = start_index(report.lookback, candles.len(), start);
        prop_assert_eq!(report.start, first);
        prop_assert_eq!(report.records.len(), candles.len().saturating_sub(first));
        for (offset, record) in report.records.iter().enumerate() {
            prop_assert_eq!(record.index, first + offset);
            prop_assert_eq!(record.result, closes[record.index] > 100.0);
        }
    }
}
