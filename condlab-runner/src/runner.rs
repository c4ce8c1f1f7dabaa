//! Run orchestration: config → candles + tree → replay → optional export.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use condlab_core::domain::Candle;
use condlab_core::model::IndicatorConditions;

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data::{dataset_hash, load_candles, LoadError};
use crate::export::write_report;
use crate::replay::{replay, ReplayOptions, ReplayReport};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("export error: {0:#}")]
    Export(anyhow::Error),
}

/// Everything a config-driven replay produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub run_id: RunId,
    pub dataset_hash: String,
    pub report: ReplayReport,
}

/// Tree and candles a config points at.
pub fn load_inputs(config: &RunConfig) -> Result<(IndicatorConditions, Vec<Candle>), RunError> {
    let tree = config.load_tree()?;
    let candles = load_candles(&config.data.path, &config.load_options())?;
    Ok((tree, candles))
}

pub fn replay_options(config: &RunConfig) -> ReplayOptions {
    ReplayOptions {
        start: config.replay.start,
        with_intents: config.replay.intents,
        signals: config.signal_overrides(),
    }
}

/// Load inputs, replay, and write the report when `[replay.output]` is set.
pub fn run_replay(config: &RunConfig) -> Result<RunOutput, RunError> {
    let (tree, candles) = load_inputs(config)?;
    let run_id = config.run_id();
    info!(run_id = %run_id, bars = candles.len(), "starting replay");

    let report = replay(&tree, &candles, &config.context, &replay_options(config));
    if let Some(output) = &config.replay.output {
        write_report(&report, &output.path, output.format).map_err(RunError::Export)?;
    }
    Ok(RunOutput {
        run_id,
        dataset_hash: dataset_hash(&candles),
        report,
    })
}
