//! TOML run configuration.
//!
//! A run names a candle file, a tree file and everything the evaluator and
//! planner need besides them:
//!
//! ```toml
//! [data]
//! path = "candles.csv"
//! limit = 500
//!
//! [tree]
//! path = "rules.json"
//!
//! [context]
//! symbol = "BTCUSDT"
//! direction = "long"
//! profitRatePct = 2.5
//!
//! [signals]
//! rsi-1 = true
//!
//! [market]
//! pricePrecision = 2
//! minNotional = 5.0
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use condlab_core::eval::EvaluationContext;
use condlab_core::intents::{MarketConstraints, PlannerOptions, RuntimeAmounts};
use condlab_core::model::{migrate_legacy, IndicatorConditions};
use condlab_core::ModelError;

use crate::data::{CandleFormat, LoadOptions};
use crate::export::OutputFormat;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid run config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid tree file '{path}': {source}")]
    Tree {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Serializable configuration for one replay or evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    pub tree: TreeConfig,
    #[serde(default)]
    pub context: EvaluationContext,
    /// Per-leaf signal overrides, keyed by indicator leaf id.
    #[serde(default)]
    pub signals: BTreeMap<String, bool>,
    #[serde(default)]
    pub market: MarketConstraints,
    #[serde(default)]
    pub runtime: RuntimeAmounts,
    #[serde(default)]
    pub planner: PlannerOptions,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Inferred from the file extension when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CandleFormat>,
    /// Keep only the most recent `limit` candles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// First bar index to evaluate; defaults to the tree's lookback.
    pub start: Option<usize>,
    /// Build action intents on bars where the tree passes.
    pub intents: bool,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Inferred from the file extension when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl RunConfig {
    /// Read, parse and validate a config file, resolving relative paths
    /// against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse and validate TOML text. Paths are left as written.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.limit == Some(0) {
            return Err(ConfigError::Invalid {
                field: "data.limit",
                reason: "must be at least 1".into(),
            });
        }
        for (field, value) in [
            ("market.minNotional", self.market.min_notional),
            ("market.minQuantity", self.market.min_quantity),
        ] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a non-negative number".into(),
                });
            }
        }
        for (field, value) in [
            ("market.pricePrecision", self.market.price_precision),
            ("market.quantityPrecision", self.market.quantity_precision),
        ] {
            if value.is_some_and(|p| p > 16) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "at most 16 decimal places".into(),
                });
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data.path);
        resolve(&mut self.tree.path);
        if let Some(output) = self.replay.output.as_mut() {
            resolve(&mut output.path);
        }
    }

    /// Load the tree file leniently: any stored shape is migrated and
    /// normalized. Only unreadable files and JSON syntax errors fail.
    pub fn load_tree(&self) -> Result<IndicatorConditions, ConfigError> {
        let path = &self.tree.path;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        migrate_legacy(&text).map_err(|source| ConfigError::Tree {
            path: path.clone(),
            source,
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            format: self.data.format,
            limit: self.data.limit,
        }
    }

    /// Overrides in the shape the evaluator takes.
    pub fn signal_overrides(&self) -> HashMap<String, bool> {
        self.signals.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
