//! Indicator signals: per-type boolean judgments and numeric outputs.
//!
//! Each indicator config implements [`IndicatorSignal`]. The evaluator asks
//! a leaf for its signal (a trading judgment such as "RSI crossed above 30")
//! and for its numeric outputs, which comparisons and price references read.
//!
//! Signals only look at the last two bars of each series. Any NaN operand
//! makes the check false.

pub mod bollinger;
pub mod dmi;
pub mod ma;
pub mod macd;
pub mod rsi;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::algebra::collect_indicator_nodes;
use crate::domain::{Candle, OhlcSeries};
use crate::model::{IndicatorConditions, IndicatorMetric, IndicatorSpec};

/// Minimum history `required_lookback` ever asks for.
pub const MIN_LOOKBACK: usize = 50;
/// Margin added on top of the largest indicator need.
pub const LOOKBACK_MARGIN: usize = 5;

/// Behaviour shared by every indicator config.
pub trait IndicatorSignal {
    /// Bars needed before the indicator produces a non-NaN value.
    fn lookback(&self) -> usize;

    /// The indicator's own boolean judgment on the latest bar.
    fn signal(&self, ohlc: &OhlcSeries) -> bool;

    /// All numeric outputs, aligned with the input bars.
    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs;
}

impl IndicatorSpec {
    pub fn as_signal(&self) -> &dyn IndicatorSignal {
        match self {
            IndicatorSpec::Bollinger(c) => c,
            IndicatorSpec::Ma(c) => c,
            IndicatorSpec::Rsi(c) => c,
            IndicatorSpec::Dmi(c) => c,
            IndicatorSpec::Macd(c) => c,
        }
    }
}

/// Numeric outputs of one indicator leaf: the primary series plus any named
/// sub-metrics (bands, MACD lines, DMI components).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorOutputs {
    primary: Vec<f64>,
    metrics: Vec<(IndicatorMetric, Vec<f64>)>,
}

impl IndicatorOutputs {
    pub fn single(primary: Vec<f64>) -> Self {
        Self {
            primary,
            metrics: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: IndicatorMetric, values: Vec<f64>) -> Self {
        self.metrics.push((metric, values));
        self
    }

    pub fn primary(&self) -> &[f64] {
        &self.primary
    }

    /// Series for `metric`. `None`, or a metric this indicator does not
    /// expose, reads the primary series.
    pub fn metric(&self, metric: Option<IndicatorMetric>) -> &[f64] {
        metric
            .and_then(|m| self.metrics.iter().find(|(name, _)| *name == m))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&self.primary)
    }

    pub fn into_primary(self) -> Vec<f64> {
        self.primary
    }
}

/// Numeric series keyed by indicator leaf id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesMap {
    series: HashMap<String, Vec<f64>>,
}

impl SeriesMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, values: Vec<f64>) {
        self.series.insert(id.into(), values);
    }

    /// Value at a bar index.
    pub fn get(&self, id: &str, index: usize) -> Option<f64> {
        self.series.get(id).and_then(|v| v.get(index).copied())
    }

    pub fn get_series(&self, id: &str) -> Option<&[f64]> {
        self.series.get(id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<(String, Vec<f64>)> for SeriesMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f64>)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

/// Boolean signal for every indicator leaf, computed from candles.
pub fn build_indicator_signals(conditions: &IndicatorConditions, candles: &[Candle]) -> HashMap<String, bool> {
    build_indicator_signals_from_series(conditions, &OhlcSeries::from_candles(candles))
}

pub fn build_indicator_signals_from_series(conditions: &IndicatorConditions, ohlc: &OhlcSeries) -> HashMap<String, bool> {
    collect_indicator_nodes(&conditions.root)
        .into_iter()
        .map(|leaf| {
            let signal = leaf.indicator.spec.as_signal().signal(ohlc);
            trace!(node = %leaf.id, kind = %leaf.indicator.kind(), signal, "indicator signal");
            (leaf.id.clone(), signal)
        })
        .collect()
}

/// Primary numeric series for every indicator leaf.
pub fn build_numeric_series(conditions: &IndicatorConditions, ohlc: &OhlcSeries) -> SeriesMap {
    collect_indicator_nodes(&conditions.root)
        .into_iter()
        .map(|leaf| {
            let outputs = leaf.indicator.spec.as_signal().outputs(ohlc);
            (leaf.id.clone(), outputs.into_primary())
        })
        .collect()
}

/// Bars of history needed so every indicator in the tree is defined:
/// `max(MIN_LOOKBACK, largest need + LOOKBACK_MARGIN)`.
pub fn required_lookback(conditions: &IndicatorConditions) -> usize {
    let need = collect_indicator_nodes(&conditions.root)
        .iter()
        .map(|leaf| leaf.indicator.spec.as_signal().lookback())
        .max()
        .unwrap_or(0);
    MIN_LOOKBACK.max(need + LOOKBACK_MARGIN)
}
