//! Per-type indicator configuration records.
//!
//! Each indicator type has its own config struct. Missing fields take the
//! factory defaults (`#[serde(default)]`), so partial persisted configs load
//! cleanly. The `effective_*` accessors clamp stored values into the ranges
//! the signal evaluators accept.

use serde::{Deserialize, Serialize};

use super::comparison::{Comparator, IndicatorMetric};
use crate::domain::PriceField;
use crate::error::ModelError;
use crate::indicators::MaMethod;

/// Indicator type discriminator (`type` in persisted JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Bollinger,
    Ma,
    Rsi,
    Dmi,
    Macd,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Bollinger,
        IndicatorKind::Ma,
        IndicatorKind::Rsi,
        IndicatorKind::Dmi,
        IndicatorKind::Macd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorKind::Bollinger => "bollinger",
            IndicatorKind::Ma => "ma",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Dmi => "dmi",
            IndicatorKind::Macd => "macd",
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn positive_or(value: usize, fallback: usize) -> usize {
    if value == 0 {
        fallback
    } else {
        value
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value != 0.0 {
        value
    } else {
        fallback
    }
}

// ─── Moving average ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaAction {
    BreakAbove,
    BreakBelow,
    StayAbove,
    StayBelow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaConfig {
    pub enabled: bool,
    pub period: usize,
    pub actions: Vec<MaAction>,
}

impl Default for MaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 20,
            actions: Vec::new(),
        }
    }
}

impl MaConfig {
    pub fn effective_period(&self) -> usize {
        positive_or(self.period, 20).max(1)
    }
}

// ─── RSI ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSmoothing {
    #[default]
    Sma,
    Ema,
}

impl From<RsiSmoothing> for MaMethod {
    fn from(s: RsiSmoothing) -> Self {
        match s {
            RsiSmoothing::Sma => MaMethod::Sma,
            RsiSmoothing::Ema => MaMethod::Ema,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiAction {
    CrossAbove,
    CrossBelow,
    StayAbove,
    StayBelow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsiConfig {
    pub enabled: bool,
    pub period: usize,
    pub smoothing: RsiSmoothing,
    pub threshold: f64,
    pub actions: Vec<RsiAction>,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 14,
            smoothing: RsiSmoothing::Sma,
            threshold: 50.0,
            actions: Vec::new(),
        }
    }
}

impl RsiConfig {
    pub fn effective_period(&self) -> usize {
        positive_or(self.period, 14).max(2)
    }

    pub fn effective_threshold(&self) -> f64 {
        if self.threshold.is_finite() {
            self.threshold
        } else {
            50.0
        }
    }
}

// ─── Bollinger ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BollingerBand {
    Upper,
    #[default]
    Middle,
    Lower,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BollingerAction {
    #[default]
    Touch,
    BreakAbove,
    BreakBelow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BollingerConfig {
    pub enabled: bool,
    pub length: usize,
    pub standard_deviation: f64,
    pub offset: f64,
    pub band: BollingerBand,
    pub action: BollingerAction,
    pub touch_tolerance_pct: f64,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            length: 20,
            standard_deviation: 2.0,
            offset: 0.0,
            band: BollingerBand::Middle,
            action: BollingerAction::Touch,
            touch_tolerance_pct: 0.2,
        }
    }
}

impl BollingerConfig {
    pub fn effective_length(&self) -> usize {
        positive_or(self.length, 20).max(2)
    }

    pub fn effective_multiplier(&self) -> f64 {
        finite_or(self.standard_deviation, 2.0).max(0.1)
    }

    /// Touch tolerance as a ratio (0.2 % → 0.002).
    pub fn tolerance_ratio(&self) -> f64 {
        let pct = if self.touch_tolerance_pct.is_finite() {
            self.touch_tolerance_pct
        } else {
            0.2
        };
        pct.max(0.0) / 100.0
    }

    /// The band used for signals and the primary value; `none` reads middle.
    pub fn band_metric(&self) -> IndicatorMetric {
        match self.band {
            BollingerBand::Upper => IndicatorMetric::Upper,
            BollingerBand::Lower => IndicatorMetric::Lower,
            BollingerBand::Middle | BollingerBand::None => IndicatorMetric::Middle,
        }
    }
}

// ─── MACD ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdComparison {
    MacdOverSignal,
    MacdUnderSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramAction {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MacdConfig {
    pub enabled: bool,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub source: PriceField,
    pub method: MaMethod,
    pub comparison: Option<MacdComparison>,
    pub histogram_action: Option<HistogramAction>,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fast: 12,
            slow: 26,
            signal: 9,
            source: PriceField::Close,
            method: MaMethod::Ema,
            comparison: None,
            histogram_action: None,
        }
    }
}

impl MacdConfig {
    /// (fast, slow, signal) with zeros replaced by defaults.
    pub fn effective_periods(&self) -> (usize, usize, usize) {
        (
            positive_or(self.fast, 12),
            positive_or(self.slow, 26),
            positive_or(self.signal, 9),
        )
    }
}

// ─── DMI ─────────────────────────────────────────────────────────────

/// Enable-able absolute threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdCondition {
    pub enabled: bool,
    pub comparator: Comparator,
    pub value: f64,
}

impl Default for ThresholdCondition {
    fn default() -> Self {
        Self {
            enabled: false,
            comparator: Comparator::Over,
            value: 0.0,
        }
    }
}

impl ThresholdCondition {
    /// `None` when disabled, otherwise whether `reading` passes.
    pub fn check(&self, reading: f64) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let value = if self.value.is_finite() { self.value } else { 0.0 };
        Some(self.comparator.compare(reading, value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiComparison {
    PlusOverMinus,
    MinusOverPlus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdxVsDi {
    AdxGtDiPlus,
    AdxLtDiPlus,
    AdxGtDiMinus,
    AdxLtDiMinus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DmiConfig {
    pub enabled: bool,
    pub di_period: usize,
    pub adx_period: usize,
    pub adx: ThresholdCondition,
    pub di_comparison: Option<DiComparison>,
    pub di_plus: ThresholdCondition,
    pub di_minus: ThresholdCondition,
    pub adx_vs_di: Option<AdxVsDi>,
}

impl Default for DmiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            di_period: 14,
            adx_period: 14,
            adx: ThresholdCondition::default(),
            di_comparison: None,
            di_plus: ThresholdCondition::default(),
            di_minus: ThresholdCondition::default(),
            adx_vs_di: None,
        }
    }
}

impl DmiConfig {
    /// (di, adx) periods as used by the numeric series.
    pub fn series_periods(&self) -> (usize, usize) {
        (positive_or(self.di_period, 14), positive_or(self.adx_period, 14))
    }

    /// (di, adx) periods as used by the boolean signal (minimum 2).
    pub fn signal_periods(&self) -> (usize, usize) {
        let (di, adx) = self.series_periods();
        (di.max(2), adx.max(2))
    }
}

// ─── Entry ───────────────────────────────────────────────────────────

/// Typed indicator configuration, one variant per indicator type.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSpec {
    Bollinger(BollingerConfig),
    Ma(MaConfig),
    Rsi(RsiConfig),
    Dmi(DmiConfig),
    Macd(MacdConfig),
}

impl IndicatorSpec {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorSpec::Bollinger(_) => IndicatorKind::Bollinger,
            IndicatorSpec::Ma(_) => IndicatorKind::Ma,
            IndicatorSpec::Rsi(_) => IndicatorKind::Rsi,
            IndicatorSpec::Dmi(_) => IndicatorKind::Dmi,
            IndicatorSpec::Macd(_) => IndicatorKind::Macd,
        }
    }

    /// Default configuration for a type.
    pub fn default_for(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Bollinger => IndicatorSpec::Bollinger(BollingerConfig::default()),
            IndicatorKind::Ma => IndicatorSpec::Ma(MaConfig::default()),
            IndicatorKind::Rsi => IndicatorSpec::Rsi(RsiConfig::default()),
            IndicatorKind::Dmi => IndicatorSpec::Dmi(DmiConfig::default()),
            IndicatorKind::Macd => IndicatorSpec::Macd(MacdConfig::default()),
        }
    }

    /// Decode a config payload for `kind`. `null` yields the defaults.
    pub fn from_config(kind: IndicatorKind, config: serde_json::Value) -> Result<Self, ModelError> {
        if config.is_null() {
            return Ok(Self::default_for(kind));
        }
        let invalid = |source| ModelError::InvalidConfig { kind, source };
        Ok(match kind {
            IndicatorKind::Bollinger => IndicatorSpec::Bollinger(serde_json::from_value(config).map_err(invalid)?),
            IndicatorKind::Ma => IndicatorSpec::Ma(serde_json::from_value(config).map_err(invalid)?),
            IndicatorKind::Rsi => IndicatorSpec::Rsi(serde_json::from_value(config).map_err(invalid)?),
            IndicatorKind::Dmi => IndicatorSpec::Dmi(serde_json::from_value(config).map_err(invalid)?),
            IndicatorKind::Macd => IndicatorSpec::Macd(serde_json::from_value(config).map_err(invalid)?),
        })
    }

    /// Encode the config payload.
    pub fn config_value(&self) -> serde_json::Value {
        let encoded = match self {
            IndicatorSpec::Bollinger(c) => serde_json::to_value(c),
            IndicatorSpec::Ma(c) => serde_json::to_value(c),
            IndicatorSpec::Rsi(c) => serde_json::to_value(c),
            IndicatorSpec::Dmi(c) => serde_json::to_value(c),
            IndicatorSpec::Macd(c) => serde_json::to_value(c),
        };
        // Plain structs of numbers, enums and vectors always encode.
        encoded.unwrap_or(serde_json::Value::Null)
    }
}

/// An indicator instance inside a leaf: `{ id, type, config }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIndicatorEntry", into = "RawIndicatorEntry")]
pub struct IndicatorEntry {
    pub id: String,
    pub spec: IndicatorSpec,
}

impl IndicatorEntry {
    pub fn new(id: impl Into<String>, spec: IndicatorSpec) -> Self {
        Self {
            id: id.into(),
            spec,
        }
    }

    pub fn kind(&self) -> IndicatorKind {
        self.spec.kind()
    }
}

/// Wire form of `IndicatorEntry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawIndicatorEntry {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: IndicatorKind,
    #[serde(default)]
    config: serde_json::Value,
}

impl TryFrom<RawIndicatorEntry> for IndicatorEntry {
    type Error = ModelError;

    fn try_from(raw: RawIndicatorEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            spec: IndicatorSpec::from_config(raw.kind, raw.config)?,
        })
    }
}

impl From<IndicatorEntry> for RawIndicatorEntry {
    fn from(entry: IndicatorEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.spec.kind(),
            config: entry.spec.config_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_through_wire_form() {
        let json = r#"{"id":"ind-1","type":"rsi","config":{"period":21,"actions":["cross_above"]}}"#;
        let entry: IndicatorEntry = serde_json::from_str(json).unwrap();
        match &entry.spec {
            IndicatorSpec::Rsi(cfg) => {
                assert_eq!(cfg.period, 21);
                assert_eq!(cfg.threshold, 50.0);
                assert_eq!(cfg.actions, vec![RsiAction::CrossAbove]);
            }
            other => panic!("unexpected spec {other:?}"),
        }
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["type"], "rsi");
        assert_eq!(back["config"]["smoothing"], "sma");
    }

    #[test]
    fn missing_config_uses_defaults() {
        let entry: IndicatorEntry = serde_json::from_str(r#"{"id":"x","type":"macd"}"#).unwrap();
        assert_eq!(entry.spec, IndicatorSpec::Macd(MacdConfig::default()));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let err = serde_json::from_str::<IndicatorEntry>(r#"{"type":"ma","config":{"period":"x"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn macd_nulls_serialize_as_null() {
        let v = IndicatorSpec::Macd(MacdConfig::default()).config_value();
        assert!(v["comparison"].is_null());
        assert!(v["histogramAction"].is_null());
        assert_eq!(v["method"], "EMA");
    }

    #[test]
    fn effective_values_clamp() {
        let ma = MaConfig { period: 0, ..MaConfig::default() };
        assert_eq!(ma.effective_period(), 20);
        let rsi = RsiConfig { period: 1, ..RsiConfig::default() };
        assert_eq!(rsi.effective_period(), 2);
        let bb = BollingerConfig {
            standard_deviation: 0.01,
            ..BollingerConfig::default()
        };
        assert_eq!(bb.effective_multiplier(), 0.1);
        assert!((bb.tolerance_ratio() - 0.002).abs() < 1e-15);
    }

    #[test]
    fn threshold_check_respects_enabled() {
        let mut t = ThresholdCondition::default();
        assert_eq!(t.check(30.0), None);
        t.enabled = true;
        t.value = 25.0;
        assert_eq!(t.check(30.0), Some(true));
        assert_eq!(t.check(20.0), Some(false));
    }
}
