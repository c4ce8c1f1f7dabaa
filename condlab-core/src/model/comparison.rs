//! Comparators, indicator comparisons and the candle condition record.

use serde::{Deserialize, Serialize};

use crate::domain::{CandleReference, PriceField};

/// Absolute tolerance for `Comparator::Eq`.
pub const EQ_TOLERANCE: f64 = 1e-12;

/// Binary numeric comparator. `None` never holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Over,
    Under,
    Eq,
    Lte,
    Gte,
    None,
}

impl Comparator {
    /// Apply the comparator. Any non-finite operand makes it false.
    pub fn compare(self, left: f64, right: f64) -> bool {
        if !left.is_finite() || !right.is_finite() {
            return false;
        }
        match self {
            Comparator::Over => left > right,
            Comparator::Under => left < right,
            Comparator::Eq => (left - right).abs() < EQ_TOLERANCE,
            Comparator::Lte => left <= right,
            Comparator::Gte => left >= right,
            Comparator::None => false,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Comparator::None)
    }
}

/// Named numeric output of an indicator, addressable from a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorMetric {
    Upper,
    Middle,
    Lower,
    Macd,
    Signal,
    Histogram,
    Adx,
    DiPlus,
    DiMinus,
}

impl IndicatorMetric {
    /// Parse the persisted name, tolerating unknown values.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "upper" => Some(Self::Upper),
            "middle" => Some(Self::Middle),
            "lower" => Some(Self::Lower),
            "macd" => Some(Self::Macd),
            "signal" => Some(Self::Signal),
            "histogram" => Some(Self::Histogram),
            "adx" => Some(Self::Adx),
            "diPlus" => Some(Self::DiPlus),
            "diMinus" => Some(Self::DiMinus),
            _ => None,
        }
    }
}

/// Optional numeric gate attached to an indicator leaf.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Comparison {
    /// Leaf truth is the indicator's own signal.
    #[default]
    None,
    /// Indicator value vs a constant.
    Value { comparator: Comparator, value: f64 },
    /// Indicator value vs an OHLC field of the current or previous bar.
    Candle {
        comparator: Comparator,
        field: PriceField,
        #[serde(default)]
        reference: CandleReference,
    },
    /// Indicator value vs another indicator leaf's value.
    Indicator {
        comparator: Comparator,
        #[serde(rename = "targetIndicatorId")]
        target_indicator_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metric: Option<IndicatorMetric>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<CandleReference>,
    },
}

impl Comparison {
    pub fn is_none(&self) -> bool {
        matches!(self, Comparison::None)
    }

    /// Target leaf id for indicator comparisons.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Comparison::Indicator {
                target_indicator_id,
                ..
            } => Some(target_indicator_id),
            _ => None,
        }
    }
}

/// Raw candle predicate carried by a candle leaf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandleCondition {
    pub enabled: bool,
    pub field: PriceField,
    pub comparator: Comparator,
    pub target_value: f64,
    pub reference: CandleReference,
}

impl Default for CandleCondition {
    fn default() -> Self {
        Self {
            enabled: false,
            field: PriceField::Close,
            comparator: Comparator::Over,
            target_value: 0.0,
            reference: CandleReference::Current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_table() {
        assert!(Comparator::Over.compare(2.0, 1.0));
        assert!(!Comparator::Over.compare(1.0, 1.0));
        assert!(Comparator::Under.compare(1.0, 2.0));
        assert!(Comparator::Gte.compare(1.0, 1.0));
        assert!(Comparator::Lte.compare(1.0, 1.0));
        assert!(Comparator::Eq.compare(1.0, 1.0 + 1e-13));
        assert!(!Comparator::Eq.compare(1.0, 1.0 + 1e-9));
        assert!(!Comparator::None.compare(2.0, 1.0));
    }

    #[test]
    fn comparator_rejects_non_finite() {
        assert!(!Comparator::Over.compare(f64::NAN, 1.0));
        assert!(!Comparator::Under.compare(1.0, f64::INFINITY));
        assert!(!Comparator::Lte.compare(f64::NAN, f64::NAN));
    }

    #[test]
    fn comparison_json_shapes() {
        let c: Comparison = serde_json::from_str(
            r#"{"kind":"indicator","comparator":"over","targetIndicatorId":"cond-a","metric":"upper"}"#,
        )
        .unwrap();
        assert_eq!(c.target_id(), Some("cond-a"));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["kind"], "indicator");
        assert!(json.get("reference").is_none());

        let none: Comparison = serde_json::from_str(r#"{"kind":"none"}"#).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn candle_condition_fills_defaults() {
        let c: CandleCondition = serde_json::from_str(r#"{"enabled":true,"targetValue":100}"#).unwrap();
        assert!(c.enabled);
        assert_eq!(c.field, PriceField::Close);
        assert_eq!(c.reference, CandleReference::Current);
        assert_eq!(c.target_value, 100.0);
    }

    #[test]
    fn metric_parse_tolerates_unknown() {
        assert_eq!(IndicatorMetric::parse("diPlus"), Some(IndicatorMetric::DiPlus));
        assert_eq!(IndicatorMetric::parse("bogus"), None);
    }
}
