//! Evaluation context: the candles and account state a tree is judged against.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, CandleReference};
use crate::model::{QuoteAsset, StatusMetric, StatusUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionDirection {
    #[default]
    Long,
    Short,
}

/// Amount denominated in a quote asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub asset: QuoteAsset,
    pub value: f64,
}

impl Money {
    pub fn new(asset: QuoteAsset, value: f64) -> Self {
        Self { asset, value }
    }

    pub fn usdt(value: f64) -> Self {
        Self::new(QuoteAsset::Usdt, value)
    }
}

/// Runtime account and position figures. Absent figures make the status
/// leaves that read them false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_rate_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_age_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_age_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_age_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_balance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_margin_rate_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_size: Option<Money>,
}

impl StatusMetrics {
    /// Scalar reading for non-money metrics. `entryAge` picks the column
    /// matching `unit`, days by default.
    pub fn scalar(&self, metric: StatusMetric, unit: Option<StatusUnit>) -> Option<f64> {
        match metric {
            StatusMetric::ProfitRate => self.profit_rate_pct,
            StatusMetric::InitialMarginRate => self.initial_margin_rate_pct,
            StatusMetric::BuyCount => self.buy_count,
            StatusMetric::EntryAge => match unit {
                Some(StatusUnit::Minutes) => self.entry_age_minutes,
                Some(StatusUnit::Hours) => self.entry_age_hours,
                _ => self.entry_age_days,
            },
            _ => None,
        }
    }

    pub fn money(&self, metric: StatusMetric) -> Option<Money> {
        match metric {
            StatusMetric::Margin => self.margin,
            StatusMetric::WalletBalance => self.wallet_balance,
            StatusMetric::UnrealizedPnl => self.unrealized_pnl,
            StatusMetric::PositionSize => self.position_size,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationContext {
    pub symbol: String,
    pub direction: PositionDirection,
    #[serde(flatten)]
    pub status: StatusMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle_current: Option<Candle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle_previous: Option<Candle>,
}

impl EvaluationContext {
    pub fn new(symbol: impl Into<String>, direction: PositionDirection) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            ..Self::default()
        }
    }

    /// Set current and previous bars from the tail of a history.
    pub fn with_candles(mut self, candles: &[Candle]) -> Self {
        let n = candles.len();
        self.candle_current = candles.last().copied();
        self.candle_previous = n.checked_sub(2).map(|i| candles[i]);
        self
    }

    pub fn with_status(mut self, status: StatusMetrics) -> Self {
        self.status = status;
        self
    }

    pub fn candle(&self, reference: CandleReference) -> Option<&Candle> {
        match reference {
            CandleReference::Current => self.candle_current.as_ref(),
            CandleReference::Previous => self.candle_previous.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn with_candles_takes_last_two() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let ctx = EvaluationContext::default().with_candles(&candles);
        assert_eq!(ctx.candle(CandleReference::Current).map(|c| c.close), Some(3.0));
        assert_eq!(ctx.candle(CandleReference::Previous).map(|c| c.close), Some(2.0));

        let single = EvaluationContext::default().with_candles(&candles[..1]);
        assert!(single.candle_previous.is_none());
    }

    #[test]
    fn entry_age_follows_unit() {
        let status = StatusMetrics {
            entry_age_days: Some(2.0),
            entry_age_hours: Some(48.0),
            entry_age_minutes: Some(2880.0),
            ..StatusMetrics::default()
        };
        assert_eq!(status.scalar(StatusMetric::EntryAge, None), Some(2.0));
        assert_eq!(status.scalar(StatusMetric::EntryAge, Some(StatusUnit::Hours)), Some(48.0));
        assert_eq!(status.scalar(StatusMetric::EntryAge, Some(StatusUnit::Minutes)), Some(2880.0));
    }

    #[test]
    fn context_json_is_flat_camel_case() {
        let ctx: EvaluationContext = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","direction":"short","profitRatePct":3.5,
                "margin":{"asset":"USDC","value":120.0}}"#,
        )
        .unwrap();
        assert_eq!(ctx.direction, PositionDirection::Short);
        assert_eq!(ctx.status.profit_rate_pct, Some(3.5));
        assert_eq!(ctx.status.margin, Some(Money::new(QuoteAsset::Usdc, 120.0)));
    }
}
