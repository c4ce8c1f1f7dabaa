//! Candle: the market data unit fed to series and evaluation.

use serde::{Deserialize, Serialize};

/// OHLCV candle. `timestamp` is the open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Read one OHLC field.
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }
}

/// OHLC field selector shared by candle leaves, comparisons and MACD sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

/// Which bar a candle read refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleReference {
    #[default]
    Current,
    Previous,
}

/// Column-oriented view of a candle history, most recent last.
///
/// Series functions take plain slices; this keeps the four columns aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OhlcSeries {
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl OhlcSeries {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            opens: candles.iter().map(|c| c.open).collect(),
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
        }
    }

    /// Append one bar to every column.
    pub fn push(&mut self, candle: &Candle) {
        self.opens.push(candle.open);
        self.highs.push(candle.high);
        self.lows.push(candle.low);
        self.closes.push(candle.close);
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// Column for a price field.
    pub fn column(&self, field: PriceField) -> &[f64] {
        match field {
            PriceField::Open => &self.opens,
            PriceField::High => &self.highs,
            PriceField::Low => &self.lows,
            PriceField::Close => &self.closes,
        }
    }
}

impl From<&[Candle]> for OhlcSeries {
    fn from(candles: &[Candle]) -> Self {
        Self::from_candles(candles)
    }
}
