//! Numeric series library.
//!
//! Pure functions over parallel, chronologically ordered slices (most recent
//! last). Every function returns a vector the same length as its input, with
//! `NaN` wherever history is insufficient. Nothing here panics on short or
//! empty input.

pub mod bollinger;
pub mod dmi;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::{bollinger, BollingerBands};
pub use dmi::{dmi, dmi_snapshot, wilder_smooth, DmiSeries, DmiSnapshot};
pub use ema::ema;
pub use macd::{macd, MacdSeries};
pub use rsi::rsi;
pub use sma::sma;
pub use stddev::stddev;

use serde::{Deserialize, Serialize};

/// Averaging method shared by RSI smoothing and MACD lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaMethod {
    #[serde(rename = "SMA", alias = "sma")]
    Sma,
    #[serde(rename = "EMA", alias = "ema")]
    Ema,
}

impl MaMethod {
    /// Apply this method to a series.
    pub fn apply(self, values: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaMethod::Sma => sma(values, period),
            MaMethod::Ema => ema(values, period),
        }
    }
}

/// Value `back` bars before the most recent one, or NaN when out of range.
pub fn last(values: &[f64], back: usize) -> f64 {
    values
        .len()
        .checked_sub(1 + back)
        .map(|i| values[i])
        .unwrap_or(f64::NAN)
}

/// Synthetic candles from close prices for tests.
///
/// open = prev close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1, one minute apart.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: 1_700_000_000_000 + (i as i64) * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for series tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
