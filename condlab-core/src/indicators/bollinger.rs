//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, length)
//! - Upper: middle + mult * stddev(close, length)
//! - Lower: middle - mult * stddev(close, length)
//!
//! Uses population stddev (divide by N).

use super::{sma, stddev};

/// All three bands, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Compute Bollinger Bands over `closes`.
pub fn bollinger(closes: &[f64], length: usize, multiplier: f64) -> BollingerBands {
    let middle = sma(closes, length);
    let deviation = stddev(closes, length);
    let upper = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m + multiplier * d)
        .collect();
    let lower = middle
        .iter()
        .zip(&deviation)
        .map(|(m, d)| m - multiplier * d)
        .collect();
    BollingerBands {
        upper,
        middle,
        lower,
    }
}
