//! MACD: line, signal and histogram.
//!
//! macd = MA(values, fast) − MA(values, slow)
//! signal = MA(macd, signal)
//! histogram = macd − signal
//!
//! The same method (EMA or SMA) drives all three averages.

use super::MaMethod;

/// The three MACD series, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute MACD over `values` (normally closes).
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize, method: MaMethod) -> MacdSeries {
    let fast_line = method.apply(values, fast);
    let slow_line = method.apply(values, slow);
    let macd: Vec<f64> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| f - s)
        .collect();
    let signal = method.apply(&macd, signal);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn trending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_lengths_match_input() {
        let out = macd(&trending(60), 12, 26, 9, MaMethod::Ema);
        assert_eq!(out.macd.len(), 60);
        assert_eq!(out.signal.len(), 60);
        assert_eq!(out.histogram.len(), 60);
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let out = macd(&trending(80), 12, 26, 9, MaMethod::Ema);
        assert!(*out.macd.last().unwrap() > 0.0);
    }

    #[test]
    fn macd_constant_series_is_zero() {
        let out = macd(&[42.0; 50], 12, 26, 9, MaMethod::Ema);
        for v in &out.macd {
            assert_approx(*v, 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_sma_warmup() {
        let out = macd(&trending(60), 12, 26, 9, MaMethod::Sma);
        // slow SMA defined from 25, signal SMA of macd from 25 + 8
        assert!(out.macd[24].is_nan());
        assert!(out.macd[25].is_finite());
        assert!(out.signal[32].is_nan());
        assert!(out.signal[33].is_finite());
        assert!(out.histogram[33].is_finite());
    }

    #[test]
    fn macd_histogram_identity() {
        let out = macd(&trending(40), 5, 10, 4, MaMethod::Ema);
        for i in 0..40 {
            assert_eq!(out.histogram[i], out.macd[i] - out.signal[i]);
        }
    }
}
