//! Bollinger signal: touch or break of one band.
//!
//! Touch means `|close - band| / band` is below the tolerance ratio; the
//! middle band uses 75 % of the configured tolerance.

use super::{IndicatorOutputs, IndicatorSignal};
use crate::domain::OhlcSeries;
use crate::indicators::{bollinger, last, BollingerBands};
use crate::model::{BollingerAction, BollingerConfig, IndicatorMetric};

const MIDDLE_TOLERANCE_FACTOR: f64 = 0.75;

impl BollingerConfig {
    fn bands(&self, closes: &[f64]) -> BollingerBands {
        bollinger(closes, self.effective_length(), self.effective_multiplier())
    }
}

fn select(bands: &BollingerBands, metric: IndicatorMetric) -> &[f64] {
    match metric {
        IndicatorMetric::Upper => &bands.upper,
        IndicatorMetric::Lower => &bands.lower,
        _ => &bands.middle,
    }
}

impl IndicatorSignal for BollingerConfig {
    fn lookback(&self) -> usize {
        self.effective_length() + 2
    }

    fn signal(&self, ohlc: &OhlcSeries) -> bool {
        let closes = &ohlc.closes;
        let bands = self.bands(closes);
        let metric = self.band_metric();
        let band = select(&bands, metric);
        let (c0, c1) = (last(closes, 0), last(closes, 1));
        let (b0, b1) = (last(band, 0), last(band, 1));
        match self.action {
            BollingerAction::BreakAbove => c0 > b0 && c1 <= b1,
            BollingerAction::BreakBelow => c0 < b0 && c1 >= b1,
            BollingerAction::Touch => {
                let mut tolerance = self.tolerance_ratio();
                if metric == IndicatorMetric::Middle {
                    tolerance *= MIDDLE_TOLERANCE_FACTOR;
                }
                let distance = (c0 - b0).abs() / b0;
                distance.is_finite() && distance < tolerance
            }
        }
    }

    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs {
        let bands = self.bands(&ohlc.closes);
        let primary = select(&bands, self.band_metric()).to_vec();
        IndicatorOutputs::single(primary)
            .with_metric(IndicatorMetric::Upper, bands.upper)
            .with_metric(IndicatorMetric::Middle, bands.middle)
            .with_metric(IndicatorMetric::Lower, bands.lower)
    }
}
