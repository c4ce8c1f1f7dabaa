//! MACD signal: line/signal relation and histogram direction.

use super::{IndicatorOutputs, IndicatorSignal};
use crate::domain::OhlcSeries;
use crate::indicators::{last, macd, MacdSeries};
use crate::model::{HistogramAction, IndicatorMetric, MacdComparison, MacdConfig};

impl MacdConfig {
    fn series(&self, ohlc: &OhlcSeries) -> MacdSeries {
        let (fast, slow, signal) = self.effective_periods();
        macd(ohlc.column(self.source), fast, slow, signal, self.method)
    }
}

impl IndicatorSignal for MacdConfig {
    fn lookback(&self) -> usize {
        let (_, slow, signal) = self.effective_periods();
        slow + signal + 2
    }

    /// Configured checks must all hold; with none configured the signal is
    /// `macd > signal`.
    fn signal(&self, ohlc: &OhlcSeries) -> bool {
        let s = self.series(ohlc);
        let (m0, s0) = (last(&s.macd, 0), last(&s.signal, 0));
        let (h0, h1) = (last(&s.histogram, 0), last(&s.histogram, 1));
        let relation = self.comparison.map(|c| match c {
            MacdComparison::MacdOverSignal => m0 > s0,
            MacdComparison::MacdUnderSignal => m0 < s0,
        });
        let histogram = self.histogram_action.map(|a| match a {
            HistogramAction::Increasing => h0 > h1,
            HistogramAction::Decreasing => h0 < h1,
        });
        match (relation, histogram) {
            (None, None) => m0 > s0,
            (relation, histogram) => relation.unwrap_or(true) && histogram.unwrap_or(true),
        }
    }

    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs {
        let s = self.series(ohlc);
        IndicatorOutputs::single(s.macd.clone())
            .with_metric(IndicatorMetric::Macd, s.macd)
            .with_metric(IndicatorMetric::Signal, s.signal)
            .with_metric(IndicatorMetric::Histogram, s.histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceField;
    use crate::indicators::make_candles;

    fn accelerating(n: usize) -> OhlcSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 * 1.02f64.powi(i as i32)).collect();
        OhlcSeries::from_candles(&make_candles(&closes))
    }

    fn falling(n: usize) -> OhlcSeries {
        let closes: Vec<f64> = (0..n).map(|i| 200.0 - i as f64 * 0.5).collect();
        OhlcSeries::from_candles(&make_candles(&closes))
    }

    #[test]
    fn default_macd_over_signal() {
        assert!(MacdConfig::default().signal(&accelerating(60)));
        assert!(!MacdConfig::default().signal(&falling(60)));
    }

    #[test]
    fn both_checks_must_hold() {
        let cfg = MacdConfig {
            comparison: Some(MacdComparison::MacdOverSignal),
            histogram_action: Some(HistogramAction::Increasing),
            ..MacdConfig::default()
        };
        assert!(cfg.signal(&accelerating(60)));
        let cfg = MacdConfig {
            histogram_action: Some(HistogramAction::Decreasing),
            ..cfg
        };
        assert!(!cfg.signal(&accelerating(60)));
    }

    #[test]
    fn under_signal_on_decline() {
        let cfg = MacdConfig {
            comparison: Some(MacdComparison::MacdUnderSignal),
            ..MacdConfig::default()
        };
        assert!(cfg.signal(&falling(60)));
    }

    #[test]
    fn source_selects_column() {
        let s = accelerating(40);
        let close = MacdConfig::default().outputs(&s);
        let open = MacdConfig {
            source: PriceField::Open,
            ..MacdConfig::default()
        }
        .outputs(&s);
        assert_ne!(close.primary()[39], open.primary()[39]);
        assert_eq!(close.metric(Some(IndicatorMetric::Macd)), close.primary());
    }
}
