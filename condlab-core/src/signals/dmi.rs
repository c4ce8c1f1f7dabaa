//! DMI signal: DI dominance, absolute thresholds and ADX-vs-DI relations.

use super::{IndicatorOutputs, IndicatorSignal};
use crate::domain::OhlcSeries;
use crate::indicators::{dmi, dmi_snapshot};
use crate::model::{AdxVsDi, DiComparison, DmiConfig, IndicatorMetric};

impl IndicatorSignal for DmiConfig {
    fn lookback(&self) -> usize {
        let (di, adx) = self.series_periods();
        di + adx + 2
    }

    /// Every configured check must hold; with none configured the signal is
    /// `DI+ > DI-`.
    fn signal(&self, ohlc: &OhlcSeries) -> bool {
        let (di, adx) = self.signal_periods();
        let Some(snap) = dmi_snapshot(&ohlc.highs, &ohlc.lows, &ohlc.closes, di, adx) else {
            return false;
        };
        let mut checks = Vec::new();
        if let Some(c) = self.di_comparison {
            checks.push(match c {
                DiComparison::PlusOverMinus => snap.di_plus > snap.di_minus,
                DiComparison::MinusOverPlus => snap.di_minus > snap.di_plus,
            });
        }
        checks.extend(self.adx.check(snap.adx));
        checks.extend(self.di_plus.check(snap.di_plus));
        checks.extend(self.di_minus.check(snap.di_minus));
        if let Some(rel) = self.adx_vs_di {
            checks.push(match rel {
                AdxVsDi::AdxGtDiPlus => snap.adx > snap.di_plus,
                AdxVsDi::AdxLtDiPlus => snap.adx < snap.di_plus,
                AdxVsDi::AdxGtDiMinus => snap.adx > snap.di_minus,
                AdxVsDi::AdxLtDiMinus => snap.adx < snap.di_minus,
            });
        }
        if checks.is_empty() {
            return snap.di_plus > snap.di_minus;
        }
        checks.into_iter().all(|ok| ok)
    }

    /// ADX is reported from bar `di + adx + 1` onwards.
    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs {
        let (di, adx) = self.series_periods();
        let series = dmi(&ohlc.highs, &ohlc.lows, &ohlc.closes, di, adx);
        let first = di + adx + 1;
        let adx_line: Vec<f64> = series
            .adx
            .iter()
            .enumerate()
            .map(|(i, &v)| if i >= first && v.is_finite() { v } else { f64::NAN })
            .collect();
        IndicatorOutputs::single(adx_line.clone())
            .with_metric(IndicatorMetric::Adx, adx_line)
            .with_metric(IndicatorMetric::DiPlus, series.di_plus)
            .with_metric(IndicatorMetric::DiMinus, series.di_minus)
    }
}
