//! RSI signal: crosses and stays around a threshold.

use super::{IndicatorOutputs, IndicatorSignal};
use crate::domain::OhlcSeries;
use crate::indicators::{last, rsi};
use crate::model::{RsiAction, RsiConfig};

impl RsiConfig {
    fn line(&self, closes: &[f64]) -> Vec<f64> {
        rsi(closes, self.effective_period(), self.smoothing.into())
    }
}

impl IndicatorSignal for RsiConfig {
    fn lookback(&self) -> usize {
        self.effective_period() + 2
    }

    fn signal(&self, ohlc: &OhlcSeries) -> bool {
        let line = self.line(&ohlc.closes);
        let (r0, r1) = (last(&line, 0), last(&line, 1));
        if !r0.is_finite() {
            return false;
        }
        let th = self.effective_threshold();
        if self.actions.is_empty() {
            return r0 > th;
        }
        self.actions.iter().any(|action| match action {
            RsiAction::CrossAbove => r1.is_finite() && r1 <= th && r0 > th,
            RsiAction::CrossBelow => r1.is_finite() && r1 >= th && r0 < th,
            RsiAction::StayAbove => r0 > th,
            RsiAction::StayBelow => r0 < th,
        })
    }

    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs {
        IndicatorOutputs::single(self.line(&ohlc.closes))
    }
}
