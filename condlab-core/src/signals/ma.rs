//! Moving-average signal: close vs SMA(period).

use super::{IndicatorOutputs, IndicatorSignal};
use crate::domain::OhlcSeries;
use crate::indicators::{last, sma};
use crate::model::{MaAction, MaConfig};

impl IndicatorSignal for MaConfig {
    fn lookback(&self) -> usize {
        self.effective_period()
    }

    /// Any configured action passing is enough; with no actions the signal
    /// is `close > MA`.
    fn signal(&self, ohlc: &OhlcSeries) -> bool {
        let closes = &ohlc.closes;
        let ma = sma(closes, self.effective_period());
        let (c0, c1) = (last(closes, 0), last(closes, 1));
        let (m0, m1) = (last(&ma, 0), last(&ma, 1));
        if !c0.is_finite() || !m0.is_finite() {
            return false;
        }
        if self.actions.is_empty() {
            return c0 > m0;
        }
        let prev_ok = c1.is_finite() && m1.is_finite();
        self.actions.iter().any(|action| match action {
            MaAction::BreakAbove => prev_ok && c1 <= m1 && c0 > m0,
            MaAction::BreakBelow => prev_ok && c1 >= m1 && c0 < m0,
            MaAction::StayAbove => c0 > m0,
            MaAction::StayBelow => c0 < m0,
        })
    }

    fn outputs(&self, ohlc: &OhlcSeries) -> IndicatorOutputs {
        IndicatorOutputs::single(sma(&ohlc.closes, self.effective_period()))
    }
}
