//! condlab core: condition trees for trading rules.
//!
//! - Candle and id types ([`domain`])
//! - Numeric series library: SMA, EMA, stddev, RSI, MACD, Bollinger, DMI ([`indicators`])
//! - Condition-tree model, factories, executable plan, legacy import/export ([`model`])
//! - Pure tree algebra: normalize, insert/remove/move/duplicate, collect ([`algebra`])
//! - Per-indicator boolean signals and numeric outputs ([`signals`])
//! - Evaluator with per-node trace ([`eval`])
//! - Action intents, price references and the order planner ([`intents`])
//!
//! Everything here is synchronous and free of I/O. Trees are plain owned
//! values; every edit returns a new tree.

pub mod algebra;
pub mod domain;
pub mod error;
pub mod eval;
pub mod fingerprint;
pub mod indicators;
pub mod intents;
pub mod model;
pub mod signals;

pub use error::ModelError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public value types are Send + Sync, so callers can
    /// evaluate independent trees on worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::OhlcSeries>();
        require_sync::<domain::OhlcSeries>();
        require_send::<domain::SeededIds>();
        require_sync::<domain::SeededIds>();

        // Model
        require_send::<model::IndicatorConditions>();
        require_sync::<model::IndicatorConditions>();
        require_send::<model::ConditionNode>();
        require_sync::<model::ConditionNode>();
        require_send::<model::IndicatorSpec>();
        require_sync::<model::IndicatorSpec>();
        require_send::<model::ActionConfig>();
        require_sync::<model::ActionConfig>();
        require_send::<model::ExecutablePlan>();
        require_sync::<model::ExecutablePlan>();
        require_send::<model::LegacyView>();
        require_sync::<model::LegacyView>();

        // Signals and evaluation
        require_send::<signals::SeriesMap>();
        require_sync::<signals::SeriesMap>();
        require_send::<signals::IndicatorOutputs>();
        require_sync::<signals::IndicatorOutputs>();
        require_send::<eval::EvaluationContext>();
        require_sync::<eval::EvaluationContext>();
        require_send::<eval::EvaluationResult>();
        require_sync::<eval::EvaluationResult>();
        require_send::<eval::EvaluateOptions<'static>>();
        require_sync::<eval::EvaluateOptions<'static>>();

        // Intents
        require_send::<intents::ActionIntent>();
        require_sync::<intents::ActionIntent>();
        require_send::<intents::ExprRef>();
        require_sync::<intents::ExprRef>();
        require_send::<intents::PlannedOrder>();
        require_sync::<intents::PlannedOrder>();
        require_send::<intents::MarketConstraints>();
        require_sync::<intents::MarketConstraints>();

        // Errors and fingerprints
        require_send::<ModelError>();
        require_sync::<ModelError>();
        require_send::<intents::ExprError>();
        require_sync::<intents::ExprError>();
        require_send::<fingerprint::TreeFingerprint>();
        require_sync::<fingerprint::TreeFingerprint>();
    }

    /// Indicator signals see only candle history: the trait has no access to
    /// account state.
    #[test]
    fn indicator_signal_takes_only_history() {
        fn _check(sig: &dyn signals::IndicatorSignal, ohlc: &domain::OhlcSeries) -> bool {
            sig.signal(ohlc)
        }
    }
}
