//! Bar-by-bar replay of a condition tree over a candle history.
//!
//! At bar `i` the tree sees only `candles[..=i]`: the series are built from
//! that prefix and the context's current/previous candles are its last two
//! bars. Nothing after bar `i` can influence the record for bar `i`.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use condlab_core::algebra::collect_action_nodes;
use condlab_core::domain::{Candle, OhlcSeries};
use condlab_core::eval::{evaluate_with_trace, EvaluateOptions, EvaluationContext};
use condlab_core::fingerprint::{tree_fingerprint, TreeFingerprint};
use condlab_core::intents::{intents_from_evaluation, ActionIntent};
use condlab_core::model::IndicatorConditions;
use condlab_core::signals::{build_numeric_series, required_lookback};

/// Schema version stamped on every report.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayOptions {
    /// First bar to evaluate. Defaults to the first bar whose prefix holds
    /// the tree's lookback.
    pub start: Option<usize>,
    /// Build action intents on passing bars.
    pub with_intents: bool,
    /// Forced indicator signals, applied on every bar.
    pub signals: HashMap<String, bool>,
}

/// Outcome of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub index: usize,
    pub timestamp: i64,
    pub result: bool,
    /// Ids of every node that evaluated true, sorted.
    pub passed_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<ActionIntent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub schema_version: u32,
    pub fingerprint: TreeFingerprint,
    pub lookback: usize,
    pub start: usize,
    pub bars: usize,
    pub records: Vec<ReplayRecord>,
}

impl ReplayReport {
    /// Number of bars on which the root passed.
    pub fn pass_count(&self) -> usize {
        self.records.iter().filter(|r| r.result).count()
    }
}

/// First bar replay evaluates.
///
/// With a history shorter than the lookback, replay still starts at bar 1
/// (the first bar with a predecessor) so every bar but the first is recorded.
pub fn start_index(lookback: usize, len: usize, requested: Option<usize>) -> usize {
    let wanted = requested.unwrap_or(lookback.saturating_sub(1));
    if wanted < len {
        wanted
    } else {
        1.min(len)
    }
}

/// Replay one tree over a candle history.
pub fn replay(
    conditions: &IndicatorConditions,
    candles: &[Candle],
    template: &EvaluationContext,
    opts: &ReplayOptions,
) -> ReplayReport {
    let fingerprint = tree_fingerprint(conditions);
    let lookback = required_lookback(conditions);
    let start = start_index(lookback, candles.len(), opts.start);
    let wants_intents = opts.with_intents && !collect_action_nodes(&conditions.root).is_empty();
    let signals = (!opts.signals.is_empty()).then_some(&opts.signals);

    let mut history = OhlcSeries::from_candles(&candles[..start.min(candles.len())]);
    let mut records = Vec::with_capacity(candles.len().saturating_sub(start));
    for (index, candle) in candles.iter().enumerate().skip(start) {
        history.push(candle);
        let prefix = &candles[..=index];
        let ctx = template.clone().with_candles(prefix);
        let mut eval_opts = EvaluateOptions::default().with_history(&history);
        if let Some(signals) = signals {
            eval_opts = eval_opts.with_signals(signals);
        }
        let evaluation = evaluate_with_trace(conditions, &ctx, eval_opts);

        let intents = if wants_intents && evaluation.result {
            let series = build_numeric_series(conditions, &history);
            intents_from_evaluation(conditions, &evaluation, &series, None)
        } else {
            Vec::new()
        };
        records.push(ReplayRecord {
            index,
            timestamp: candle.timestamp,
            result: evaluation.result,
            passed_ids: evaluation.passed_ids(),
            intents,
        });
    }

    let report = ReplayReport {
        schema_version: SCHEMA_VERSION,
        fingerprint,
        lookback,
        start,
        bars: candles.len(),
        records,
    };
    info!(
        fingerprint = report.fingerprint.short(12),
        lookback,
        start,
        evaluated = report.records.len(),
        passed = report.pass_count(),
        "replay finished"
    );
    report
}

/// Replay independent trees over the same history in parallel.
///
/// Reports come back in input order.
pub fn replay_many(
    trees: &[IndicatorConditions],
    candles: &[Candle],
    template: &EvaluationContext,
    opts: &ReplayOptions,
) -> Vec<ReplayReport> {
    debug!(trees = trees.len(), bars = candles.len(), "batch replay");
    trees
        .par_iter()
        .map(|tree| replay(tree, candles, template, opts))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use condlab_core::model::{
        CandleCondition, CandleLeaf, ConditionNode, GroupNode, IndicatorEntry, IndicatorLeaf, IndicatorSpec,
        LogicalOperator, MaConfig,
    };

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 1_000 + i as i64,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1.0,
            })
            .collect()
    }

    fn close_over(target_value: f64) -> IndicatorConditions {
        IndicatorConditions::new(ConditionNode::Group(GroupNode {
            id: "root".into(),
            operator: LogicalOperator::And,
            children: vec![ConditionNode::Candle(CandleLeaf {
                id: "c".into(),
                candle: CandleCondition {
                    enabled: true,
                    target_value,
                    ..CandleCondition::default()
                },
            })],
        }))
    }

    #[test]
    fn start_index_rules() {
        assert_eq!(start_index(50, 100, None), 49);
        assert_eq!(start_index(50, 20, None), 1);
        assert_eq!(start_index(50, 100, Some(5)), 5);
        assert_eq!(start_index(50, 1, None), 1);
        assert_eq!(start_index(50, 0, None), 0);
    }

    #[test]
    fn short_history_records_every_bar_after_the_first() {
        let bars = candles(&[1.0, 5.0, 2.0, 6.0]);
        let report = replay(&close_over(3.0), &bars, &EvaluationContext::default(), &ReplayOptions::default());
        assert_eq!(report.start, 1);
        let results: Vec<bool> = report.records.iter().map(|r| r.result).collect();
        assert_eq!(results, vec![true, false, true]);
        assert_eq!(report.records[0].passed_ids, vec!["c".to_string(), "root".to_string()]);
        assert_eq!(report.pass_count(), 2);
    }

    #[test]
    fn empty_history_yields_no_records() {
        let report = replay(&close_over(3.0), &[], &EvaluationContext::default(), &ReplayOptions::default());
        assert!(report.records.is_empty());
    }

    #[test]
    fn prefix_evaluation_has_no_lookahead() {
        let tree = IndicatorConditions::new(ConditionNode::Group(GroupNode {
            id: "root".into(),
            operator: LogicalOperator::And,
            children: vec![ConditionNode::Indicator(IndicatorLeaf {
                id: "ma".into(),
                indicator: IndicatorEntry::new(
                    "ind",
                    IndicatorSpec::Ma(MaConfig {
                        period: 3,
                        ..MaConfig::default()
                    }),
                ),
                comparison: Default::default(),
            })],
        }));
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let full = candles(&closes);
        let opts = ReplayOptions {
            start: Some(10),
            ..ReplayOptions::default()
        };
        let whole = replay(&tree, &full, &EvaluationContext::default(), &opts);
        let cut = replay(&tree, &full[..40], &EvaluationContext::default(), &opts);
        assert_eq!(&whole.records[..cut.records.len()], &cut.records[..]);
    }

    #[test]
    fn batch_matches_sequential() {
        let bars = candles(&[1.0, 5.0, 2.0, 6.0, 4.0]);
        let trees = vec![close_over(3.0), close_over(4.5), close_over(0.0)];
        let ctx = EvaluationContext::default();
        let batch = replay_many(&trees, &bars, &ctx, &ReplayOptions::default());
        assert_eq!(batch.len(), 3);
        for (tree, report) in trees.iter().zip(&batch) {
            assert_eq!(report, &replay(tree, &bars, &ctx, &ReplayOptions::default()));
        }
        assert_eq!(batch[2].pass_count(), 4);
    }

    #[test]
    fn forced_signals_apply_on_every_bar() {
        let tree = IndicatorConditions::new(ConditionNode::Group(GroupNode {
            id: "root".into(),
            operator: LogicalOperator::And,
            children: vec![ConditionNode::Indicator(IndicatorLeaf {
                id: "ma".into(),
                indicator: IndicatorEntry::new("ind", IndicatorSpec::Ma(MaConfig::default())),
                comparison: Default::default(),
            })],
        }));
        let bars = candles(&[1.0, 2.0, 3.0]);
        let opts = ReplayOptions {
            signals: [("ma".to_string(), true)].into_iter().collect(),
            ..ReplayOptions::default()
        };
        let report = replay(&tree, &bars, &EvaluationContext::default(), &opts);
        assert!(report.records.iter().all(|r| r.result));
    }
}
