//! Derive order intents from the armed action leaves of a tree.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::resolver::resolve_price_from_ref;
use crate::eval::{evaluate_with_trace, EvaluateOptions, EvaluationContext, EvaluationResult};
use crate::model::{
    to_executable_plan, ActionConfig, AmountMode, BuyOrderConfig, IndicatorConditions, LimitPriceMode,
    OrderType, QuoteAsset, SellOrderConfig, StopLossConfig, StopPriceMode, WalletBasis,
};
use crate::signals::SeriesMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Buy,
    Sell,
    #[serde(rename = "stoploss")]
    StopLoss,
}

/// Outcome of price resolution for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PriceResolution {
    /// Market orders carry no price.
    #[default]
    NotApplicable,
    Resolved(f64),
    /// A price was required but the input or reference gave none.
    Unresolved,
}

impl PriceResolution {
    fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => PriceResolution::Resolved(v),
            _ => PriceResolution::Unresolved,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            PriceResolution::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_unresolved(self) -> bool {
        matches!(self, PriceResolution::Unresolved)
    }
}

/// Declared sizing, carried forward without exchange-side validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentAmount {
    pub mode: AmountMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<QuoteAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_basis: Option<WalletBasis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIntent {
    pub id: String,
    pub group_id: String,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub price: PriceResolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<IntentAmount>,
    /// The action config the intent was built from.
    pub raw: ActionConfig,
}

/// Evaluate the tree and build intents for every action whose enclosing
/// group passed. A false root yields no intents.
pub fn build_action_intents(
    conditions: &IndicatorConditions,
    ctx: &EvaluationContext,
    opts: EvaluateOptions<'_>,
    series: &SeriesMap,
    index: Option<usize>,
) -> Vec<ActionIntent> {
    let evaluation = evaluate_with_trace(conditions, ctx, opts);
    intents_from_evaluation(conditions, &evaluation, series, index)
}

/// Build intents from an evaluation already computed for `conditions`.
pub fn intents_from_evaluation(
    conditions: &IndicatorConditions,
    evaluation: &EvaluationResult,
    series: &SeriesMap,
    index: Option<usize>,
) -> Vec<ActionIntent> {
    if !evaluation.result {
        return Vec::new();
    }
    let intents: Vec<ActionIntent> = to_executable_plan(conditions)
        .actions
        .into_iter()
        .filter(|planned| planned.is_armed(|id| evaluation.passed(id)))
        .map(|planned| {
            let (kind, order_type, price, amount) = match &planned.action {
                ActionConfig::Buy(cfg) => (
                    ActionKind::Buy,
                    Some(cfg.order_type),
                    limit_price(cfg.order_type, cfg.limit_price_mode, cfg.limit_price, cfg.indicator_ref_id.as_deref(), series, index),
                    Some(buy_amount(cfg)),
                ),
                ActionConfig::Sell(cfg) => (
                    ActionKind::Sell,
                    Some(cfg.order_type),
                    limit_price(cfg.order_type, cfg.limit_price_mode, cfg.limit_price, cfg.indicator_ref_id.as_deref(), series, index),
                    Some(sell_amount(cfg)),
                ),
                ActionConfig::StopLoss(cfg) => (ActionKind::StopLoss, None, stop_price(cfg, series, index), None),
            };
            if price.is_unresolved() {
                warn!(action = %planned.id, reference = ?planned.action.indicator_ref_id(), "intent price unresolved");
            }
            ActionIntent {
                id: planned.id,
                group_id: planned.group_id,
                kind,
                order_type,
                price,
                amount,
                raw: planned.action,
            }
        })
        .collect();
    debug!(count = intents.len(), "action intents built");
    intents
}

fn limit_price(
    order_type: OrderType,
    mode: Option<LimitPriceMode>,
    input: Option<f64>,
    reference: Option<&str>,
    series: &SeriesMap,
    index: Option<usize>,
) -> PriceResolution {
    match (order_type, mode) {
        (OrderType::Market, _) => PriceResolution::NotApplicable,
        (OrderType::Limit, Some(LimitPriceMode::Input)) => PriceResolution::from_option(input),
        (OrderType::Limit, _) => PriceResolution::from_option(resolve_price_from_ref(reference, series, index)),
    }
}

fn stop_price(cfg: &StopLossConfig, series: &SeriesMap, index: Option<usize>) -> PriceResolution {
    let value = match cfg.price_mode {
        StopPriceMode::Input => cfg.price,
        StopPriceMode::Indicator | StopPriceMode::Condition => {
            resolve_price_from_ref(cfg.indicator_ref_id.as_deref(), series, index)
        }
    };
    PriceResolution::from_option(value)
}

fn buy_amount(cfg: &BuyOrderConfig) -> IntentAmount {
    IntentAmount {
        mode: cfg.amount_mode,
        asset: cfg.asset,
        value: cfg
            .usdt
            .or(cfg.position_percent)
            .or(cfg.wallet_percent)
            .or(cfg.initial_percent),
        wallet_basis: cfg.wallet_basis,
    }
}

fn sell_amount(cfg: &SellOrderConfig) -> IntentAmount {
    IntentAmount {
        mode: cfg.amount_mode.into(),
        asset: cfg.asset,
        value: cfg.usdt.or(cfg.position_percent),
        wallet_basis: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::{
        ActionLeaf, Comparator, ConditionNode, GroupNode, LogicalOperator, SellAmountMode, StatusLeaf,
        StatusMetric,
    };

    fn action(id: &str, config: ActionConfig) -> ConditionNode {
        ConditionNode::Action(ActionLeaf {
            id: id.into(),
            action: config,
        })
    }

    fn status(id: &str, threshold: f64) -> ConditionNode {
        ConditionNode::Status(StatusLeaf {
            id: id.into(),
            metric: StatusMetric::BuyCount,
            comparator: Comparator::Gte,
            value: threshold,
            unit: None,
        })
    }

    fn group(id: &str, op: LogicalOperator, children: Vec<ConditionNode>) -> ConditionNode {
        ConditionNode::Group(GroupNode {
            id: id.into(),
            operator: op,
            children,
        })
    }

    fn ctx() -> EvaluationContext {
        let mut ctx = EvaluationContext::default();
        ctx.status.buy_count = Some(1.0);
        ctx
    }

    fn build(tree: &IndicatorConditions, series: &SeriesMap) -> Vec<ActionIntent> {
        build_action_intents(tree, &ctx(), EvaluateOptions::default(), series, None)
    }

    #[test]
    fn only_armed_groups_emit() {
        let buy = ActionConfig::Buy(BuyOrderConfig {
            usdt: Some(25.0),
            position_percent: Some(50.0),
            ..BuyOrderConfig::default()
        });
        let sell = ActionConfig::Sell(SellOrderConfig {
            amount_mode: SellAmountMode::PositionPercent,
            position_percent: Some(100.0),
            ..SellOrderConfig::default()
        });
        let tree = IndicatorConditions::new(group(
            "root",
            LogicalOperator::Or,
            vec![
                group("pass", LogicalOperator::And, vec![status("s1", 1.0), action("buy", buy)]),
                group("fail", LogicalOperator::And, vec![status("s2", 5.0), action("sell", sell)]),
            ],
        ));
        let intents = build(&tree, &SeriesMap::new());
        assert_eq!(intents.len(), 1);
        let intent = &intents[0];
        assert_eq!((intent.id.as_str(), intent.group_id.as_str()), ("buy", "pass"));
        assert_eq!(intent.kind, ActionKind::Buy);
        assert_eq!(intent.price, PriceResolution::NotApplicable);
        assert_eq!(intent.amount.and_then(|a| a.value), Some(25.0));
    }

    #[test]
    fn false_root_yields_nothing() {
        let tree = IndicatorConditions::new(group(
            "root",
            LogicalOperator::And,
            vec![status("s", 9.0), action("buy", ActionConfig::Buy(BuyOrderConfig::default()))],
        ));
        assert!(build(&tree, &SeriesMap::new()).is_empty());
    }

    #[test]
    fn limit_and_stop_prices() {
        let series: SeriesMap = [("ma".to_string(), vec![99.0, 101.5])].into_iter().collect();
        let limit_ref = ActionConfig::Buy(BuyOrderConfig {
            order_type: OrderType::Limit,
            limit_price_mode: Some(LimitPriceMode::Indicator),
            indicator_ref_id: Some("ma".into()),
            ..BuyOrderConfig::default()
        });
        let limit_input = ActionConfig::Sell(SellOrderConfig {
            order_type: OrderType::Limit,
            limit_price_mode: Some(LimitPriceMode::Input),
            limit_price: None,
            ..SellOrderConfig::default()
        });
        let stop_dangling = ActionConfig::StopLoss(StopLossConfig {
            price_mode: StopPriceMode::Indicator,
            indicator_ref_id: Some("deleted".into()),
            ..StopLossConfig::default()
        });
        let stop_input = ActionConfig::StopLoss(StopLossConfig {
            price: Some(95.0),
            ..StopLossConfig::default()
        });
        let tree = IndicatorConditions::new(group(
            "root",
            LogicalOperator::And,
            vec![
                action("b", limit_ref),
                action("s", limit_input),
                action("x", stop_dangling),
                action("y", stop_input),
            ],
        ));
        let intents: HashMap<String, ActionIntent> =
            build(&tree, &series).into_iter().map(|i| (i.id.clone(), i)).collect();
        assert_eq!(intents["b"].price, PriceResolution::Resolved(101.5));
        assert_eq!(intents["s"].price, PriceResolution::Unresolved);
        assert_eq!(intents["x"].price, PriceResolution::Unresolved);
        assert_eq!(intents["y"].price, PriceResolution::Resolved(95.0));
        assert_eq!(intents["y"].order_type, None);
        assert!(intents["y"].amount.is_none());
        assert_eq!(intents["y"].group_id, "root");
    }

    #[test]
    fn intent_json_shape() {
        let intent = ActionIntent {
            id: "a".into(),
            group_id: "g".into(),
            kind: ActionKind::StopLoss,
            order_type: None,
            price: PriceResolution::Resolved(10.0),
            amount: None,
            raw: ActionConfig::StopLoss(StopLossConfig::default()),
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["kind"], "stoploss");
        assert_eq!(json["groupId"], "g");
        assert_eq!(json["price"]["status"], "resolved");
        assert_eq!(json["price"]["value"], 10.0);
        let back: ActionIntent = serde_json::from_value(json).unwrap();
        assert_eq!(back, intent);
    }
}
