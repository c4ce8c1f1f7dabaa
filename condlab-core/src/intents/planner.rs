//! Order planner: turns intents into exchange-ready order drafts.
//!
//! Prices are rounded to the market's price precision; quantities are sized
//! from the intent's notional and aligned to the quantity precision and
//! minimum quantity. Nothing here talks to an exchange.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::builder::{ActionIntent, ActionKind};
use crate::model::{ActionConfig, AmountMode, OrderType, PositionSide, WorkingType};

/// Slack applied before floor/ceil so values a hair off a step stay on it.
pub const PRECISION_EPSILON: f64 = 1e-8;

pub const REASON_STOP_UNRESOLVED: &str = "stop price unresolved";
pub const REASON_LIMIT_UNRESOLVED: &str = "limit price unresolved";
pub const REASON_MIN_NOTIONAL: &str = "min_notional_aligned";

/// Exchange trading rules for one symbol. Unset or invalid fields are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketConstraints {
    pub price_precision: Option<u32>,
    pub quantity_precision: Option<u32>,
    pub min_notional: Option<f64>,
    pub min_quantity: Option<f64>,
}

/// Account figures percent-based amounts are sized from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeAmounts {
    pub position_notional: Option<f64>,
    pub wallet_balance: Option<f64>,
    pub initial_buy_notional: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerOptions {
    /// Raise orders below the minimum notional up to it.
    pub use_min_notional_fallback: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            use_min_notional_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlannedOrderType {
    Market,
    Limit,
    StopMarket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOrder {
    pub id: String,
    pub group_id: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: PlannedOrderType,
    pub price: Option<f64>,
    pub stop_price: Option<f64>,
    pub quantity: Option<f64>,
    pub notional: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_type: Option<WorkingType>,
    pub raw: ActionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Floor,
    Ceil,
    Round,
}

/// Largest decimal precision with a finite `10^p` in f64.
const MAX_PRECISION: i32 = 308;

/// Round `value` to `precision` decimal places. Non-finite values and an
/// absent precision pass through unchanged.
pub fn apply_precision(value: f64, precision: Option<u32>, mode: RoundingMode) -> f64 {
    let Some(p) = precision else {
        return value;
    };
    if !value.is_finite() {
        return value;
    }
    let Some(exp) = i32::try_from(p).ok().filter(|p| *p <= MAX_PRECISION) else {
        return value;
    };
    let factor = 10f64.powi(exp);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let adjusted = match mode {
        RoundingMode::Floor => (scaled + PRECISION_EPSILON).floor(),
        RoundingMode::Ceil => (scaled - PRECISION_EPSILON).ceil(),
        RoundingMode::Round => scaled.round(),
    };
    adjusted / factor
}

/// Quantity and recomputed notional for a sizing request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sizing {
    pub quantity: Option<f64>,
    pub notional: Option<f64>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Size an order of `notional` at `price`: floor to precision, lift to the
/// (ceil-aligned) minimum quantity, floor again, recompute notional.
pub fn quantity_by_notional(price: f64, notional: f64, min_quantity: Option<f64>, precision: Option<u32>) -> Sizing {
    let (Some(price), Some(notional)) = (positive(Some(price)), positive(Some(notional))) else {
        return Sizing {
            quantity: None,
            notional: positive(Some(notional)),
        };
    };
    let Some(mut quantity) = positive(Some(notional / price)) else {
        return Sizing::default();
    };
    quantity = apply_precision(quantity, precision, RoundingMode::Floor);
    if let Some(min) = positive(min_quantity) {
        let aligned = apply_precision(min, precision, RoundingMode::Ceil);
        if quantity < aligned - PRECISION_EPSILON {
            quantity = aligned;
        }
    }
    let Some(quantity) = positive(Some(apply_precision(quantity, precision, RoundingMode::Floor))) else {
        return Sizing::default();
    };
    let recomputed = quantity * price;
    Sizing {
        quantity: Some(quantity),
        notional: recomputed.is_finite().then_some(recomputed),
    }
}

fn target_notional(intent: &ActionIntent, constraints: &MarketConstraints, runtime: &RuntimeAmounts) -> Option<f64> {
    let amount = intent.amount?;
    let percent_of = |base: Option<f64>| Some(positive(base)? * positive(amount.value)? / 100.0);
    match amount.mode {
        AmountMode::Usdt => positive(amount.value),
        AmountMode::PositionPercent => percent_of(runtime.position_notional),
        AmountMode::WalletPercent => percent_of(runtime.wallet_balance),
        AmountMode::InitialPercent => percent_of(runtime.initial_buy_notional),
        AmountMode::MinNotional => positive(constraints.min_notional),
    }
}

/// Materialize every intent into a planned order, in input order.
pub fn materialize_orders(
    intents: &[ActionIntent],
    constraints: &MarketConstraints,
    last_price: Option<f64>,
    runtime: &RuntimeAmounts,
    options: PlannerOptions,
) -> Vec<PlannedOrder> {
    let min_notional = positive(constraints.min_notional);
    let min_quantity = positive(constraints.min_quantity);
    let round_price = |p: f64| apply_precision(p, constraints.price_precision, RoundingMode::Round);

    intents
        .iter()
        .map(|intent| {
            let mut reason = None;
            let mut price = None;
            let mut stop_price = None;
            let (side, order_type) = match (intent.kind, intent.order_type) {
                (ActionKind::StopLoss, _) => {
                    stop_price = intent.price.value().map(round_price);
                    if stop_price.is_none() {
                        reason = Some(REASON_STOP_UNRESOLVED);
                    }
                    (OrderSide::StopLoss, PlannedOrderType::StopMarket)
                }
                (kind, Some(OrderType::Limit)) => {
                    price = intent.price.value().map(round_price);
                    if price.is_none() {
                        reason = Some(REASON_LIMIT_UNRESOLVED);
                    }
                    (side_of(kind), PlannedOrderType::Limit)
                }
                (kind, _) => (side_of(kind), PlannedOrderType::Market),
            };

            let mut sizing = Sizing::default();
            if intent.kind != ActionKind::StopLoss {
                let reference = match order_type {
                    PlannedOrderType::Market => positive(last_price),
                    _ => positive(price),
                };
                if let (Some(reference), Some(target)) = (reference, target_notional(intent, constraints, runtime)) {
                    sizing = quantity_by_notional(reference, target, min_quantity, constraints.quantity_precision);
                    if let Some(min) = min_notional.filter(|_| options.use_min_notional_fallback) {
                        if sizing.notional.unwrap_or(0.0) < min {
                            sizing = quantity_by_notional(reference, min, min_quantity, constraints.quantity_precision);
                            reason = reason.or(Some(REASON_MIN_NOTIONAL));
                        }
                    }
                }
            }

            debug!(intent = %intent.id, ?side, ?order_type, quantity = ?sizing.quantity, ?reason, "order planned");
            PlannedOrder {
                id: intent.id.clone(),
                group_id: intent.group_id.clone(),
                side,
                order_type,
                price,
                stop_price,
                quantity: sizing.quantity,
                notional: sizing.notional,
                reason: reason.map(str::to_string),
                reduce_only: intent.raw.reduce_only(),
                position_side: intent.raw.position_side(),
                working_type: intent.raw.working_type(),
                raw: intent.raw.clone(),
            }
        })
        .collect()
}

fn side_of(kind: ActionKind) -> OrderSide {
    match kind {
        ActionKind::Buy => OrderSide::Buy,
        ActionKind::Sell => OrderSide::Sell,
        ActionKind::StopLoss => OrderSide::StopLoss,
    }
}
