//! Order templates carried by action leaves.

use serde::{Deserialize, Serialize};

use super::status::QuoteAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

/// Sizing mode of an order intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountMode {
    #[default]
    Usdt,
    PositionPercent,
    WalletPercent,
    InitialPercent,
    MinNotional,
}

/// The sizing modes a sell order accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellAmountMode {
    #[default]
    Usdt,
    PositionPercent,
    MinNotional,
}

impl From<SellAmountMode> for AmountMode {
    fn from(mode: SellAmountMode) -> Self {
        match mode {
            SellAmountMode::Usdt => AmountMode::Usdt,
            SellAmountMode::PositionPercent => AmountMode::PositionPercent,
            SellAmountMode::MinNotional => AmountMode::MinNotional,
        }
    }
}

/// Which wallet figure a wallet-percent buy is sized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletBasis {
    Wallet,
    Total,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitPriceMode {
    Input,
    Indicator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPriceMode {
    #[default]
    Input,
    Indicator,
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingType {
    MarkPrice,
    ContractPrice,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOrderConfig {
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub amount_mode: AmountMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<QuoteAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usdt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_basis: Option<WalletBasis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price_mode: Option<LimitPriceMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellOrderConfig {
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub amount_mode: SellAmountMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<QuoteAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usdt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price_mode: Option<LimitPriceMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopLossConfig {
    #[serde(default)]
    pub price_mode: StopPriceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recreate_on_missing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_type: Option<WorkingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
}

/// Order template, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionConfig {
    Buy(BuyOrderConfig),
    Sell(SellOrderConfig),
    #[serde(rename = "stoploss")]
    StopLoss(StopLossConfig),
}

impl ActionConfig {
    pub fn reduce_only(&self) -> Option<bool> {
        match self {
            ActionConfig::Buy(c) => c.reduce_only,
            ActionConfig::Sell(c) => c.reduce_only,
            ActionConfig::StopLoss(c) => c.reduce_only,
        }
    }

    pub fn position_side(&self) -> Option<PositionSide> {
        match self {
            ActionConfig::Buy(c) => c.position_side,
            ActionConfig::Sell(c) => c.position_side,
            ActionConfig::StopLoss(c) => c.position_side,
        }
    }

    pub fn working_type(&self) -> Option<WorkingType> {
        match self {
            ActionConfig::StopLoss(c) => c.working_type,
            _ => None,
        }
    }

    /// Indicator reference used for price resolution, if any.
    pub fn indicator_ref_id(&self) -> Option<&str> {
        match self {
            ActionConfig::Buy(c) => c.indicator_ref_id.as_deref(),
            ActionConfig::Sell(c) => c.indicator_ref_id.as_deref(),
            ActionConfig::StopLoss(c) => c.indicator_ref_id.as_deref(),
        }
    }
}
