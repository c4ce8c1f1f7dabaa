//! Account and position status metrics.

use serde::{Deserialize, Serialize};

/// Runtime metric a status leaf compares against a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusMetric {
    ProfitRate,
    Margin,
    BuyCount,
    EntryAge,
    WalletBalance,
    InitialMarginRate,
    UnrealizedPnl,
    PositionSize,
}

impl StatusMetric {
    /// Parse the persisted name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// Unit assumed when a leaf carries none.
    pub fn default_unit(self) -> StatusUnit {
        match self {
            StatusMetric::ProfitRate | StatusMetric::InitialMarginRate => StatusUnit::Percent,
            StatusMetric::BuyCount => StatusUnit::Count,
            StatusMetric::EntryAge => StatusUnit::Days,
            StatusMetric::Margin
            | StatusMetric::WalletBalance
            | StatusMetric::UnrealizedPnl
            | StatusMetric::PositionSize => StatusUnit::Usdt,
        }
    }

    /// Metrics denominated in a quote asset.
    pub fn is_money(self) -> bool {
        matches!(
            self,
            StatusMetric::Margin
                | StatusMetric::WalletBalance
                | StatusMetric::UnrealizedPnl
                | StatusMetric::PositionSize
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusUnit {
    #[serde(rename = "percent")]
    Percent,
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "days")]
    Days,
    #[serde(rename = "hours")]
    Hours,
    #[serde(rename = "minutes")]
    Minutes,
}

impl StatusUnit {
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// Quote asset for money units.
    pub fn asset(self) -> Option<QuoteAsset> {
        match self {
            StatusUnit::Usdt => Some(QuoteAsset::Usdt),
            StatusUnit::Usdc => Some(QuoteAsset::Usdc),
            _ => None,
        }
    }
}

/// Stablecoin a money amount is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuoteAsset {
    #[default]
    #[serde(rename = "USDT")]
    Usdt,
    #[serde(rename = "USDC")]
    Usdc,
}
