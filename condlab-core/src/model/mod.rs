//! Condition-tree model: node types, per-indicator configs, action templates,
//! factories, the executable plan and legacy import/export.

pub mod action;
pub mod comparison;
pub mod factory;
pub mod indicator;
pub mod legacy;
pub mod node;
pub mod plan;
pub mod status;

pub use action::{
    ActionConfig, AmountMode, BuyOrderConfig, LimitPriceMode, OrderType, PositionSide,
    SellAmountMode, SellOrderConfig, StopLossConfig, StopPriceMode, WalletBasis, WorkingType,
};
pub use comparison::{CandleCondition, Comparator, Comparison, IndicatorMetric, EQ_TOLERANCE};
pub use factory::{create_indicator_conditions, NodeFactory, DEFAULT_ROOT_ID};
pub use indicator::{
    AdxVsDi, BollingerAction, BollingerBand, BollingerConfig, DiComparison, DmiConfig,
    HistogramAction, IndicatorEntry, IndicatorKind, IndicatorSpec, MaAction, MaConfig,
    MacdComparison, MacdConfig, RsiAction, RsiConfig, RsiSmoothing, ThresholdCondition,
};
pub use legacy::{conditions_from_value, migrate_legacy, to_legacy_view, LegacyEntry, LegacyView};
pub use node::{
    ActionLeaf, CandleLeaf, ConditionNode, GroupNode, IndicatorConditions, IndicatorLeaf,
    LogicalOperator, StatusLeaf,
};
pub use plan::{to_executable_plan, ExecutablePlan, PlannedAction, PlannedCandle, PlannedGroup};
pub use status::{QuoteAsset, StatusMetric, StatusUnit};
