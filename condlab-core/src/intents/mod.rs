//! Action intents: what the armed action leaves of a satisfied tree would do.
//!
//! [`build_action_intents`] resolves each armed action into an
//! [`ActionIntent`] (kind, order type, price, declared amount).
//! [`materialize_orders`] sizes and rounds intents against market rules.

pub mod builder;
pub mod expr;
pub mod planner;
pub mod resolver;

pub use builder::{build_action_intents, intents_from_evaluation, ActionIntent, ActionKind, IntentAmount, PriceResolution};
pub use expr::{parse_expr_ref, CrossDirection, CrossWhen, ExprError, ExprRef, Interpolation, PairOp};
pub use planner::{
    apply_precision, materialize_orders, quantity_by_notional, MarketConstraints, OrderSide, PlannedOrder,
    PlannedOrderType, PlannerOptions, RoundingMode, RuntimeAmounts, Sizing,
};
pub use resolver::resolve_price_from_ref;
