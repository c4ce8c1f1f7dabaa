//! Boolean evaluation of condition trees.

pub mod context;
pub mod evaluator;

pub use context::{EvaluationContext, Money, PositionDirection, StatusMetrics};
pub use evaluator::{evaluate, evaluate_with_trace, EvaluateOptions, EvaluationResult, EvaluationTrace};
