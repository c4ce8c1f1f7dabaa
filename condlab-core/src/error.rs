//! Errors raised at the parsing boundary of the model.
//!
//! Tree-shape problems are never errors: `normalize` repairs them. These
//! variants cover input that cannot be read as a tree at all.

use thiserror::Error;

use crate::model::IndicatorKind;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown indicator type '{0}'")]
    UnknownIndicator(String),

    #[error("invalid {kind} config: {source}")]
    InvalidConfig {
        kind: IndicatorKind,
        #[source]
        source: serde_json::Error,
    },
}
