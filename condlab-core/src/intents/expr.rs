//! Price reference expressions.
//!
//! Grammar: `expr:<op>:<a>[:<b>][:key=value...]`. Anything without the
//! `expr:` prefix names an indicator leaf directly.
//!
//! | op | operands | keys |
//! |---|---|---|
//! | `cross` | a, b | `dir=up\|down\|both`, `when=recent\|previous`, `interp=linear` |
//! | `min`, `max`, `avg`, `ratio` | a, b | |
//! | `offset` | a | `pct=<number>` (default 0) |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFIX: &str = "expr:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    Up,
    Down,
    #[default]
    Both,
}

/// Which crossing, counting back from the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossWhen {
    #[default]
    Recent,
    Previous,
}

/// How the crossing price is derived from the two series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// `(a + b) / 2` on the crossing bar.
    #[default]
    Mid,
    /// Intersection of the two segments between the crossing bar and the one before.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairOp {
    Min,
    Max,
    Avg,
    Ratio,
}

impl PairOp {
    fn as_str(self) -> &'static str {
        match self {
            PairOp::Min => "min",
            PairOp::Max => "max",
            PairOp::Avg => "avg",
            PairOp::Ratio => "ratio",
        }
    }
}

/// Parsed price reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExprRef {
    Indicator {
        id: String,
    },
    Cross {
        a: String,
        b: String,
        dir: CrossDirection,
        when: CrossWhen,
        interp: Interpolation,
    },
    Pair {
        op: PairOp,
        a: String,
        b: String,
    },
    Offset {
        a: String,
        pct: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("empty price reference")]
    Empty,

    #[error("unknown expression op '{0}'")]
    UnknownOp(String),

    #[error("'{op}' needs operand {operand}")]
    MissingOperand { op: String, operand: &'static str },

    #[error("invalid value '{value}' for key '{key}'")]
    InvalidKey { key: String, value: String },
}

/// Strictly parse a price reference.
pub fn parse_expr_ref(input: &str) -> Result<ExprRef, ExprError> {
    if input.is_empty() {
        return Err(ExprError::Empty);
    }
    let Some(body) = input.strip_prefix(PREFIX) else {
        return Ok(ExprRef::Indicator { id: input.to_string() });
    };

    let mut parts = body.split(':');
    let op = parts.next().unwrap_or_default();
    let a = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let mut b: Option<String> = None;
    let mut keys: HashMap<&str, &str> = HashMap::new();
    for segment in parts {
        match segment.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                keys.insert(key, value);
            }
            _ if b.is_none() && !segment.is_empty() => b = Some(segment.to_string()),
            _ => {}
        }
    }

    let missing = |operand| ExprError::MissingOperand {
        op: op.to_string(),
        operand,
    };
    match op {
        "cross" => {
            let a = a.ok_or_else(|| missing("a"))?;
            let b = b.ok_or_else(|| missing("b"))?;
            let dir = match keys.get("dir").copied() {
                None | Some("both") => CrossDirection::Both,
                Some("up") => CrossDirection::Up,
                Some("down") => CrossDirection::Down,
                Some(other) => return Err(invalid("dir", other)),
            };
            let when = match keys.get("when").copied() {
                None | Some("recent") => CrossWhen::Recent,
                Some("previous") => CrossWhen::Previous,
                Some(other) => return Err(invalid("when", other)),
            };
            let interp = match keys.get("interp").copied() {
                Some("linear") => Interpolation::Linear,
                _ => Interpolation::Mid,
            };
            Ok(ExprRef::Cross { a, b, dir, when, interp })
        }
        "min" | "max" | "avg" | "ratio" => {
            let pair = match op {
                "min" => PairOp::Min,
                "max" => PairOp::Max,
                "avg" => PairOp::Avg,
                _ => PairOp::Ratio,
            };
            let a = a.ok_or_else(|| missing("a"))?;
            let b = b.ok_or_else(|| missing("b"))?;
            Ok(ExprRef::Pair { op: pair, a, b })
        }
        "offset" => {
            let a = a.ok_or_else(|| missing("a"))?;
            let raw = keys.get("pct").copied().unwrap_or("0");
            let pct = raw
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| invalid("pct", raw))?;
            Ok(ExprRef::Offset { a, pct })
        }
        other => Err(ExprError::UnknownOp(other.to_string())),
    }
}

fn invalid(key: &str, value: &str) -> ExprError {
    ExprError::InvalidKey {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl FromStr for ExprRef {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_expr_ref(s)
    }
}

impl fmt::Display for ExprRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprRef::Indicator { id } => f.write_str(id),
            ExprRef::Cross { a, b, dir, when, interp } => {
                let dir = match dir {
                    CrossDirection::Up => "up",
                    CrossDirection::Down => "down",
                    CrossDirection::Both => "both",
                };
                let when = match when {
                    CrossWhen::Recent => "recent",
                    CrossWhen::Previous => "previous",
                };
                write!(f, "{PREFIX}cross:{a}:{b}:dir={dir}:when={when}")?;
                if *interp == Interpolation::Linear {
                    f.write_str(":interp=linear")?;
                }
                Ok(())
            }
            ExprRef::Pair { op, a, b } => write!(f, "{PREFIX}{}:{a}:{b}", op.as_str()),
            ExprRef::Offset { a, pct } => write!(f, "{PREFIX}offset:{a}:pct={pct}"),
        }
    }
}
