//! # Digest-Time Value Representation
//!
//! A small [`Value`] enum used only while the equation hierarchy is being
//! digested — constant folding (stage 10), unit/type checking (stage 9,
//! 17), and exponent inference (stage 18) all operate on literals pulled
//! out of expression text via this type. It is *not* the representation the
//! emitted code uses at run time: code generation lowers `Scalar → T`, `Matrix →
//! Matrix<T>`/`MatrixFixed<T,R,C>`, `Text → String` directly, bypassing this
//! enum entirely.
//!
//! [`fixed`] holds the fixed-point arithmetic helpers used by exponent
//! inference and by integration shift during code generation.

pub mod fixed;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value recognized during digest, with a best-effort runtime
/// [`crate::ast::VarType`] classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(f64),
    /// Row-major dense matrix; `(rows, cols)` is `(data.len() / cols, cols)`.
    Matrix { rows: usize, cols: usize, data: Vec<f64> },
    Text(String),
    /// Not yet constant-foldable (depends on a non-constant variable).
    Unknown,
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn var_type(&self) -> crate::ast::VarType {
        match self {
            Value::Scalar(_) => crate::ast::VarType::Scalar,
            Value::Matrix { .. } => crate::ast::VarType::Matrix,
            Value::Text(_) => crate::ast::VarType::Text,
            Value::Unknown => crate::ast::VarType::Scalar,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Value::Unknown)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::Matrix { rows, cols, .. } => write!(f, "<matrix {rows}x{cols}>"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Unknown => write!(f, "<unknown>"),
        }
    }
}

/// Parse a bare numeric literal, the way constant folding (stage 10)
/// recognizes leaves of an expression tree. Returns `None` for anything
/// that isn't a plain decimal/scientific-notation number (variable
/// references, function calls, etc. stay `Value::Unknown` upstream).
pub fn parse_numeric_literal(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok()
}
