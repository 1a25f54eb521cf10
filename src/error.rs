//! Crate-wide error types.
//!
//! One `thiserror` enum per compiler phase. Digest errors carry a
//! [`NodePath`] so failures can be reported against the part hierarchy
//! rather than a bare message; runtime errors distinguish recoverable
//! conditions (fall back and warn) from the `AbortRun` case that
//! terminates the whole pipeline.

use std::fmt;
use thiserror::Error;

/// Dotted path to an [`crate::ast::EquationSet`] or [`crate::ast::Variable`],
/// e.g. `Compartment.sub.x`. Used purely for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath(pub Vec<String>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn push(&self, segment: impl Into<String>) -> Self {
        let mut parts = self.0.clone();
        parts.push(segment.into());
        NodePath(parts)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// Kind of failure raised during [`crate::digest`] analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestErrorKind {
    UnresolvedReference,
    AmbiguousDownReference,
    UnitMismatch,
    TypeInconsistency,
    ExponentUnderdetermined,
    IllFormedTypeExpression,
    UnfulfilledConnectionBinding,
    DynamicFileNameNotString,
}

impl fmt::Display for DigestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DigestErrorKind::UnresolvedReference => "unresolved reference",
            DigestErrorKind::AmbiguousDownReference => "ambiguous down-reference",
            DigestErrorKind::UnitMismatch => "unit mismatch",
            DigestErrorKind::TypeInconsistency => "type inconsistency",
            DigestErrorKind::ExponentUnderdetermined => "exponent underdetermined",
            DigestErrorKind::IllFormedTypeExpression => "ill-formed $type expression",
            DigestErrorKind::UnfulfilledConnectionBinding => {
                "unfulfilled connection binding during $type transition"
            }
            DigestErrorKind::DynamicFileNameNotString => "dynamic file name is not a string expression",
        };
        write!(f, "{s}")
    }
}

/// Error raised while digesting the equation hierarchy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {path}: {message}")]
pub struct DigestError {
    pub kind: DigestErrorKind,
    pub path: NodePath,
    pub message: String,
}

impl DigestError {
    pub fn new(kind: DigestErrorKind, path: NodePath, message: impl Into<String>) -> Self {
        DigestError {
            kind,
            path,
            message: message.into(),
        }
    }
}

/// Error raised while planning connection enumeration strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("connection {0} has no resolvable endpoint for alias {1}")]
    UnresolvedEndpoint(String, String),

    #[error("connection {0} mixes nearest-neighbor and sparse-matrix bindings, which is unsupported")]
    ConflictingStrategy(String),
}

/// Error raised while emitting source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("part {0} has no BackendData; digest must run before emission")]
    MissingBackendData(String),

    #[error("variable {0} in part {1} has no resolvable storage type")]
    UnresolvedStorageType(String, String),
}

/// Error raised while the generated simulation is running.
///
/// `Fatal` variants abort cooperatively; the others are logged to stderr and
/// the operation returns a safe default instead of propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("malformed input matrix in {0}, falling back to 1x1 zero")]
    IllFormedInputMatrix(String),

    #[error("missing input file: {0}")]
    MissingInputFile(String),

    #[error("image format not found for {0}, falling back to BMP")]
    ImageFormatNotFound(String),

    #[error("arithmetic trap (divide-by-zero or overflow) during simulation")]
    ArithmeticTrap,

    #[error("{0}")]
    Fatal(String),
}

/// Top-level abort surfaced from digest or code generation.
///
/// The driver binary catches this, writes `failure` to the sentinel file
/// named by the job, and preserves whatever logs were already flushed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("aborted: {0}")]
pub struct AbortRun(pub String);

impl From<DigestError> for AbortRun {
    fn from(e: DigestError) -> Self {
        AbortRun(e.to_string())
    }
}

impl From<PlanError> for AbortRun {
    fn from(e: PlanError) -> Self {
        AbortRun(e.to_string())
    }
}

impl From<EmitError> for AbortRun {
    fn from(e: EmitError) -> Self {
        AbortRun(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_renders_dotted() {
        let path = NodePath::root().push("Compartment").push("sub").push("x");
        assert_eq!(path.to_string(), "Compartment.sub.x");
    }

    #[test]
    fn empty_path_renders_root() {
        assert_eq!(NodePath::root().to_string(), "<root>");
    }

    #[test]
    fn digest_error_display_includes_path_and_message() {
        let err = DigestError::new(
            DigestErrorKind::UnresolvedReference,
            NodePath::root().push("A").push("B"),
            "no such variable `q`",
        );
        let rendered = err.to_string();
        assert!(rendered.contains("A.B"));
        assert!(rendered.contains("no such variable"));
    }
}
