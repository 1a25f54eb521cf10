//! Combiner semantics attached to a variable during digest.
//!
//! `Combiner` tags each variable with the algebraic identity its
//! accumulation assignment (`+=`, `*=`, `min=`, `max=`) implies, the way
//! a small algebraic-structure tag lets downstream code pick specialized
//! evaluation without re-deriving it from the assignment operator each
//! time.

use crate::ast::{Assignment, CombinerIdentity};
use serde::{Deserialize, Serialize};

/// Accumulation semantics for a combined variable: which identity its
/// buffer resets to at the start of a cycle, and whether multiple writers
/// require buffering at all (a non-`REPLACE` assignment means the
/// Variable is combined).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combiner {
    pub assignment: Assignment,
    pub identity: CombinerIdentity,
    pub buffered: bool,
}

impl Combiner {
    pub fn from_assignment(assignment: Assignment) -> Self {
        Combiner {
            assignment,
            identity: assignment.identity(),
            buffered: assignment.is_combined(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_is_not_buffered() {
        let c = Combiner::from_assignment(Assignment::Replace);
        assert!(!c.buffered);
        assert_eq!(c.identity, CombinerIdentity::None);
    }

    #[test]
    fn add_is_buffered_with_zero_identity() {
        let c = Combiner::from_assignment(Assignment::Add);
        assert!(c.buffered);
        assert_eq!(c.identity, CombinerIdentity::Zero);
    }
}
