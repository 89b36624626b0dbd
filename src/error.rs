use core::fmt;

use thiserror::Error;

/// Errors reported by tree operations.
///
/// A missing key or a duplicate insert is not an error; those are ordinary `Option` results.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A rotation was asked to lift a node that lacks the ancestors it needs.
    #[error("cannot perform rotation {rotation}: node has no {missing}")]
    StructuralPrecondition {
        rotation: &'static str,
        missing: &'static str,
    },

    /// The tree changed structurally while a cursor was enumerating it.
    #[error("tree was modified during enumeration (generation {expected}, now {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    /// Keys were found out of order where a sorted subtree was required.
    #[error("search order violated: {0}")]
    IntegrityViolation(String),
}

impl TreeError {
    pub(crate) fn no_parent(rotation: &'static str) -> TreeError {
        TreeError::StructuralPrecondition {
            rotation,
            missing: "parent",
        }
    }

    pub(crate) fn no_grandparent(rotation: &'static str) -> TreeError {
        TreeError::StructuralPrecondition {
            rotation,
            missing: "grandparent",
        }
    }

    pub(crate) fn misordered<K: fmt::Debug + ?Sized>(before: &K, after: &K) -> TreeError {
        TreeError::IntegrityViolation(format!("{before:?} is not less than {after:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            TreeError::no_grandparent("LR").to_string(),
            "cannot perform rotation LR: node has no grandparent"
        );
        assert_eq!(
            TreeError::ConcurrentModification {
                expected: 3,
                found: 5
            }
            .to_string(),
            "tree was modified during enumeration (generation 3, now 5)"
        );
        assert_eq!(
            TreeError::IntegrityViolation("7 precedes 4".into()).to_string(),
            "search order violated: 7 precedes 4"
        );
    }
}
