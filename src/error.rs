//! Error types for the graph store, traversal kernel and analytics.
//!
//! Structural and input errors are fail-fast. `NoPath` is an expected
//! negative result for disconnected queries, not a defect. Algorithmic
//! non-convergence is never an error: results carry a `converged` flag.

use thiserror::Error;

use crate::store::{EntityRef, NodeId, NodeKind, RelKind, RelationshipId};

/// Errors produced by graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A node with this id already exists in the store.
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// The referenced node is not present in the store.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node or relationship targeted by an update or removal is absent.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityRef),

    /// The relationship kind does not accept these endpoint kinds.
    #[error("Incompatible kind: {kind} cannot connect {source_kind} -> {target_kind}")]
    IncompatibleKind {
        kind: RelKind,
        source_kind: NodeKind,
        target_kind: NodeKind,
    },

    /// Source and target are not connected under the traversal filter.
    #[error("No path from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    /// The caller-supplied weight function returned a negative (or NaN) weight.
    #[error("Negative weight {weight} on relationship {relationship}")]
    NegativeWeight {
        relationship: RelationshipId,
        weight: f64,
    },

    /// IO error while reading or writing a snapshot file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error for snapshots.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = GraphError::DuplicateNode(NodeId::from("Inception"));
        assert_eq!(err.to_string(), "Duplicate node: Inception");

        let err = GraphError::IncompatibleKind {
            kind: RelKind::HasGenre,
            source_kind: NodeKind::Person,
            target_kind: NodeKind::Genre,
        };
        assert_eq!(
            err.to_string(),
            "Incompatible kind: HAS_GENRE cannot connect Person -> Genre"
        );

        let err = GraphError::NoPath {
            from: NodeId::from(1),
            to: NodeId::from("E"),
        };
        assert_eq!(err.to_string(), "No path from 1 to E");
    }
}
