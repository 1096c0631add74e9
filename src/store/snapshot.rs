//! Snapshot export/import.
//!
//! The core defines no persisted layout of its own; a snapshot is the
//! plain node/relationship set handed to or received from an external
//! persistence collaborator. Import replays `add_node`/`add_relationship`
//! so every store invariant is enforced on the way in.

use std::fs;
use std::path::Path;

use super::graph::GraphStore;
use super::models::{GraphSnapshot, RelationshipRecord};
use crate::error::Result;

impl GraphStore {
    /// Export all live nodes and relationships in insertion order.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            relationships: self
                .relationships()
                .map(|rel| RelationshipRecord {
                    kind: rel.kind,
                    source: rel.source.clone(),
                    target: rel.target.clone(),
                    attributes: rel.attributes.clone(),
                })
                .collect(),
        }
    }

    /// Build a store from a snapshot, failing on the first invalid entry.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut store = Self::with_capacity(snapshot.nodes.len(), snapshot.relationships.len());
        for node in snapshot.nodes {
            store.add_node(node.id, node.kind, node.attributes)?;
        }
        for rel in snapshot.relationships {
            store.add_relationship(rel.kind, rel.source, rel.target, rel.attributes)?;
        }
        Ok(store)
    }
}

/// Read a JSON snapshot file into a new store.
pub fn load_snapshot(path: &Path) -> Result<GraphStore> {
    let contents = fs::read_to_string(path)?;
    let snapshot: GraphSnapshot = serde_json::from_str(&contents)?;
    let store = GraphStore::from_snapshot(snapshot)?;
    tracing::info!(
        "Loaded snapshot from {}: {} nodes, {} relationships",
        path.display(),
        store.node_count(),
        store.relationship_count()
    );
    Ok(store)
}

/// Write the store to a pretty-printed JSON snapshot file.
pub fn save_snapshot(store: &GraphStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&store.to_snapshot())?;
    fs::write(path, json)?;
    tracing::info!(
        "Saved snapshot to {}: {} nodes, {} relationships",
        path.display(),
        store.node_count(),
        store.relationship_count()
    );
    Ok(())
}
