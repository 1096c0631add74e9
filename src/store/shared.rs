//! Shared handle enforcing single-writer / multiple-reader access.
//!
//! A mutation holds the write lock for its whole duration and excludes all
//! readers. Analytics hold a read guard for one computation, so any number
//! of them can run concurrently against the same snapshot.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::graph::GraphStore;
use super::models::{Attributes, EntityRef, Node, NodeId, NodeKind, RelKind, RelationshipId};
use crate::error::Result;

/// Cloneable, thread-safe handle to one [`GraphStore`].
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<GraphStore>>,
}

impl SharedGraph {
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Read snapshot; blocks while a mutation is in flight.
    pub fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.inner.read()
    }

    /// Exclusive access for a batch of mutations.
    pub fn write(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.inner.write()
    }

    pub fn add_node(
        &self,
        id: impl Into<NodeId>,
        kind: NodeKind,
        attributes: Attributes,
    ) -> Result<()> {
        self.write().add_node(id, kind, attributes)
    }

    pub fn add_relationship(
        &self,
        kind: RelKind,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        attributes: Attributes,
    ) -> Result<RelationshipId> {
        self.write().add_relationship(kind, source, target, attributes)
    }

    pub fn remove_node(&self, id: &NodeId) -> Result<Node> {
        self.write().remove_node(id)
    }

    pub fn update_attributes(&self, target: impl Into<EntityRef>, patch: Attributes) -> Result<()> {
        self.write().update_attributes(target, patch)
    }
}

impl From<GraphStore> for SharedGraph {
    fn from(store: GraphStore) -> Self {
        Self::new(store)
    }
}
