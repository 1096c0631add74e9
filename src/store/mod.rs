//! Graph store.
//!
//! Owns every node and relationship of the movie graph and the adjacency
//! indices over them.
//!
//! ## Modules
//!
//! - [`models`]: Node/relationship vocabulary, ids, attributes, snapshot types
//! - [`graph`]: `GraphStore` arena with insertion, cascade removal, compaction, neighbor lookup
//! - [`collaboration`]: derived COLLABORATED_WITH index (cached, invalidated on change)
//! - [`shared`]: `SharedGraph` single-writer / multi-reader handle
//! - [`snapshot`]: JSON export/import for external persistence

pub mod collaboration;
pub mod graph;
pub mod models;
pub mod shared;
pub mod snapshot;

pub use collaboration::{Collaboration, CollaborationIndex};
pub use graph::{CompactionStats, GraphStore, Neighbors};
pub use models::{
    attrs, AttrValue, Attributes, Direction, EntityRef, GraphSnapshot, Node, NodeId, NodeKind,
    RelKind, Relationship, RelationshipId, RelationshipRecord,
};
pub use shared::SharedGraph;
pub use snapshot::{load_snapshot, save_snapshot};
