//! Arena-backed property graph.
//!
//! Nodes and relationships live in flat slot vectors; every cross reference
//! is a slot index resolved through the store. Removed slots become
//! tombstones until they make up half of an arena, at which point the store
//! compacts itself (see [`GraphStore::compact`]). Compaction keeps relative
//! slot order, so insertion order survives it. [`RelationshipId`] handles
//! are mapped to slots and stay valid across compaction.
//!
//! Each node keeps an outgoing and an incoming adjacency list (relationship
//! slots in insertion order), which makes `neighbors` O(degree) in either
//! direction.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::{Copied, Peekable};
use std::slice;
use std::sync::Arc;

use super::collaboration::{Collaboration, CollaborationIndex};
use super::models::{
    Attributes, Direction, EntityRef, Node, NodeId, NodeKind, RelKind, Relationship,
    RelationshipId,
};
use crate::error::{GraphError, Result};

#[derive(Debug, Clone)]
pub(crate) struct NodeSlot {
    pub(crate) node: Node,
    /// Relationship slots, ascending
    pub(crate) outgoing: Vec<usize>,
    pub(crate) incoming: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct RelSlot {
    pub(crate) rel: Relationship,
    pub(crate) source: usize,
    pub(crate) target: usize,
}

/// Arenas smaller than this are never compacted automatically.
const COMPACT_MIN_SLOTS: usize = 64;

/// Result of one [`GraphStore::compact`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionStats {
    pub node_slots_reclaimed: usize,
    pub relationship_slots_reclaimed: usize,
}

impl CompactionStats {
    pub fn is_empty(&self) -> bool {
        self.node_slots_reclaimed == 0 && self.relationship_slots_reclaimed == 0
    }
}

/// In-memory directed multigraph of people, movies and genres.
///
/// The store owns every node and relationship. Algorithms borrow it
/// immutably for the duration of one computation; wrap it in a
/// [`SharedGraph`](super::SharedGraph) to share it across threads.
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Option<NodeSlot>>,
    index: HashMap<NodeId, usize>,
    relationships: Vec<Option<RelSlot>>,
    rel_index: HashMap<RelationshipId, usize>,
    next_relationship: usize,
    generation: u64,
    /// Derived COLLABORATED_WITH index, rebuilt lazily after structural change.
    collaborations: Mutex<Option<Arc<CollaborationIndex>>>,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, relationships: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            index: HashMap::with_capacity(nodes),
            relationships: Vec::with_capacity(relationships),
            rel_index: HashMap::with_capacity(relationships),
            next_relationship: 0,
            generation: 0,
            collaborations: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert a node. Fails with `DuplicateNode` if the id is taken.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        kind: NodeKind,
        attributes: Attributes,
    ) -> Result<()> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let slot = self.nodes.len();
        self.nodes.push(Some(NodeSlot {
            node: Node {
                id: id.clone(),
                kind,
                attributes,
            },
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }));
        self.index.insert(id, slot);
        self.touch(false);
        Ok(())
    }

    /// Insert a relationship between two existing nodes.
    ///
    /// Fails with `UnknownNode` if either endpoint is absent and with
    /// `IncompatibleKind` if the kind does not accept the endpoint kinds.
    /// COLLABORATED_WITH is derived and always rejected.
    pub fn add_relationship(
        &mut self,
        kind: RelKind,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        attributes: Attributes,
    ) -> Result<RelationshipId> {
        let source = source.into();
        let target = target.into();
        let source_slot = self.require_slot(&source)?;
        let target_slot = self.require_slot(&target)?;

        let source_kind = self.slot(source_slot).node.kind;
        let target_kind = self.slot(target_slot).node.kind;
        if !kind.accepts(source_kind, target_kind) {
            return Err(GraphError::IncompatibleKind {
                kind,
                source_kind,
                target_kind,
            });
        }

        let id = RelationshipId(self.next_relationship);
        self.next_relationship += 1;
        let rel_slot = self.relationships.len();
        self.relationships.push(Some(RelSlot {
            rel: Relationship {
                id,
                kind,
                source,
                target,
                attributes,
            },
            source: source_slot,
            target: target_slot,
        }));
        self.rel_index.insert(id, rel_slot);
        self.slot_mut(source_slot).outgoing.push(rel_slot);
        self.slot_mut(target_slot).incoming.push(rel_slot);
        self.touch(kind.is_participation());
        Ok(id)
    }

    /// Remove a node and every relationship incident to it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let slot = self.require_slot(id)?;
        self.index.remove(id);
        let removed = self.nodes[slot]
            .take()
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;

        let mut incident: Vec<usize> = removed
            .outgoing
            .iter()
            .chain(removed.incoming.iter())
            .copied()
            .collect();
        incident.sort_unstable();
        incident.dedup();

        for rel_slot in incident {
            if let Some(rel) = self.relationships[rel_slot].take() {
                self.rel_index.remove(&rel.rel.id);
                // Detach from the surviving endpoint only.
                if rel.source != slot {
                    if let Some(other) = self.nodes[rel.source].as_mut() {
                        other.outgoing.retain(|r| *r != rel_slot);
                    }
                }
                if rel.target != slot {
                    if let Some(other) = self.nodes[rel.target].as_mut() {
                        other.incoming.retain(|r| *r != rel_slot);
                    }
                }
            }
        }

        self.touch(true);
        self.compact_if_sparse();
        Ok(removed.node)
    }

    /// Remove a single relationship.
    pub fn remove_relationship(&mut self, id: RelationshipId) -> Result<Relationship> {
        let rel_slot = self
            .rel_index
            .remove(&id)
            .ok_or(GraphError::UnknownEntity(EntityRef::Relationship(id)))?;
        let rel = self.relationships[rel_slot]
            .take()
            .ok_or(GraphError::UnknownEntity(EntityRef::Relationship(id)))?;
        if let Some(source) = self.nodes[rel.source].as_mut() {
            source.outgoing.retain(|r| *r != rel_slot);
        }
        if let Some(target) = self.nodes[rel.target].as_mut() {
            target.incoming.retain(|r| *r != rel_slot);
        }
        self.touch(rel.rel.kind.is_participation());
        self.compact_if_sparse();
        Ok(rel.rel)
    }

    // ------------------------------------------------------------------
    // Compaction
    // ------------------------------------------------------------------

    /// Drop every tombstone and renumber slots in their existing order.
    ///
    /// Node ids and relationship handles are unaffected. Runs automatically
    /// after a removal once either arena is at least half tombstones.
    pub fn compact(&mut self) -> CompactionStats {
        let stats = CompactionStats {
            node_slots_reclaimed: self.nodes.len() - self.index.len(),
            relationship_slots_reclaimed: self.relationships.len() - self.rel_index.len(),
        };
        if stats.is_empty() {
            return stats;
        }

        // Phase 1: old -> new slot maps (usize::MAX marks a tombstone)
        let node_map = survivor_map(&self.nodes);
        let rel_map = survivor_map(&self.relationships);

        // Phase 2: rebuild the relationship arena with remapped endpoints
        self.relationships = std::mem::take(&mut self.relationships)
            .into_iter()
            .flatten()
            .map(|mut rel| {
                rel.source = node_map[rel.source];
                rel.target = node_map[rel.target];
                rel
            })
            .map(Some)
            .collect();

        // Phase 3: rebuild the node arena with remapped adjacency
        self.nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .flatten()
            .map(|mut slot| {
                for rel in slot.outgoing.iter_mut().chain(slot.incoming.iter_mut()) {
                    *rel = rel_map[*rel];
                }
                slot
            })
            .map(Some)
            .collect();

        // Phase 4: id indexes
        for slot in self.index.values_mut() {
            *slot = node_map[*slot];
        }
        for slot in self.rel_index.values_mut() {
            *slot = rel_map[*slot];
        }

        // The collaboration index is keyed by slot
        *self.collaborations.get_mut() = None;

        tracing::debug!(
            node_slots_reclaimed = stats.node_slots_reclaimed,
            relationship_slots_reclaimed = stats.relationship_slots_reclaimed,
            generation = self.generation,
            "Compacted graph store"
        );
        stats
    }

    fn compact_if_sparse(&mut self) {
        let sparse = |len: usize, live: usize| len >= COMPACT_MIN_SLOTS && live * 2 <= len;
        if sparse(self.nodes.len(), self.index.len())
            || sparse(self.relationships.len(), self.rel_index.len())
        {
            self.compact();
        }
    }

    /// Merge `patch` into the attributes of a node or relationship.
    ///
    /// Unknown keys are added, existing keys overwritten.
    pub fn update_attributes(
        &mut self,
        target: impl Into<EntityRef>,
        patch: Attributes,
    ) -> Result<()> {
        let target = target.into();
        let attributes = match &target {
            EntityRef::Node(id) => self
                .index
                .get(id)
                .copied()
                .and_then(|slot| self.nodes[slot].as_mut())
                .map(|slot| &mut slot.node.attributes),
            EntityRef::Relationship(rel) => self
                .rel_index
                .get(rel)
                .copied()
                .and_then(|slot| self.relationships[slot].as_mut())
                .map(|slot| &mut slot.rel.attributes),
        };
        match attributes {
            Some(attributes) => {
                attributes.extend(patch);
                Ok(())
            }
            None => Err(GraphError::UnknownEntity(target)),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Relationships incident to `id`, lazily, in insertion order.
    ///
    /// `Both` merges outgoing and incoming lists by insertion order. The
    /// iterator is cheap to clone and the call can be repeated freely.
    pub fn neighbors(
        &self,
        id: &NodeId,
        direction: Direction,
        kind: Option<RelKind>,
    ) -> Result<Neighbors<'_>> {
        let slot = self.require_slot(id)?;
        Ok(Neighbors {
            store: self,
            origin: &self.slot(slot).node.id,
            ids: self.adjacency(slot, direction),
            kind,
        })
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.slot_of(id).map(|slot| &self.slot(slot).node)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.rel_slot(id).map(|slot| &slot.rel)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.rel_index.len()
    }

    /// Allocated node and relationship slots, tombstones included.
    pub fn arena_len(&self) -> (usize, usize) {
        (self.nodes.len(), self.relationships.len())
    }

    /// Counter bumped on every structural change (not on attribute updates).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten().map(|slot| &slot.node)
    }

    /// Nodes of one kind in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes().filter(move |node| node.kind == kind)
    }

    /// All live relationships in insertion order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.iter().flatten().map(|slot| &slot.rel)
    }

    // ------------------------------------------------------------------
    // Derived COLLABORATED_WITH
    // ------------------------------------------------------------------

    /// Cached collaboration index, rebuilt if a contributing edge changed.
    pub fn collaborations(&self) -> Arc<CollaborationIndex> {
        let mut cache = self.collaborations.lock();
        if let Some(index) = cache.as_ref() {
            return Arc::clone(index);
        }
        let index = Arc::new(CollaborationIndex::build(self));
        tracing::debug!(
            pairs = index.len(),
            generation = self.generation,
            "Rebuilt collaboration index"
        );
        *cache = Some(Arc::clone(&index));
        index
    }

    /// Derived COLLABORATED_WITH edges as `(a, b, weight)` with `a` inserted before `b`.
    pub fn collaboration_edges(&self) -> Vec<Collaboration> {
        let index = self.collaborations();
        index
            .pairs()
            .map(|((a, b), weight)| Collaboration {
                a: self.slot(a).node.id.clone(),
                b: self.slot(b).node.id.clone(),
                weight,
            })
            .collect()
    }

    /// Collaborators of a person with co-occurrence counts, in insertion order.
    pub fn collaborators(&self, id: &NodeId) -> Result<Vec<(NodeId, u32)>> {
        let slot = self.require_slot(id)?;
        let index = self.collaborations();
        Ok(index
            .partners(slot)
            .iter()
            .map(|&(other, weight)| (self.slot(other).node.id.clone(), weight))
            .collect())
    }

    /// Co-occurrence count of two people computed on demand, bypassing the cache.
    pub fn collaboration_weight(&self, a: &NodeId, b: &NodeId) -> Result<u32> {
        let a_slot = self.require_slot(a)?;
        let b_slot = self.require_slot(b)?;
        if a_slot == b_slot {
            return Ok(0);
        }
        let mut a_movies = self.participations(a_slot);
        a_movies.sort_unstable();
        a_movies.dedup();
        let mut b_movies = self.participations(b_slot);
        b_movies.sort_unstable();
        b_movies.dedup();
        Ok(a_movies
            .iter()
            .filter(|m| b_movies.binary_search(m).is_ok())
            .count() as u32)
    }

    // ------------------------------------------------------------------
    // Crate-internal slot access (used by traversal and analytics)
    // ------------------------------------------------------------------

    pub(crate) fn slot_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn require_slot(&self, id: &NodeId) -> Result<usize> {
        self.slot_of(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    /// Upper bound (exclusive) of node slot indices, tombstones included.
    pub(crate) fn slot_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Upper bound (exclusive) of relationship slot indices.
    pub(crate) fn rel_bound(&self) -> usize {
        self.relationships.len()
    }

    /// Live slot; callers only pass indices obtained from the store itself.
    pub(crate) fn slot(&self, slot: usize) -> &NodeSlot {
        match self.nodes[slot].as_ref() {
            Some(s) => s,
            None => unreachable!("slot {} resolved after removal", slot),
        }
    }

    fn slot_mut(&mut self, slot: usize) -> &mut NodeSlot {
        match self.nodes[slot].as_mut() {
            Some(s) => s,
            None => unreachable!("slot {} resolved after removal", slot),
        }
    }

    pub(crate) fn rel_slot(&self, id: RelationshipId) -> Option<&RelSlot> {
        self.rel_at(*self.rel_index.get(&id)?)
    }

    pub(crate) fn rel_at(&self, slot: usize) -> Option<&RelSlot> {
        self.relationships.get(slot)?.as_ref()
    }

    pub(crate) fn adjacency(&self, slot: usize, direction: Direction) -> AdjacencyIds<'_> {
        let node = self.slot(slot);
        let empty: &[usize] = &[];
        let (out, inc) = match direction {
            Direction::Outgoing => (node.outgoing.as_slice(), empty),
            Direction::Incoming => (empty, node.incoming.as_slice()),
            Direction::Both => (node.outgoing.as_slice(), node.incoming.as_slice()),
        };
        AdjacencyIds {
            out: out.iter().copied().peekable(),
            inc: inc.iter().copied().peekable(),
        }
    }

    /// Movie slots a person reaches through ACTED_IN/DIRECTED, with repeats.
    pub(crate) fn participations(&self, person: usize) -> Vec<usize> {
        self.slot(person)
            .outgoing
            .iter()
            .filter_map(|rel| self.rel_at(*rel))
            .filter(|rel| rel.rel.kind.is_participation())
            .map(|rel| rel.target)
            .collect()
    }

    /// Person slots reaching a movie through ACTED_IN/DIRECTED, with repeats.
    pub(crate) fn participants(&self, movie: usize) -> Vec<usize> {
        self.slot(movie)
            .incoming
            .iter()
            .filter_map(|rel| self.rel_at(*rel))
            .filter(|rel| rel.rel.kind.is_participation())
            .map(|rel| rel.source)
            .collect()
    }

    /// Distinct genre slots of a movie, sorted.
    pub(crate) fn genres_of(&self, movie: usize) -> Vec<usize> {
        let mut genres: Vec<usize> = self
            .slot(movie)
            .outgoing
            .iter()
            .filter_map(|rel| self.rel_at(*rel))
            .filter(|rel| rel.rel.kind == RelKind::HasGenre)
            .map(|rel| rel.target)
            .collect();
        genres.sort_unstable();
        genres.dedup();
        genres
    }

    fn touch(&mut self, participation_changed: bool) {
        self.generation += 1;
        if participation_changed {
            *self.collaborations.get_mut() = None;
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GraphStore {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            index: self.index.clone(),
            relationships: self.relationships.clone(),
            rel_index: self.rel_index.clone(),
            next_relationship: self.next_relationship,
            generation: self.generation,
            collaborations: Mutex::new(self.collaborations.lock().clone()),
        }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Old slot -> new slot for every live entry; tombstones map to `usize::MAX`.
fn survivor_map<T>(arena: &[Option<T>]) -> Vec<usize> {
    let mut next = 0;
    arena
        .iter()
        .map(|entry| match entry {
            Some(_) => {
                next += 1;
                next - 1
            }
            None => usize::MAX,
        })
        .collect()
}

/// Relationship slots of one node, merged across directions by insertion order.
#[derive(Clone)]
pub(crate) struct AdjacencyIds<'a> {
    out: Peekable<Copied<slice::Iter<'a, usize>>>,
    inc: Peekable<Copied<slice::Iter<'a, usize>>>,
}

impl Iterator for AdjacencyIds<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match (self.out.peek().copied(), self.inc.peek().copied()) {
            // Self-loop: listed on both sides, reported once
            (Some(a), Some(b)) if a == b => {
                self.inc.next();
                self.out.next()
            }
            (Some(a), Some(b)) if a < b => self.out.next(),
            (_, Some(_)) => self.inc.next(),
            (Some(_), None) => self.out.next(),
            (None, None) => None,
        }
    }
}

/// Lazy `(relationship, other endpoint)` sequence returned by [`GraphStore::neighbors`].
#[derive(Clone)]
pub struct Neighbors<'a> {
    store: &'a GraphStore,
    origin: &'a NodeId,
    ids: AdjacencyIds<'a>,
    kind: Option<RelKind>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = (&'a Relationship, &'a NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rel = self.ids.next()?;
            let Some(slot) = self.store.rel_at(rel) else {
                continue;
            };
            if self.kind.is_some_and(|k| k != slot.rel.kind) {
                continue;
            }
            return Some((&slot.rel, slot.rel.other(&self.origin)));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{attrs, AttrValue};

    /// Nolan -DIRECTED-> Inception -HAS_GENRE-> Sci-Fi; DiCaprio -ACTED_IN-> Inception
    fn make_inception_graph() -> GraphStore {
        let mut g = GraphStore::new();
        g.add_node("Nolan", NodeKind::Person, attrs([("name", "Christopher Nolan".into())]))
            .unwrap();
        g.add_node("Inception", NodeKind::Movie, attrs([("year", 2010.into())]))
            .unwrap();
        g.add_node("Sci-Fi", NodeKind::Genre, Attributes::new())
            .unwrap();
        g.add_node("DiCaprio", NodeKind::Person, Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::Directed, "Nolan", "Inception", Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::HasGenre, "Inception", "Sci-Fi", Attributes::new())
            .unwrap();
        g.add_relationship(
            RelKind::ActedIn,
            "DiCaprio",
            "Inception",
            attrs([("role", "Cobb".into())]),
        )
        .unwrap();
        g
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    // --- Insertion ---

    #[test]
    fn test_add_node_duplicate_fails() {
        let mut g = make_inception_graph();
        let err = g
            .add_node("Nolan", NodeKind::Movie, Attributes::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(ref d) if d == &id("Nolan")));
        // Original node untouched
        assert_eq!(g.node(&id("Nolan")).unwrap().kind, NodeKind::Person);
    }

    #[test]
    fn test_ids_unique_across_kinds() {
        let mut g = GraphStore::new();
        g.add_node(1, NodeKind::Person, Attributes::new()).unwrap();
        assert!(g.add_node(1, NodeKind::Genre, Attributes::new()).is_err());
        // String "1" is a different key than integer 1
        assert!(g.add_node("1", NodeKind::Genre, Attributes::new()).is_ok());
    }

    #[test]
    fn test_add_relationship_unknown_endpoint() {
        let mut g = make_inception_graph();
        let err = g
            .add_relationship(RelKind::ActedIn, "Hardy", "Inception", Attributes::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(ref n) if n == &id("Hardy")));

        let err = g
            .add_relationship(RelKind::ActedIn, "Nolan", "Dunkirk", Attributes::new())
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(ref n) if n == &id("Dunkirk")));
    }

    #[test]
    fn test_add_relationship_incompatible_kinds() {
        let mut g = make_inception_graph();
        let cases = [
            (RelKind::ActedIn, "Inception", "Nolan"),
            (RelKind::Directed, "Nolan", "Sci-Fi"),
            (RelKind::Produced, "Nolan", "DiCaprio"),
            (RelKind::HasGenre, "Nolan", "Sci-Fi"),
            (RelKind::CollaboratedWith, "Nolan", "DiCaprio"),
        ];
        for (kind, s, t) in cases {
            let err = g.add_relationship(kind, s, t, Attributes::new()).unwrap_err();
            assert!(
                matches!(err, GraphError::IncompatibleKind { kind: k, .. } if k == kind),
                "{} {}->{} should be rejected, got {:?}",
                kind,
                s,
                t,
                err
            );
        }
        assert_eq!(g.relationship_count(), 3);
    }

    #[test]
    fn test_multigraph_parallel_edges() {
        let mut g = make_inception_graph();
        let r1 = g
            .add_relationship(RelKind::ActedIn, "Nolan", "Inception", Attributes::new())
            .unwrap();
        let r2 = g
            .add_relationship(
                RelKind::ActedIn,
                "Nolan",
                "Inception",
                attrs([("character", "Cameo".into())]),
            )
            .unwrap();
        assert_ne!(r1, r2);
        let out: Vec<_> = g
            .neighbors(&id("Nolan"), Direction::Outgoing, None)
            .unwrap()
            .map(|(rel, _)| rel.kind)
            .collect();
        assert_eq!(out, vec![RelKind::Directed, RelKind::ActedIn, RelKind::ActedIn]);
    }

    // --- Neighbors ---

    #[test]
    fn test_neighbors_incoming_in_insertion_order() {
        let g = make_inception_graph();
        let incoming: Vec<(RelKind, NodeId)> = g
            .neighbors(&id("Inception"), Direction::Incoming, None)
            .unwrap()
            .map(|(rel, other)| (rel.kind, other.clone()))
            .collect();
        assert_eq!(
            incoming,
            vec![
                (RelKind::Directed, id("Nolan")),
                (RelKind::ActedIn, id("DiCaprio")),
            ]
        );
    }

    #[test]
    fn test_neighbors_both_merges_by_insertion() {
        let g = make_inception_graph();
        let both: Vec<RelKind> = g
            .neighbors(&id("Inception"), Direction::Both, None)
            .unwrap()
            .map(|(rel, _)| rel.kind)
            .collect();
        assert_eq!(
            both,
            vec![RelKind::Directed, RelKind::HasGenre, RelKind::ActedIn]
        );
    }

    #[test]
    fn test_neighbors_kind_filter_and_restart() {
        let g = make_inception_graph();
        let iter = g
            .neighbors(&id("Inception"), Direction::Both, Some(RelKind::ActedIn))
            .unwrap();
        let first: Vec<_> = iter.clone().map(|(_, o)| o.clone()).collect();
        let second: Vec<_> = iter.map(|(_, o)| o.clone()).collect();
        assert_eq!(first, vec![id("DiCaprio")]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_neighbors_unknown_node() {
        let g = make_inception_graph();
        assert!(matches!(
            g.neighbors(&id("Memento"), Direction::Both, None),
            Err(GraphError::UnknownNode(_))
        ));
    }

    // --- Removal ---

    #[test]
    fn test_remove_node_cascades() {
        let mut g = make_inception_graph();
        let removed = g.remove_node(&id("Inception")).unwrap();
        assert_eq!(removed.kind, NodeKind::Movie);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.relationship_count(), 0);
        assert_eq!(g.relationships().count(), 0);
        for person in ["Nolan", "DiCaprio", "Sci-Fi"] {
            assert_eq!(
                g.neighbors(&id(person), Direction::Both, None)
                    .unwrap()
                    .count(),
                0,
                "{} should have no remaining relationships",
                person
            );
        }
        assert!(matches!(
            g.neighbors(&id("Inception"), Direction::Both, None),
            Err(GraphError::UnknownNode(_))
        ));
        assert!(g.relationship(RelationshipId(0)).is_none());
    }

    #[test]
    fn test_remove_node_unknown() {
        let mut g = make_inception_graph();
        assert!(matches!(
            g.remove_node(&id("Memento")),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_removed_id_can_be_reinserted() {
        let mut g = make_inception_graph();
        g.remove_node(&id("DiCaprio")).unwrap();
        g.add_node("DiCaprio", NodeKind::Person, Attributes::new())
            .unwrap();
        assert_eq!(
            g.neighbors(&id("DiCaprio"), Direction::Both, None)
                .unwrap()
                .count(),
            0
        );
        assert_eq!(g.nodes().last().unwrap().id, id("DiCaprio"));
    }

    #[test]
    fn test_remove_relationship() {
        let mut g = make_inception_graph();
        let rel = g.remove_relationship(RelationshipId(2)).unwrap();
        assert_eq!(rel.kind, RelKind::ActedIn);
        assert_eq!(g.relationship_count(), 2);
        assert!(matches!(
            g.remove_relationship(RelationshipId(2)),
            Err(GraphError::UnknownEntity(EntityRef::Relationship(_)))
        ));
    }

    #[test]
    fn test_churn_keeps_arena_bounded() {
        let mut g = GraphStore::new();
        g.add_node("Inception", NodeKind::Movie, Attributes::new())
            .unwrap();
        for round in 0..10_000 {
            let extra = NodeId::from(format!("extra-{}", round));
            g.add_node(extra.clone(), NodeKind::Person, Attributes::new())
                .unwrap();
            g.add_relationship(RelKind::ActedIn, extra.clone(), "Inception", Attributes::new())
                .unwrap();
            g.remove_node(&extra).unwrap();
        }
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.relationship_count(), 0);
        let (nodes, rels) = g.arena_len();
        assert!(nodes < 2 * COMPACT_MIN_SLOTS, "node arena grew to {}", nodes);
        assert!(rels < 2 * COMPACT_MIN_SLOTS, "relationship arena grew to {}", rels);
        assert!(g.slot_bound() <= nodes);
    }

    #[test]
    fn test_compact_keeps_handles_and_order() {
        let mut g = make_inception_graph();
        g.add_node("Hardy", NodeKind::Person, Attributes::new())
            .unwrap();
        let hardy = g
            .add_relationship(RelKind::ActedIn, "Hardy", "Inception", Attributes::new())
            .unwrap();
        g.remove_node(&id("Nolan")).unwrap();

        let stats = g.compact();
        assert_eq!(stats.node_slots_reclaimed, 1);
        assert_eq!(stats.relationship_slots_reclaimed, 1);
        assert_eq!(g.arena_len(), (4, 3));
        assert!(g.compact().is_empty());

        // Handles issued before compaction still resolve to the same edges
        assert_eq!(g.relationship(hardy).unwrap().source, id("Hardy"));
        assert_eq!(g.relationship(RelationshipId(2)).unwrap().source, id("DiCaprio"));
        assert!(g.relationship(RelationshipId(0)).is_none());

        let incoming: Vec<NodeId> = g
            .neighbors(&id("Inception"), Direction::Incoming, None)
            .unwrap()
            .map(|(_, other)| other.clone())
            .collect();
        assert_eq!(incoming, vec![id("DiCaprio"), id("Hardy")]);
        let order: Vec<NodeId> = g.nodes().map(|n| n.id.clone()).collect();
        assert_eq!(order, vec![id("Inception"), id("Sci-Fi"), id("DiCaprio"), id("Hardy")]);
        assert_eq!(
            g.collaborators(&id("Hardy")).unwrap(),
            vec![(id("DiCaprio"), 1)]
        );

        // New handles continue after the old ones
        g.add_node("Nolan", NodeKind::Person, Attributes::new())
            .unwrap();
        let fresh = g
            .add_relationship(RelKind::Directed, "Nolan", "Inception", Attributes::new())
            .unwrap();
        assert_eq!(fresh, RelationshipId(4));
        g.remove_relationship(hardy).unwrap();
        assert_eq!(g.relationship_count(), 3);
    }

    // --- Attributes ---

    #[test]
    fn test_update_attributes_merges() {
        let mut g = make_inception_graph();
        g.update_attributes(
            id("Inception"),
            attrs([("year", 2011.into()), ("rating", 8.8.into())]),
        )
        .unwrap();
        let movie = g.node(&id("Inception")).unwrap();
        assert_eq!(movie.attributes["year"], AttrValue::Int(2011));
        assert_eq!(movie.attributes["rating"], AttrValue::Float(8.8));

        g.update_attributes(RelationshipId(2), attrs([("character", "Cobb".into())]))
            .unwrap();
        let rel = g.relationship(RelationshipId(2)).unwrap();
        assert_eq!(rel.attributes.len(), 2);
    }

    #[test]
    fn test_update_attributes_unknown_entity() {
        let mut g = make_inception_graph();
        assert!(matches!(
            g.update_attributes(id("Memento"), Attributes::new()),
            Err(GraphError::UnknownEntity(EntityRef::Node(_)))
        ));
        assert!(matches!(
            g.update_attributes(RelationshipId(99), Attributes::new()),
            Err(GraphError::UnknownEntity(EntityRef::Relationship(_)))
        ));
    }

    #[test]
    fn test_attribute_update_keeps_generation() {
        let mut g = make_inception_graph();
        let before = g.generation();
        g.update_attributes(id("Nolan"), attrs([("born", 1970.into())]))
            .unwrap();
        assert_eq!(g.generation(), before);
    }

    // --- Collaborations ---

    #[test]
    fn test_collaboration_derived_and_invalidated() {
        let mut g = make_inception_graph();
        assert_eq!(g.collaboration_edges().len(), 1);
        assert_eq!(
            g.collaboration_weight(&id("Nolan"), &id("DiCaprio")).unwrap(),
            1
        );

        g.add_node("The Revenant", NodeKind::Movie, Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::ActedIn, "DiCaprio", "The Revenant", Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::Directed, "Nolan", "The Revenant", Attributes::new())
            .unwrap();

        let edges = g.collaboration_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 2, "cache must be rebuilt after new edges");
        assert_eq!(
            g.collaborators(&id("DiCaprio")).unwrap(),
            vec![(id("Nolan"), 2)]
        );

        g.remove_node(&id("Nolan")).unwrap();
        assert!(g.collaboration_edges().is_empty());
    }

    #[test]
    fn test_collaboration_counts_movie_once_per_person() {
        let mut g = make_inception_graph();
        // Nolan also acts in his own movie: still one shared movie
        g.add_relationship(RelKind::ActedIn, "Nolan", "Inception", Attributes::new())
            .unwrap();
        assert_eq!(g.collaboration_edges()[0].weight, 1);
        assert_eq!(
            g.collaboration_weight(&id("Nolan"), &id("DiCaprio")).unwrap(),
            1
        );
    }

    #[test]
    fn test_produced_does_not_create_collaboration() {
        let mut g = make_inception_graph();
        g.add_node("Thomas", NodeKind::Person, Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::Produced, "Thomas", "Inception", Attributes::new())
            .unwrap();
        assert_eq!(g.collaboration_edges().len(), 1);
        assert_eq!(
            g.collaboration_weight(&id("Thomas"), &id("Nolan")).unwrap(),
            0
        );
    }
}
