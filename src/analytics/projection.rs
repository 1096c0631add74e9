//! Induced subgraph projections.
//!
//! Algorithms never walk the store directly. They run on an
//! [`InducedGraph`]: the nodes of one kind, in store insertion order, joined
//! by undirected weighted edges. Two nodes are joined when they share a
//! neighbor through the chosen relationship kind, with the number of
//! distinct shared neighbors as the weight. COLLABORATED_WITH maps to the
//! store's cached collaboration index.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

use crate::store::{GraphStore, NodeId, NodeKind, RelKind};
use crate::traversal::Adjacency;

/// Undirected weighted projection with id ↔ index mapping.
#[derive(Debug, Clone)]
pub struct InducedGraph {
    pub graph: UnGraph<NodeId, f64>,
    pub id_to_index: HashMap<NodeId, NodeIndex>,
}

impl InducedGraph {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: UnGraph::with_capacity(nodes, edges),
            id_to_index: HashMap::with_capacity(nodes),
        }
    }

    /// Add a node, returning the existing index if the id is already present.
    pub fn add_node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.id_to_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.id_to_index.insert(id, idx);
        idx
    }

    /// Add `weight` to the edge between two known nodes, creating it if needed.
    pub fn add_edge(&mut self, a: &NodeId, b: &NodeId, weight: f64) -> Option<EdgeIndex> {
        let a = *self.id_to_index.get(a)?;
        let b = *self.id_to_index.get(b)?;
        Some(match self.graph.find_edge(a, b) {
            Some(e) => {
                self.graph[e] += weight;
                e
            }
            None => self.graph.add_edge(a, b, weight),
        })
    }

    /// Persons joined by derived COLLABORATED_WITH edges.
    pub fn collaboration(store: &GraphStore) -> Self {
        Self::project(store, NodeKind::Person, RelKind::CollaboratedWith)
    }

    /// Nodes of `kind` joined through relationships of kind `via`.
    ///
    /// `via` must touch `kind` on one side; otherwise the projection has
    /// nodes but no edges.
    pub fn project(store: &GraphStore, kind: NodeKind, via: RelKind) -> Self {
        let members: Vec<usize> = store
            .nodes_of_kind(kind)
            .filter_map(|node| store.slot_of(&node.id))
            .collect();

        let pairs: BTreeMap<(usize, usize), u32> = if via.is_derived() {
            if kind == NodeKind::Person {
                store.collaborations().pairs().collect()
            } else {
                BTreeMap::new()
            }
        } else {
            shared_neighbor_pairs(store, kind, via)
        };

        let mut g = Self::with_capacity(members.len(), pairs.len());
        for &slot in &members {
            g.add_node(store.slot(slot).node.id.clone());
        }
        for ((a, b), weight) in pairs {
            let a = &store.slot(a).node.id;
            let b = &store.slot(b).node.id;
            g.add_edge(a, b, f64::from(weight));
        }

        tracing::debug!(
            kind = %kind,
            via = %via,
            nodes = g.node_count(),
            edges = g.edge_count(),
            "Built induced graph"
        );
        g
    }

    pub fn get_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.id_to_index.get(id).copied()
    }

    pub fn node_id(&self, index: usize) -> &NodeId {
        &self.graph[NodeIndex::new(index)]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adjacency lists `(neighbor, weight)` per node, both directions.
    pub fn weighted_adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.node_count()];
        for edge in self.graph.edge_references() {
            let s = edge.source().index();
            let t = edge.target().index();
            let w = *edge.weight();
            adj[s].push((t, w));
            if s != t {
                adj[t].push((s, w));
            }
        }
        adj
    }

    /// Weighted degree of every node.
    pub fn strengths(&self) -> Vec<f64> {
        self.weighted_adjacency()
            .iter()
            .map(|nbrs| nbrs.iter().map(|&(_, w)| w).sum())
            .collect()
    }
}

impl Default for InducedGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Adjacency for InducedGraph {
    type Edge = EdgeIndex;

    fn node_bound(&self) -> usize {
        self.graph.node_count()
    }

    fn visit_neighbors<F: FnMut(EdgeIndex, usize)>(&self, node: usize, mut f: F) {
        let idx = NodeIndex::new(node);
        for edge in self.graph.edges(idx) {
            let other = if edge.source() == idx {
                edge.target()
            } else {
                edge.source()
            };
            f(edge.id(), other.index());
        }
    }
}

/// Count distinct shared pivots for every pair of `kind` nodes linked through `via`.
fn shared_neighbor_pairs(
    store: &GraphStore,
    kind: NodeKind,
    via: RelKind,
) -> BTreeMap<(usize, usize), u32> {
    let (source_kind, target_kind) = via.endpoints();
    // Group member slots by the node on the other side of the relationship
    let mut by_pivot: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for rel in store.relationships().filter(|rel| rel.kind == via) {
        let Some(slot) = store.rel_slot(rel.id) else {
            continue;
        };
        if kind == source_kind {
            by_pivot.entry(slot.target).or_default().push(slot.source);
        } else if kind == target_kind {
            by_pivot.entry(slot.source).or_default().push(slot.target);
        }
    }

    let mut pairs: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for mut members in by_pivot.into_values() {
        members.sort_unstable();
        members.dedup();
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                *pairs.entry((members[i], members[j])).or_default() += 1;
            }
        }
    }
    pairs
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Attributes;

    fn make_movie_graph() -> GraphStore {
        let mut g = GraphStore::new();
        for p in ["nolan", "dicaprio", "hardy", "loner"] {
            g.add_node(p, NodeKind::Person, Attributes::new()).unwrap();
        }
        for m in ["inception", "dunkirk"] {
            g.add_node(m, NodeKind::Movie, Attributes::new()).unwrap();
        }
        for gen in ["scifi", "war"] {
            g.add_node(gen, NodeKind::Genre, Attributes::new()).unwrap();
        }
        let rels = [
            (RelKind::Directed, "nolan", "inception"),
            (RelKind::ActedIn, "dicaprio", "inception"),
            (RelKind::ActedIn, "hardy", "inception"),
            (RelKind::Directed, "nolan", "dunkirk"),
            (RelKind::ActedIn, "hardy", "dunkirk"),
            (RelKind::HasGenre, "inception", "scifi"),
            (RelKind::HasGenre, "dunkirk", "war"),
            (RelKind::HasGenre, "dunkirk", "scifi"),
        ];
        for (k, s, t) in rels {
            g.add_relationship(k, s, t, Attributes::new()).unwrap();
        }
        g
    }

    #[test]
    fn test_collaboration_projection_weights() {
        let store = make_movie_graph();
        let g = InducedGraph::collaboration(&store);
        assert_eq!(g.node_count(), 4, "isolated people stay in the projection");
        assert_eq!(g.edge_count(), 3);

        let nolan = g.get_index(&NodeId::from("nolan")).unwrap();
        let hardy = g.get_index(&NodeId::from("hardy")).unwrap();
        let e = g.graph.find_edge(nolan, hardy).unwrap();
        assert_eq!(g.graph[e], 2.0);
        // Insertion order preserved
        assert_eq!(g.node_id(0), &NodeId::from("nolan"));
        assert_eq!(g.node_id(3), &NodeId::from("loner"));
    }

    #[test]
    fn test_movie_projection_through_genres() {
        let store = make_movie_graph();
        let g = InducedGraph::project(&store, NodeKind::Movie, RelKind::HasGenre);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.strengths(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_unrelated_kind_has_no_edges() {
        let store = make_movie_graph();
        let g = InducedGraph::project(&store, NodeKind::Genre, RelKind::ActedIn);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_visit_neighbors_is_symmetric() {
        let store = make_movie_graph();
        let g = InducedGraph::collaboration(&store);
        let mut from_dicaprio = Vec::new();
        g.visit_neighbors(1, |_, w| from_dicaprio.push(w));
        from_dicaprio.sort_unstable();
        assert_eq!(from_dicaprio, vec![0, 2]);
        let mut from_loner = Vec::new();
        g.visit_neighbors(3, |_, w| from_loner.push(w));
        assert!(from_loner.is_empty());
    }
}
