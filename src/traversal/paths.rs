//! Store-level shortest-path queries.

use serde::{Deserialize, Serialize};

use super::kernel::{breadth_first, dijkstra, Adjacency};
use crate::error::{GraphError, Result};
use crate::store::{Direction, GraphStore, NodeId, RelKind, Relationship, RelationshipId};

/// Which relationships a traversal may follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalSpec {
    pub direction: Direction,
    /// `None` follows every kind.
    pub kinds: Option<Vec<RelKind>>,
}

impl TraversalSpec {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            kinds: None,
        }
    }

    /// Follow every relationship regardless of direction.
    pub fn any() -> Self {
        Self::new(Direction::Both)
    }

    pub fn with_kind(mut self, kind: RelKind) -> Self {
        self.kinds.get_or_insert_with(Vec::new).push(kind);
        self
    }

    pub fn admits(&self, kind: RelKind) -> bool {
        self.kinds.as_ref().map_or(true, |kinds| kinds.contains(&kind))
    }
}

impl Default for TraversalSpec {
    fn default() -> Self {
        Self::any()
    }
}

/// The store seen through a [`TraversalSpec`].
pub struct StoreView<'a> {
    store: &'a GraphStore,
    spec: &'a TraversalSpec,
}

impl<'a> StoreView<'a> {
    pub fn new(store: &'a GraphStore, spec: &'a TraversalSpec) -> Self {
        Self { store, spec }
    }
}

/// Edges are relationship slots; [`Path`] maps them back to handles.
impl Adjacency for StoreView<'_> {
    type Edge = usize;

    fn node_bound(&self) -> usize {
        self.store.slot_bound()
    }

    fn visit_neighbors<F: FnMut(usize, usize)>(&self, node: usize, mut f: F) {
        for id in self.store.adjacency(node, self.spec.direction) {
            let Some(rel) = self.store.rel_at(id) else {
                continue;
            };
            if !self.spec.admits(rel.rel.kind) {
                continue;
            }
            let other = if rel.source == node {
                rel.target
            } else {
                rel.source
            };
            f(id, other);
        }
    }
}

/// A walk through the store: `nodes.len() == relationships.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub relationships: Vec<RelationshipId>,
}

impl Path {
    /// Number of hops.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    fn build(store: &GraphStore, source: usize, steps: &[(usize, usize, usize)]) -> Self {
        let id_at = |slot: usize| store.slot(slot).node.id.clone();
        let mut nodes = Vec::with_capacity(steps.len() + 1);
        nodes.push(id_at(source));
        nodes.extend(steps.iter().map(|&(_, _, to)| id_at(to)));
        Self {
            nodes,
            relationships: steps
                .iter()
                .filter_map(|&(_, rel, _)| store.rel_at(rel))
                .map(|slot| slot.rel.id)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPath {
    #[serde(flatten)]
    pub path: Path,
    pub total_weight: f64,
}

/// Fewest-hop path from `source` to `target`.
///
/// Frontier expansion is deterministic: at each level the relationship that
/// first reached a node (in adjacency insertion order) is the one kept.
/// Returns a zero-hop path when `source == target`.
pub fn shortest_path(
    store: &GraphStore,
    source: &NodeId,
    target: &NodeId,
    spec: &TraversalSpec,
) -> Result<Path> {
    let from = store.require_slot(source)?;
    let to = store.require_slot(target)?;

    let view = StoreView::new(store, spec);
    let dag = breadth_first(&view, from, Some(to));
    let steps = dag.path_to(to).ok_or_else(|| GraphError::NoPath {
        from: source.clone(),
        to: target.clone(),
    })?;

    tracing::debug!(
        from = %source,
        to = %target,
        hops = steps.len(),
        visited = dag.order.len(),
        "Shortest path found"
    );
    Ok(Path::build(store, from, &steps))
}

/// Minimum total weight path from `source` to `target`.
///
/// `weight_fn` is evaluated once for every relationship the traversal filter admits,
/// before the search starts; a negative or NaN weight fails with
/// `NegativeWeight` even if that relationship would never be reached.
pub fn weighted_shortest_path<W>(
    store: &GraphStore,
    source: &NodeId,
    target: &NodeId,
    spec: &TraversalSpec,
    weight_fn: W,
) -> Result<WeightedPath>
where
    W: Fn(&Relationship) -> f64,
{
    let from = store.require_slot(source)?;
    let to = store.require_slot(target)?;

    let mut weights = vec![f64::INFINITY; store.rel_bound()];
    for (slot, weight) in weights.iter_mut().enumerate() {
        let Some(rel) = store.rel_at(slot).map(|s| &s.rel) else {
            continue;
        };
        if !spec.admits(rel.kind) {
            continue;
        }
        let w = weight_fn(rel);
        if w.is_nan() || w < 0.0 {
            return Err(GraphError::NegativeWeight {
                relationship: rel.id,
                weight: w,
            });
        }
        *weight = w;
    }

    let view = StoreView::new(store, spec);
    let dag = dijkstra(&view, from, Some(to), |rel: usize| weights[rel]);
    let steps = dag.path_to(to).ok_or_else(|| GraphError::NoPath {
        from: source.clone(),
        to: target.clone(),
    })?;

    let total_weight = dag.dist[to];
    tracing::debug!(
        from = %source,
        to = %target,
        hops = steps.len(),
        total_weight,
        "Weighted shortest path found"
    );
    Ok(WeightedPath {
        path: Path::build(store, from, &steps),
        total_weight,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{attrs, Attributes, NodeKind};

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    /// People chained through movies: A -m1- B -m2- C -m3- D, plus isolated E.
    fn make_chain_graph() -> GraphStore {
        let mut g = GraphStore::new();
        for p in ["A", "B", "C", "D", "E"] {
            g.add_node(p, NodeKind::Person, Attributes::new()).unwrap();
        }
        for (m, a, b) in [("m1", "A", "B"), ("m2", "B", "C"), ("m3", "C", "D")] {
            g.add_node(m, NodeKind::Movie, Attributes::new()).unwrap();
            g.add_relationship(RelKind::ActedIn, a, m, Attributes::new())
                .unwrap();
            g.add_relationship(RelKind::ActedIn, b, m, Attributes::new())
                .unwrap();
        }
        g
    }

    #[test]
    fn test_shortest_path_through_movies() {
        let g = make_chain_graph();
        let path = shortest_path(&g, &id("A"), &id("D"), &TraversalSpec::any()).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(
            path.nodes,
            vec![id("A"), id("m1"), id("B"), id("m2"), id("C"), id("m3"), id("D")]
        );
    }

    #[test]
    fn test_shortest_path_isolated_node() {
        let g = make_chain_graph();
        let err = shortest_path(&g, &id("A"), &id("E"), &TraversalSpec::any()).unwrap_err();
        assert!(matches!(err, GraphError::NoPath { .. }));
    }

    #[test]
    fn test_shortest_path_respects_direction() {
        let g = make_chain_graph();
        let spec = TraversalSpec::new(Direction::Outgoing);
        // Person -> Movie only: can't come back out of m1
        assert!(matches!(
            shortest_path(&g, &id("A"), &id("B"), &spec),
            Err(GraphError::NoPath { .. })
        ));
        let path = shortest_path(&g, &id("A"), &id("m1"), &spec).unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_shortest_path_kind_filter() {
        let mut g = make_chain_graph();
        g.add_node("m4", NodeKind::Movie, Attributes::new()).unwrap();
        g.add_relationship(RelKind::Produced, "A", "m4", Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::Produced, "D", "m4", Attributes::new())
            .unwrap();

        let any = shortest_path(&g, &id("A"), &id("D"), &TraversalSpec::any()).unwrap();
        assert_eq!(any.len(), 2);

        let acted = TraversalSpec::any().with_kind(RelKind::ActedIn);
        let path = shortest_path(&g, &id("A"), &id("D"), &acted).unwrap();
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_shortest_path_same_node_and_unknown() {
        let g = make_chain_graph();
        let path = shortest_path(&g, &id("B"), &id("B"), &TraversalSpec::any()).unwrap();
        assert!(path.is_empty());
        assert_eq!(path.nodes, vec![id("B")]);

        assert!(matches!(
            shortest_path(&g, &id("A"), &id("Z"), &TraversalSpec::any()),
            Err(GraphError::UnknownNode(ref n)) if n == &id("Z")
        ));
    }

    #[test]
    fn test_shortest_path_first_edge_wins() {
        let mut g = GraphStore::new();
        g.add_node("p", NodeKind::Person, Attributes::new()).unwrap();
        g.add_node("m", NodeKind::Movie, Attributes::new()).unwrap();
        let first = g
            .add_relationship(RelKind::Directed, "p", "m", Attributes::new())
            .unwrap();
        g.add_relationship(RelKind::ActedIn, "p", "m", Attributes::new())
            .unwrap();
        let path = shortest_path(&g, &id("p"), &id("m"), &TraversalSpec::any()).unwrap();
        assert_eq!(path.relationships, vec![first]);
    }

    #[test]
    fn test_weighted_path_prefers_lighter_route() {
        let mut g = GraphStore::new();
        for p in ["A", "B"] {
            g.add_node(p, NodeKind::Person, Attributes::new()).unwrap();
        }
        for m in ["short", "long"] {
            g.add_node(m, NodeKind::Movie, Attributes::new()).unwrap();
        }
        let cost = |c: f64| attrs([("cost", c.into())]);
        g.add_relationship(RelKind::ActedIn, "A", "short", cost(5.0))
            .unwrap();
        g.add_relationship(RelKind::ActedIn, "B", "short", cost(5.0))
            .unwrap();
        g.add_relationship(RelKind::ActedIn, "A", "long", cost(1.0))
            .unwrap();
        g.add_relationship(RelKind::ActedIn, "B", "long", cost(1.0))
            .unwrap();

        let by_cost = |rel: &Relationship| {
            rel.attributes
                .get("cost")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0)
        };
        let path =
            weighted_shortest_path(&g, &id("A"), &id("B"), &TraversalSpec::any(), by_cost)
                .unwrap();
        assert_eq!(path.path.nodes, vec![id("A"), id("long"), id("B")]);
        assert!((path.total_weight - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_path_negative_weight() {
        let g = make_chain_graph();
        let err = weighted_shortest_path(&g, &id("A"), &id("B"), &TraversalSpec::any(), |rel| {
            if rel.target == id("m3") {
                -1.0
            } else {
                1.0
            }
        })
        .unwrap_err();
        assert!(
            matches!(err, GraphError::NegativeWeight { weight, .. } if weight == -1.0),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_weighted_path_disconnected() {
        let g = make_chain_graph();
        assert!(matches!(
            weighted_shortest_path(&g, &id("A"), &id("E"), &TraversalSpec::any(), |_| 1.0),
            Err(GraphError::NoPath { .. })
        ));
    }
}
