//! Single-source shortest-path primitives.
//!
//! Both searches are iterative worklist loops over dense node indices and
//! record the full shortest-path DAG (settle order, distances, path counts
//! and predecessor lists), which is what both path reconstruction and
//! Brandes' dependency accumulation need.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Read-only adjacency over dense node indices `0..node_bound()`.
pub trait Adjacency {
    /// Handle of the edge used to reach a neighbor.
    type Edge: Copy;

    /// Exclusive upper bound of node indices.
    fn node_bound(&self) -> usize;

    /// Call `f(edge, neighbor)` for every edge leaving `node`, in a stable order.
    fn visit_neighbors<F: FnMut(Self::Edge, usize)>(&self, node: usize, f: F);
}

/// Shortest-path DAG rooted at one source.
#[derive(Debug, Clone)]
pub struct ShortestPathDag<E> {
    pub source: usize,
    /// Nodes in the order they were settled (non-decreasing distance).
    pub order: Vec<usize>,
    /// Distance from the source; `INFINITY` when unreached.
    pub dist: Vec<f64>,
    /// Number of distinct shortest paths from the source.
    pub sigma: Vec<f64>,
    /// `(predecessor, edge)` pairs on shortest paths, in discovery order.
    pub preds: Vec<Vec<(usize, E)>>,
}

impl<E: Copy> ShortestPathDag<E> {
    fn new(source: usize, bound: usize) -> Self {
        let mut dist = vec![f64::INFINITY; bound];
        let mut sigma = vec![0.0; bound];
        dist[source] = 0.0;
        sigma[source] = 1.0;
        Self {
            source,
            order: Vec::new(),
            dist,
            sigma,
            preds: vec![Vec::new(); bound],
        }
    }

    pub fn reached(&self, node: usize) -> bool {
        self.dist.get(node).is_some_and(|d| d.is_finite())
    }

    /// Steps `(from, edge, to)` of the path that follows the first
    /// recorded predecessor at every hop. `None` if `target` is unreached.
    pub fn path_to(&self, target: usize) -> Option<Vec<(usize, E, usize)>> {
        if !self.reached(target) {
            return None;
        }
        let mut steps = Vec::new();
        let mut current = target;
        while current != self.source {
            let &(prev, edge) = self.preds[current].first()?;
            steps.push((prev, edge, current));
            current = prev;
        }
        steps.reverse();
        Some(steps)
    }
}

// ============================================================================
// Breadth-first search
// ============================================================================

/// Unweighted single-source search.
///
/// Every edge counts as distance 1 and parallel edges between the same pair
/// contribute one predecessor entry. The first predecessor of a node is the
/// edge that discovered it. With `stop_at`, the search ends once that node
/// is settled; its distance, path count and predecessors are final then.
pub fn breadth_first<A: Adjacency>(
    adj: &A,
    source: usize,
    stop_at: Option<usize>,
) -> ShortestPathDag<A::Edge> {
    let mut dag = ShortestPathDag::new(source, adj.node_bound());
    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        dag.order.push(v);
        if stop_at == Some(v) {
            break;
        }
        let next = dag.dist[v] + 1.0;
        let sigma_v = dag.sigma[v];
        adj.visit_neighbors(v, |edge, w| {
            if dag.dist[w].is_infinite() {
                dag.dist[w] = next;
                queue.push_back(w);
            }
            if dag.dist[w] == next && dag.preds[w].last().map(|p| p.0) != Some(v) {
                dag.sigma[w] += sigma_v;
                dag.preds[w].push((v, edge));
            }
        });
    }
    dag
}

// ============================================================================
// Dijkstra
// ============================================================================

/// Min-heap entry ordered by distance, then by push sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueItem {
    dist: f64,
    seq: u64,
    node: usize,
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn same_distance(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

/// Weighted single-source search.
///
/// `weight` must return non-negative values; callers validate weights
/// before searching. Distances within a relative 1e-12 of each other are
/// treated as ties so that equal-length paths accumulate path counts.
pub fn dijkstra<A, W>(
    adj: &A,
    source: usize,
    stop_at: Option<usize>,
    weight: W,
) -> ShortestPathDag<A::Edge>
where
    A: Adjacency,
    W: Fn(A::Edge) -> f64,
{
    let bound = adj.node_bound();
    let mut dag = ShortestPathDag::new(source, bound);
    let mut settled = vec![false; bound];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    heap.push(QueueItem {
        dist: 0.0,
        seq,
        node: source,
    });

    while let Some(QueueItem { dist, node: v, .. }) = heap.pop() {
        if settled[v] || dist > dag.dist[v] {
            continue;
        }
        settled[v] = true;
        dag.order.push(v);
        if stop_at == Some(v) {
            break;
        }
        let sigma_v = dag.sigma[v];
        adj.visit_neighbors(v, |edge, w| {
            if settled[w] {
                return;
            }
            let candidate = dist + weight(edge);
            if dag.dist[w].is_finite() && same_distance(candidate, dag.dist[w]) {
                if dag.preds[w].last().map(|p| p.0) != Some(v) {
                    dag.sigma[w] += sigma_v;
                    dag.preds[w].push((v, edge));
                }
            } else if candidate < dag.dist[w] {
                dag.dist[w] = candidate;
                dag.sigma[w] = sigma_v;
                dag.preds[w].clear();
                dag.preds[w].push((v, edge));
                seq += 1;
                heap.push(QueueItem {
                    dist: candidate,
                    seq,
                    node: w,
                });
            }
        });
    }
    dag
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Undirected edge list with weights; edge handle = position in the list.
    struct EdgeList {
        n: usize,
        adj: Vec<Vec<(usize, usize)>>,
        weights: Vec<f64>,
    }

    impl EdgeList {
        fn new(n: usize, edges: &[(usize, usize, f64)]) -> Self {
            let mut adj = vec![Vec::new(); n];
            let mut weights = Vec::new();
            for (i, &(a, b, w)) in edges.iter().enumerate() {
                adj[a].push((i, b));
                adj[b].push((i, a));
                weights.push(w);
            }
            Self { n, adj, weights }
        }
    }

    impl Adjacency for EdgeList {
        type Edge = usize;

        fn node_bound(&self) -> usize {
            self.n
        }

        fn visit_neighbors<F: FnMut(usize, usize)>(&self, node: usize, mut f: F) {
            for &(e, w) in &self.adj[node] {
                f(e, w);
            }
        }
    }

    #[test]
    fn test_bfs_diamond_counts_paths() {
        // 0 - 1 - 3, 0 - 2 - 3
        let g = EdgeList::new(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)]);
        let dag = breadth_first(&g, 0, None);
        assert_eq!(dag.dist, vec![0.0, 1.0, 1.0, 2.0]);
        assert_eq!(dag.sigma[3], 2.0);
        assert_eq!(dag.order, vec![0, 1, 2, 3]);
        // First discovered edge wins on reconstruction
        let path = dag.path_to(3).unwrap();
        assert_eq!(path, vec![(0, 0, 1), (1, 2, 3)]);
    }

    #[test]
    fn test_bfs_parallel_edges_count_once() {
        let g = EdgeList::new(2, &[(0, 1, 1.0), (0, 1, 1.0), (0, 1, 1.0)]);
        let dag = breadth_first(&g, 0, None);
        assert_eq!(dag.dist[1], 1.0);
        assert_eq!(dag.sigma[1], 1.0);
        assert_eq!(dag.preds[1].len(), 1);
    }

    #[test]
    fn test_bfs_unreached_node() {
        let g = EdgeList::new(3, &[(0, 1, 1.0)]);
        let dag = breadth_first(&g, 0, None);
        assert!(!dag.reached(2));
        assert!(dag.path_to(2).is_none());
        assert_eq!(dag.sigma[2], 0.0);
    }

    #[test]
    fn test_bfs_stop_at_keeps_target_final() {
        let g = EdgeList::new(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)]);
        let dag = breadth_first(&g, 0, Some(3));
        assert_eq!(dag.order.last(), Some(&3));
        assert_eq!(dag.sigma[3], 2.0);
    }

    #[test]
    fn test_dijkstra_prefers_lighter_route() {
        // Direct 0-2 costs 10, detour 0-1-2 costs 3
        let g = EdgeList::new(3, &[(0, 2, 10.0), (0, 1, 1.0), (1, 2, 2.0)]);
        let dag = dijkstra(&g, 0, None, |e| g.weights[e]);
        assert!((dag.dist[2] - 3.0).abs() < 1e-12);
        let hops: Vec<usize> = dag.path_to(2).unwrap().iter().map(|s| s.2).collect();
        assert_eq!(hops, vec![1, 2]);
    }

    #[test]
    fn test_dijkstra_ties_accumulate_sigma() {
        let g = EdgeList::new(4, &[(0, 1, 0.5), (0, 2, 1.5), (1, 3, 1.5), (2, 3, 0.5)]);
        let dag = dijkstra(&g, 0, None, |e| g.weights[e]);
        assert!((dag.dist[3] - 2.0).abs() < 1e-12);
        assert_eq!(dag.sigma[3], 2.0);
        assert_eq!(dag.preds[3].len(), 2);
    }

    #[test]
    fn test_dijkstra_unit_weights_match_bfs() {
        let edges: Vec<(usize, usize, f64)> =
            vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (0, 4, 1.0), (4, 3, 1.0)];
        let g = EdgeList::new(5, &edges);
        let bfs = breadth_first(&g, 0, None);
        let dij = dijkstra(&g, 0, None, |_| 1.0);
        assert_eq!(bfs.dist, dij.dist);
        assert_eq!(bfs.sigma, dij.sigma);
    }
}
