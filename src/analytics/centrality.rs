//! Centrality algorithms.
//!
//! - **PageRank**: weighted power iteration on an undirected projection
//! - **Betweenness centrality**: Brandes, one traversal-kernel search per source
//! - **Clustering coefficient**: local clustering per node
//! - **Most connected people**: movie participations plus distinct collaborators
//!
//! PageRank and betweenness switch to the rayon pool once the projection
//! reaches `parallel_threshold` nodes. Both produce bit-identical output
//! either way: per-node arithmetic is the same, and partial sums are
//! reduced in a fixed order.

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use super::models::{AnalyticsConfig, ConnectedPerson, PageRankResult};
use super::projection::InducedGraph;
use crate::store::{GraphStore, NodeId, NodeKind};
use crate::traversal::{breadth_first, dijkstra, ShortestPathDag};

/// Sources handled per betweenness work unit.
const BETWEENNESS_CHUNK: usize = 32;

// ============================================================================
// PageRank (power iteration)
// ============================================================================

/// Compute PageRank scores for every node of the projection.
///
/// Rank flows along undirected edges proportionally to edge weight.
/// Isolated nodes hold the teleport share (1 − d)/N on every iteration; the
/// mass they would leak is spread uniformly over connected nodes, so scores
/// always sum to 1. A projection with no edges at all gives every node 1/N.
pub fn pagerank(graph: &InducedGraph, config: &AnalyticsConfig) -> PageRankResult {
    let n = graph.node_count();
    if n == 0 {
        return PageRankResult {
            scores: BTreeMap::new(),
            iterations: 0,
            converged: true,
        };
    }
    let start = Instant::now();

    let damping = config.pagerank_damping;
    let adj = graph.weighted_adjacency();
    let strengths: Vec<f64> = adj
        .iter()
        .map(|nbrs| nbrs.iter().map(|&(_, w)| w).sum())
        .collect();
    let connected = strengths.iter().filter(|&&s| s > 0.0).count();

    if connected == 0 {
        let uniform = 1.0 / n as f64;
        return PageRankResult {
            scores: collect_scores(graph, &vec![uniform; n]),
            iterations: 0,
            converged: true,
        };
    }

    let base = (1.0 - damping) / n as f64;
    let isolated = n - connected;
    // Teleport mass isolated nodes cannot pass on, shared by connected nodes
    let dangling = damping * isolated as f64 * base / connected as f64;
    let initial = (1.0 - isolated as f64 * base) / connected as f64;

    let mut scores: Vec<f64> = strengths
        .iter()
        .map(|&s| if s > 0.0 { initial } else { base })
        .collect();
    let mut next: Vec<f64> = vec![0.0; n];
    let mut share: Vec<f64> = vec![0.0; n];

    let parallel = n >= config.parallel_threshold;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.pagerank_max_iterations {
        iterations += 1;

        for (i, s) in share.iter_mut().enumerate() {
            *s = if strengths[i] > 0.0 {
                scores[i] / strengths[i]
            } else {
                0.0
            };
        }

        // Pull update: each node gathers from its neighbors
        let update = |i: usize| -> f64 {
            if strengths[i] == 0.0 {
                return base;
            }
            let inflow: f64 = adj[i].iter().map(|&(j, w)| w * share[j]).sum();
            base + dangling + damping * inflow
        };
        if parallel {
            (0..n).into_par_iter().map(update).collect_into_vec(&mut next);
        } else {
            next.clear();
            next.extend((0..n).map(update));
        }

        let diff: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        std::mem::swap(&mut scores, &mut next);

        if diff < config.pagerank_tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            iterations,
            tolerance = config.pagerank_tolerance,
            "PageRank stopped at the iteration cap before converging"
        );
    }
    tracing::debug!(
        nodes = n,
        iterations,
        converged,
        parallel,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "PageRank computed"
    );

    PageRankResult {
        scores: collect_scores(graph, &scores),
        iterations,
        converged,
    }
}

fn collect_scores(graph: &InducedGraph, values: &[f64]) -> BTreeMap<NodeId, f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (graph.node_id(i).clone(), v))
        .collect()
}

// ============================================================================
// Betweenness Centrality (Brandes)
// ============================================================================

/// Compute betweenness centrality for every node of the projection.
///
/// One breadth-first search per source (or Dijkstra with edge length
/// 1/weight when `betweenness_weighted` is set); shortest-path ties split
/// credit as σ_sv/σ_sw. Scores are halved since every undirected pair is
/// counted from both ends, then optionally scaled by 2/((n−1)(n−2)).
///
/// O(V·E) unweighted: restrict the projection first on large graphs.
pub fn betweenness_centrality(
    graph: &InducedGraph,
    config: &AnalyticsConfig,
) -> BTreeMap<NodeId, f64> {
    let n = graph.node_count();
    if n == 0 {
        return BTreeMap::new();
    }
    let start = Instant::now();

    let sources: Vec<usize> = (0..n).collect();
    let parallel = n >= config.parallel_threshold;
    let partials: Vec<Vec<f64>> = if parallel {
        sources
            .par_chunks(BETWEENNESS_CHUNK)
            .map(|chunk| accumulate_chunk(graph, chunk, config.betweenness_weighted))
            .collect()
    } else {
        sources
            .chunks(BETWEENNESS_CHUNK)
            .map(|chunk| accumulate_chunk(graph, chunk, config.betweenness_weighted))
            .collect()
    };

    // Reduce in chunk order
    let mut scores = vec![0.0; n];
    for partial in &partials {
        for (total, p) in scores.iter_mut().zip(partial) {
            *total += p;
        }
    }

    let scale = if config.betweenness_normalized {
        if n > 2 {
            1.0 / ((n - 1) * (n - 2)) as f64
        } else {
            0.0
        }
    } else {
        0.5
    };
    for s in scores.iter_mut() {
        *s *= scale;
    }

    tracing::debug!(
        nodes = n,
        edges = graph.edge_count(),
        parallel,
        weighted = config.betweenness_weighted,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Betweenness computed"
    );
    collect_scores(graph, &scores)
}

/// Dependency sums of one chunk of sources, accumulated in source order.
fn accumulate_chunk(graph: &InducedGraph, sources: &[usize], weighted: bool) -> Vec<f64> {
    let n = graph.node_count();
    let mut totals = vec![0.0; n];
    let mut delta = vec![0.0; n];
    for &s in sources {
        let dag = if weighted {
            dijkstra(graph, s, None, |e| {
                let w = graph.graph[e];
                if w > 0.0 {
                    1.0 / w
                } else {
                    f64::INFINITY
                }
            })
        } else {
            breadth_first(graph, s, None)
        };
        accumulate_dependencies(&dag, &mut delta, &mut totals);
    }
    totals
}

/// Brandes back-propagation over one source's DAG.
fn accumulate_dependencies<E>(dag: &ShortestPathDag<E>, delta: &mut [f64], totals: &mut [f64]) {
    for &w in &dag.order {
        delta[w] = 0.0;
    }
    for &w in dag.order.iter().rev() {
        let coeff = (1.0 + delta[w]) / dag.sigma[w];
        for &(v, _) in &dag.preds[w] {
            delta[v] += dag.sigma[v] * coeff;
        }
        if w != dag.source {
            totals[w] += delta[w];
        }
    }
}

// ============================================================================
// Clustering Coefficient
// ============================================================================

/// Local clustering coefficient: linked neighbor pairs / possible pairs.
///
/// Nodes with fewer than two distinct neighbors score 0.
pub fn clustering_coefficient(graph: &InducedGraph) -> BTreeMap<NodeId, f64> {
    let g = &graph.graph;
    let mut result = BTreeMap::new();

    for idx in g.node_indices() {
        let mut seen = HashSet::new();
        let neighbors: Vec<NodeIndex> = g
            .neighbors(idx)
            .filter(|&nb| nb != idx && seen.insert(nb))
            .collect();

        let k = neighbors.len();
        let coeff = if k < 2 {
            0.0
        } else {
            let mut linked = 0usize;
            for i in 0..k {
                for j in (i + 1)..k {
                    if g.contains_edge(neighbors[i], neighbors[j]) {
                        linked += 1;
                    }
                }
            }
            linked as f64 / (k * (k - 1) / 2) as f64
        };
        result.insert(g[idx].clone(), coeff);
    }
    result
}

// ============================================================================
// Most connected people
// ============================================================================

/// People ranked by ACTED_IN/DIRECTED relationships plus distinct collaborators.
///
/// People with neither are left out. Ties are broken by id.
pub fn most_connected_people(store: &GraphStore, limit: usize) -> Vec<ConnectedPerson> {
    let collaborations = store.collaborations();
    let mut ranked: Vec<ConnectedPerson> = store
        .nodes_of_kind(NodeKind::Person)
        .filter_map(|person| {
            let slot = store.slot_of(&person.id)?;
            let movie_connections = store.participations(slot).len();
            let person_connections = collaborations.partners(slot).len();
            let total_connections = movie_connections + person_connections;
            (total_connections > 0).then(|| ConnectedPerson {
                person: person.id.clone(),
                name: person.label(),
                movie_connections,
                person_connections,
                total_connections,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_connections
            .cmp(&a.total_connections)
            .then_with(|| a.person.cmp(&b.person))
    });
    ranked.truncate(limit);
    ranked
}

// ============================================================================
// Tests
// ============================================================================
