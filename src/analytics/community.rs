//! Community structure.
//!
//! - **Louvain**: greedy modularity local moving with optional coarsening
//! - **Connected components**: breadth-first sweep through the traversal kernel
//!
//! Both label nodes densely from 0 in order of first appearance in the
//! projection, which follows store insertion order, so unchanged input
//! always produces the same labeling.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use super::models::{AnalyticsConfig, CommunityInfo, CommunityResult, ComponentInfo};
use super::projection::InducedGraph;
use crate::store::NodeId;
use crate::traversal::breadth_first;

// ============================================================================
// Community Detection (Louvain)
// ============================================================================

/// One level of the (possibly coarsened) graph.
struct Level {
    /// Neighbor lists without self loops; each undirected edge listed on both ends.
    adj: Vec<Vec<(usize, f64)>>,
    /// Weight of the edges collapsed inside each super-node.
    self_loops: Vec<f64>,
}

impl Level {
    fn len(&self) -> usize {
        self.adj.len()
    }

    /// Weighted degree, counting a self loop twice.
    fn strengths(&self) -> Vec<f64> {
        self.adj
            .iter()
            .zip(&self.self_loops)
            .map(|(nbrs, &sl)| nbrs.iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * sl)
            .collect()
    }

    /// Collapse every community into a super-node.
    fn coarsen(&self, community: &[usize], count: usize) -> Level {
        let mut self_loops = vec![0.0; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        for (i, nbrs) in self.adj.iter().enumerate() {
            let ci = community[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in nbrs {
                let cj = community[j];
                if ci == cj {
                    // Seen once from each end
                    self_loops[ci] += w / 2.0;
                } else {
                    *links[ci].entry(cj).or_default() += w;
                }
            }
        }
        Level {
            adj: links.into_iter().map(|m| m.into_iter().collect()).collect(),
            self_loops,
        }
    }
}

/// Outcome of local moving on one level.
struct LocalMoving {
    /// Dense community per level node, numbered by first appearance
    community: Vec<usize>,
    count: usize,
    passes: usize,
    converged: bool,
}

/// Greedy local moving: each node joins the neighboring community with the
/// largest modularity gain above `threshold`; ties go to the lowest id.
fn local_moving(
    level: &Level,
    resolution: f64,
    threshold: f64,
    max_passes: usize,
) -> LocalMoving {
    let n = level.len();
    let strengths = level.strengths();
    let m2: f64 = strengths.iter().sum();

    let mut community: Vec<usize> = (0..n).collect();
    let mut comm_total_strength: Vec<f64> = strengths.clone();

    let mut passes = 0;
    let mut converged = false;
    while passes < max_passes {
        passes += 1;
        let mut moved = false;

        for node in 0..n {
            let current = community[node];

            // Ordered so that equal gains resolve to the lowest community id
            let mut comm_weights: BTreeMap<usize, f64> = BTreeMap::new();
            for &(neighbor, w) in &level.adj[node] {
                *comm_weights.entry(community[neighbor]).or_default() += w;
            }

            let ki = strengths[node];
            let w_in_current = comm_weights.get(&current).copied().unwrap_or(0.0);
            let remove_cost = w_in_current / m2
                - resolution * ki * (comm_total_strength[current] - ki) / (m2 * m2);

            let mut best_comm = current;
            let mut best_gain = threshold;
            for (&target, &w_to_target) in &comm_weights {
                if target == current {
                    continue;
                }
                let insert_cost =
                    w_to_target / m2 - resolution * ki * comm_total_strength[target] / (m2 * m2);
                let gain = insert_cost - remove_cost;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = target;
                }
            }

            if best_comm != current {
                comm_total_strength[current] -= ki;
                comm_total_strength[best_comm] += ki;
                community[node] = best_comm;
                moved = true;
            }
        }

        if !moved {
            converged = true;
            break;
        }
    }

    let count = renumber(&mut community);
    LocalMoving {
        community,
        count,
        passes,
        converged,
    }
}

/// Relabel densely by first appearance; returns the number of labels.
fn renumber(labels: &mut [usize]) -> usize {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    for c in labels.iter_mut() {
        let next = remap.len();
        *c = *remap.entry(*c).or_insert(next);
    }
    remap.len()
}

/// Detect communities on the undirected weighted projection.
///
/// Runs a single level of local moving unless `louvain_multilevel` is set,
/// in which case communities are collapsed into super-nodes and the process
/// repeats until a level moves nothing or `louvain_max_levels` is reached.
/// Singleton communities are valid output.
pub fn louvain_communities(graph: &InducedGraph, config: &AnalyticsConfig) -> CommunityResult {
    let n = graph.node_count();
    if n == 0 {
        return CommunityResult {
            labels: BTreeMap::new(),
            communities: vec![],
            modularity: 0.0,
            passes: 0,
            levels: 0,
            converged: true,
        };
    }
    let start = Instant::now();
    let resolution = config.louvain_resolution;

    let adj = graph.weighted_adjacency();
    let node_strengths: Vec<f64> = adj
        .iter()
        .map(|nbrs| nbrs.iter().map(|&(_, w)| w).sum())
        .collect();
    let total_weight: f64 = node_strengths.iter().sum::<f64>() / 2.0;

    // Original node → community
    let mut membership: Vec<usize> = (0..n).collect();
    let mut passes = 0;
    let mut levels = 0;
    let mut converged = true;

    if total_weight > 0.0 {
        let mut level = Level {
            adj: adj.clone(),
            self_loops: vec![0.0; n],
        };
        loop {
            let outcome = local_moving(
                &level,
                resolution,
                config.louvain_gain_threshold,
                config.louvain_max_passes,
            );
            levels += 1;
            passes += outcome.passes;
            converged &= outcome.converged;
            for m in membership.iter_mut() {
                *m = outcome.community[*m];
            }

            let shrank = outcome.count < level.len();
            if !config.louvain_multilevel || !shrank || levels >= config.louvain_max_levels {
                break;
            }
            level = level.coarsen(&outcome.community, outcome.count);
        }
    }

    if !converged {
        tracing::warn!(
            passes,
            max_passes = config.louvain_max_passes,
            "Louvain stopped at the pass cap while nodes were still moving"
        );
    }

    renumber(&mut membership);
    let modularity = compute_modularity(&membership, &adj, &node_strengths, resolution);
    let (labels, communities) = summarize(graph, &membership, &node_strengths);

    tracing::debug!(
        nodes = n,
        communities = communities.len(),
        modularity,
        passes,
        levels,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Louvain computed"
    );

    CommunityResult {
        labels,
        communities,
        modularity,
        passes,
        levels,
        converged,
    }
}

/// Build the id → label map and per-community metadata.
fn summarize(
    graph: &InducedGraph,
    membership: &[usize],
    node_strengths: &[f64],
) -> (BTreeMap<NodeId, u32>, Vec<CommunityInfo>) {
    let mut labels = BTreeMap::new();
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &c) in membership.iter().enumerate() {
        labels.insert(graph.node_id(i).clone(), c as u32);
        members.entry(c).or_default().push(i);
    }

    let mut communities: Vec<CommunityInfo> = members
        .into_iter()
        .map(|(id, nodes)| {
            // Strongest member names the community; earliest wins ties
            let hub = nodes
                .iter()
                .copied()
                .fold(nodes[0], |best, i| {
                    if node_strengths[i] > node_strengths[best] {
                        i
                    } else {
                        best
                    }
                });
            let hub = graph.node_id(hub).clone();
            CommunityInfo {
                id: id as u32,
                size: nodes.len(),
                label: hub.to_string(),
                hub,
                members: nodes.iter().map(|&i| graph.node_id(i).clone()).collect(),
            }
        })
        .collect();
    communities.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.id.cmp(&b.id)));
    (labels, communities)
}

/// Newman modularity Q with resolution γ:
/// Σ_c [ in_c / 2m − γ (tot_c / 2m)² ].
fn compute_modularity(
    community: &[usize],
    adj: &[Vec<(usize, f64)>],
    node_strengths: &[f64],
    resolution: f64,
) -> f64 {
    let m2: f64 = node_strengths.iter().sum();
    if m2 == 0.0 {
        return 0.0;
    }
    let count = community.iter().copied().max().map_or(0, |c| c + 1);
    let mut internal = vec![0.0; count];
    let mut total = vec![0.0; count];

    for (i, neighbors) in adj.iter().enumerate() {
        total[community[i]] += node_strengths[i];
        for &(j, w) in neighbors {
            if community[i] == community[j] {
                // Each undirected edge is listed from both ends
                internal[community[i]] += w;
            }
        }
    }

    internal
        .iter()
        .zip(&total)
        .map(|(&inside, &tot)| inside / m2 - resolution * (tot / m2).powi(2))
        .sum()
}

// ============================================================================
// Connected Components
// ============================================================================

/// Identify connected components of the projection.
///
/// Returns `(node_to_component, component_infos)`; components are numbered
/// by their first node in insertion order and listed largest first.
pub fn connected_components(graph: &InducedGraph) -> (BTreeMap<NodeId, u32>, Vec<ComponentInfo>) {
    let n = graph.node_count();
    let mut component_of: Vec<Option<u32>> = vec![None; n];
    let mut members: Vec<Vec<NodeId>> = Vec::new();

    for start in 0..n {
        if component_of[start].is_some() {
            continue;
        }
        let id = members.len() as u32;
        let dag = breadth_first(graph, start, None);
        let mut nodes: Vec<usize> = dag.order;
        nodes.sort_unstable();
        for &v in &nodes {
            component_of[v] = Some(id);
        }
        members.push(nodes.iter().map(|&v| graph.node_id(v).clone()).collect());
    }

    let mut node_map = BTreeMap::new();
    for (i, comp) in component_of.iter().enumerate() {
        if let Some(comp) = comp {
            node_map.insert(graph.node_id(i).clone(), *comp);
        }
    }

    let max_size = members.iter().map(Vec::len).max().unwrap_or(0);
    let mut components: Vec<ComponentInfo> = members
        .into_iter()
        .enumerate()
        .map(|(id, members)| ComponentInfo {
            id: id as u32,
            size: members.len(),
            is_main: members.len() == max_size,
            members,
        })
        .collect();
    components.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.id.cmp(&b.id)));

    (node_map, components)
}

// ============================================================================
// Tests
// ============================================================================
