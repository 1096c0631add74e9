//! Analytics engine: single entry point over a shared graph.
//!
//! `GraphAnalyticsEngine` owns a [`SharedGraph`] handle and the tuning
//! configuration. Every method takes the read lock for the duration of one
//! computation, so any number of analytics can run concurrently while
//! mutations wait.
//!
//! [`compute_all`] runs the full pipeline on the person collaboration
//! projection:
//!
//! 1. **PageRank**
//! 2. **Betweenness**
//! 3. **Louvain communities**
//! 4. **Clustering coefficient**
//! 5. **Connected components**

use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;

use super::centrality::{
    betweenness_centrality, clustering_coefficient, most_connected_people, pagerank,
};
use super::community::{connected_components, louvain_communities};
use super::insights::{
    collaboration_network, genre_analysis, graph_statistics, influential_movies,
    temporal_analysis,
};
use super::models::{
    AnalyticsConfig, CollaborationNetwork, CommunityResult, ComponentInfo, ConnectedPerson,
    GenreAnalysis, GraphAnalytics, GraphStatistics, InfluentialMovie, NodeMetrics,
    PageRankResult, Recommendation, RecommendationConfig, SimilarPerson, TemporalAnalysis,
};
use super::projection::InducedGraph;
use super::recommend::{recommend_movies, similar_people};
use crate::error::Result;
use crate::store::{GraphStore, NodeId, NodeKind, RelKind, Relationship, SharedGraph};
use crate::traversal::{shortest_path, weighted_shortest_path, Path, TraversalSpec, WeightedPath};

// ============================================================================
// Full pipeline
// ============================================================================

/// Run every projection algorithm and assemble per-person metrics.
pub fn compute_all(store: &GraphStore, config: &AnalyticsConfig) -> GraphAnalytics {
    let start = Instant::now();
    let graph = InducedGraph::collaboration(store);

    // 1. PageRank
    let pr = pagerank(&graph, config);

    // 2. Betweenness centrality
    let bc = betweenness_centrality(&graph, config);

    // 3. Louvain communities, labeled with member names
    let mut louvain = louvain_communities(&graph, config);
    label_communities(store, &mut louvain);

    // 4. Clustering coefficient
    let cc = clustering_coefficient(&graph);

    // 5. Connected components
    let (comp_map, components) = connected_components(&graph);

    // 6. Assemble NodeMetrics per person
    let strengths = graph.strengths();
    let g = &graph.graph;
    let mut metrics: BTreeMap<NodeId, NodeMetrics> = BTreeMap::new();
    for idx in g.node_indices() {
        let id = &g[idx];
        metrics.insert(
            id.clone(),
            NodeMetrics {
                pagerank: pr.scores.get(id).copied().unwrap_or(0.0),
                betweenness: bc.get(id).copied().unwrap_or(0.0),
                community_id: louvain.labels.get(id).copied().unwrap_or(0),
                clustering_coefficient: cc.get(id).copied().unwrap_or(0.0),
                component_id: comp_map.get(id).copied().unwrap_or(0),
                degree: g.neighbors(idx).count(),
                strength: strengths[idx.index()],
            },
        );
    }

    let elapsed = start.elapsed();
    tracing::info!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        communities = louvain.communities.len(),
        components = components.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Graph analytics computed"
    );

    GraphAnalytics {
        metrics,
        communities: louvain.communities,
        components,
        modularity: louvain.modularity,
        pagerank_iterations: pr.iterations,
        pagerank_converged: pr.converged,
        louvain_passes: louvain.passes,
        louvain_converged: louvain.converged,
        node_count: g.node_count(),
        edge_count: g.edge_count(),
        computation_ms: elapsed.as_millis() as u64,
        computed_at: Utc::now(),
    }
}

/// Replace hub ids with the hub's display label.
fn label_communities(store: &GraphStore, result: &mut CommunityResult) {
    for community in &mut result.communities {
        if let Some(hub) = store.node(&community.hub) {
            community.label = hub.label();
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Analytics facade over a shared movie graph.
pub struct GraphAnalyticsEngine {
    graph: SharedGraph,
    config: AnalyticsConfig,
    recommendation: RecommendationConfig,
}

impl GraphAnalyticsEngine {
    pub fn new(graph: SharedGraph, config: AnalyticsConfig) -> Self {
        Self {
            graph,
            config,
            recommendation: RecommendationConfig::default(),
        }
    }

    /// Override the recommendation signal weights.
    pub fn with_recommendation(mut self, recommendation: RecommendationConfig) -> Self {
        self.recommendation = recommendation;
        self
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn recommendation_config(&self) -> &RecommendationConfig {
        &self.recommendation
    }

    /// Projection of `kind` nodes joined through `via`.
    pub fn projection(&self, kind: NodeKind, via: RelKind) -> InducedGraph {
        InducedGraph::project(&self.graph.read(), kind, via)
    }

    // ------------------------------------------------------------------
    // Centrality
    // ------------------------------------------------------------------

    /// PageRank over the person collaboration projection.
    pub fn pagerank(&self) -> PageRankResult {
        self.pagerank_on(NodeKind::Person, RelKind::CollaboratedWith)
    }

    /// PageRank over an arbitrary projection.
    pub fn pagerank_on(&self, kind: NodeKind, via: RelKind) -> PageRankResult {
        let graph = self.projection(kind, via);
        pagerank(&graph, &self.config)
    }

    pub fn betweenness(&self) -> BTreeMap<NodeId, f64> {
        let graph = self.projection(NodeKind::Person, RelKind::CollaboratedWith);
        betweenness_centrality(&graph, &self.config)
    }

    pub fn clustering(&self) -> BTreeMap<NodeId, f64> {
        let graph = self.projection(NodeKind::Person, RelKind::CollaboratedWith);
        clustering_coefficient(&graph)
    }

    pub fn most_connected(&self, limit: usize) -> Vec<ConnectedPerson> {
        most_connected_people(&self.graph.read(), limit)
    }

    // ------------------------------------------------------------------
    // Communities
    // ------------------------------------------------------------------

    /// Louvain communities, labeled by their strongest member's name.
    pub fn communities(&self) -> CommunityResult {
        let store = self.graph.read();
        let graph = InducedGraph::collaboration(&store);
        let mut result = louvain_communities(&graph, &self.config);
        label_communities(&store, &mut result);
        result
    }

    pub fn components(&self) -> (BTreeMap<NodeId, u32>, Vec<ComponentInfo>) {
        let graph = self.projection(NodeKind::Person, RelKind::CollaboratedWith);
        connected_components(&graph)
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    pub fn shortest_path(&self, source: &NodeId, target: &NodeId, spec: &TraversalSpec) -> Result<Path> {
        shortest_path(&self.graph.read(), source, target, spec)
    }

    pub fn weighted_shortest_path<W>(
        &self,
        source: &NodeId,
        target: &NodeId,
        spec: &TraversalSpec,
        weight_fn: W,
    ) -> Result<WeightedPath>
    where
        W: Fn(&Relationship) -> f64,
    {
        weighted_shortest_path(&self.graph.read(), source, target, spec, weight_fn)
    }

    // ------------------------------------------------------------------
    // Recommendations
    // ------------------------------------------------------------------

    pub fn recommend(&self, person: &NodeId) -> Result<Vec<Recommendation>> {
        recommend_movies(&self.graph.read(), person, &self.recommendation, &self.config)
    }

    pub fn similar_people(&self, person: &NodeId, limit: usize) -> Result<Vec<SimilarPerson>> {
        similar_people(&self.graph.read(), person, limit)
    }

    // ------------------------------------------------------------------
    // Insights
    // ------------------------------------------------------------------

    pub fn statistics(&self) -> GraphStatistics {
        graph_statistics(&self.graph.read())
    }

    pub fn genre_analysis(&self) -> GenreAnalysis {
        genre_analysis(&self.graph.read())
    }

    pub fn collaboration_network(&self, person: &NodeId, depth: usize) -> Result<CollaborationNetwork> {
        collaboration_network(&self.graph.read(), person, depth)
    }

    pub fn influential_movies(&self, limit: usize) -> Vec<InfluentialMovie> {
        influential_movies(&self.graph.read(), limit)
    }

    pub fn temporal_analysis(&self) -> TemporalAnalysis {
        temporal_analysis(&self.graph.read())
    }

    // ------------------------------------------------------------------
    // Full report
    // ------------------------------------------------------------------

    /// Run the full pipeline against one read snapshot.
    pub fn analyze(&self) -> GraphAnalytics {
        let store = self.graph.read();
        compute_all(&store, &self.config)
    }
}

// ============================================================================
// Tests
// ============================================================================
