//! Analytics data models.
//!
//! ## Configuration
//! - [`AnalyticsConfig`]: tuning parameters for the analytics algorithms
//! - [`RecommendationConfig`]: recommendation signal weights and result limit
//!
//! ## Algorithm results
//! - [`PageRankResult`]: scores plus convergence information
//! - [`CommunityResult`] / [`CommunityInfo`]: Louvain partition
//! - [`ComponentInfo`]: connected component metadata
//! - [`Recommendation`], [`SimilarPerson`], [`ConnectedPerson`]: ranked people/movies
//!
//! ## Insights
//! - [`GraphStatistics`], [`GenreAnalysis`], [`CollaborationNetwork`],
//!   [`InfluentialMovie`], [`TemporalAnalysis`]
//!
//! ## Report
//! - [`NodeMetrics`] / [`GraphAnalytics`]: aggregated result of a full analytics run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::NodeId;

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the analytics algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// PageRank damping factor (default: 0.85)
    pub pagerank_damping: f64,
    /// PageRank convergence tolerance on the L1 change (default: 1e-6)
    pub pagerank_tolerance: f64,
    /// PageRank maximum iterations (default: 100)
    pub pagerank_max_iterations: usize,
    /// Louvain resolution parameter (default: 1.0, higher = smaller communities)
    pub louvain_resolution: f64,
    /// Louvain maximum local-moving passes per level (default: 20)
    pub louvain_max_passes: usize,
    /// Minimum modularity gain for a move to count (default: 1e-9)
    pub louvain_gain_threshold: f64,
    /// Coarsen communities into super-nodes and repeat (default: false)
    pub louvain_multilevel: bool,
    /// Level cap when `louvain_multilevel` is set (default: 10)
    pub louvain_max_levels: usize,
    /// Scale betweenness by 2/((n-1)(n-2)) (default: true)
    pub betweenness_normalized: bool,
    /// Use 1/weight edge lengths for betweenness (default: false)
    pub betweenness_weighted: bool,
    /// Node count from which PageRank and betweenness run on the rayon pool (default: 200)
    pub parallel_threshold: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_tolerance: 1e-6,
            pagerank_max_iterations: 100,
            louvain_resolution: 1.0,
            louvain_max_passes: 20,
            louvain_gain_threshold: 1e-9,
            louvain_multilevel: false,
            louvain_max_levels: 10,
            betweenness_normalized: true,
            betweenness_weighted: false,
            parallel_threshold: 200,
        }
    }
}

/// Recommendation signal weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Weight of the shared-genre ratio (default: 0.6)
    pub genre_overlap: f64,
    /// Weight of the distinct-collaborator count (default: 0.4)
    pub collaborator_signal: f64,
    /// Weight of the collaborators' summed PageRank (default: 0.0, PageRank skipped)
    pub influence: f64,
    /// Maximum number of results, `None` for all
    pub limit: Option<usize>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            genre_overlap: 0.6,
            collaborator_signal: 0.4,
            influence: 0.0,
            limit: None,
        }
    }
}

// ============================================================================
// Centrality
// ============================================================================

/// PageRank scores with convergence information.
///
/// Hitting the iteration cap is not an error: `converged` is false and
/// `scores` hold the last iterate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRankResult {
    pub scores: BTreeMap<NodeId, f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl PageRankResult {
    /// Highest scores first, ties by id.
    pub fn top(&self, limit: usize) -> Vec<(NodeId, f64)> {
        rank_desc(&self.scores, limit)
    }
}

/// Sort a score map descending, ties by ascending id.
pub fn rank_desc(scores: &BTreeMap<NodeId, f64>, limit: usize) -> Vec<(NodeId, f64)> {
    let mut ranked: Vec<(NodeId, f64)> = scores.iter().map(|(id, s)| (id.clone(), *s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// A person ranked by movie participations plus distinct collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedPerson {
    pub person: NodeId,
    pub name: String,
    /// ACTED_IN/DIRECTED relationships
    pub movie_connections: usize,
    /// Distinct collaborators
    pub person_connections: usize,
    pub total_connections: usize,
}

// ============================================================================
// Community detection
// ============================================================================

/// Metadata about a Louvain community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityInfo {
    /// Dense label starting at 0
    pub id: u32,
    pub size: usize,
    /// Members in store insertion order
    pub members: Vec<NodeId>,
    /// Member with the largest collaboration strength
    pub hub: NodeId,
    /// Display label of the hub
    pub label: String,
}

/// Result of a Louvain run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityResult {
    pub labels: BTreeMap<NodeId, u32>,
    /// Sorted by size descending, then id
    pub communities: Vec<CommunityInfo>,
    /// Newman modularity of `labels` on the original graph
    pub modularity: f64,
    /// Local-moving passes across all levels
    pub passes: usize,
    pub levels: usize,
    /// False when a level stopped at the pass cap while still moving nodes
    pub converged: bool,
}

/// Metadata about a connected component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub id: u32,
    pub size: usize,
    pub members: Vec<NodeId>,
    /// Whether this is the largest component (ties all count)
    pub is_main: bool,
}

// ============================================================================
// Recommendations
// ============================================================================

/// A movie recommended to a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie: NodeId,
    pub title: String,
    pub score: f64,
    /// Shared genres / candidate genres
    pub genre_overlap: f64,
    /// Distinct collaborators on the candidate
    pub collaborators: usize,
    /// Summed PageRank of those collaborators (0 unless weighted)
    pub influence: f64,
}

/// A person similar to the query person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPerson {
    pub person: NodeId,
    pub name: String,
    pub shared_genres: usize,
    pub shared_movies: usize,
    /// `shared_genres + 2 * shared_movies`
    pub score: usize,
}

// ============================================================================
// Insights
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_relationships: usize,
    pub nodes_by_kind: BTreeMap<String, usize>,
    pub relationships_by_kind: BTreeMap<String, usize>,
    pub movies: usize,
    pub people: usize,
    /// ACTED_IN + DIRECTED relationships
    pub movie_person_relationships: usize,
    /// `movie_person_relationships / (movies * people)`, 0 when either is empty
    pub movie_person_density: f64,
    /// Derived COLLABORATED_WITH pairs
    pub collaboration_pairs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStats {
    pub genre: NodeId,
    pub name: String,
    pub movie_count: usize,
    /// Mean `rating` over movies that carry one
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreCooccurrence {
    pub first: String,
    pub second: String,
    pub movies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreAnalysis {
    pub genres: Vec<GenreStats>,
    pub cooccurrence: Vec<GenreCooccurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMember {
    pub person: NodeId,
    pub name: String,
    /// Collaboration hops from the query person
    pub degrees: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectCollaborator {
    pub person: NodeId,
    pub name: String,
    /// Titles of the shared movies, sorted
    pub shared_movies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationNetwork {
    pub person: NodeId,
    pub depth: usize,
    pub network: Vec<NetworkMember>,
    pub direct: Vec<DirectCollaborator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluentialMovie {
    pub movie: NodeId,
    pub title: String,
    pub rating: Option<f64>,
    /// Distinct people with ACTED_IN/DIRECTED edges to the movie
    pub cast_size: usize,
    /// Distinct other movies those people worked on
    pub connected_movies: usize,
    pub influence_score: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    pub year: i64,
    pub movie_count: usize,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerSpan {
    pub person: NodeId,
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub span: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalAnalysis {
    pub movies_per_year: Vec<YearStats>,
    pub longest_careers: Vec<CareerSpan>,
}

// ============================================================================
// Report
// ============================================================================

/// Per-person metrics on the collaboration projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub pagerank: f64,
    pub betweenness: f64,
    pub community_id: u32,
    pub clustering_coefficient: f64,
    pub component_id: u32,
    /// Distinct collaborators
    pub degree: usize,
    /// Summed co-occurrence weight
    pub strength: f64,
}

/// Aggregated result of a full analytics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAnalytics {
    pub metrics: BTreeMap<NodeId, NodeMetrics>,
    pub communities: Vec<CommunityInfo>,
    pub components: Vec<ComponentInfo>,
    pub modularity: f64,
    pub pagerank_iterations: usize,
    pub pagerank_converged: bool,
    pub louvain_passes: usize,
    pub louvain_converged: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub computation_ms: u64,
    pub computed_at: DateTime<Utc>,
}

// ============================================================================
// Tests
// ============================================================================
