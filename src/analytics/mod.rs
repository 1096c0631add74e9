//! Graph analytics over the movie graph.
//!
//! Algorithms run on an [`InducedGraph`] projection (people joined by
//! derived collaborations by default) or directly on a read snapshot of the
//! store:
//!
//! - [`centrality`]: PageRank, betweenness, clustering, most connected people
//! - [`community`]: Louvain communities, connected components
//! - [`recommend`]: movie recommendations, similar people
//! - [`insights`]: statistics, genres, collaboration networks, timelines
//! - [`engine`]: `GraphAnalyticsEngine` facade over a `SharedGraph`

pub mod centrality;
pub mod community;
pub mod engine;
pub mod insights;
pub mod models;
pub mod projection;
pub mod recommend;

pub use centrality::{betweenness_centrality, clustering_coefficient, most_connected_people, pagerank};
pub use community::{connected_components, louvain_communities};
pub use engine::{compute_all, GraphAnalyticsEngine};
pub use insights::{
    collaboration_network, genre_analysis, graph_statistics, influential_movies, temporal_analysis,
};
pub use models::*;
pub use projection::InducedGraph;
pub use recommend::{recommend_movies, similar_people};
