//! Traversal kernel.
//!
//! Breadth-first and priority-queue shortest-path search, generic over the
//! [`Adjacency`] trait so the same loops serve store-level path queries and
//! the centrality algorithms running on analytics projections.
//!
//! - [`kernel`]: `Adjacency`, `ShortestPathDag`, `breadth_first`, `dijkstra`
//! - [`paths`]: `shortest_path` / `weighted_shortest_path` over a `GraphStore`

pub mod kernel;
pub mod paths;

pub use kernel::{breadth_first, dijkstra, Adjacency, ShortestPathDag};
pub use paths::{shortest_path, weighted_shortest_path, Path, StoreView, TraversalSpec, WeightedPath};
