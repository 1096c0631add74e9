//! Descriptive graph insights.
//!
//! Aggregate views over the movie graph that complement the ranking
//! algorithms: size statistics, genre popularity and co-occurrence,
//! a person's collaboration network, influential movies, and release /
//! career timelines.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::models::{
    CareerSpan, CollaborationNetwork, DirectCollaborator, GenreAnalysis, GenreCooccurrence,
    GenreStats, GraphStatistics, InfluentialMovie, NetworkMember, TemporalAnalysis, YearStats,
};
use super::projection::InducedGraph;
use crate::error::Result;
use crate::store::{GraphStore, Node, NodeId, NodeKind, RelKind};
use crate::traversal::breadth_first;

/// Maximum genre pairs reported by [`genre_analysis`].
const MAX_GENRE_PAIRS: usize = 20;
/// Maximum careers reported by [`temporal_analysis`].
const MAX_CAREERS: usize = 10;

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn year_of(node: &Node) -> Option<i64> {
    node.attributes.get("year").and_then(|v| v.as_i64())
}

// ============================================================================
// Statistics
// ============================================================================

/// Node and relationship counts plus person–movie density.
pub fn graph_statistics(store: &GraphStore) -> GraphStatistics {
    let mut nodes_by_kind: BTreeMap<String, usize> = NodeKind::ALL
        .iter()
        .map(|kind| (kind.to_string(), 0))
        .collect();
    for node in store.nodes() {
        *nodes_by_kind.entry(node.kind.to_string()).or_default() += 1;
    }

    let mut relationships_by_kind: BTreeMap<String, usize> = RelKind::ALL
        .iter()
        .filter(|kind| !kind.is_derived())
        .map(|kind| (kind.to_string(), 0))
        .collect();
    let mut movie_person_relationships = 0;
    for rel in store.relationships() {
        *relationships_by_kind.entry(rel.kind.to_string()).or_default() += 1;
        if rel.kind.is_participation() {
            movie_person_relationships += 1;
        }
    }

    let movies = store.nodes_of_kind(NodeKind::Movie).count();
    let people = store.nodes_of_kind(NodeKind::Person).count();
    let movie_person_density = if movies > 0 && people > 0 {
        movie_person_relationships as f64 / (movies * people) as f64
    } else {
        0.0
    };

    GraphStatistics {
        total_nodes: store.node_count(),
        total_relationships: store.relationship_count(),
        nodes_by_kind,
        relationships_by_kind,
        movies,
        people,
        movie_person_relationships,
        movie_person_density,
        collaboration_pairs: store.collaborations().len(),
    }
}

// ============================================================================
// Genres
// ============================================================================

/// Genre popularity (most movies first) and the most frequent genre pairs.
pub fn genre_analysis(store: &GraphStore) -> GenreAnalysis {
    let mut movies_per_genre: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut pairs: BTreeMap<(String, String), usize> = BTreeMap::new();

    for movie in store.nodes_of_kind(NodeKind::Movie) {
        let Some(slot) = store.slot_of(&movie.id) else {
            continue;
        };
        let genres = store.genres_of(slot);
        for &g in &genres {
            movies_per_genre.entry(g).or_default().push(slot);
        }

        let names: BTreeSet<String> = genres
            .iter()
            .map(|&g| store.slot(g).node.label())
            .collect();
        let names: Vec<String> = names.into_iter().collect();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                *pairs
                    .entry((names[i].clone(), names[j].clone()))
                    .or_default() += 1;
            }
        }
    }

    let mut genres: Vec<GenreStats> = store
        .nodes_of_kind(NodeKind::Genre)
        .filter_map(|genre| {
            let slot = store.slot_of(&genre.id)?;
            let movies = movies_per_genre.get(&slot).map(Vec::as_slice).unwrap_or(&[]);
            let ratings: Vec<f64> = movies
                .iter()
                .filter_map(|&m| store.slot(m).node.attr_f64("rating"))
                .collect();
            Some(GenreStats {
                genre: genre.id.clone(),
                name: genre.label(),
                movie_count: movies.len(),
                avg_rating: mean(&ratings),
            })
        })
        .collect();
    genres.sort_by(|a, b| {
        b.movie_count
            .cmp(&a.movie_count)
            .then_with(|| a.genre.cmp(&b.genre))
    });

    let mut cooccurrence: Vec<GenreCooccurrence> = pairs
        .into_iter()
        .map(|((first, second), movies)| GenreCooccurrence {
            first,
            second,
            movies,
        })
        .collect();
    // Stable sort keeps the name order among equal counts
    cooccurrence.sort_by(|a, b| b.movies.cmp(&a.movies));
    cooccurrence.truncate(MAX_GENRE_PAIRS);

    GenreAnalysis {
        genres,
        cooccurrence,
    }
}

// ============================================================================
// Collaboration network
// ============================================================================

/// People within `depth` collaboration hops of `person`, plus direct
/// collaborators with the titles of their shared movies.
///
/// Network members are ordered by degrees of separation, then name;
/// direct collaborators by name, with shared titles sorted.
pub fn collaboration_network(
    store: &GraphStore,
    person: &NodeId,
    depth: usize,
) -> Result<CollaborationNetwork> {
    let slot = store.require_slot(person)?;
    let graph = InducedGraph::collaboration(store);

    let mut network: Vec<NetworkMember> = Vec::new();
    if let Some(origin) = graph.get_index(person) {
        let dag = breadth_first(&graph, origin.index(), None);
        for &v in dag.order.iter().skip(1) {
            let degrees = dag.dist[v] as usize;
            if degrees > depth {
                break;
            }
            let id = graph.node_id(v);
            let name = store.node(id).map(Node::label).unwrap_or_else(|| id.to_string());
            network.push(NetworkMember {
                person: id.clone(),
                name,
                degrees,
            });
        }
    }
    network.sort_by(|a, b| a.degrees.cmp(&b.degrees).then_with(|| a.name.cmp(&b.name)));

    let own_movies: HashSet<usize> = store.participations(slot).into_iter().collect();
    let mut direct: Vec<DirectCollaborator> = store
        .collaborations()
        .partners(slot)
        .iter()
        .map(|&(other, _)| {
            let shared: BTreeSet<String> = store
                .participations(other)
                .into_iter()
                .filter(|m| own_movies.contains(m))
                .map(|m| store.slot(m).node.label())
                .collect();
            let node = &store.slot(other).node;
            DirectCollaborator {
                person: node.id.clone(),
                name: node.label(),
                shared_movies: shared.into_iter().collect(),
            }
        })
        .collect();
    direct.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.person.cmp(&b.person)));

    Ok(CollaborationNetwork {
        person: person.clone(),
        depth,
        network,
        direct,
    })
}

// ============================================================================
// Influential movies
// ============================================================================

/// Movies ranked by cast size × distinct other movies of the cast.
///
/// Movies scoring 0 are left out; ties go to the higher rating, then the id.
pub fn influential_movies(store: &GraphStore, limit: usize) -> Vec<InfluentialMovie> {
    let mut ranked: Vec<InfluentialMovie> = store
        .nodes_of_kind(NodeKind::Movie)
        .filter_map(|movie| {
            let slot = store.slot_of(&movie.id)?;
            let mut cast = store.participants(slot);
            cast.sort_unstable();
            cast.dedup();
            let connected: HashSet<usize> = cast
                .iter()
                .flat_map(|&p| store.participations(p))
                .filter(|&m| m != slot)
                .collect();
            let influence_score = cast.len() * connected.len();
            (influence_score > 0).then(|| InfluentialMovie {
                movie: movie.id.clone(),
                title: movie.label(),
                rating: movie.attr_f64("rating"),
                cast_size: cast.len(),
                connected_movies: connected.len(),
                influence_score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.influence_score
            .cmp(&a.influence_score)
            .then_with(|| {
                let ra = a.rating.unwrap_or(f64::NEG_INFINITY);
                let rb = b.rating.unwrap_or(f64::NEG_INFINITY);
                rb.total_cmp(&ra)
            })
            .then_with(|| a.movie.cmp(&b.movie))
    });
    ranked.truncate(limit);
    ranked
}

// ============================================================================
// Timelines
// ============================================================================

/// Movies per release year and the longest careers.
///
/// Only movies with an integer `year` attribute take part. A career spans
/// the earliest to the latest such movie a person worked on; single-year
/// careers are left out.
pub fn temporal_analysis(store: &GraphStore) -> TemporalAnalysis {
    let mut by_year: BTreeMap<i64, (usize, Vec<f64>)> = BTreeMap::new();
    for movie in store.nodes_of_kind(NodeKind::Movie) {
        if let Some(year) = year_of(movie) {
            let entry = by_year.entry(year).or_default();
            entry.0 += 1;
            entry.1.extend(movie.attr_f64("rating"));
        }
    }
    let movies_per_year = by_year
        .into_iter()
        .map(|(year, (movie_count, ratings))| YearStats {
            year,
            movie_count,
            avg_rating: mean(&ratings),
        })
        .collect();

    let mut longest_careers: Vec<CareerSpan> = store
        .nodes_of_kind(NodeKind::Person)
        .filter_map(|person| {
            let slot = store.slot_of(&person.id)?;
            let years: Vec<i64> = store
                .participations(slot)
                .into_iter()
                .filter_map(|m| year_of(&store.slot(m).node))
                .collect();
            let start = *years.iter().min()?;
            let end = *years.iter().max()?;
            (end > start).then(|| CareerSpan {
                person: person.id.clone(),
                name: person.label(),
                start,
                end,
                span: end - start,
            })
        })
        .collect();
    longest_careers.sort_by(|a, b| b.span.cmp(&a.span).then_with(|| a.person.cmp(&b.person)));
    longest_careers.truncate(MAX_CAREERS);

    TemporalAnalysis {
        movies_per_year,
        longest_careers,
    }
}

// ============================================================================
// Tests
// ============================================================================
