//! Recommendation engine.
//!
//! Movie recommendations blend three signals for every movie the person
//! has not worked on:
//! - genre overlap: shared genres / genres of the candidate
//! - collaborator signal: distinct collaborators with ACTED_IN/DIRECTED on it
//! - influence: those collaborators' summed PageRank (off by default)
//!
//! People similarity uses `shared_genres + 2 * shared_movies`.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::centrality::pagerank;
use super::models::{AnalyticsConfig, Recommendation, RecommendationConfig, SimilarPerson};
use super::projection::InducedGraph;
use crate::error::Result;
use crate::store::{GraphStore, NodeId, NodeKind};

/// Distinct movie slots a person has ACTED_IN/DIRECTED edges to.
fn movies_of(store: &GraphStore, person: usize) -> BTreeSet<usize> {
    store.participations(person).into_iter().collect()
}

/// Distinct genre slots across a set of movies.
fn genres_across<'a>(store: &GraphStore, movies: impl IntoIterator<Item = &'a usize>) -> HashSet<usize> {
    movies
        .into_iter()
        .flat_map(|&m| store.genres_of(m))
        .collect()
}

/// Rank movies for `person`, best first, ties by movie id.
///
/// Returns an empty list when the person has no ACTED_IN/DIRECTED edges or
/// is not a Person. Candidates scoring 0 are dropped.
pub fn recommend_movies(
    store: &GraphStore,
    person: &NodeId,
    config: &RecommendationConfig,
    analytics: &AnalyticsConfig,
) -> Result<Vec<Recommendation>> {
    let slot = store.require_slot(person)?;
    if store.slot(slot).node.kind != NodeKind::Person {
        return Ok(Vec::new());
    }
    let own_movies = movies_of(store, slot);
    if own_movies.is_empty() {
        return Ok(Vec::new());
    }

    let own_genres = genres_across(store, &own_movies);
    let collaborations = store.collaborations();
    let collaborators: HashSet<usize> = collaborations
        .partners(slot)
        .iter()
        .map(|&(other, _)| other)
        .collect();

    let influence: HashMap<NodeId, f64> = if config.influence != 0.0 {
        let graph = InducedGraph::collaboration(store);
        pagerank(&graph, analytics).scores.into_iter().collect()
    } else {
        HashMap::new()
    };

    let mut ranked: Vec<Recommendation> = Vec::new();
    for movie in store.nodes_of_kind(NodeKind::Movie) {
        let Some(candidate) = store.slot_of(&movie.id) else {
            continue;
        };
        if own_movies.contains(&candidate) {
            continue;
        }

        let genres = store.genres_of(candidate);
        let genre_overlap = if genres.is_empty() {
            0.0
        } else {
            let shared = genres.iter().filter(|g| own_genres.contains(g)).count();
            shared as f64 / genres.len() as f64
        };

        let mut cast = store.participants(candidate);
        cast.sort_unstable();
        cast.dedup();
        cast.retain(|p| collaborators.contains(p));
        let influence_sum: f64 = cast
            .iter()
            .filter_map(|&p| influence.get(&store.slot(p).node.id))
            .sum();

        let score = config.genre_overlap * genre_overlap
            + config.collaborator_signal * cast.len() as f64
            + config.influence * influence_sum;
        if score > 0.0 {
            ranked.push(Recommendation {
                movie: movie.id.clone(),
                title: movie.label(),
                score,
                genre_overlap,
                collaborators: cast.len(),
                influence: influence_sum,
            });
        }
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.movie.cmp(&b.movie)));
    if let Some(limit) = config.limit {
        ranked.truncate(limit);
    }

    tracing::debug!(
        person = %person,
        own_movies = own_movies.len(),
        collaborators = collaborators.len(),
        results = ranked.len(),
        "Movie recommendations computed"
    );
    Ok(ranked)
}

/// People most similar to `person`, best first, ties by id.
///
/// Shared genres are counted over the other person's movies that `person`
/// has not worked on; shared movies are movies both worked on.
pub fn similar_people(store: &GraphStore, person: &NodeId, limit: usize) -> Result<Vec<SimilarPerson>> {
    let slot = store.require_slot(person)?;
    if store.slot(slot).node.kind != NodeKind::Person {
        return Ok(Vec::new());
    }
    let own_movies = movies_of(store, slot);
    let own_genres = genres_across(store, &own_movies);

    let mut ranked: Vec<SimilarPerson> = store
        .nodes_of_kind(NodeKind::Person)
        .filter_map(|other| {
            let other_slot = store.slot_of(&other.id)?;
            if other_slot == slot {
                return None;
            }
            let movies = movies_of(store, other_slot);
            let shared_movies = movies.intersection(&own_movies).count();
            let shared_genres = genres_across(store, movies.difference(&own_movies))
                .intersection(&own_genres)
                .count();
            let score = shared_genres + 2 * shared_movies;
            (score > 0).then(|| SimilarPerson {
                person: other.id.clone(),
                name: other.label(),
                shared_genres,
                shared_movies,
                score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.person.cmp(&b.person)));
    ranked.truncate(limit);
    Ok(ranked)
}

// ============================================================================
// Tests
// ============================================================================
