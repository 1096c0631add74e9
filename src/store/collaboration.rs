//! Derived COLLABORATED_WITH relationships.
//!
//! Two distinct people collaborate when both have an ACTED_IN or DIRECTED
//! edge to the same movie. The weight is the number of distinct shared
//! movies. The index is keyed by store slot and is only valid for the store
//! generation it was built from; [`GraphStore`] drops it on every change to
//! a contributing edge.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::graph::GraphStore;
use super::models::{NodeId, NodeKind};

/// One derived COLLABORATED_WITH edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaboration {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: u32,
}

/// Co-occurrence counts for every collaborating pair.
#[derive(Debug, Clone, Default)]
pub struct CollaborationIndex {
    /// `(lower slot, higher slot)` → shared movie count
    pairs: BTreeMap<(usize, usize), u32>,
    /// person slot → partners sorted by slot
    partners: HashMap<usize, Vec<(usize, u32)>>,
}

impl CollaborationIndex {
    pub(crate) fn build(store: &GraphStore) -> Self {
        let mut pairs: BTreeMap<(usize, usize), u32> = BTreeMap::new();

        for movie in store.nodes_of_kind(NodeKind::Movie) {
            let Some(movie_slot) = store.slot_of(&movie.id) else {
                continue;
            };
            let mut cast = store.participants(movie_slot);
            cast.sort_unstable();
            cast.dedup();
            for i in 0..cast.len() {
                for j in (i + 1)..cast.len() {
                    *pairs.entry((cast[i], cast[j])).or_default() += 1;
                }
            }
        }

        let mut partners: HashMap<usize, Vec<(usize, u32)>> = HashMap::new();
        for (&(a, b), &w) in &pairs {
            partners.entry(a).or_default().push((b, w));
            partners.entry(b).or_default().push((a, w));
        }
        for list in partners.values_mut() {
            list.sort_unstable();
        }

        Self { pairs, partners }
    }

    /// Number of collaborating pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Total co-occurrence weight over all pairs.
    pub fn total_weight(&self) -> u64 {
        self.pairs.values().map(|&w| u64::from(w)).sum()
    }

    pub(crate) fn pairs(&self) -> impl Iterator<Item = ((usize, usize), u32)> + '_ {
        self.pairs.iter().map(|(&k, &w)| (k, w))
    }

    pub(crate) fn partners(&self, slot: usize) -> &[(usize, u32)] {
        self.partners.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }
}
