//! Edge sets: the adjacency structure of the order book graph.
//!
//! ## Design
//!
//! An `EdgeSet` hangs off a single graph node (an asset) and maps each
//! counter asset to the offers trading between the two. The offer data
//! itself lives in the graph's slab; an edge set only stores slab keys,
//! kept sorted by (price ascending, offer id ascending).
//!
//! That ordering is load-bearing twice over: price level aggregation walks
//! the list once and merges adjacent equal prices, and the path search
//! consumes offers cheapest-first without re-sorting. The offer id
//! tie-break exists purely to keep summation order reproducible.

use std::cmp::Ordering;
use std::collections::HashMap;

use slab::Slab;

use crate::types::{Asset, Offer, OfferId, Price};

/// Offers adjacent to one asset, grouped by the counter asset.
///
/// Multiple offers for the same pair coexist as parallel edges. Empty
/// groups are pruned on removal so iteration never sees a dead pair.
#[derive(Debug, Default)]
pub struct EdgeSet {
    edges: HashMap<Asset, Vec<usize>>,
}

/// Sort key for edge lists: price first, offer id to break ties.
fn edge_key(offers: &Slab<Offer>, key: usize) -> (Price, OfferId) {
    let offer = &offers[key];
    (offer.price, offer.offer_id)
}

impl EdgeSet {
    pub fn new() -> Self {
        EdgeSet::default()
    }

    /// Insert the offer at `key` under `counter`, preserving the
    /// (price, offer id) order of the group.
    pub fn insert(&mut self, counter: Asset, key: usize, offers: &Slab<Offer>) {
        let group = self.edges.entry(counter).or_default();
        let target = edge_key(offers, key);
        let pos = group
            .binary_search_by(|&k| {
                let probe = edge_key(offers, k);
                if probe < target {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
            .unwrap_err();
        group.insert(pos, key);
    }

    /// Remove the offer at `key` from the `counter` group.
    ///
    /// The offer must still be resident in the slab so its position can be
    /// located. Returns false if the group or the entry is missing.
    pub fn remove(&mut self, counter: &Asset, key: usize, offers: &Slab<Offer>) -> bool {
        let Some(group) = self.edges.get_mut(counter) else {
            return false;
        };
        let target = edge_key(offers, key);
        let Ok(pos) = group.binary_search_by(|&k| edge_key(offers, k).cmp(&target)) else {
            return false;
        };
        group.remove(pos);
        if group.is_empty() {
            self.edges.remove(counter);
        }
        true
    }

    /// The sorted slab keys for one counter asset.
    pub fn get(&self, counter: &Asset) -> Option<&[usize]> {
        self.edges.get(counter).map(Vec::as_slice)
    }

    /// Iterate over (counter asset, sorted slab keys).
    pub fn iter(&self) -> impl Iterator<Item = (&Asset, &[usize])> {
        self.edges.iter().map(|(a, v)| (a, v.as_slice()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total number of parallel edges across all counter assets.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
