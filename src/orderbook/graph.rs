//! The in-memory order book graph.
//!
//! ## Architecture
//!
//! A directed multigraph over assets where every edge is a live offer:
//!
//! - **Slab**: pre-allocated offer storage, O(1) by slab key
//! - **HashMap index**: offer id to slab key, O(1) removal by id
//! - **Edge sets**: per-asset adjacency in both directions (offers selling
//!   an asset, offers buying an asset), price-sorted
//! - **Level cache**: lazily built price levels per directed pair,
//!   invalidated for exactly the pairs an apply touches
//!
//! ## Mutation model
//!
//! The graph is only ever mutated through staged batches: `add_offer`,
//! `update_offer` and `remove_offer` queue deltas, `apply` validates and
//! commits them in one step and advances the last-applied-ledger marker.
//! One ingestion writer, any number of concurrent readers.
//!
//! ## Locking
//!
//! A single `RwLock` guards the graph. Readers - including the whole of a
//! path search - hold the shared lock for their full duration so they see
//! one consistent snapshot; `apply` takes the exclusive lock only after
//! validation has passed.
//!
//! ## Example
//!
//! ```
//! use orderbook_graph::orderbook::OrderBookGraph;
//! use orderbook_graph::types::{Asset, Offer, Price};
//!
//! let graph = OrderBookGraph::new();
//! let eur = Asset::credit("EUR", "issuer-1");
//!
//! graph.add_offer(Offer::new(1, "seller-1", Asset::Native, eur.clone(), Price::new(2, 1), 500));
//! graph.apply(123).unwrap();
//!
//! let levels = graph.price_levels(&Asset::Native, &eur, 10);
//! assert_eq!(levels.len(), 1);
//! assert_eq!(levels[0].amount, 500);
//! assert_eq!(graph.last_applied_ledger(), 123);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use log::{debug, warn};
use sha2::{Digest, Sha256};
use slab::Slab;

use crate::error::{InvalidBatchError, QueryError};
use crate::orderbook::batch::{BatchOp, PendingBatch};
use crate::orderbook::edges::EdgeSet;
use crate::orderbook::level::{aggregate_levels, PriceLevel};
use crate::types::{Asset, Offer, OfferId};

/// Bids and asks for one trading pair, plus the ledger the snapshot
/// reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookSummary {
    /// Offers selling the base asset, cheapest first.
    pub asks: Vec<PriceLevel>,
    /// Offers selling the counter asset, cheapest (in counter terms) first.
    pub bids: Vec<PriceLevel>,
    pub last_ledger: u32,
}

/// Graph state guarded by the read-write lock.
#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    pub(crate) offers: Slab<Offer>,
    pub(crate) offer_index: HashMap<OfferId, usize>,
    /// Adjacency keyed by the asset an offer sells.
    pub(crate) selling_edges: HashMap<Asset, EdgeSet>,
    /// Adjacency keyed by the asset an offer buys.
    pub(crate) buying_edges: HashMap<Asset, EdgeSet>,
    /// Sequence of the last ledger folded into the graph; 0 = never.
    pub(crate) last_ledger: u32,
}

impl GraphInner {
    /// Insert or replace one offer. Pre-validated; infallible.
    fn upsert(&mut self, offer: Offer) {
        if self.offer_index.contains_key(&offer.offer_id) {
            self.delete(offer.offer_id);
        }

        let selling = offer.selling.clone();
        let buying = offer.buying.clone();
        let key = self.offers.insert(offer);
        self.offer_index.insert(self.offers[key].offer_id, key);

        self.selling_edges
            .entry(selling.clone())
            .or_default()
            .insert(buying.clone(), key, &self.offers);
        self.buying_edges
            .entry(buying)
            .or_default()
            .insert(selling, key, &self.offers);
    }

    /// Remove one offer by id. Pre-validated; the id must be live.
    fn delete(&mut self, id: OfferId) -> Offer {
        let key = self.offer_index.remove(&id).expect("offer id validated as live");
        let selling = self.offers[key].selling.clone();
        let buying = self.offers[key].buying.clone();

        if let Some(set) = self.selling_edges.get_mut(&selling) {
            set.remove(&buying, key, &self.offers);
            if set.is_empty() {
                self.selling_edges.remove(&selling);
            }
        }
        if let Some(set) = self.buying_edges.get_mut(&buying) {
            set.remove(&selling, key, &self.offers);
            if set.is_empty() {
                self.buying_edges.remove(&buying);
            }
        }

        self.offers.remove(key)
    }

    /// The directed pair an offer id currently occupies, if any.
    fn pair_of(&self, id: OfferId) -> Option<(Asset, Asset)> {
        let key = *self.offer_index.get(&id)?;
        let offer = &self.offers[key];
        Some((offer.selling.clone(), offer.buying.clone()))
    }
}

/// The live order book graph. See the module docs for the big picture.
#[derive(Debug, Default)]
pub struct OrderBookGraph {
    inner: RwLock<GraphInner>,
    pending: Mutex<PendingBatch>,
    level_cache: Mutex<HashMap<(Asset, Asset), Arc<Vec<PriceLevel>>>>,
}

impl OrderBookGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        OrderBookGraph::default()
    }

    /// Create a graph with pre-allocated offer capacity.
    pub fn with_capacity(offer_capacity: usize) -> Self {
        OrderBookGraph {
            inner: RwLock::new(GraphInner {
                offers: Slab::with_capacity(offer_capacity),
                offer_index: HashMap::with_capacity(offer_capacity),
                ..GraphInner::default()
            }),
            pending: Mutex::new(PendingBatch::new()),
            level_cache: Mutex::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Staging
    // ========================================================================

    /// Queue an offer insertion for the next [`apply`](Self::apply).
    pub fn add_offer(&self, offer: Offer) -> &Self {
        self.pending.lock().expect("poisoned lock").put(offer);
        self
    }

    /// Queue an offer replacement for the next [`apply`](Self::apply).
    ///
    /// Updates and additions are both upserts at commit time; the split
    /// exists so call sites read like the ledger deltas they translate.
    pub fn update_offer(&self, offer: Offer) -> &Self {
        self.pending.lock().expect("poisoned lock").put(offer);
        self
    }

    /// Queue an offer removal for the next [`apply`](Self::apply).
    pub fn remove_offer(&self, id: OfferId) -> &Self {
        self.pending.lock().expect("poisoned lock").remove(id);
        self
    }

    /// Drop every staged delta without touching the live graph.
    pub fn discard(&self) {
        self.pending.lock().expect("poisoned lock").clear();
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Validate and commit all staged deltas for `ledger`.
    ///
    /// On success the graph reflects every delta and the consistency marker
    /// advances to `ledger`; the level cache is invalidated for exactly the
    /// pairs whose offer sets changed. An empty batch is a no-op that still
    /// advances the marker.
    ///
    /// On failure nothing changes - not the offer set, not the marker, not
    /// the staged batch (callers decide whether to [`discard`](Self::discard)).
    /// Re-applying at the same ledger sequence is permitted and idempotent;
    /// only a regression to an older ledger is rejected.
    pub fn apply(&self, ledger: u32) -> Result<(), InvalidBatchError> {
        let mut pending = self.pending.lock().expect("poisoned lock");
        let mut inner = self.inner.write().expect("poisoned lock");

        if inner.last_ledger > 0 && ledger < inner.last_ledger {
            let err = InvalidBatchError::LedgerRegression {
                applied: ledger,
                current: inner.last_ledger,
            };
            warn!("rejecting batch: {}", err);
            return Err(err);
        }

        if let Err(err) = pending.validate(|id| inner.offer_index.contains_key(&id)) {
            warn!("rejecting batch for ledger {}: {}", ledger, err);
            return Err(err);
        }

        // All deltas are valid; commit and record which pairs changed.
        let mut touched: Vec<(Asset, Asset)> = Vec::new();
        for (id, op) in pending.iter_sorted() {
            if let Some(pair) = inner.pair_of(id) {
                touched.push(pair);
            }
            match op {
                BatchOp::Put(offer) => {
                    touched.push((offer.selling.clone(), offer.buying.clone()));
                    inner.upsert(offer.clone());
                }
                BatchOp::Remove => {
                    inner.delete(id);
                }
            }
        }
        let applied = pending.len();
        inner.last_ledger = ledger;
        pending.clear();

        let mut cache = self.level_cache.lock().expect("poisoned lock");
        for pair in touched {
            cache.remove(&pair);
        }
        drop(cache);

        debug!("applied ledger {} ({} offer deltas)", ledger, applied);
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Aggregated price levels for offers selling `selling` in exchange for
    /// `buying`: at most `max_levels` levels, most favorable to the buyer
    /// first, equal prices merged, amounts saturating at `i64::MAX`.
    pub fn price_levels(&self, selling: &Asset, buying: &Asset, max_levels: usize) -> Vec<PriceLevel> {
        let inner = self.inner.read().expect("poisoned lock");
        let levels = self.levels_cached(&inner, selling, buying);
        levels.iter().take(max_levels).copied().collect()
    }

    /// Order book summary for one trading pair.
    ///
    /// Asks sell `selling`, bids sell `buying`; both are capped at `limit`
    /// levels and taken from the same snapshot as the returned ledger
    /// sequence. Fails with [`QueryError::EmptyOrderBook`] until a first
    /// ledger has been applied.
    pub fn find_asks_and_bids(
        &self,
        selling: &Asset,
        buying: &Asset,
        limit: usize,
    ) -> Result<OrderBookSummary, QueryError> {
        for asset in [selling, buying] {
            if !asset.is_well_formed() {
                return Err(QueryError::MalformedAsset(asset.to_string()));
            }
        }

        let inner = self.inner.read().expect("poisoned lock");
        if inner.last_ledger == 0 {
            return Err(QueryError::EmptyOrderBook);
        }

        let asks = self.levels_cached(&inner, selling, buying);
        let bids = self.levels_cached(&inner, buying, selling);
        Ok(OrderBookSummary {
            asks: asks.iter().take(limit).copied().collect(),
            bids: bids.iter().take(limit).copied().collect(),
            last_ledger: inner.last_ledger,
        })
    }

    /// Ids of all offers selling `asset`, ascending.
    pub fn offers_for_selling_asset(&self, asset: &Asset) -> Vec<OfferId> {
        let inner = self.inner.read().expect("poisoned lock");
        let mut ids: Vec<OfferId> = inner
            .selling_edges
            .get(asset)
            .map(|set| {
                set.iter()
                    .flat_map(|(_, keys)| keys.iter().map(|&k| inner.offers[k].offer_id))
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Every live offer, ordered by offer id.
    pub fn offers(&self) -> Vec<Offer> {
        let inner = self.inner.read().expect("poisoned lock");
        let mut offers: Vec<Offer> = inner.offers.iter().map(|(_, o)| o.clone()).collect();
        offers.sort_unstable_by_key(|o| o.offer_id);
        offers
    }

    /// SHA-256 over the canonical encoding of the sorted offer list.
    ///
    /// Two graphs that hold the same offers produce the same digest, which
    /// is what the ingestion verifier compares against its own source of
    /// truth.
    pub fn state_digest(&self) -> [u8; 32] {
        let offers = self.offers();
        let encoded = serde_json::to_vec(&offers).expect("offers always encode");
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        hasher.finalize().into()
    }

    /// Hex form of [`state_digest`](Self::state_digest), for logs and
    /// health endpoints.
    pub fn state_digest_hex(&self) -> String {
        hex::encode(self.state_digest())
    }

    /// True if the graph holds no offers.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("poisoned lock").selling_edges.is_empty()
    }

    /// Number of live offers.
    pub fn len(&self) -> usize {
        self.inner.read().expect("poisoned lock").offers.len()
    }

    /// Sequence of the last successfully applied ledger; 0 until the first
    /// apply. Readers use this to detect staleness.
    pub fn last_applied_ledger(&self) -> u32 {
        self.inner.read().expect("poisoned lock").last_ledger
    }

    /// Reset to the empty, never-applied state. Used when the ingestion
    /// pipeline has to rebuild from scratch.
    pub fn clear(&self) {
        let mut pending = self.pending.lock().expect("poisoned lock");
        let mut inner = self.inner.write().expect("poisoned lock");
        *inner = GraphInner::default();
        pending.clear();
        self.level_cache.lock().expect("poisoned lock").clear();
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Full (uncapped) price levels for a directed pair, via the cache.
    ///
    /// The caller must already hold the read lock; the guard parameter
    /// proves it and pins the snapshot the levels are computed from.
    fn levels_cached(
        &self,
        inner: &GraphInner,
        selling: &Asset,
        buying: &Asset,
    ) -> Arc<Vec<PriceLevel>> {
        let pair = (selling.clone(), buying.clone());
        let mut cache = self.level_cache.lock().expect("poisoned lock");
        if let Some(levels) = cache.get(&pair) {
            return Arc::clone(levels);
        }

        let keys = inner
            .selling_edges
            .get(selling)
            .and_then(|set| set.get(buying))
            .unwrap_or(&[]);
        let levels = Arc::new(aggregate_levels(keys, &inner.offers));
        cache.insert(pair, Arc::clone(&levels));
        levels
    }

    /// Shared-lock access for the path search, which traverses the raw
    /// adjacency under one guard for its whole run.
    pub(crate) fn read_inner(&self) -> RwLockReadGuard<'_, GraphInner> {
        self.inner.read().expect("poisoned lock")
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
