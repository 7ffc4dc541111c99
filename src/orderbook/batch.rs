//! Staged mutation batches.
//!
//! The ingestion pipeline never touches the live graph directly: it stages
//! add/update/remove deltas for one closed ledger and commits them in a
//! single `apply`. This module holds the staging area and the validation
//! that runs before anything mutates.
//!
//! Invariant: one delta per offer id - the last write for a key wins. A
//! batch either applies in full or not at all; validation failures name the
//! lowest offending offer id so the pipeline can log something actionable.

use std::collections::HashMap;

use crate::error::InvalidBatchError;
use crate::types::{Offer, OfferId};

/// A single staged delta.
#[derive(Debug, Clone)]
pub(crate) enum BatchOp {
    /// Insert or replace the offer with this id.
    Put(Offer),
    /// Delete the offer with this id.
    Remove,
}

/// Deltas staged for the next apply, keyed by offer id.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    ops: HashMap<OfferId, BatchOp>,
}

impl PendingBatch {
    pub fn new() -> Self {
        PendingBatch::default()
    }

    /// Stage an add or update. Replaces any previously staged delta for the
    /// same offer id.
    pub fn put(&mut self, offer: Offer) {
        self.ops.insert(offer.offer_id, BatchOp::Put(offer));
    }

    /// Stage a removal. Replaces any previously staged delta for the same
    /// offer id.
    pub fn remove(&mut self, id: OfferId) {
        self.ops.insert(id, BatchOp::Remove);
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check every delta, lowest offer id first.
    ///
    /// `is_live` reports whether an offer id currently exists in the graph;
    /// removals of unknown ids are structural errors. Nothing is mutated
    /// here.
    pub fn validate(&self, is_live: impl Fn(OfferId) -> bool) -> Result<(), InvalidBatchError> {
        for (id, op) in self.iter_sorted() {
            match op {
                BatchOp::Put(offer) => {
                    if !offer.selling.is_well_formed() || !offer.buying.is_well_formed() {
                        return Err(InvalidBatchError::MalformedAsset(id));
                    }
                    if !offer.price.is_valid() {
                        return Err(InvalidBatchError::NonPositivePrice(id));
                    }
                    if offer.amount < 0 {
                        return Err(InvalidBatchError::NegativeAmount(id));
                    }
                }
                BatchOp::Remove => {
                    if !is_live(id) {
                        return Err(InvalidBatchError::OfferNotPresent(id));
                    }
                }
            }
        }
        Ok(())
    }

    /// Deltas ordered by offer id, for deterministic validation and apply.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (OfferId, &BatchOp)> {
        let mut ids: Vec<OfferId> = self.ops.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(move |id| (id, &self.ops[&id]))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
