//! Price level aggregation.
//!
//! ## Design
//!
//! A `PriceLevel` summarizes every live offer at a single rational price
//! for one directed asset pair: the price plus the summed remaining
//! amounts. Levels are derived, never stored as source of truth - the
//! graph rebuilds them from an edge list whenever its cached copy has been
//! invalidated.
//!
//! Determinism: the input edge list is sorted by (price, offer id), so
//! equal prices are contiguous and the summation order is fixed. Sums
//! saturate at the maximum representable amount instead of overflowing.

use serde::{Deserialize, Serialize};
use slab::Slab;

use crate::types::amount::saturating_add_amount;
use crate::types::{Offer, Price};

/// An aggregated (price, total remaining amount) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    /// Total remaining amount across all offers at this price, clamped at
    /// `i64::MAX`.
    pub amount: i64,
}

/// Collapse a (price, offer id)-sorted edge list into price levels,
/// cheapest first.
///
/// Offers with equal rational prices merge into a single level. The result
/// is uncapped; callers truncate to their level limit.
pub fn aggregate_levels(keys: &[usize], offers: &Slab<Offer>) -> Vec<PriceLevel> {
    let mut levels: Vec<PriceLevel> = Vec::new();
    for &key in keys {
        let offer = &offers[key];
        match levels.last_mut() {
            Some(level) if level.price == offer.price => {
                level.amount = saturating_add_amount(level.amount, offer.amount);
            }
            _ => levels.push(PriceLevel {
                price: offer.price,
                amount: offer.amount,
            }),
        }
    }
    levels
}

// ============================================================================
// Unit Tests
// ============================================================================
