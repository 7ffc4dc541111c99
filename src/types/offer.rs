//! Offers and their exact-rational prices.
//!
//! An offer is a standing order to sell one asset for another at a fixed
//! price, with a remaining sellable amount. Offers are owned by the graph
//! once applied: updates replace the stored value wholesale and removals go
//! by offer id.
//!
//! Prices are exact rationals. Comparing or aggregating them never goes
//! through floating point; cross-multiplication in `i128` cannot overflow
//! for `i32` numerators and denominators.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Asset};

/// Identifier of an offer, unique across the book.
pub type OfferId = i64;

/// An exact rational price: `n` units of the buying asset per `d` units of
/// the selling asset.
///
/// Equality and ordering are *rational*: `1/2 == 2/4`. That is what the
/// price level aggregation relies on, so the struct deliberately does not
/// derive `PartialEq`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    pub fn new(n: i32, d: i32) -> Self {
        Price { n, d }
    }

    /// A price is valid iff both terms are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.n > 0 && self.d > 0
    }

    /// Units of the buying asset a taker must pay for `selling_units` of the
    /// selling asset, rounded up so the seller is never underpaid.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    pub fn buying_units_ceil(&self, selling_units: i64) -> Option<i64> {
        debug_assert!(self.is_valid());
        if selling_units < 0 {
            return None;
        }
        let numer = selling_units as i128 * self.n as i128;
        let d = self.d as i128;
        let out = (numer + d - 1) / d;
        i64::try_from(out).ok()
    }

    /// Units of the selling asset obtained for `buying_units` of the buying
    /// asset, rounded down so the book is never overdrawn.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    pub fn selling_units_floor(&self, buying_units: i64) -> Option<i64> {
        debug_assert!(self.is_valid());
        if buying_units < 0 {
            return None;
        }
        let numer = buying_units as i128 * self.d as i128;
        let out = numer / self.n as i128;
        i64::try_from(out).ok()
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.n as i128 * other.d as i128 == other.n as i128 * self.d as i128
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.n as i128 * other.d as i128).cmp(&(other.n as i128 * self.d as i128))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}

/// A standing order to sell `amount` of `selling` in exchange for `buying`
/// at `price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: OfferId,
    pub seller: AccountId,
    pub selling: Asset,
    pub buying: Asset,
    pub price: Price,
    /// Remaining sellable amount, in stroops of the selling asset.
    pub amount: i64,
}

impl Offer {
    pub fn new(
        offer_id: OfferId,
        seller: impl Into<String>,
        selling: Asset,
        buying: Asset,
        price: Price,
        amount: i64,
    ) -> Self {
        Offer {
            offer_id,
            seller: AccountId::new(seller),
            selling,
            buying,
            price,
            amount,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
