//! Depth-bounded exhaustive search over the order book graph.
//!
//! ## Shape of the search
//!
//! Both query modes are the same depth-first traversal parameterized by a
//! [`SearchState`]:
//!
//! - **Strict receive** starts at the *destination* asset with the amount
//!   to deliver and walks offers *selling* the current asset backwards.
//!   Each hop answers "how much of the neighbor asset buys this much of
//!   the current one", rounding costs up.
//! - **Strict send** starts at the *source* asset with the amount to spend
//!   and walks offers *buying* the current asset forwards. Each hop
//!   answers "how much of the neighbor asset does this much of the current
//!   one buy", rounding proceeds down and requiring the amount to be spent
//!   in full.
//!
//! The traversal never revisits an asset on the current path and never
//! expands past the hop bound, but within those limits it is exhaustive -
//! it is not a greedy single-path walk. Offers on an edge are consumed
//! cheapest-first; an edge whose arithmetic would overflow is skipped
//! rather than failing the query.
//!
//! Each state keeps only the best path per terminal asset, so the result
//! set is independent of traversal order.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::orderbook::graph::GraphInner;
use crate::orderbook::EdgeSet;
use crate::types::{AccountId, Asset};

/// A payment path from a source asset to a destination asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    pub source_asset: Asset,
    pub source_amount: i64,
    pub destination_asset: Asset,
    pub destination_amount: i64,
    /// Intermediate assets in source-to-destination order; endpoints are
    /// not repeated here.
    pub interior: Vec<Asset>,
}

impl Path {
    /// Number of conversions along the path. Zero for the degenerate
    /// same-asset path.
    pub fn hop_count(&self) -> usize {
        if self.interior.is_empty() && self.source_asset == self.destination_asset {
            0
        } else {
            self.interior.len() + 1
        }
    }
}

/// Mode-specific half of the traversal.
pub(crate) trait SearchState {
    /// May a path terminate at `asset` carrying `amount`?
    fn is_terminal(&self, asset: &Asset, amount: i64) -> bool;

    /// Record the path described by `visited` (start node first, terminal
    /// node last) carrying `amount` at its terminal node.
    fn record(&mut self, visited: &[Asset], amount: i64);

    /// The adjacency to expand from `asset`.
    fn edges<'g>(&self, inner: &'g GraphInner, asset: &Asset) -> Option<&'g EdgeSet>;

    /// Convert `amount` of the current asset across one edge's offers.
    /// `None` means the edge cannot carry the amount (insufficient
    /// liquidity, arithmetic overflow, or unspendable remainder).
    fn consume(&self, inner: &GraphInner, keys: &[usize], amount: i64) -> Option<i64>;
}

/// Exhaustive DFS from `current`, bounded by `max_path_length` conversions.
///
/// `visited` carries the path so far; the caller starts it empty. The
/// traversal holds no locks itself - the caller owns the graph's read
/// guard for the whole search.
pub(crate) fn dfs<S: SearchState>(
    state: &mut S,
    inner: &GraphInner,
    visited: &mut Vec<Asset>,
    current: &Asset,
    amount: i64,
    max_path_length: u32,
) {
    if amount <= 0 {
        return;
    }
    if visited.iter().any(|a| a == current) {
        return;
    }

    visited.push(current.clone());
    if state.is_terminal(current, amount) {
        state.record(visited, amount);
    }

    // visited.len() nodes means visited.len() conversions once we take one
    // more edge; stop expanding at the bound.
    if visited.len() <= max_path_length as usize {
        if let Some(set) = state.edges(inner, current) {
            let mut neighbors: Vec<(&Asset, &[usize])> = set.iter().collect();
            neighbors.sort_unstable_by(|a, b| a.0.cmp(b.0));
            for (next, keys) in neighbors {
                if let Some(next_amount) = state.consume(inner, keys, amount) {
                    dfs(state, inner, visited, next, next_amount, max_path_length);
                }
            }
        }
    }
    visited.pop();
}

// ============================================================================
// Offer consumption
// ============================================================================

/// Cost, in the offers' buying asset, of taking `needed` units of their
/// selling asset, consuming cheapest-first.
///
/// Offers from `ignore_seller` are passed over. `None` if the edge cannot
/// deliver the full amount or the arithmetic overflows.
pub(crate) fn consume_offers_for_selling_asset(
    inner: &GraphInner,
    keys: &[usize],
    ignore_seller: Option<&AccountId>,
    needed: i64,
) -> Option<i64> {
    let mut total_cost: i64 = 0;
    let mut remaining = needed;
    for &key in keys {
        let offer = &inner.offers[key];
        if ignore_seller == Some(&offer.seller) {
            continue;
        }
        let take = remaining.min(offer.amount);
        if take == 0 {
            continue;
        }
        let cost = offer.price.buying_units_ceil(take)?;
        total_cost = total_cost.checked_add(cost)?;
        remaining -= take;
        if remaining == 0 {
            return Some(total_cost);
        }
    }
    // Ran out of offers before covering the requested amount.
    None
}

/// Proceeds, in the offers' selling asset, of spending exactly `have` units
/// of their buying asset, consuming cheapest-first.
///
/// The whole amount must be spent: a remainder too small to buy one stroop
/// from the next offer fails the edge. `None` also covers running out of
/// offers and arithmetic overflow.
pub(crate) fn consume_offers_for_buying_asset(
    inner: &GraphInner,
    keys: &[usize],
    have: i64,
) -> Option<i64> {
    let mut total_received: i64 = 0;
    let mut remaining = have;
    for &key in keys {
        let offer = &inner.offers[key];
        let would_get = offer.price.selling_units_floor(remaining)?;
        if would_get == 0 {
            return None;
        }
        if would_get <= offer.amount {
            // The rest of our amount fits in this offer.
            return total_received.checked_add(would_get);
        }
        // Take the whole offer and keep going.
        let cost = offer.price.buying_units_ceil(offer.amount)?;
        total_received = total_received.checked_add(offer.amount)?;
        // would_get > offer.amount guarantees remaining >= cost.
        remaining -= cost;
        if remaining == 0 {
            return Some(total_received);
        }
    }
    None
}

// ============================================================================
// Search states
// ============================================================================

/// Keep `candidate` if it beats `current` for a strict-receive query:
/// cheaper, then fewer hops, then lexicographically smaller interior.
fn better_receive(candidate: &Path, current: &Path) -> bool {
    (candidate.source_amount, candidate.interior.len(), &candidate.interior)
        < (current.source_amount, current.interior.len(), &current.interior)
}

/// Keep `candidate` if it beats `current` for a strict-send query: higher
/// proceeds, then fewer hops, then lexicographically smaller interior.
fn better_send(candidate: &Path, current: &Path) -> bool {
    candidate.destination_amount > current.destination_amount
        || (candidate.destination_amount == current.destination_amount
            && (candidate.interior.len(), &candidate.interior)
                < (current.interior.len(), &current.interior))
}

/// Strict receive: walk backwards from the destination over offers selling
/// the current asset; terminals are the candidate source assets.
pub(crate) struct StrictReceiveState<'a> {
    pub destination_asset: &'a Asset,
    pub destination_amount: i64,
    pub ignore_offers_from: Option<&'a AccountId>,
    /// Candidate source assets with their spendable balances.
    pub source_assets: HashMap<&'a Asset, i64>,
    pub validate_source_balance: bool,
    /// Best path per source asset.
    pub best: HashMap<Asset, Path>,
}

impl SearchState for StrictReceiveState<'_> {
    fn is_terminal(&self, asset: &Asset, amount: i64) -> bool {
        match self.source_assets.get(asset) {
            Some(&balance) => !self.validate_source_balance || balance >= amount,
            None => false,
        }
    }

    fn record(&mut self, visited: &[Asset], amount: i64) {
        let source = visited.last().expect("visited is never empty here");
        // visited runs destination -> source; the interior reads
        // source -> destination.
        let interior: Vec<Asset> = if visited.len() > 2 {
            visited[1..visited.len() - 1].iter().rev().cloned().collect()
        } else {
            Vec::new()
        };
        let candidate = Path {
            source_asset: source.clone(),
            source_amount: amount,
            destination_asset: self.destination_asset.clone(),
            destination_amount: self.destination_amount,
            interior,
        };
        match self.best.get_mut(source) {
            Some(current) if !better_receive(&candidate, current) => {}
            Some(current) => *current = candidate,
            None => {
                self.best.insert(source.clone(), candidate);
            }
        }
    }

    fn edges<'g>(&self, inner: &'g GraphInner, asset: &Asset) -> Option<&'g EdgeSet> {
        inner.selling_edges.get(asset)
    }

    fn consume(&self, inner: &GraphInner, keys: &[usize], amount: i64) -> Option<i64> {
        consume_offers_for_selling_asset(inner, keys, self.ignore_offers_from, amount)
    }
}

/// Strict send: walk forwards from the source over offers buying the
/// current asset; terminals are the candidate destination assets.
pub(crate) struct StrictSendState<'a> {
    pub source_asset: &'a Asset,
    pub source_amount: i64,
    pub destination_assets: HashSet<&'a Asset>,
    /// Best path per destination asset.
    pub best: HashMap<Asset, Path>,
}

impl SearchState for StrictSendState<'_> {
    fn is_terminal(&self, asset: &Asset, _amount: i64) -> bool {
        self.destination_assets.contains(asset)
    }

    fn record(&mut self, visited: &[Asset], amount: i64) {
        let destination = visited.last().expect("visited is never empty here");
        let interior: Vec<Asset> = if visited.len() > 2 {
            visited[1..visited.len() - 1].to_vec()
        } else {
            Vec::new()
        };
        let candidate = Path {
            source_asset: self.source_asset.clone(),
            source_amount: self.source_amount,
            destination_asset: destination.clone(),
            destination_amount: amount,
            interior,
        };
        match self.best.get_mut(destination) {
            Some(current) if !better_send(&candidate, current) => {}
            Some(current) => *current = candidate,
            None => {
                self.best.insert(destination.clone(), candidate);
            }
        }
    }

    fn edges<'g>(&self, inner: &'g GraphInner, asset: &Asset) -> Option<&'g EdgeSet> {
        inner.buying_edges.get(asset)
    }

    fn consume(&self, inner: &GraphInner, keys: &[usize], amount: i64) -> Option<i64> {
        consume_offers_for_buying_asset(inner, keys, amount)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
