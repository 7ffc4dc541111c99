//! # orderbook-graph
//!
//! An in-memory order book graph with payment path finding.
//!
//! ## Architecture
//!
//! The crate consists of:
//! - **Types**: assets, offers, exact-rational prices, fixed-point amounts
//! - **OrderBook**: the live graph - slab-backed offer storage, batched
//!   ledger-scoped mutation, price level queries
//! - **Search**: strict-receive and strict-send path finding with ranked
//!   results
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical inputs produce identical results - fixed
//!    iteration orders, exact rational arithmetic, no floating point
//! 2. **Atomic batches**: a ledger's offer deltas apply in full or not at
//!    all, and the last-applied-ledger marker only advances on success
//! 3. **Single writer, many readers**: one ingestion pipeline mutates the
//!    graph while request handlers read it; readers always observe a
//!    whole-ledger snapshot
//! 4. **Errors over panics**: bad batches and bad queries come back as
//!    values, never as process aborts

// ============================================================================
// Module declarations
// ============================================================================

/// Core value types: Asset, Offer, Price, fixed-point amounts
pub mod types;

/// Order book graph: batched mutation, price levels, consistency marker
pub mod orderbook;

/// Path finding: strict receive / strict send search and ranking
pub mod search;

/// Error taxonomy
pub mod error;

/// Runtime settings loader
pub mod settings;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{InvalidBatchError, QueryError};
pub use orderbook::{OrderBookGraph, OrderBookSummary, PriceLevel};
pub use search::{Path, PathFinder, PathFinderConfig, PathSearch};
pub use types::{AccountId, Asset, Offer, OfferId, Price};
