//! The order book graph and its batch-mutation machinery.
//!
//! ## Architecture
//!
//! The graph is a directed multigraph: nodes are assets, parallel edges are
//! offers. It is built from:
//!
//! - **Slab-based storage**: offers live in a pre-allocated slab with a
//!   HashMap id index for O(1) removal
//! - **Dual adjacency**: edge sets keyed by the selling asset and by the
//!   buying asset, each price-sorted, so both search directions walk
//!   cheapest-first without sorting
//! - **Batched mutation**: deltas are staged per ledger and committed
//!   atomically by `apply`, which also advances the consistency marker
//!
//! ## Components
//!
//! - [`EdgeSet`]: price-sorted adjacency for one node
//! - [`PriceLevel`]: aggregated (price, amount) summary line
//! - [`OrderBookGraph`]: the live graph - staging, apply, queries
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
//! graph
//!     .add_offer(Offer::new(1, "alice", Asset::Native, eur.clone(), Price::new(2, 1), 500))
//!     .add_offer(Offer::new(2, "bob", eur.clone(), Asset::Native, Price::new(1, 1), 200));
//! graph.apply(42).unwrap();
//!
//! let summary = graph.find_asks_and_bids(&Asset::Native, &eur, 20).unwrap();
//! assert_eq!(summary.last_ledger, 42);
//! ```

pub mod edges;
pub mod level;
pub mod graph;

mod batch;

pub use edges::EdgeSet;
pub use graph::{OrderBookGraph, OrderBookSummary};
pub use level::PriceLevel;
