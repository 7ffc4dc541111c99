//! Payment path search over the order book graph.
//!
//! ## Components
//!
//! - [`PathFinder`]: the public entry point - validates requests, resolves
//!   account holdings through a [`LedgerStateReader`], runs the search and
//!   ranks the results
//! - [`Path`]: one ranked conversion route
//! - `dfs`: the mode-agnostic depth-bounded traversal (internal)
//!
//! A search runs entirely under the graph's shared read lock so it sees a
//! single consistent snapshot, and every result is tagged with the ledger
//! sequence that snapshot reflected.

pub mod finder;

mod dfs;

pub use dfs::Path;
pub use finder::{
    AccountBalance, DestinationSpec, InMemoryLedgerState, LedgerStateReader, PathFinder,
    PathFinderConfig, PathSearch, SourceSpec, StrictReceiveRequest, StrictSendRequest,
    DEFAULT_MAX_ASSETS_PARAM_LENGTH, DEFAULT_MAX_PATH_LENGTH,
};
