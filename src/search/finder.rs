//! The path finder: request validation, account resolution, search, ranking.
//!
//! ## Query modes
//!
//! - **Strict receive**: "deliver exactly this much of the destination
//!   asset - what is the cheapest way to pay for it from each candidate
//!   source asset?"
//! - **Strict send**: "spend exactly this much of the source asset - how
//!   much of each candidate destination asset can it become?"
//!
//! Candidates come either from an explicit asset list or from an account,
//! resolved through the injected [`LedgerStateReader`]. Account-sourced
//! strict-receive queries validate balances and skip offers placed by the
//! paying account itself.
//!
//! Parameter problems are rejected before the graph is touched; a graph
//! that has never applied a ledger (or holds no offers) yields
//! [`QueryError::EmptyOrderBook`] so callers can answer "still ingesting"
//! instead of "no route". A well-formed search that finds nothing returns
//! an empty path list.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use log::debug;

use crate::error::QueryError;
use crate::orderbook::OrderBookGraph;
use crate::search::dfs::{dfs, Path, StrictReceiveState, StrictSendState};
use crate::types::{AccountId, Asset};

/// Default cap on conversions per path. Kept single-digit on purpose:
/// readers hold the graph's shared lock for a whole search, so the depth
/// bound is what bounds writer latency.
pub const DEFAULT_MAX_PATH_LENGTH: u32 = 5;

/// Default cap on explicit source/destination asset lists.
pub const DEFAULT_MAX_ASSETS_PARAM_LENGTH: usize = 15;

/// Limits enforced before any search runs.
#[derive(Debug, Clone, Copy)]
pub struct PathFinderConfig {
    pub max_path_length: u32,
    pub max_assets_param_length: usize,
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        PathFinderConfig {
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_assets_param_length: DEFAULT_MAX_ASSETS_PARAM_LENGTH,
        }
    }
}

/// One asset position held by an account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub asset: Asset,
    pub balance: i64,
}

/// Read access to account holdings, injected into the finder.
///
/// One production implementation ([`InMemoryLedgerState`], maintained by
/// the same pipeline that feeds the graph) and whatever doubles tests
/// need. Unknown accounts resolve to an empty list.
pub trait LedgerStateReader: Send + Sync {
    fn assets_for_account(&self, account: &AccountId) -> Vec<AccountBalance>;
}

impl<R: LedgerStateReader> LedgerStateReader for Arc<R> {
    fn assets_for_account(&self, account: &AccountId) -> Vec<AccountBalance> {
        (**self).assets_for_account(account)
    }
}

/// Account holdings kept in memory, updated by the ingestion pipeline.
#[derive(Debug, Default)]
pub struct InMemoryLedgerState {
    accounts: RwLock<HashMap<AccountId, Vec<AccountBalance>>>,
}

impl InMemoryLedgerState {
    pub fn new() -> Self {
        InMemoryLedgerState::default()
    }

    /// Replace the holdings recorded for `account`.
    pub fn set_account(&self, account: AccountId, balances: Vec<AccountBalance>) {
        self.accounts
            .write()
            .expect("poisoned lock")
            .insert(account, balances);
    }
}

impl LedgerStateReader for InMemoryLedgerState {
    fn assets_for_account(&self, account: &AccountId) -> Vec<AccountBalance> {
        self.accounts
            .read()
            .expect("poisoned lock")
            .get(account)
            .cloned()
            .unwrap_or_default()
    }
}

/// Where a strict-receive payment may come from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// The account's holdings become the candidate source assets, each
    /// balance capping how much of it can be spent. Offers placed by this
    /// account are not consumed.
    Account(AccountId),
    /// Explicit candidates; no balance validation.
    Assets(Vec<Asset>),
}

/// Where a strict-send payment may arrive.
#[derive(Debug, Clone)]
pub enum DestinationSpec {
    /// The account's held assets become the candidate destinations.
    Account(AccountId),
    /// Explicit candidates.
    Assets(Vec<Asset>),
}

/// "Deliver exactly `destination_amount` of `destination_asset`."
#[derive(Debug, Clone)]
pub struct StrictReceiveRequest {
    pub destination_asset: Asset,
    pub destination_amount: i64,
    pub source: SourceSpec,
    /// Maximum conversions per path; capped by the finder's config.
    pub max_path_length: u32,
}

/// "Spend exactly `source_amount` of `source_asset`."
#[derive(Debug, Clone)]
pub struct StrictSendRequest {
    pub source_asset: Asset,
    pub source_amount: i64,
    pub destination: DestinationSpec,
    /// Maximum conversions per path; capped by the finder's config.
    pub max_path_length: u32,
}

/// A ranked search result, tagged with the ledger the graph reflected
/// while the search ran.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSearch {
    pub paths: Vec<Path>,
    pub last_ledger: u32,
}

/// Payment path search over a shared [`OrderBookGraph`].
#[derive(Debug)]
pub struct PathFinder<R> {
    graph: Arc<OrderBookGraph>,
    reader: R,
    config: PathFinderConfig,
}

impl<R: LedgerStateReader> PathFinder<R> {
    pub fn new(graph: Arc<OrderBookGraph>, reader: R, config: PathFinderConfig) -> Self {
        PathFinder { graph, reader, config }
    }

    pub fn config(&self) -> PathFinderConfig {
        self.config
    }

    /// Strict receive: per viable source asset, the minimum source amount
    /// that delivers the requested destination amount, plus the path.
    ///
    /// Results are sorted by ascending source amount, ties broken by fewer
    /// hops and then by asset order.
    pub fn find_paths(&self, request: &StrictReceiveRequest) -> Result<PathSearch, QueryError> {
        // Parameter validation happens before the reader or the graph is
        // touched.
        self.check_hops(request.max_path_length)?;
        check_amount(request.destination_amount)?;
        check_asset(&request.destination_asset)?;
        if let SourceSpec::Assets(assets) = &request.source {
            self.check_asset_list(assets)?;
        }

        let (sources, validate_balance, ignore_offers_from) = match &request.source {
            SourceSpec::Account(account) => {
                let holdings = self.reader.assets_for_account(account);
                (holdings, true, Some(account.clone()))
            }
            SourceSpec::Assets(assets) => {
                let unlimited = assets
                    .iter()
                    .map(|asset| AccountBalance { asset: asset.clone(), balance: 0 })
                    .collect();
                (unlimited, false, None)
            }
        };

        let inner = self.graph.read_inner();
        if inner.last_ledger == 0 || inner.selling_edges.is_empty() {
            return Err(QueryError::EmptyOrderBook);
        }
        // Read before traversal so the tag matches the snapshot searched.
        let last_ledger = inner.last_ledger;

        let mut state = StrictReceiveState {
            destination_asset: &request.destination_asset,
            destination_amount: request.destination_amount,
            ignore_offers_from: ignore_offers_from.as_ref(),
            source_assets: sources.iter().map(|b| (&b.asset, b.balance)).collect(),
            validate_source_balance: validate_balance,
            best: HashMap::new(),
        };
        let mut visited = Vec::new();
        dfs(
            &mut state,
            &inner,
            &mut visited,
            &request.destination_asset,
            request.destination_amount,
            request.max_path_length,
        );
        drop(inner);

        let mut paths: Vec<Path> = state.best.into_values().collect();
        paths.sort_by(|a, b| {
            (a.source_amount, a.interior.len(), &a.source_asset)
                .cmp(&(b.source_amount, b.interior.len(), &b.source_asset))
        });
        debug!(
            "strict receive for {}: {} path(s) at ledger {}",
            request.destination_asset, paths.len(), last_ledger
        );
        Ok(PathSearch { paths, last_ledger })
    }

    /// Strict send: per viable destination asset, the maximum amount the
    /// fixed source spend can become, plus the path.
    ///
    /// Results are sorted by descending destination amount, ties broken by
    /// fewer hops and then by asset order.
    pub fn find_fixed_paths(&self, request: &StrictSendRequest) -> Result<PathSearch, QueryError> {
        self.check_hops(request.max_path_length)?;
        check_amount(request.source_amount)?;
        check_asset(&request.source_asset)?;
        if let DestinationSpec::Assets(assets) = &request.destination {
            self.check_asset_list(assets)?;
        }

        let destinations: Vec<Asset> = match &request.destination {
            DestinationSpec::Account(account) => self
                .reader
                .assets_for_account(account)
                .into_iter()
                .map(|b| b.asset)
                .collect(),
            DestinationSpec::Assets(assets) => assets.clone(),
        };

        let inner = self.graph.read_inner();
        if inner.last_ledger == 0 || inner.selling_edges.is_empty() {
            return Err(QueryError::EmptyOrderBook);
        }
        let last_ledger = inner.last_ledger;

        let mut state = StrictSendState {
            source_asset: &request.source_asset,
            source_amount: request.source_amount,
            destination_assets: HashSet::from_iter(destinations.iter()),
            best: HashMap::new(),
        };
        let mut visited = Vec::new();
        dfs(
            &mut state,
            &inner,
            &mut visited,
            &request.source_asset,
            request.source_amount,
            request.max_path_length,
        );
        drop(inner);

        let mut paths: Vec<Path> = state.best.into_values().collect();
        paths.sort_by(|a, b| {
            (Reverse(a.destination_amount), a.interior.len(), &a.destination_asset)
                .cmp(&(Reverse(b.destination_amount), b.interior.len(), &b.destination_asset))
        });
        debug!(
            "strict send of {}: {} path(s) at ledger {}",
            request.source_asset, paths.len(), last_ledger
        );
        Ok(PathSearch { paths, last_ledger })
    }

    fn check_hops(&self, requested: u32) -> Result<(), QueryError> {
        if requested > self.config.max_path_length {
            return Err(QueryError::TooManyHops {
                requested,
                max: self.config.max_path_length,
            });
        }
        Ok(())
    }

    fn check_asset_list(&self, assets: &[Asset]) -> Result<(), QueryError> {
        if assets.len() > self.config.max_assets_param_length {
            return Err(QueryError::TooManyAssets {
                max: self.config.max_assets_param_length,
            });
        }
        for asset in assets {
            check_asset(asset)?;
        }
        Ok(())
    }
}

fn check_asset(asset: &Asset) -> Result<(), QueryError> {
    if !asset.is_well_formed() {
        return Err(QueryError::MalformedAsset(asset.to_string()));
    }
    Ok(())
}

fn check_amount(amount: i64) -> Result<(), QueryError> {
    if amount <= 0 {
        return Err(QueryError::NonPositiveAmount);
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::{Offer, Price};

    fn eur() -> Asset {
        Asset::credit("EUR", "issuer-1")
    }

    fn usd() -> Asset {
        Asset::credit("USD", "issuer-1")
    }

    /// Test double that counts resolutions and knows one account.
    #[derive(Default)]
    struct CountingReader {
        calls: AtomicUsize,
        holdings: Vec<AccountBalance>,
    }

    impl LedgerStateReader for CountingReader {
        fn assets_for_account(&self, _account: &AccountId) -> Vec<AccountBalance> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.holdings.clone()
        }
    }

    /// Offers EUR for native at 2/1 and USD for EUR at 1/1, so payments can
    /// run native -> EUR -> USD.
    fn two_hop_graph() -> Arc<OrderBookGraph> {
        let graph = OrderBookGraph::new();
        graph.add_offer(Offer::new(
            1, "alice", eur(), Asset::Native, Price::new(2, 1), 100_000,
        ));
        graph.add_offer(Offer::new(
            2, "bob", usd(), eur(), Price::new(1, 1), 100_000,
        ));
        graph.apply(9).unwrap();
        Arc::new(graph)
    }

    fn finder(graph: Arc<OrderBookGraph>) -> PathFinder<CountingReader> {
        PathFinder::new(graph, CountingReader::default(), PathFinderConfig::default())
    }

    fn receive_request(source: SourceSpec) -> StrictReceiveRequest {
        StrictReceiveRequest {
            destination_asset: eur(),
            destination_amount: 1000,
            source,
            max_path_length: 5,
        }
    }

    #[test]
    fn test_empty_graph_is_an_error_not_an_empty_result() {
        let finder = finder(Arc::new(OrderBookGraph::new()));

        let receive = finder.find_paths(&receive_request(SourceSpec::Assets(vec![Asset::Native])));
        assert_eq!(receive.unwrap_err(), QueryError::EmptyOrderBook);

        let send = finder.find_fixed_paths(&StrictSendRequest {
            source_asset: Asset::Native,
            source_amount: 1000,
            destination: DestinationSpec::Assets(vec![eur()]),
            max_path_length: 5,
        });
        assert_eq!(send.unwrap_err(), QueryError::EmptyOrderBook);
    }

    #[test]
    fn test_unapplied_graph_counts_as_empty() {
        let graph = OrderBookGraph::new();
        graph.add_offer(Offer::new(
            1, "alice", eur(), Asset::Native, Price::new(2, 1), 1000,
        ));
        // Never applied: offers are staged only.
        let finder = finder(Arc::new(graph));
        let result = finder.find_paths(&receive_request(SourceSpec::Assets(vec![Asset::Native])));
        assert_eq!(result.unwrap_err(), QueryError::EmptyOrderBook);
    }

    #[test]
    fn test_strict_receive_direct_path() {
        let finder = finder(two_hop_graph());
        let result = finder
            .find_paths(&receive_request(SourceSpec::Assets(vec![Asset::Native])))
            .unwrap();

        assert_eq!(result.last_ledger, 9);
        assert_eq!(result.paths.len(), 1);
        let path = &result.paths[0];
        assert_eq!(path.source_asset, Asset::Native);
        // 1000 EUR at 2 native per EUR costs 2000 native
        assert_eq!(path.source_amount, 2000);
        assert_eq!(path.destination_amount, 1000);
        assert!(path.interior.is_empty());
        assert_eq!(path.hop_count(), 1);
    }

    #[test]
    fn test_strict_receive_balance_validation() {
        let graph = two_hop_graph();
        let payer = AccountId::new("carol");

        // Enough native to cover the 2000 cost
        let rich = PathFinder::new(
            Arc::clone(&graph),
            CountingReader {
                calls: AtomicUsize::new(0),
                holdings: vec![AccountBalance { asset: Asset::Native, balance: 5000 }],
            },
            PathFinderConfig::default(),
        );
        let found = rich
            .find_paths(&receive_request(SourceSpec::Account(payer.clone())))
            .unwrap();
        assert_eq!(found.paths.len(), 1);

        // Balance below the cost: the path is not viable
        let poor = PathFinder::new(
            graph,
            CountingReader {
                calls: AtomicUsize::new(0),
                holdings: vec![AccountBalance { asset: Asset::Native, balance: 1999 }],
            },
            PathFinderConfig::default(),
        );
        let found = poor.find_paths(&receive_request(SourceSpec::Account(payer))).unwrap();
        assert!(found.paths.is_empty());
    }

    #[test]
    fn test_strict_receive_skips_offers_from_paying_account() {
        // The only EUR liquidity was placed by the payer itself.
        let graph = OrderBookGraph::new();
        graph.add_offer(Offer::new(
            1, "carol", eur(), Asset::Native, Price::new(2, 1), 100_000,
        ));
        graph.apply(3).unwrap();

        let finder = PathFinder::new(
            Arc::new(graph),
            CountingReader {
                calls: AtomicUsize::new(0),
                holdings: vec![AccountBalance { asset: Asset::Native, balance: 1_000_000 }],
            },
            PathFinderConfig::default(),
        );
        let found = finder
            .find_paths(&receive_request(SourceSpec::Account(AccountId::new("carol"))))
            .unwrap();
        assert!(found.paths.is_empty());
    }

    #[test]
    fn test_strict_send_hop_bound() {
        let finder = finder(two_hop_graph());
        let mut request = StrictSendRequest {
            source_asset: Asset::Native,
            source_amount: 1000,
            destination: DestinationSpec::Assets(vec![usd()]),
            max_path_length: 1,
        };

        // Reaching USD needs two conversions; one is not enough. That is a
        // legitimate empty result, not an error.
        let found = finder.find_fixed_paths(&request).unwrap();
        assert!(found.paths.is_empty());

        request.max_path_length = 2;
        let found = finder.find_fixed_paths(&request).unwrap();
        assert_eq!(found.paths.len(), 1);
        let path = &found.paths[0];
        assert_eq!(path.interior, vec![eur()]);
        // 1000 native -> 500 EUR -> 500 USD
        assert_eq!(path.destination_amount, 500);
        assert_eq!(path.hop_count(), 2);
    }

    #[test]
    fn test_strict_send_ranks_by_destination_amount() {
        // Two destinations: EUR (500 out of 1000 native) and USD (via EUR,
        // also 500). Equal amounts rank the shorter path first.
        let finder = finder(two_hop_graph());
        let found = finder
            .find_fixed_paths(&StrictSendRequest {
                source_asset: Asset::Native,
                source_amount: 1000,
                destination: DestinationSpec::Assets(vec![usd(), eur()]),
                max_path_length: 5,
            })
            .unwrap();

        assert_eq!(found.paths.len(), 2);
        assert_eq!(found.paths[0].destination_asset, eur());
        assert_eq!(found.paths[0].hop_count(), 1);
        assert_eq!(found.paths[1].destination_asset, usd());
        assert_eq!(found.paths[1].hop_count(), 2);
    }

    #[test]
    fn test_strict_send_to_account_uses_its_held_assets() {
        let finder = PathFinder::new(
            two_hop_graph(),
            CountingReader {
                calls: AtomicUsize::new(0),
                holdings: vec![AccountBalance { asset: usd(), balance: 0 }],
            },
            PathFinderConfig::default(),
        );
        let found = finder
            .find_fixed_paths(&StrictSendRequest {
                source_asset: Asset::Native,
                source_amount: 1000,
                destination: DestinationSpec::Account(AccountId::new("dave")),
                max_path_length: 5,
            })
            .unwrap();

        assert_eq!(finder.reader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(found.paths.len(), 1);
        assert_eq!(found.paths[0].destination_asset, usd());
    }

    #[test]
    fn test_strict_receive_prefers_cheaper_source() {
        // EUR can be bought with native (2/1) or with USD (1/1): paying in
        // USD is cheaper, so it ranks first.
        let graph = OrderBookGraph::new();
        graph.add_offer(Offer::new(
            1, "alice", eur(), Asset::Native, Price::new(2, 1), 100_000,
        ));
        graph.add_offer(Offer::new(
            2, "bob", eur(), usd(), Price::new(1, 1), 100_000,
        ));
        graph.apply(4).unwrap();

        let finder = finder(Arc::new(graph));
        let found = finder
            .find_paths(&receive_request(SourceSpec::Assets(vec![Asset::Native, usd()])))
            .unwrap();

        assert_eq!(found.paths.len(), 2);
        assert_eq!(found.paths[0].source_asset, usd());
        assert_eq!(found.paths[0].source_amount, 1000);
        assert_eq!(found.paths[1].source_asset, Asset::Native);
        assert_eq!(found.paths[1].source_amount, 2000);
    }

    #[test]
    fn test_same_asset_payment_is_a_zero_hop_path() {
        let finder = finder(two_hop_graph());
        let found = finder
            .find_paths(&receive_request(SourceSpec::Assets(vec![eur()])))
            .unwrap();

        assert_eq!(found.paths.len(), 1);
        assert_eq!(found.paths[0].hop_count(), 0);
        assert_eq!(found.paths[0].source_amount, 1000);
    }

    #[test]
    fn test_too_many_assets_rejected_before_any_resolution() {
        let graph = two_hop_graph();
        let finder = PathFinder::new(
            graph,
            CountingReader::default(),
            PathFinderConfig { max_path_length: 5, max_assets_param_length: 3 },
        );

        let assets: Vec<Asset> = (0..4)
            .map(|i| Asset::credit(format!("A{}", i), "issuer-1"))
            .collect();
        let result = finder.find_paths(&receive_request(SourceSpec::Assets(assets)));
        assert_eq!(result.unwrap_err(), QueryError::TooManyAssets { max: 3 });
        // The reader was never consulted: validation short-circuited.
        assert_eq!(finder.reader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hop_cap_and_bad_params_rejected() {
        let finder = finder(two_hop_graph());

        let mut request = receive_request(SourceSpec::Assets(vec![Asset::Native]));
        request.max_path_length = 9;
        assert_eq!(
            finder.find_paths(&request).unwrap_err(),
            QueryError::TooManyHops { requested: 9, max: 5 }
        );

        let mut request = receive_request(SourceSpec::Assets(vec![Asset::Native]));
        request.destination_amount = 0;
        assert_eq!(finder.find_paths(&request).unwrap_err(), QueryError::NonPositiveAmount);

        let request = receive_request(SourceSpec::Assets(vec![Asset::credit("", "x")]));
        assert!(matches!(
            finder.find_paths(&request).unwrap_err(),
            QueryError::MalformedAsset(_)
        ));
    }

    #[test]
    fn test_no_cycles_in_results() {
        // A deliberately loopy book: every pair trades both ways.
        let graph = OrderBookGraph::new();
        let assets = [Asset::Native, eur(), usd()];
        let mut id = 0;
        for a in &assets {
            for b in &assets {
                if a != b {
                    id += 1;
                    graph.add_offer(Offer::new(
                        id, "maker", a.clone(), b.clone(), Price::new(1, 1), 1_000_000,
                    ));
                }
            }
        }
        graph.apply(2).unwrap();

        let finder = finder(Arc::new(graph));
        let found = finder
            .find_fixed_paths(&StrictSendRequest {
                source_asset: Asset::Native,
                source_amount: 1000,
                destination: DestinationSpec::Assets(vec![eur(), usd()]),
                max_path_length: 5,
            })
            .unwrap();

        for path in &found.paths {
            let mut seen: Vec<&Asset> = vec![&path.source_asset];
            seen.extend(path.interior.iter());
            seen.push(&path.destination_asset);
            let unique: HashSet<&&Asset> = seen.iter().collect();
            assert_eq!(unique.len(), seen.len(), "cycle in {:?}", path);
            assert!(path.hop_count() <= 5);
        }
    }
}
