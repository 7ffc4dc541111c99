//! Demo binary: builds a small order book graph and runs one query of each
//! kind against it. The real consumers of this crate are the ingestion
//! pipeline and the HTTP handlers of the hosting service.

use std::error::Error;
use std::sync::Arc;

use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

use orderbook_graph::search::{
    DestinationSpec, InMemoryLedgerState, PathFinder, SourceSpec, StrictReceiveRequest,
    StrictSendRequest,
};
use orderbook_graph::settings::load_settings;
use orderbook_graph::types::amount::format_amount;
use orderbook_graph::{Asset, Offer, OrderBookGraph, Price};

fn setup_logger(level: &str) -> Result<(), Box<dyn Error>> {
    let log_level = match level.to_lowercase().as_str() {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build();

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(log_level))?;

    log4rs::init_config(log_config)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let settings = load_settings()?;
    setup_logger(&settings.log_level)?;

    let eur = Asset::credit("EUR", "GISSUER1");
    let usd = Asset::credit("USD", "GISSUER2");

    // One ledger's worth of offers: EUR sold for native, USD sold for EUR.
    let graph = Arc::new(OrderBookGraph::with_capacity(1024));
    graph
        .add_offer(Offer::new(1, "GALICE", eur.clone(), Asset::Native, Price::new(2, 1), 50_000_000))
        .add_offer(Offer::new(2, "GBOB", usd.clone(), eur.clone(), Price::new(1, 1), 50_000_000))
        .add_offer(Offer::new(3, "GBOB", usd.clone(), eur.clone(), Price::new(2, 1), 10_000_000));
    graph.apply(1)?;
    log::info!(
        "graph ready: {} offers, ledger {}, digest {}",
        graph.len(),
        graph.last_applied_ledger(),
        graph.state_digest_hex()
    );

    let summary = graph.find_asks_and_bids(&usd, &eur, 10)?;
    for level in &summary.asks {
        log::info!("ask {} x {}", level.price, format_amount(level.amount));
    }

    let ledger_state = InMemoryLedgerState::new();
    let finder = PathFinder::new(Arc::clone(&graph), ledger_state, (&settings).into());

    let receive = finder.find_paths(&StrictReceiveRequest {
        destination_asset: usd.clone(),
        destination_amount: 10_000_000,
        source: SourceSpec::Assets(vec![Asset::Native, eur.clone()]),
        max_path_length: settings.max_path_length,
    })?;
    for path in &receive.paths {
        log::info!(
            "receive {} {}: pay {} {} ({} hops)",
            format_amount(path.destination_amount),
            path.destination_asset,
            format_amount(path.source_amount),
            path.source_asset,
            path.hop_count()
        );
    }

    let send = finder.find_fixed_paths(&StrictSendRequest {
        source_asset: Asset::Native,
        source_amount: 10_000_000,
        destination: DestinationSpec::Assets(vec![eur, usd]),
        max_path_length: settings.max_path_length,
    })?;
    for path in &send.paths {
        log::info!(
            "send {} native: deliver {} {} ({} hops)",
            format_amount(path.source_amount),
            format_amount(path.destination_amount),
            path.destination_asset,
            path.hop_count()
        );
    }

    Ok(())
}
