//! Entry point: assembles the concrete plug-ins and hosts the engine.
//!
//! Reference: SPEC_FULL.md §6, grounded on
//! `panon-btc-cory/crates/cory/src/main.rs`'s shape (parse CLI, load
//! config, build the `axum::Router`, serve).

use std::sync::Arc;

use clap::Parser;
use eyre::WrapErr;
use overlay_core::Engine;
use overlay_server::{build_router, AppState, Cli, Config};
use overlay_services::{ArcBroadcaster, HttpChainTracker, HttpGossiper};
use overlay_ship_slap::{ShipLookupService, ShipSlapAdvertiser, ShipTopicManager, SlapLookupService, SlapTopicManager};
use overlay_storage_sqlite::StorageSqlite;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("load config file")?;
    config.apply_cli(&cli);

    let engine = build_engine(&config).context("assemble engine plug-ins")?;

    if config.sync_interval_secs > 0 {
        let background_engine = engine.clone();
        let interval = std::time::Duration::from_secs(config.sync_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                background_engine.sync_advertisements().await;
            }
        });
    }

    let state = Arc::new(AppState { engine });
    let router = build_router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .context("bind TCP listener")?;
    tracing::info!(addr = %config.listen_addr, "overlay-server listening");
    axum::serve(listener, router).await.context("run HTTP server")?;

    Ok(())
}

fn build_engine(config: &Config) -> eyre::Result<Engine> {
    let storage = Arc::new(StorageSqlite::new(&config.sqlite_path).context("open sqlite storage")?);
    let chain_tracker = Arc::new(HttpChainTracker::new(config.chain_tracker_url.clone()));
    let ls_ship = Arc::new(ShipLookupService::new(storage.clone()));
    let ls_slap = Arc::new(SlapLookupService::new(storage.clone()));
    let advertiser = Arc::new(ShipSlapAdvertiser::new(
        config.hosting_url.clone(),
        ls_ship.clone(),
        ls_slap.clone(),
    ));

    let engine = Engine::new(storage, chain_tracker)
        .with_topic_manager(overlay_core::types::TM_SHIP, Arc::new(ShipTopicManager))
        .with_topic_manager(overlay_core::types::TM_SLAP, Arc::new(SlapTopicManager))
        .with_lookup_service(overlay_core::types::LS_SHIP, ls_ship)
        .with_lookup_service(overlay_core::types::LS_SLAP, ls_slap)
        .with_advertiser(advertiser)
        .with_broadcaster(Arc::new(ArcBroadcaster::new(config.arc_url.clone())))
        .with_gossiper(Arc::new(HttpGossiper::new()))
        .with_hosting_url(config.hosting_url.clone())
        .with_ship_trackers(config.ship_trackers.clone())
        .with_slap_trackers(config.slap_trackers.clone());

    Ok(engine)
}
