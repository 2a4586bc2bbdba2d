//! Manna - request-interception caching gateway
//!
//! "Gather enough for today" - Exodus 16:4

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use manna::{
    config::Args,
    fetch::HttpFetcher,
    gateway::Gateway,
    server::{self, AppState},
    store::MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("manna={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Manna - Caching Gateway");
    info!("  \"Gather enough for today\"");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Origin: {}", args.site_origin());
    info!("Build version: {}", args.build_version);
    info!("Claim policy: {:?}", args.claim_policy);
    info!("======================================");

    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(HttpFetcher::new());

    let gateway = Arc::new(Gateway::new(
        args.route_config(),
        &args.build_version,
        store.clone(),
        fetcher.clone(),
        args.claim_policy,
    ));

    // Install: pre-warm the site namespace with the entry document. A cold
    // start with the origin down still has to serve whatever is cached, so
    // install failure is not fatal here.
    match gateway.install().await {
        Ok(()) => info!("Install complete, site namespace pre-warmed"),
        Err(e) => warn!("Install failed (continuing with empty cache): {}", e),
    }

    // Activate: take over traffic and report namespaces left behind by
    // earlier build versions.
    gateway.activate().await;

    // Run the server
    let state = Arc::new(AppState {
        args,
        gateway,
        store,
        fetcher,
    });

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
