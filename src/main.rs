use std::sync::Arc;

use anyhow::Result;
use city_events_service::http::{AppState, HttpServer};
use city_events_service::{InMemoryUserStore, ScraperConfig, ScraperService, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // ログ設定（RUST_LOG で上書き可能）
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,city_events_service=debug")),
        )
        .init();

    let scraper_config = ScraperConfig::from_env();
    let server_config = ServerConfig::from_env();

    info!(
        "Scraper config: origin={}, headless={}, max_sessions={}, nav_timeout={:?}",
        scraper_config.site.origin(),
        scraper_config.headless,
        scraper_config.max_concurrent_sessions,
        scraper_config.navigation_timeout
    );

    let state = AppState::new(
        ScraperService::new(scraper_config),
        Arc::new(InMemoryUserStore::new()),
    );

    HttpServer::new(server_config, state)
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
}
