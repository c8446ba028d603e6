//! BlinkGuard API Server
//!
//! REST API for pre-signing transaction analysis and the community
//! malicious-URL registry.
//!
//! Usage:
//!   cargo run --bin blinkguard_api
//!
//! Environment:
//!   PORT / BLINKGUARD_PORT      - Server port (default: 3000)
//!   BLINKGUARD_HOST             - Server host (default: 0.0.0.0)
//!   BLINKGUARD_REGISTRY_PATH    - Registry file (default: data/registry.json)
//!   BLINKGUARD_ADMIN_KEY        - Enables POST /registry/verify
//!   RUST_LOG                    - Log filter (default: info)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use blinkguard::api::{create_router, spawn_cleanup_task, AppState};
use blinkguard::utils::constants::{APP_NAME, APP_VERSION};
use blinkguard::{GuardConfig, RegistryStore, TelemetryCollector};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = GuardConfig::from_env()?;

    // Registry is owned here and handed to the state explicitly
    let store = Arc::new(RegistryStore::open(&config.registry_path)?);
    let telemetry = Arc::new(TelemetryCollector::new());

    let state = Arc::new(AppState::new(&config, store.clone(), telemetry.clone()));
    let cleanup = spawn_cleanup_task(state.rate_limiter.clone());
    info!("🧹 Rate limiter cleanup task started");

    let app = create_router(state, config.max_concurrency);

    let addr: SocketAddr = config.bind_address().parse()?;

    info!("🚀 {} API v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!("📒 Registry: {}", config.registry_path.display());
    if config.admin_key.is_none() {
        warn!("⚠️ BLINKGUARD_ADMIN_KEY not set, /registry/verify is disabled");
    }
    info!("");
    info!("Endpoints:");
    info!("  POST /analyze           - Transaction safety analysis");
    info!("  GET  /registry/check    - Check a URL against the registry");
    info!("  GET  /registry/latest   - Full registry");
    info!("  POST /registry/report   - Report a malicious URL");
    info!("  POST /registry/verify   - Verify a report (admin)");
    info!("  GET  /stats             - Service statistics");
    info!("  GET  /health            - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Graceful shutdown sequence
    info!("🛑 Shutdown signal received, cleaning up...");
    cleanup.abort();
    store.close();

    let stats = telemetry.get_stats();
    info!("{}", stats.summary_line());

    match telemetry.export_stats_json(Path::new("telemetry")) {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 {} API shutdown complete", APP_NAME);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║   🛡️  B L I N K G U A R D                            ║
    ║                                                      ║
    ║        Pre-signing Safety Engine for Blinks          ║
    ║             Community Malicious-URL Registry         ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );
}
