//! Standup Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use standup_core::config::AppConfig;
use standup_database::Stores;
use standup_rpc::{AppState, build_app};
use standup_service::mail::build_mailer;

#[tokio::main]
async fn main() {
    let env = std::env::var("STANDUP_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Standup v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Persistent store ─────────────────────────────────
    tracing::info!(provider = ?config.database.provider, "Connecting to store...");
    let stores = Stores::connect(&config.database)
        .await
        .context("store initialization failed")?;

    // ── Step 2: Mail transport ───────────────────────────────────
    let mailer = build_mailer(&config.mail).context("invalid mail configuration")?;
    tracing::info!(provider = ?config.mail.provider, "Mail transport ready");

    // ── Step 3: Services and RPC pipeline ────────────────────────
    let addr = config.server.bind_address();
    let state = AppState::build(config, stores, mailer).context("invalid auth configuration")?;

    // ── Step 4: Background sweeper ───────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = state.sweeper();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(shutdown_rx).await;
    });

    // ── Step 5: HTTP server ──────────────────────────────────────
    let pool = state.stores.pool.clone();
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Standup server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("server error")?;

    // ── Step 6: Drain background work ────────────────────────────
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;
    if let Some(pool) = pool {
        pool.close().await;
    }

    tracing::info!("Standup server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
