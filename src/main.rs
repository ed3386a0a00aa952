//! Microfinance Ledger Server
//!
//! Serves the ledger API over HTTP, backed by PostgreSQL when `DATABASE_URL`
//! is set and by an in-process store otherwise.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;

use microfinance_ledger::auth::AuthService;
use microfinance_ledger::config::Config;
use microfinance_ledger::middleware::RateLimiter;
use microfinance_ledger::services::BusinessCalendar;
use microfinance_ledger::state::AppState;
use microfinance_ledger::store::{LedgerStore, MemoryStore, PgStore};
use microfinance_ledger::{build_router, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        timezone = %config.business_timezone,
        "Starting microfinance ledger"
    );

    let store: Arc<dyn LedgerStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(&config, url).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let auth_service =
        Arc::new(AuthService::from_config(&config).context("Failed to initialize auth")?);
    let calendar = BusinessCalendar::new(config.business_timezone);
    let app_state = AppState::new(store, calendar, auth_service.clone());

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);

    // Periodic housekeeping: idle rate limit buckets and expired revocations
    let limiter_cleanup = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let buckets = limiter_cleanup.cleanup(Duration::from_secs(600)).await;
            let revocations = auth_service.purge_expired().await;
            tracing::debug!(buckets, revocations, "Housekeeping completed");
        }
    });

    let app = build_router(app_state, &config, rate_limiter);

    let ip = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid BIND_ADDRESS '{}'", config.bind_address))?;
    let addr = SocketAddr::new(ip, config.port);

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
