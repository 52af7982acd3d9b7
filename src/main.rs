use std::sync::Arc;

use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use tradesim_backend::app;
use tradesim_backend::config::{AppConfig, StoreBackend};
use tradesim_backend::logging::{init_logging, LoggingConfig};
use tradesim_backend::state::AppState;
use tradesim_backend::store::{LedgerStore, MemoryLedgerStore, PgLedgerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env()).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().map_err(|e| anyhow!(e))?;

    let store: Arc<dyn LedgerStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres store")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("failed to run database migrations")?;
                tracing::info!("📦 Database migrations applied");
            }
            tracing::info!("💾 Using Postgres ledger store");
            Arc::new(PgLedgerStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("💾 Using in-memory ledger store; data is lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let state = AppState::new(store, config.purchase_timeout);
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Tradesim backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
