use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

use transaction_service::app;
use transaction_service::config::{AppConfig, StoreBackend};
use transaction_service::logging::{init_logging, LoggingConfig};
use transaction_service::state::AppState;
use transaction_service::store::{MemoryStore, PgStore};

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let state = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is not set")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_db_connections)
                .connect(database_url)
                .await
                .context("Failed to connect to PostgreSQL")?;

            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations applied");
            }

            let store = Arc::new(PgStore::new(pool));
            info!("Using PostgreSQL store");
            AppState {
                transactions: store.clone(),
                invalid_records: store,
                max_upload_bytes: config.max_upload_bytes,
            }
        }
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            info!("Using in-memory store; data is lost on restart");
            AppState {
                transactions: store.clone(),
                invalid_records: store,
                max_upload_bytes: config.max_upload_bytes,
            }
        }
    };
    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    let state = build_state(&config).await?;
    let app = app::create_app(state, &config.cors_allowed_origins);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Transaction service running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
