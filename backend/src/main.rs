use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eduportal_backend::{
    config::{Config, StorageBackend},
    db::{DocumentStore, FileDocumentStore, MemoryDocumentStore, PgDocumentStore},
    routes::build_router,
    services::bootstrap::bootstrap,
    state::AppState,
};

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryDocumentStore::new())
        }
        StorageBackend::File => Arc::new(FileDocumentStore::open(&config.data_dir).await?),
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres storage"))?;
            Arc::new(PgDocumentStore::connect(url).await?)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduportal_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        storage_backend = ?config.storage_backend,
        data_dir = %config.data_dir.display(),
        time_zone = %config.time_zone,
        session_timeout_minutes = config.session_timeout_minutes,
        production_mode = config.production_mode,
        "Loaded configuration from environment/.env"
    );

    let store = open_store(&config).await?;
    let state = AppState::new(config.clone(), store);
    bootstrap(&state.repos, &config).await?;

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
