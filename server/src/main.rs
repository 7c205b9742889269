//! Fleet Server binary.

use fleet_engine::{DocumentStore, MemoryStore, SystemClock};
use fleet_server::config::Config;
use fleet_server::db;
use fleet_server::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "fleet_server=debug,fleet_engine=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Fleet Server on {}:{}", config.host, config.port);

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(db::open_document_store(url, config.database_max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, documents are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    tracing::info!(
        granularity = ?config.granularity,
        list_limit = config.list_limit,
        "Allocation rules configured"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(store, Arc::new(SystemClock), config);
    let app = fleet_server::app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
