//! Opening the document database: pool, schema, store.

use super::PgDocumentStore;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// How long a request waits for a pooled connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures while bringing up the document database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Connect a bounded pool to `database_url`.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// Bring the `documents` schema and its uniqueness indexes up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Connect, migrate and wrap the pool as a [`PgDocumentStore`].
pub async fn open_document_store(
    database_url: &str,
    max_connections: u32,
) -> Result<PgDocumentStore, DatabaseError> {
    let pool = create_pool(database_url, max_connections).await?;
    tracing::info!(max_connections, "Database pool ready");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(PgDocumentStore::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_a_connect_error() {
        let err = open_document_store("not a database url", 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Connect(_)));
        assert!(err.to_string().starts_with("Failed to connect to database"));
    }
}
