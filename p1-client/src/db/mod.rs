pub mod reading_queries;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to open reading store: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("failed to prepare statement: {0}")]
    Prepare(#[source] sqlx::Error),
    #[error("failed to execute statement: {0}")]
    Execute(#[source] sqlx::Error),
    #[error("no reading stored at timestamp {timestamp}")]
    NotFound { timestamp: i64 },
}

/// Open (creating if missing) the SQLite file at `path` and ensure the schema exists.
///
/// The pool holds a single connection: every write goes through one handle.
pub async fn open_file(path: impl AsRef<Path>) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    open_with(options).await
}

/// Open a private in-memory store. Its contents live as long as the returned pool.
pub async fn open_in_memory() -> Result<SqlitePool, StoreError> {
    open_with(SqliteConnectOptions::new().in_memory(true)).await
}

async fn open_with(options: SqliteConnectOptions) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(StoreError::Connect)?;

    reading_queries::create_schema(&pool).await?;
    Ok(pool)
}
