use std::path::Path;

use p1_client::{
    db::{self, reading_queries, StoreError},
    domain::Reading,
};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::WriteError;
use crate::pipeline::{Envelope, Sink};

/// Upserts each reading into the `readings` table, keyed by the second it is written at.
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::from_pool(db::open_file(path).await?))
    }

    /// Wrap an already opened store. The schema must exist.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for SqliteSink {
    async fn write(&self, input: &Envelope<Reading>) -> Result<(), WriteError> {
        let timestamp = OffsetDateTime::now_utc().unix_timestamp();
        reading_queries::save_reading(&self.pool, timestamp, &input.payload).await?;
        tracing::debug!(timestamp, "stored reading");
        Ok(())
    }
}
