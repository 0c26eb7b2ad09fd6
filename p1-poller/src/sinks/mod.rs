pub mod sqlite;
pub mod victoria_metrics;

use anyhow::Context;
use p1_client::{db::StoreError, domain::Reading};

use crate::{
    config::{AppConfig, SinkKind},
    pipeline::{Envelope, Sink},
};

pub use sqlite::SqliteSink;
pub use victoria_metrics::VictoriaMetricsSink;

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("reading store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to send line to the time-series endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("time-series endpoint responded with status {0}")]
    Status(String),
}

/// The backend chosen at startup.
pub enum ReadingSink {
    Sqlite(SqliteSink),
    VictoriaMetrics(VictoriaMetricsSink),
}

impl ReadingSink {
    /// Open the configured backend. Failing to open the SQLite store is fatal.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        match cfg.sink.kind {
            SinkKind::Sqlite => {
                let path = &cfg.sqlite.path;
                let sink = SqliteSink::open(path).await.with_context(|| {
                    format!("failed to open SQLite database `{}`", path.display())
                })?;
                tracing::info!(path = %path.display(), "writing readings to local SQLite database");
                Ok(Self::Sqlite(sink))
            }
            SinkKind::VictoriaMetrics => {
                let vm = &cfg.victoria_metrics;
                let sink = VictoriaMetricsSink::new(&vm.host, vm.port, cfg.request_timeout())
                    .context("failed to build VictoriaMetrics HTTP client")?;
                tracing::info!(url = %sink.url(), "writing readings to VictoriaMetrics");
                Ok(Self::VictoriaMetrics(sink))
            }
        }
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for ReadingSink {
    async fn write(&self, input: &Envelope<Reading>) -> Result<(), WriteError> {
        match self {
            Self::Sqlite(s) => s.write(input).await,
            Self::VictoriaMetrics(s) => s.write(input).await,
        }
    }
}
