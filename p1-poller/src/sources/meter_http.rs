use std::time::Duration;

use p1_client::domain::Reading;
use reqwest::{StatusCode, Url};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("failed to request a reading from the meter: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("meter responded with status {0}")]
    Status(String),
    #[error("failed to decode the meter response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Something that can produce one fresh reading on demand.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self) -> Result<Reading, FetchError>;
}

/// HTTP client for the P1 meter's `GET /api/v1/data` endpoint.
pub struct MeterClient {
    inner: reqwest::Client,
    url: Url,
}

impl MeterClient {
    /// Idle connections are not pooled, so every fetch opens its own connection.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self { inner, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Fetch for MeterClient {
    async fn fetch(&self) -> Result<Reading, FetchError> {
        let response = self
            .inner
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.to_string()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}
