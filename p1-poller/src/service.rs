use anyhow::Context;
use p1_client::domain::Reading;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    metrics_server,
    pipeline::{Pipeline, RunStats},
    sinks::ReadingSink,
    sources::{MeterClient, MeterPollSource},
};

/// Open the configured backend and poll the meter until `cancel` fires.
///
/// Only startup failures are returned; per-cycle errors are logged and skipped.
pub async fn run(cfg: &AppConfig, cancel: CancellationToken) -> anyhow::Result<RunStats> {
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr).await?;
    }

    let sink = ReadingSink::from_config(cfg).await?;

    let url = Url::parse(&cfg.meter.url)
        .with_context(|| format!("invalid meter url `{}`", cfg.meter.url))?;
    let client = MeterClient::new(url, cfg.request_timeout())
        .context("failed to build meter HTTP client")?;

    tracing::info!(
        url = %client.url(),
        interval_secs = cfg.poll.interval_secs,
        "polling P1 meter"
    );
    let source = MeterPollSource::new(client, cfg.poll_interval(), cancel);

    let pipeline: Pipeline<_, Reading, _> = Pipeline::new(source, sink);
    Ok(pipeline.run().await)
}

/// Cancel `token` on Ctrl-C.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received Ctrl-C, stopping after the current cycle");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C"),
        }
    });
}
