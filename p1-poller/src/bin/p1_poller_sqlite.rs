//! Fixed-backend poller: reads the meter every second into `p1-meter.db`.

use anyhow::Result;
use p1_poller::{
    config::{AppConfig, PollConfig, SinkConfig, SinkKind},
    observability, service,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig {
        poll: PollConfig { interval_secs: 1 },
        sink: SinkConfig {
            kind: SinkKind::Sqlite,
        },
        ..AppConfig::default()
    };
    cfg.log_config();

    let cancel = CancellationToken::new();
    service::cancel_on_ctrl_c(cancel.clone());

    service::run(&cfg, cancel).await?;
    Ok(())
}
