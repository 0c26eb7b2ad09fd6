use anyhow::Result;
use clap::Parser;
use p1_poller::{cli::Args, observability, service};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = Args::parse().into_config()?;
    cfg.log_config();

    let cancel = CancellationToken::new();
    service::cancel_on_ctrl_c(cancel.clone());

    service::run(&cfg, cancel).await?;
    Ok(())
}
