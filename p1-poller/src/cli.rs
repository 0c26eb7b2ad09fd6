use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, SinkKind};

/// Poll a P1 meter and store its readings in SQLite or VictoriaMetrics.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Where to write readings.
    #[arg(long, value_enum)]
    pub mode: Option<SinkKind>,

    /// Hostname of the VictoriaMetrics instance.
    #[arg(long)]
    pub host: Option<String>,

    /// Poll interval in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// TOML config file; flags take precedence over it.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut cfg = AppConfig::load(self.config.as_deref())?;
        self.apply(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(mode) = self.mode {
            cfg.sink.kind = mode;
        }
        if let Some(host) = &self.host {
            cfg.victoria_metrics.host = host.clone();
        }
        if let Some(interval) = self.interval {
            cfg.poll.interval_secs = interval;
        }
    }
}
