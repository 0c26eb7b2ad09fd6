use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Context};
use serde::Deserialize;

use crate::sinks::victoria_metrics;

const CONFIG_ENV: &str = "P1_POLLER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "p1-poller.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Sqlite,
    #[value(name = "victoriametrics")]
    VictoriaMetrics,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            url: "http://10.0.0.29/api/v1/data".to_string(),
            timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::VictoriaMetrics,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("p1-meter.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VictoriaMetricsConfig {
    pub host: String,
    pub port: u16,
}

impl Default for VictoriaMetricsConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: victoria_metrics::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub meter: MeterConfig,
    pub poll: PollConfig,
    pub sink: SinkConfig,
    pub sqlite: SqliteConfig,
    pub victoria_metrics: VictoriaMetricsConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Resolve the config file (explicit path, then `P1_POLLER_CONFIG`, then
    /// `p1-poller.toml` if present) and fall back to defaults when there is none.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        use std::env;

        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists())),
        };

        match path {
            Some(path) => {
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file `{}`", path.display()))?;
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config file `{}`", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.poll.interval_secs > 0, "poll interval must be at least one second");
        ensure!(self.meter.timeout_ms > 0, "meter timeout must be positive");
        reqwest::Url::parse(&self.meter.url)
            .with_context(|| format!("invalid meter url `{}`", self.meter.url))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// Per-request timeout, never longer than one poll interval.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.meter.timeout_ms).min(self.poll_interval())
    }

    pub fn log_config(&self) {
        tracing::info!(
            meter_url = %self.meter.url,
            interval_secs = self.poll.interval_secs,
            timeout_ms = self.request_timeout().as_millis() as u64,
            sink = ?self.sink.kind,
            "configuration loaded"
        );
    }
}
