use std::time::Duration;

use p1_client::domain::Reading;

use super::WriteError;
use crate::pipeline::{Envelope, Sink};

pub const DEFAULT_PORT: u16 = 8428;

const MEASUREMENT: &str = "p1";

fn push_tag(out: &mut String, key: &str, value: &str) {
    out.push(',');
    out.push_str(key);
    out.push('=');
    out.push_str(value);
}

/// Fields are written with six decimals, e.g. `1234.500000`.
fn push_field_f64(out: &mut String, first: &mut bool, key: &str, value: f64) {
    if *first {
        *first = false;
    } else {
        out.push(',');
    }

    out.push_str(key);
    out.push('=');
    out.push_str(&format!("{value:.6}"));
}

/// Line-protocol encoding without a trailing newline or timestamp.
pub trait LineEncode {
    fn write_line(&self, out: &mut String);
}

impl LineEncode for Reading {
    fn write_line(&self, out: &mut String) {
        out.push_str(MEASUREMENT);
        push_tag(out, "tag", MEASUREMENT);

        out.push(' ');
        let mut first = true;
        for (key, value) in self.numeric_fields() {
            push_field_f64(out, &mut first, key, value);
        }
    }
}

pub fn encode_line<T: LineEncode>(item: &T) -> String {
    let mut line = String::with_capacity(512);
    item.write_line(&mut line);
    line
}

/// POSTs one line per reading to VictoriaMetrics' InfluxDB-compatible `/write` endpoint.
pub struct VictoriaMetricsSink {
    client: reqwest::Client,
    url: String,
}

impl VictoriaMetricsSink {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            client,
            url: format!("http://{host}:{port}/write"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Sink<Reading> for VictoriaMetricsSink {
    async fn write(&self, input: &Envelope<Reading>) -> Result<(), WriteError> {
        let line = encode_line(&input.payload);
        let len = line.len();

        let response = self
            .client
            .post(&self.url)
            .body(line)
            .send()
            .await
            .map_err(WriteError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WriteError::Status(status.to_string()));
        }

        metrics::counter!("p1_line_protocol_bytes_total").increment(len as u64);
        tracing::debug!(bytes = len, "wrote reading to VictoriaMetrics");
        Ok(())
    }
}
