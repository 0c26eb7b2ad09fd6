use std::{marker::PhantomData, pin::Pin, time::SystemTime};

use futures::{Stream, StreamExt};

use crate::{sinks::WriteError, sources::FetchError};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Produces one item per poll cycle until it is cancelled.
#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;
}

/// Persists a single item. Implementations do not retry.
#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn write(&self, input: &Envelope<T>) -> Result<(), WriteError>;
}

/// Counters for one `Pipeline::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub fetch_errors: u64,
    pub writes: u64,
    pub write_errors: u64,
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub sink: K,
    _payload: PhantomData<fn() -> T>,
}

impl<S, T, K> Pipeline<S, T, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            _payload: PhantomData,
        }
    }
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    /// Drive the source to completion, writing every item to the sink.
    ///
    /// A failed fetch or write only abandons its own cycle; the loop ends when the
    /// source stream ends.
    pub async fn run(self) -> RunStats {
        let mut stream = self.source.stream().await;
        let mut stats = RunStats::default();

        while let Some(item) = stream.next().await {
            stats.cycles += 1;

            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    stats.fetch_errors += 1;
                    tracing::warn!(error = %e, "poll cycle abandoned, no reading to write");
                    continue;
                }
            };

            match self.sink.write(&env).await {
                Ok(()) => {
                    stats.writes += 1;
                    metrics::counter!("p1_write_total").increment(1);

                    if let Ok(dur) = SystemTime::now().duration_since(env.received_at) {
                        metrics::histogram!("p1_cycle_latency_seconds").record(dur.as_secs_f64());
                    }
                }
                Err(e) => {
                    stats.write_errors += 1;
                    metrics::counter!("p1_write_errors_total").increment(1);
                    tracing::warn!(error = %e, "poll cycle abandoned, failed to write reading");
                }
            }
        }

        tracing::info!(
            cycles = stats.cycles,
            writes = stats.writes,
            fetch_errors = stats.fetch_errors,
            write_errors = stats.write_errors,
            "poll loop stopped"
        );
        stats
    }
}
