use std::{pin::Pin, sync::Arc, time::Duration};

use futures::Stream;
use p1_client::domain::Reading;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::Fetch;
use crate::pipeline::{Envelope, PipelineError, Source};

/// Fetches one reading per timer tick until cancelled.
///
/// The first tick fires one full interval after the stream is created. The next
/// tick is not awaited until the consumer has finished with the previous item,
/// so at most one fetch and write are ever in flight. Late ticks are delayed,
/// never bunched up.
pub struct MeterPollSource<F> {
    fetcher: Arc<F>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<F> MeterPollSource<F> {
    pub fn new(fetcher: F, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            interval,
            cancel,
        }
    }
}

#[async_trait::async_trait]
impl<F> Source<Reading> for MeterPollSource<F>
where
    F: Fetch + 'static,
{
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<Reading>, PipelineError>> + Send>> {
        let fetcher = self.fetcher.clone();
        let cancel = self.cancel.clone();
        let period = self.interval;

        Box::pin(async_stream::stream! {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                metrics::counter!("p1_fetch_total").increment(1);
                let item = match fetcher.fetch().await {
                    Ok(reading) => {
                        tracing::info!(
                            active_power_w = reading.active_power_w,
                            "loaded P1 meter reading"
                        );
                        Ok(Envelope::new(reading))
                    }
                    Err(e) => {
                        metrics::counter!("p1_fetch_errors_total").increment(1);
                        Err(PipelineError::from(e))
                    }
                };
                yield item;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Mutex;

    use super::*;
    use crate::{
        pipeline::{Pipeline, RunStats, Sink},
        sinks::WriteError,
        sources::FetchError,
    };

    /// Fails every other call and cancels the run after `stop_after` calls.
    struct FlakyMeter {
        calls: AtomicUsize,
        stop_after: usize,
        cancel: CancellationToken,
    }

    #[async_trait::async_trait]
    impl Fetch for FlakyMeter {
        async fn fetch(&self) -> Result<Reading, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.stop_after {
                self.cancel.cancel();
            }
            if call % 2 == 1 {
                return Err(FetchError::Status("503 Service Unavailable".to_string()));
            }
            Ok(Reading {
                active_power_w: call as f64,
                ..Reading::default()
            })
        }
    }

    #[derive(Default)]
    struct TimedSink {
        writes: Mutex<Vec<(Instant, f64)>>,
    }

    #[async_trait::async_trait]
    impl Sink<Reading> for Arc<TimedSink> {
        async fn write(&self, input: &Envelope<Reading>) -> Result<(), WriteError> {
            self.writes
                .lock()
                .await
                .push((Instant::now(), input.payload.active_power_w));
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_every_tick_and_skips_writes_for_failed_fetches() {
        let cancel = CancellationToken::new();
        let meter = FlakyMeter {
            calls: AtomicUsize::new(0),
            stop_after: 4,
            cancel: cancel.clone(),
        };
        let sink = Arc::new(TimedSink::default());
        let started = Instant::now();

        let source = MeterPollSource::new(meter, Duration::from_secs(10), cancel);
        let stats = Pipeline::<_, Reading, _>::new(source, sink.clone()).run().await;

        assert_eq!(
            stats,
            RunStats {
                cycles: 4,
                fetch_errors: 2,
                writes: 2,
                write_errors: 0,
            }
        );

        let writes = sink.writes.lock().await;
        let written: Vec<f64> = writes.iter().map(|(_, w)| *w).collect();
        assert_eq!(written, vec![2.0, 4.0]);
        // Ticks at 10s, 20s, 30s and 40s; only the even ones wrote.
        assert!(writes[0].0 - started >= Duration::from_secs(20));
        assert!(writes[1].0 - started >= Duration::from_secs(40));
        assert!(writes[1].0 - started < Duration::from_secs(41));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_tick_never_fetches() {
        let cancel = CancellationToken::new();
        let meter = FlakyMeter {
            calls: AtomicUsize::new(0),
            stop_after: usize::MAX,
            cancel: cancel.clone(),
        };
        cancel.cancel();

        let source = MeterPollSource::new(meter, Duration::from_secs(1), cancel);
        let fetcher = source.fetcher.clone();
        let sink = Arc::new(TimedSink::default());
        let stats = Pipeline::<_, Reading, _>::new(source, sink).run().await;

        assert_eq!(stats, RunStats::default());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting_for_a_tick_stops_the_loop() {
        let cancel = CancellationToken::new();
        let meter = FlakyMeter {
            calls: AtomicUsize::new(0),
            stop_after: usize::MAX,
            cancel: cancel.clone(),
        };
        let source = MeterPollSource::new(meter, Duration::from_secs(10), cancel.clone());

        let canceller = tokio::spawn(async move {
            time::sleep(Duration::from_secs(25)).await;
            cancel.cancel();
        });
        let sink = Arc::new(TimedSink::default());
        let stats = Pipeline::<_, Reading, _>::new(source, sink).run().await;
        canceller.await.unwrap();

        assert_eq!(stats.cycles, 2);
    }
}
