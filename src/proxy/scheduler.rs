//! Bounded worker pool that runs one probe per proxy

use crate::proxy::aggregate::ResultAggregator;
use crate::proxy::checker::{CheckerConfig, HttpProber, Prober};
use crate::proxy::models::{ProbeOutcome, ProbeResult, Proxy};
use crate::proxy::status::StatusSink;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Live counters for a run
#[derive(Debug, Default)]
pub struct RunStats {
    started: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl RunStats {
    /// Probes that got past the cancellation check
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Probes that produced a real outcome
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of probes running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs a prober over a proxy list with at most `workers` probes in flight.
///
/// Every proxy gets exactly one [`ProbeResult`], tagged with its input index.
/// Slots that have not started when the token is cancelled resolve to
/// [`ProbeOutcome::Cancelled`] without touching the prober; started probes are
/// left to finish on their own.
pub struct Scheduler<P: Prober> {
    prober: Arc<P>,
    workers: usize,
    sink: StatusSink,
    stats: Arc<RunStats>,
}

impl<P: Prober> Scheduler<P> {
    pub fn new(prober: P, workers: usize, sink: StatusSink) -> Self {
        Self {
            prober: Arc::new(prober),
            workers: workers.max(1),
            sink,
            stats: Arc::new(RunStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Probe every proxy and return the results in completion order
    pub async fn run(&self, proxies: &[Proxy], token: &CancellationToken) -> Vec<ProbeResult> {
        info!(
            proxies = proxies.len(),
            workers = self.workers,
            "starting proxy run"
        );

        let results = stream::iter(proxies.iter().cloned().enumerate())
            .map(|(index, proxy)| {
                let prober = Arc::clone(&self.prober);
                let stats = Arc::clone(&self.stats);
                let sink = self.sink.clone();
                let token = token.clone();
                async move {
                    if token.is_cancelled() {
                        debug!(index, proxy = %proxy, "skipped after cancellation");
                        return ProbeResult::new(index, proxy, ProbeOutcome::Cancelled);
                    }

                    stats.begin();
                    let task_proxy = proxy.clone();
                    let outcome =
                        match tokio::spawn(async move { prober.probe(&task_proxy).await }).await {
                            Ok(outcome) => outcome,
                            Err(e) => ProbeOutcome::NetworkFailure {
                                reason: format!("probe task failed: {}", e),
                                timed_out: false,
                            },
                        };
                    stats.finish();

                    sink.report(&proxy, &outcome);
                    ProbeResult::new(index, proxy, outcome)
                }
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<_>>()
            .await;

        let cancelled = results.iter().filter(|r| r.outcome.is_cancelled()).count();
        info!(
            completed = results.len() - cancelled,
            cancelled,
            "proxy run settled"
        );

        results
    }
}

/// Probe `proxies` with the HTTP prober and return the working subset in input order
pub async fn run(
    proxies: &[Proxy],
    config: CheckerConfig,
    sink: StatusSink,
    token: &CancellationToken,
) -> Vec<Proxy> {
    let workers = config.concurrency;
    let scheduler = Scheduler::new(HttpProber::with_config(config), workers, sink);
    let results = scheduler.run(proxies, token).await;
    ResultAggregator::working(&results)
}
