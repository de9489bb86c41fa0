//! Interrupt handling for a running check

use crate::proxy::status::StatusSink;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Turns an interrupt into a cancelled token.
///
/// Cancelling only stops probes that have not started yet. The run future
/// passed to [`CancellationController::supervise`] still drives the in-flight
/// ones to completion before it returns.
#[derive(Clone)]
pub struct CancellationController {
    token: CancellationToken,
    notified: Arc<AtomicBool>,
    sink: StatusSink,
}

impl CancellationController {
    pub fn new(sink: StatusSink) -> Self {
        Self {
            token: CancellationToken::new(),
            notified: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    /// Token handed to the scheduler
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop dispatching new probes. Only the first call prints a notice.
    pub fn cancel(&self) {
        if !self.notified.swap(true, Ordering::SeqCst) {
            self.sink
                .notice("Interrupted: skipping untested proxies, waiting for running checks to finish...");
            warn!("cancellation requested, waiting for in-flight probes");
        }
        self.token.cancel();
    }

    /// Cancel on the first Ctrl-C. The listener exits once the token is cancelled.
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => controller.cancel(),
                    Err(e) => warn!("unable to listen for interrupt: {}", e),
                },
                _ = controller.token.cancelled() => {}
            }
        })
    }

    /// Drive `run` to completion with the interrupt listener armed
    pub async fn supervise<F: Future>(&self, run: F) -> F::Output {
        let listener = self.listen_for_ctrl_c();
        let output = run.await;
        listener.abort();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::aggregate::ResultAggregator;
    use crate::proxy::checker::Prober;
    use crate::proxy::models::{ProbeOutcome, Proxy};
    use crate::proxy::scheduler::Scheduler;
    use crate::proxy::status::tests::SharedBuffer;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedDelayProber(Duration);

    #[async_trait]
    impl Prober for FixedDelayProber {
        async fn probe(&self, _proxy: &Proxy) -> ProbeOutcome {
            tokio::time::sleep(self.0).await;
            ProbeOutcome::Working {
                latency_ms: self.0.as_millis() as f64,
                detail: None,
            }
        }
    }

    #[test]
    fn test_cancel_notices_once() {
        let buffer = SharedBuffer::default();
        let controller = CancellationController::new(StatusSink::new(buffer.clone(), false));

        assert!(!controller.is_cancelled());
        controller.cancel();
        controller.cancel();

        assert!(controller.is_cancelled());
        assert!(controller.token().is_cancelled());
        assert_eq!(buffer.contents().lines().count(), 1);
        assert!(buffer.contents().starts_with("Interrupted"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_supervised_run_settles_after_cancel() {
        let proxies: Vec<Proxy> = (0..8).map(|i| Proxy::new(format!("h{}", i), "80")).collect();
        let scheduler = Scheduler::new(
            FixedDelayProber(Duration::from_millis(200)),
            3,
            StatusSink::discard(),
        );
        let stats = scheduler.stats();
        let controller = CancellationController::new(StatusSink::discard());

        let trigger = {
            let controller = controller.clone();
            let stats = Arc::clone(&stats);
            tokio::spawn(async move {
                while stats.started() < 3 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                controller.cancel();
            })
        };

        let token = controller.token();
        let results = controller.supervise(scheduler.run(&proxies, &token)).await;
        trigger.await.unwrap();

        let summary = ResultAggregator::summarize(&results);
        assert_eq!(summary.total, 8);
        assert_eq!(summary.working, 3);
        assert_eq!(summary.cancelled, 5);
        assert_eq!(stats.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_listener_exits_when_cancelled_elsewhere() {
        let controller = CancellationController::new(StatusSink::discard());
        let listener = controller.listen_for_ctrl_c();
        controller.cancel();
        tokio::time::timeout(Duration::from_secs(1), listener)
            .await
            .expect("listener should stop after cancellation")
            .unwrap();
    }
}
