//! Turning a finished run into the working list and counts

use crate::proxy::models::{ProbeOutcome, ProbeResult, Proxy};
use serde::Serialize;

/// Aggregate counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    /// Probes that actually ran (everything except cancelled)
    pub tested: usize,
    pub working: usize,
    pub failed: usize,
    pub proxy_failures: usize,
    pub network_failures: usize,
    /// Subset of `network_failures`
    pub timeouts: usize,
    pub cancelled: usize,
}

impl RunSummary {
    pub fn was_interrupted(&self) -> bool {
        self.cancelled > 0
    }
}

/// Full run report, results in input order
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub summary: RunSummary,
    pub results: Vec<&'a ProbeResult>,
}

/// Pure functions over a completed set of probe results
pub struct ResultAggregator;

impl ResultAggregator {
    /// Results sorted back into input order
    pub fn ordered(results: &[ProbeResult]) -> Vec<&ProbeResult> {
        let mut ordered: Vec<&ProbeResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.index);
        ordered
    }

    /// Working proxies in input order
    pub fn working(results: &[ProbeResult]) -> Vec<Proxy> {
        Self::select(results, ProbeOutcome::is_working)
    }

    /// Proxies whose probe ran and failed, in input order
    pub fn failed(results: &[ProbeResult]) -> Vec<Proxy> {
        Self::select(results, ProbeOutcome::is_failure)
    }

    pub fn summarize(results: &[ProbeResult]) -> RunSummary {
        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match &result.outcome {
                ProbeOutcome::Working { .. } => summary.working += 1,
                ProbeOutcome::ProxyFailure { .. } => summary.proxy_failures += 1,
                ProbeOutcome::NetworkFailure { timed_out, .. } => {
                    summary.network_failures += 1;
                    if *timed_out {
                        summary.timeouts += 1;
                    }
                }
                ProbeOutcome::Cancelled => summary.cancelled += 1,
            }
        }

        summary.failed = summary.proxy_failures + summary.network_failures;
        summary.tested = summary.total - summary.cancelled;
        summary
    }

    pub fn report(results: &[ProbeResult]) -> RunReport<'_> {
        RunReport {
            summary: Self::summarize(results),
            results: Self::ordered(results),
        }
    }

    fn select(results: &[ProbeResult], keep: fn(&ProbeOutcome) -> bool) -> Vec<Proxy> {
        Self::ordered(results)
            .into_iter()
            .filter(|r| keep(&r.outcome))
            .map(|r| r.proxy.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn working(ms: f64) -> ProbeOutcome {
        ProbeOutcome::Working {
            latency_ms: ms,
            detail: None,
        }
    }

    /// Results as they might arrive, out of input order
    fn shuffled_results() -> Vec<ProbeResult> {
        vec![
            ProbeResult::new(3, Proxy::new("d", "4"), working(5.0)),
            ProbeResult::new(
                1,
                Proxy::new("b", "2"),
                ProbeOutcome::NetworkFailure {
                    reason: "timed out".to_string(),
                    timed_out: true,
                },
            ),
            ProbeResult::new(0, Proxy::with_auth("a", "1", "u", "p"), working(40.0)),
            ProbeResult::new(5, Proxy::new("f", "6"), ProbeOutcome::Cancelled),
            ProbeResult::new(
                2,
                Proxy::new("c", "3"),
                ProbeOutcome::ProxyFailure {
                    reason: "refused".to_string(),
                },
            ),
            ProbeResult::new(4, Proxy::new("e", "5"), working(1.0)),
        ]
    }

    #[test]
    fn test_working_in_input_order() {
        let working = ResultAggregator::working(&shuffled_results());
        let hosts: Vec<&str> = working.iter().map(|p| p.host.as_str()).collect();
        assert_eq!(hosts, vec!["a", "d", "e"]);
        assert!(working[0].auth.is_some());
    }

    #[test]
    fn test_failed_excludes_cancelled() {
        let failed = ResultAggregator::failed(&shuffled_results());
        let hosts: Vec<&str> = failed.iter().map(|p| p.host.as_str()).collect();
        assert_eq!(hosts, vec!["b", "c"]);
    }

    #[test]
    fn test_summary_counts() {
        let summary = ResultAggregator::summarize(&shuffled_results());
        assert_eq!(
            summary,
            RunSummary {
                total: 6,
                tested: 5,
                working: 3,
                failed: 2,
                proxy_failures: 1,
                network_failures: 1,
                timeouts: 1,
                cancelled: 1,
            }
        );
        assert!(summary.was_interrupted());
    }

    #[test]
    fn test_report_is_ordered_and_serializable() {
        let results = shuffled_results();
        let report = ResultAggregator::report(&results);
        let indices: Vec<usize> = report.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["working"], 3);
        assert_eq!(json["results"][5]["outcome"]["kind"], "cancelled");
        assert_eq!(json["results"][1]["outcome"]["timed_out"], true);
    }

    #[test]
    fn test_empty_results() {
        assert!(ResultAggregator::working(&[]).is_empty());
        assert_eq!(ResultAggregator::summarize(&[]), RunSummary::default());
    }
}
