//! Probe: one timed GET through one proxy

use crate::error::Error;
use crate::proxy::models::{round_latency, ProbeOutcome, Proxy};
use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy, Url};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for proxy checks in milliseconds
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 20;

/// Default URL to test proxies against
pub const DEFAULT_TEST_URL: &str = "https://ip.cerbus.nl";

/// Hosts that answer with the caller's IP as a bare text body
const DEFAULT_ECHO_HOSTS: &[&str] = &["ip.cerbus.nl"];

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
    /// Hosts whose response body is reported next to a working proxy
    pub echo_hosts: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            echo_hosts: DEFAULT_ECHO_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of worker slots, never less than one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_url(mut self, url: impl Into<String>) -> Self {
        self.test_url = url.into();
        self
    }

    pub fn with_echo_host(mut self, host: impl Into<String>) -> Self {
        self.echo_hosts.push(host.into());
        self
    }

    /// Whether the test URL points at an IP echo endpoint
    pub fn is_echo_url(&self) -> bool {
        Url::parse(&self.test_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .map(|host| self.echo_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)))
            .unwrap_or(false)
    }
}

/// Something that can test a single proxy.
///
/// Implementations must always return exactly one outcome and never panic on
/// network errors.
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, proxy: &Proxy) -> ProbeOutcome;
}

/// Prober that issues a real GET through the proxy with reqwest
#[derive(Debug, Clone)]
pub struct HttpProber {
    config: CheckerConfig,
    echo: bool,
}

impl HttpProber {
    /// Create a new prober with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new prober with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        let echo = config.is_echo_url();
        Self { config, echo }
    }

    /// Create a reqwest client routing both HTTP and HTTPS through the proxy
    fn create_client(&self, proxy: &Proxy) -> Result<Client, Error> {
        let proxy_url = proxy.url();

        let reqwest_proxy = ReqwestProxy::all(&proxy_url).map_err(|source| Error::InvalidProxyUrl {
            url: proxy_url.clone(),
            source,
        })?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(self.config.timeout)
            .build()
            .map_err(|source| Error::InvalidProxyUrl {
                url: proxy_url,
                source,
            })
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, proxy: &Proxy) -> ProbeOutcome {
        let client = match self.create_client(proxy) {
            Ok(client) => client,
            Err(e) => {
                debug!(proxy = %proxy, error = %e, "proxy rejected before sending");
                return ProbeOutcome::ProxyFailure {
                    reason: e.to_string(),
                };
            }
        };

        let start = Instant::now();
        let response = tokio::time::timeout(
            self.config.timeout,
            client.get(&self.config.test_url).send(),
        )
        .await;
        let elapsed = start.elapsed();

        let outcome = match response {
            Ok(Ok(response)) => {
                let latency_ms = round_latency(elapsed.as_secs_f64() * 1000.0);
                let detail = if self.echo {
                    match response.text().await {
                        Ok(body) => Some(body.trim().to_string()),
                        Err(e) => {
                            debug!(proxy = %proxy, error = %e, "could not read echo body");
                            None
                        }
                    }
                } else {
                    None
                };
                ProbeOutcome::Working { latency_ms, detail }
            }
            Ok(Err(e)) => classify_error(&e),
            Err(_) => ProbeOutcome::NetworkFailure {
                reason: format!("timed out after {}ms", self.config.timeout.as_millis()),
                timed_out: true,
            },
        };

        match &outcome {
            ProbeOutcome::Working { latency_ms, .. } => {
                debug!(proxy = %proxy, latency_ms, "proxy working");
            }
            ProbeOutcome::NetworkFailure { reason, timed_out } => {
                debug!(proxy = %proxy, timed_out, reason = %reason, "network failure");
            }
            ProbeOutcome::ProxyFailure { reason } => {
                debug!(proxy = %proxy, reason = %reason, "proxy failure");
            }
            ProbeOutcome::Cancelled => {}
        }

        outcome
    }
}

/// Map an error from `send()` onto a failure outcome.
///
/// Every request goes through the proxy, so connection and request errors
/// raised before a response arrives are the proxy's fault. DNS failures,
/// timeouts and body or decode errors stay network failures.
pub(crate) fn classify_error(err: &reqwest::Error) -> ProbeOutcome {
    let reason = error_chain(err);

    if err.is_timeout() {
        ProbeOutcome::NetworkFailure {
            reason,
            timed_out: true,
        }
    } else if is_dns_failure(&reason) || err.is_body() || err.is_decode() {
        ProbeOutcome::NetworkFailure {
            reason,
            timed_out: false,
        }
    } else if err.is_connect() || err.is_request() {
        ProbeOutcome::ProxyFailure { reason }
    } else {
        ProbeOutcome::NetworkFailure {
            reason,
            timed_out: false,
        }
    }
}

fn is_dns_failure(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    reason.contains("dns error") || reason.contains("failed to lookup address")
}

/// Render an error and its sources as `outer: inner: ...`, skipping sources
/// whose text the outer messages already carry
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        let text = e.to_string();
        if !chain.contains(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }
        source = e.source();
    }
    chain
}
