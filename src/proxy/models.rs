//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// One entry of a proxy list.
///
/// Credentials live in a single `Option` so a proxy can never carry a
/// username without a password or the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: String,
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            auth: None,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            auth: Some(ProxyAuth::new(username.into(), password.into())),
        }
    }

    /// Endpoint in `user:pass@host:port` or `host:port` form
    pub fn endpoint(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "{}:{}@{}:{}",
                auth.username, auth.password, self.host, self.port
            ),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    /// Proxy URL handed to the HTTP client. HTTP and HTTPS traffic share it.
    pub fn url(&self) -> String {
        format!("http://{}", self.endpoint())
    }

    /// Get the proxy string in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the proxy string with auth in IP:PORT:USER:PASS format
    pub fn to_full_string(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "{}:{}:{}:{}",
                self.host, self.port, auth.username, auth.password
            ),
            None => self.to_simple_string(),
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Any HTTP response came back through the proxy
    Working {
        latency_ms: f64,
        detail: Option<String>,
    },
    /// The proxy refused, reset or could not set up the forward connection
    ProxyFailure { reason: String },
    /// Any other transport failure, timeouts included
    NetworkFailure { reason: String, timed_out: bool },
    /// Stopped before the probe started
    Cancelled,
}

impl ProbeOutcome {
    pub fn is_working(&self) -> bool {
        matches!(self, ProbeOutcome::Working { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::ProxyFailure { .. } | ProbeOutcome::NetworkFailure { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeOutcome::Cancelled)
    }

    /// Label used at the start of a status line
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Working { .. } => "WORKING",
            ProbeOutcome::ProxyFailure { .. } => "PROXY ERROR",
            ProbeOutcome::NetworkFailure { .. } => "NETWORK ERROR",
            ProbeOutcome::Cancelled => "CANCELLED",
        }
    }
}

/// A probe outcome tied back to the input position of its proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub index: usize,
    pub proxy: Proxy,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn new(index: usize, proxy: Proxy, outcome: ProbeOutcome) -> Self {
        Self {
            index,
            proxy,
            outcome,
        }
    }

    pub fn is_working(&self) -> bool {
        self.outcome.is_working()
    }
}

/// Round a latency to two decimal places
pub fn round_latency(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
