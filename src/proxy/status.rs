//! Serialized sink for per-probe status lines

use crate::proxy::models::{ProbeOutcome, Proxy};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Shared writer for status lines.
///
/// Each line is formatted up front and written with a single `write_all`
/// while the lock is held, so lines from concurrent probes never interleave.
#[derive(Clone)]
pub struct StatusSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    color: bool,
}

impl StatusSink {
    pub fn new<W: Write + Send + 'static>(writer: W, color: bool) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            color,
        }
    }

    /// Sink on stdout
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }

    /// Sink that drops everything
    pub fn discard() -> Self {
        Self::new(io::sink(), false)
    }

    /// Report one finished probe. Cancelled probes produce no line.
    pub fn report(&self, proxy: &Proxy, outcome: &ProbeOutcome) {
        if let Some(line) = self.format_line(proxy, outcome) {
            self.write_line(&line);
        }
    }

    /// Write a free-form notice, also as a single atomic line
    pub fn notice(&self, message: &str) {
        let line = if self.color {
            format!("{}\n", message.to_string().yellow())
        } else {
            format!("{}\n", message)
        };
        self.write_line(&line);
    }

    fn format_line(&self, proxy: &Proxy, outcome: &ProbeOutcome) -> Option<String> {
        let endpoint = proxy.endpoint();
        match outcome {
            ProbeOutcome::Working { latency_ms, detail } => {
                let detail = detail
                    .as_ref()
                    .map(|d| format!(" ({})", d))
                    .unwrap_or_default();
                let head = format!("WORKING {}ms{}", latency_ms, detail);
                let head = if self.color {
                    head.green().to_string()
                } else {
                    head
                };
                Some(format!("{} - {}\n", head, endpoint))
            }
            ProbeOutcome::ProxyFailure { .. } | ProbeOutcome::NetworkFailure { .. } => {
                let head = if self.color {
                    outcome.label().to_string().red().to_string()
                } else {
                    outcome.label().to_string()
                };
                Some(format!("{} - {}\n", head, endpoint))
            }
            ProbeOutcome::Cancelled => None,
        }
    }

    fn write_line(&self, line: &str) {
        // A poisoned lock only means another writer panicked mid-line; keep going.
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            warn!("failed to write status line: {}", e);
        }
    }
}
