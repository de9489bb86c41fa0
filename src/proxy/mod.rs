//! Proxy module for parsing and checking proxies
//!
//! This module provides functionality for:
//! - Parsing proxy lists (HOST:PORT, HOST:PORT:USER:PASS)
//! - Probing proxies through a bounded worker pool
//! - Stopping a run on interrupt without losing finished results
//! - Collecting the working proxies in input order for export

pub mod aggregate;
pub mod cancel;
pub mod checker;
pub mod models;
pub mod parser;
pub mod scheduler;
pub mod status;

pub use aggregate::{ResultAggregator, RunReport, RunSummary};
pub use cancel::CancellationController;
pub use checker::{CheckerConfig, HttpProber, Prober, DEFAULT_TEST_URL};
pub use models::{ProbeOutcome, ProbeResult, Proxy, ProxyAuth};
pub use parser::{ParsedList, ProxyParser};
pub use scheduler::{run, RunStats, Scheduler};
pub use status::StatusSink;
