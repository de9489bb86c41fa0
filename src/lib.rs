//! Proxy Checker
//!
//! Tests every proxy in a list by sending one request through it, with a
//! bounded number of probes in flight and clean handling of Ctrl-C.

pub mod error;
pub mod proxy;

pub use error::Error;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
