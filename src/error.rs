//! Typed errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A list line that is neither `host:port` nor `host:port:user:pass`
    #[error("line {line_number}: expected 2 or 4 fields, found {fields} in '{line}'")]
    MalformedLine {
        line_number: usize,
        line: String,
        fields: usize,
    },

    #[error("invalid proxy url '{url}': {source}")]
    InvalidProxyUrl {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
