//! Error taxonomy for the extractor (§4.1 Failures, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Syntactic parse failure, reported with the offending source line.
    #[error("parse error in {path} near line {line}: {detail}")]
    ParseError {
        path: String,
        line: u32,
        detail: String,
    },
}
