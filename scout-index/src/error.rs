//! Error taxonomy for the symbol index (§4.8, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error opening index at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
