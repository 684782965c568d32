//! Fatal error types for a generation run.
//!
//! Everything here stops the run. Recoverable problems (missing
//! distribution names, duplicate sources, unparseable index rows, exhausted
//! release-history retries) are reported through a
//! [`Reporter`](crate::report::Reporter) instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no advisory sources to process")]
    NoSources,

    #[error("cannot read advisory source {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid advisory source {path}: {source}")]
    ParseSource {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("package index download failed: {0}")]
    IndexDownload(#[from] reqwest::Error),

    #[error("package index I/O error: {0}")]
    Index(#[from] std::io::Error),

    #[error("cannot write output to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
