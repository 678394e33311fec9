//! Errors of the sync engine.
//!
//! Only two families stop a run: input that is not a section map at all, and
//! files that cannot be read or written. Everything else a load runs into is
//! a warning in the `LoadReport`.

use glossary_graph::StoreError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
