//! Filesystem persistence: content-addressed documents and filename-keyed summary records.
//!
//! Both stores share one discipline: bytes are written to a temporary sibling file and moved
//! into place with a rename, so readers never observe a partially written canonical file.

mod atomic;
pub mod content;
pub mod fingerprint;
pub mod summaries;

pub use content::{ContentStore, DOCUMENT_EXTENSION, StoredDocument};
pub use summaries::{SummaryCache, SummaryRecord, derive_title};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the document store and the summary cache.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O failure on {path}: {source}")]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// A persisted summary record could not be encoded or decoded.
    #[error("Malformed summary record {path}: {source}")]
    Record {
        /// Record file that failed to round-trip.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
