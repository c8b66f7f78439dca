//! Content-addressed document storage.
//!
//! Uploaded bytes land at `{digest}.pdf` where `digest` is the MD5 of the payload. Identical
//! uploads collapse onto the same file. Placement is a hard link that fails when the canonical
//! name exists, so exactly one concurrent writer places the file and the rest discard their
//! temporary copy without touching it.

use super::{StorageError, atomic, fingerprint};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File extension given to every stored document.
pub const DOCUMENT_EXTENSION: &str = "pdf";

/// A document persisted under its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Lowercase hex digest of the raw bytes.
    pub digest: String,
    /// Canonical on-disk location.
    pub path: PathBuf,
    /// Whether the canonical file already existed before this call.
    pub deduplicated: bool,
}

impl StoredDocument {
    /// Public identifier handed back to clients, e.g. `5d41402abc4b2a76b9719d911017c592.pdf`.
    pub fn file_name(&self) -> String {
        canonical_file_name(&self.digest)
    }
}

/// Directory of immutable documents deduplicated by content digest.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::io(&root, source))?;
        let swept = atomic::sweep_temp_files(&root).await?;
        if swept > 0 {
            tracing::info!(root = %root.display(), swept, "Removed abandoned upload fragments");
        }
        Ok(Self { root })
    }

    /// Directory the store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for a digest, whether or not it exists yet.
    pub fn canonical_path(&self, digest: &str) -> PathBuf {
        self.root.join(canonical_file_name(digest))
    }

    /// Report whether a document with this digest is already stored.
    pub async fn contains(&self, digest: &str) -> Result<bool, StorageError> {
        let path = self.canonical_path(digest);
        fs::try_exists(&path)
            .await
            .map_err(|source| StorageError::io(path, source))
    }

    /// Persist `bytes`, deduplicating against previously stored content.
    ///
    /// The payload is written to a temporary file first and then linked onto the canonical path.
    /// When that path is already taken the existing document is reused untouched.
    pub async fn store(
        &self,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<StoredDocument, StorageError> {
        let temp_path = atomic::write_temp(&self.root, bytes).await?;
        let digest = fingerprint::content_digest(bytes);
        let path = self.canonical_path(&digest);

        let deduplicated = !atomic::relocate_no_clobber(&temp_path, &path).await?;
        if deduplicated {
            tracing::debug!(digest = %digest, suggested_name, "Document already stored");
        } else {
            tracing::info!(
                digest = %digest,
                suggested_name,
                bytes = bytes.len(),
                "Stored new document"
            );
        }

        Ok(StoredDocument {
            digest,
            path,
            deduplicated,
        })
    }
}

fn canonical_file_name(digest: &str) -> String {
    format!("{digest}.{DOCUMENT_EXTENSION}")
}
