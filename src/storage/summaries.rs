//! Summary records cached on disk, keyed by the MD5 of the logical filename.

use super::{StorageError, atomic, fingerprint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const RECORD_SUFFIX: &str = "_summary.json";

/// Persisted result of summarizing one logical document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Logical filename supplied by the client.
    pub filename: String,
    /// Filename up to its first `.`.
    pub title: String,
    /// Text the summary was produced from.
    pub extracted_text: String,
    /// Model output.
    pub summary: String,
}

impl SummaryRecord {
    /// Build a record, deriving the title from `filename`.
    pub fn new(filename: String, extracted_text: String, summary: String) -> Self {
        Self {
            title: derive_title(&filename),
            filename,
            extracted_text,
            summary,
        }
    }
}

/// Strip every extension segment: `report.v2.pdf` becomes `report`.
pub fn derive_title(filename: &str) -> String {
    filename.split('.').next().unwrap_or_default().to_string()
}

/// Directory of summary records addressed by filename digest.
///
/// Records are immutable once written and trusted without re-validation; concurrent writers for
/// the same key resolve last-writer-wins.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    root: PathBuf,
}

impl SummaryCache {
    /// Open (creating if needed) the cache rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::io(&root, source))?;
        atomic::sweep_temp_files(&root).await?;
        Ok(Self { root })
    }

    /// Directory the cache writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic record path for a logical filename.
    pub fn record_path(&self, filename: &str) -> PathBuf {
        self.root
            .join(format!("{}{RECORD_SUFFIX}", fingerprint::name_digest(filename)))
    }

    /// Return the cached record for `filename`, if one has been written.
    pub async fn lookup(&self, filename: &str) -> Result<Option<SummaryRecord>, StorageError> {
        let path = self.record_path(filename);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::io(path, source)),
        };
        let record = serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Record { path, source })?;
        Ok(Some(record))
    }

    /// Persist `record` under its filename key, replacing any previous record atomically.
    pub async fn put(&self, record: &SummaryRecord) -> Result<PathBuf, StorageError> {
        let path = self.record_path(&record.filename);
        let bytes = encode_record(record).map_err(|source| StorageError::Record {
            path: path.clone(),
            source,
        })?;
        atomic::write_atomic(&self.root, &path, &bytes).await?;
        tracing::debug!(
            filename = %record.filename,
            path = %path.display(),
            "Cached summary record"
        );
        Ok(path)
    }
}

/// Four-space indented JSON with non-ASCII text kept verbatim.
fn encode_record(record: &SummaryRecord) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    record.serialize(&mut serializer)?;
    Ok(bytes)
}
