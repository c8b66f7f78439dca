use super::StorageError;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

const TEMP_PREFIX: &str = ".tmp-";
const TEMP_SUFFIX: &str = ".part";

/// Write `bytes` to a fresh temporary file inside `dir` and flush it to disk.
pub(crate) async fn write_temp(dir: &Path, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let temp_path = dir.join(format!("{TEMP_PREFIX}{}{TEMP_SUFFIX}", uuid::Uuid::new_v4()));
    let result = async {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(source) = result {
        discard(&temp_path).await;
        return Err(StorageError::io(temp_path, source));
    }
    Ok(temp_path)
}

/// Move a temporary file onto its canonical path with a single rename.
pub(crate) async fn relocate(temp_path: &Path, destination: &Path) -> Result<(), StorageError> {
    if let Err(source) = fs::rename(temp_path, destination).await {
        discard(temp_path).await;
        return Err(StorageError::io(destination, source));
    }
    Ok(())
}

/// Link a temporary file onto `destination` unless something already lives there.
///
/// Returns `true` when this call placed the file and `false` when `destination` already existed.
/// The temporary file is removed in every case, so existing content is never overwritten.
pub(crate) async fn relocate_no_clobber(
    temp_path: &Path,
    destination: &Path,
) -> Result<bool, StorageError> {
    let placed = match fs::hard_link(temp_path, destination).await {
        Ok(()) => Ok(true),
        Err(source) if source.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(StorageError::io(destination, source)),
    };
    discard(temp_path).await;
    placed
}

/// Replace `destination` with `bytes` without ever exposing a half-written file.
pub(crate) async fn write_atomic(
    dir: &Path,
    destination: &Path,
    bytes: &[u8],
) -> Result<(), StorageError> {
    let temp_path = write_temp(dir, bytes).await?;
    relocate(&temp_path, destination).await
}

/// Best-effort removal of a temporary file.
pub(crate) async fn discard(temp_path: &Path) {
    if let Err(error) = fs::remove_file(temp_path).await
        && error.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(
            path = %temp_path.display(),
            error = %error,
            "Failed to remove temporary file"
        );
    }
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// Remove temporary files abandoned by an interrupted write. Returns how many were removed.
pub(crate) async fn sweep_temp_files(dir: &Path) -> Result<usize, StorageError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|source| StorageError::io(dir, source))?;
    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| StorageError::io(dir, source))?
    {
        if is_temp_file(&entry.file_name().to_string_lossy()) {
            discard(&entry.path()).await;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_replaces_destination_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let destination = dir.path().join("record.json");

        write_atomic(dir.path(), &destination, b"first").await.expect("first write");
        write_atomic(dir.path(), &destination, b"second").await.expect("second write");

        assert_eq!(fs::read(&destination).await.expect("read"), b"second");
        let mut entries = fs::read_dir(dir.path()).await.expect("read_dir");
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.expect("entry") {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["record.json".to_string()]);
    }

    #[tokio::test]
    async fn no_clobber_relocation_keeps_existing_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let destination = dir.path().join("doc.pdf");

        let first = write_temp(dir.path(), b"original").await.expect("temp");
        assert!(relocate_no_clobber(&first, &destination).await.expect("place"));
        let second = write_temp(dir.path(), b"intruder").await.expect("temp");
        assert!(!relocate_no_clobber(&second, &destination).await.expect("skip"));

        assert_eq!(fs::read(&destination).await.expect("read"), b"original");
        assert!(!fs::try_exists(&first).await.expect("exists"));
        assert!(!fs::try_exists(&second).await.expect("exists"));
    }

    #[tokio::test]
    async fn write_temp_reports_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent");
        let error = write_temp(&missing, b"bytes").await.expect_err("missing dir");
        assert!(matches!(error, StorageError::Io { .. }));
    }

    #[tokio::test]
    async fn sweep_removes_only_abandoned_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_temp(dir.path(), b"orphan").await.expect("temp");
        fs::write(dir.path().join("keep.pdf"), b"doc").await.expect("keep");

        let removed = sweep_temp_files(dir.path()).await.expect("sweep");

        assert_eq!(removed, 1);
        assert!(fs::try_exists(dir.path().join("keep.pdf")).await.expect("exists"));
    }

    #[test]
    fn temp_names_are_recognised() {
        assert!(is_temp_file(".tmp-1234.part"));
        assert!(!is_temp_file("abc.pdf"));
    }
}
