//! Filesystem-backed record store.
//!
//! One file per record at `{root}/{base}_{index}.chunk`, mirroring the flat
//! key scheme records are defined with. Writes go through a temporary file
//! and a rename, so a crash mid-write never leaves a half-record behind a
//! valid key.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use super::{ChunkStore, StoreError};

const RECORD_EXT: &str = "chunk";
const TEMP_EXT: &str = "tmp";

/// File-per-record store rooted at a single directory.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory records are kept under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `(base, index)`.
    ///
    /// Base keys become file name fragments, so anything that would escape
    /// the root directory is rejected outright.
    fn record_path(&self, base: &str, index: u64) -> Result<PathBuf, StoreError> {
        if base.is_empty() {
            return Err(StoreError::InvalidKey {
                key: base.to_owned(),
                reason: "base key is empty",
            });
        }
        if base.chars().any(std::path::is_separator) || base == "." || base == ".." {
            return Err(StoreError::InvalidKey {
                key: base.to_owned(),
                reason: "base key must be a single path component",
            });
        }

        Ok(self.root.join(format!("{base}_{index}.{RECORD_EXT}")))
    }
}

#[async_trait::async_trait]
impl ChunkStore for FsStore {
    async fn put(&self, base: &str, index: u64, record: Bytes) -> Result<(), StoreError> {
        let path = self.record_path(base, index)?;

        // Write-then-rename keeps a concurrent reader from ever observing a
        // partially written record under the final name.
        let tmp = path.with_extension(TEMP_EXT);
        tokio::fs::write(&tmp, &record).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(base, index, size = record.len(), path = %path.display(), "stored record");
        Ok(())
    }

    async fn get(&self, base: &str, index: u64) -> Result<Option<Bytes>, StoreError> {
        let path = self.record_path(base, index)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn delete(&self, base: &str, index: u64) -> Result<bool, StoreError> {
        let path = self.record_path(base, index)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(base, index, "deleted record");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (FsStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let (store, _dir) = make_store();
        let record = Bytes::from_static(b"a record on disk");

        store.put("file.bin", 0, record.clone()).await.unwrap();
        assert_eq!(store.get("file.bin", 0).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let (store, _dir) = make_store();
        assert_eq!(store.get("file.bin", 42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_index() {
        let (store, _dir) = make_store();

        store.put("f", 1, Bytes::from_static(b"old")).await.unwrap();
        store.put("f", 1, Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(
            store.get("f", 1).await.unwrap(),
            Some(Bytes::from_static(b"new"))
        );
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let (store, _dir) = make_store();
        store.put("f", 0, Bytes::from_static(b"x")).await.unwrap();

        assert!(store.delete("f", 0).await.unwrap());
        assert!(!store.delete("f", 0).await.unwrap());
        assert_eq!(store.get("f", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_indices_do_not_collide() {
        let (store, _dir) = make_store();
        store.put("f", 1, Bytes::from_static(b"one")).await.unwrap();
        store.put("f", 11, Bytes::from_static(b"eleven")).await.unwrap();

        assert_eq!(
            store.get("f", 1).await.unwrap(),
            Some(Bytes::from_static(b"one"))
        );
        assert_eq!(
            store.get("f", 11).await.unwrap(),
            Some(Bytes::from_static(b"eleven"))
        );
    }

    #[tokio::test]
    async fn test_record_lands_at_expected_path() {
        let (store, dir) = make_store();
        store.put("data.bin", 3, Bytes::from_static(b"payload")).await.unwrap();

        let expected = dir.path().join("data.bin_3.chunk");
        assert!(expected.exists(), "missing {}", expected.display());
        assert_eq!(std::fs::read(&expected).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_after_put() {
        let (store, dir) = make_store();
        store.put("f", 0, Bytes::from_static(b"x")).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == TEMP_EXT))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_separator_in_base_key_is_rejected() {
        let (store, _dir) = make_store();
        let result = store.get("../escape", 0).await;
        assert!(matches!(result, Err(StoreError::InvalidKey { .. })));
    }

    #[tokio::test]
    async fn test_empty_base_key_is_rejected() {
        let (store, _dir) = make_store();
        let result = store.put("", 0, Bytes::new()).await;
        assert!(matches!(result, Err(StoreError::InvalidKey { .. })));
    }
}
