//! Local disk mirror in front of the remote store.
//!
//! Objects already fetched (or explicitly persisted) live as files under the
//! cache root, at a path mirroring their key. A present mirror file is
//! assumed current; there is no TTL or invalidation. In particular, `write`
//! goes straight through to the remote store and leaves an existing mirror
//! untouched, so a later `read`/`read_to_path` on the same key can return
//! pre-write bytes. Callers that need read-your-write refresh the mirror
//! themselves (see the janken ledger).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

use super::{ObjectStore, StorageError};

/// Disk mirror of a subset of remote keys
pub struct ObjectCache {
    store: Arc<dyn ObjectStore>,
    root: PathBuf,
}

impl ObjectCache {
    /// Create a cache rooted at `root` in front of `store`.
    pub fn new(store: Arc<dyn ObjectStore>, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    /// Deterministic mirror path for a key.
    #[must_use]
    pub fn local_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn is_mirrored(&self, key: &str) -> bool {
        self.local_path(key).exists()
    }

    async fn persist(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.local_path(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        fs::write(&path, data).await?;
        debug!(key, path = %path.display(), "mirrored object to disk");
        Ok(())
    }

    /// Check object existence. A mirror file is a fast positive; on a local
    /// miss the remote store is authoritative.
    ///
    /// # Errors
    ///
    /// Propagates remote failures other than absence.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        if self.is_mirrored(key) {
            return Ok(true);
        }
        self.store.exists(key).await
    }

    /// Cache-first read. On a local miss the object is fetched in full;
    /// `cache` controls whether the fetched bytes are also mirrored.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::NotFound`] when the object exists nowhere.
    pub async fn read(&self, key: &str, cache: bool) -> Result<Vec<u8>, StorageError> {
        if self.is_mirrored(key) {
            return Ok(fs::read(self.local_path(key)).await?);
        }
        let data = self.store.get(key).await?;
        if cache {
            self.persist(key, &data).await?;
        }
        Ok(data)
    }

    /// Like [`read`](Self::read), but guarantees a mirror file exists and
    /// returns its path, for consumers that need a filesystem handle.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::NotFound`] when the object exists nowhere.
    pub async fn read_to_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !self.is_mirrored(key) {
            let data = self.store.get(key).await?;
            self.persist(key, &data).await?;
        }
        Ok(self.local_path(key))
    }

    /// Write through to the remote store. An existing mirror is not updated.
    ///
    /// # Errors
    ///
    /// Propagates remote put failures.
    pub async fn write(&self, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.store.put(key, data).await
    }

    /// Read the given local file fully and write it through to the store.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or the remote put fails.
    pub async fn write_from_path(&self, key: &str, path: &Path) -> Result<(), StorageError> {
        let data = fs::read(path).await?;
        self.write(key, data).await
    }

    /// Deterministic public URL for a key (delegates to the store).
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        self.store.url_for(key)
    }
}
