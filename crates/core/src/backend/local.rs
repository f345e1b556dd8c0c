use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{Storage, object_key};
use crate::error::{Result, StorageError};
use crate::object::Object;

/// Storage rooted at a directory on the local filesystem.
///
/// Keys are joined onto the root. `put` never overwrites: the first complete
/// write to a key wins and later writes succeed without touching the file.
/// A write that fails or is cancelled leaves the key absent.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// The root is created lazily by the first `put`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(object_key(key)?))
    }
}

const STAGED_SUFFIX: &str = ".stowage-tmp";

static STAGED_SEQ: AtomicU64 = AtomicU64::new(0);

fn is_staged_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGED_SUFFIX)
}

/// Scratch file a `put` writes into before publishing. Removed on drop, which
/// covers success, failure and a cancelled future alike.
struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    fn new(parent: &Path, target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = STAGED_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = parent.join(format!(
            ".{name}.{}.{seq}{STAGED_SUFFIX}",
            std::process::id()
        ));
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(key)?;
        let Some(parent) = full.parent() else {
            return Err(StorageError::InvalidKey(key.to_string()));
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::from_io(parent, e))?;

        if tokio::fs::try_exists(&full).await.unwrap_or(false) {
            debug!(path = %full.display(), "key already stored, leaving it untouched");
            return Ok(());
        }

        // The value is staged next to its final path and only linked into
        // place once fully written, so the key never names a partial file.
        let staged = StagedFile::new(parent, &full);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staged.path())
            .await
            .map_err(|e| StorageError::from_io(staged.path(), e))?;
        file.write_all(data)
            .await
            .map_err(|e| StorageError::from_io(staged.path(), e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::from_io(staged.path(), e))?;
        drop(file);

        match tokio::fs::hard_link(staged.path(), &full).await {
            Ok(()) => debug!(path = %full.display(), bytes = data.len(), "stored"),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %full.display(), "key stored concurrently, leaving it untouched");
            }
            Err(e) => return Err(StorageError::from_io(&full, e)),
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let full = self.full_path(key)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| StorageError::from_io(&full, e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full = self.full_path(key)?;
        match tokio::fs::metadata(&full).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_io(&full, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full = self.full_path(key)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| StorageError::from_io(&full, e))?;
        debug!(path = %full.display(), "deleted");
        Ok(())
    }

    /// `prefix` names a directory on disk, not a path under the root. Only
    /// its direct entries are returned, keyed by bare file name.
    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        let dir = Path::new(prefix);
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| StorageError::from_io(dir, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(dir, e))?
        {
            let name = entry.file_name();
            match name.to_str() {
                Some(name) if !is_staged_name(name) => entries.push(Object::named(name)),
                Some(_) => {}
                None => debug!(dir = %dir.display(), name = ?name, "skipping non UTF-8 entry"),
            }
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn purge(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::from_io(&self.root, e)),
        }
        info!(root = %self.root.display(), "purged local storage");
        Ok(())
    }
}
