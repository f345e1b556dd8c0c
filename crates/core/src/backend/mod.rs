pub mod local;
pub mod s3;

use async_trait::async_trait;

use crate::error::{Result, StorageError};
use crate::object::Object;

/// Key/value storage contract shared by every backend.
///
/// Each call is a single attempt against the underlying medium. Dropping the
/// returned future cancels the in-flight I/O at its next await point, so
/// callers bound calls with `tokio::time::timeout` or `tokio::select!`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key`.
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Read the full payload stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Read every key in order. The first failure aborts the whole call and
    /// no partial results are returned.
    async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Object>> {
        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let data = self.get(key).await?;
            objects.push(Object::with_data(key.as_str(), data));
        }
        Ok(objects)
    }

    /// Whether `key` is present. A missing key is `Ok(false)`, never an error.
    async fn exists(&self, key: &str) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Entries under `prefix`, sorted by key. Never carries payloads.
    async fn list(&self, prefix: &str) -> Result<Vec<Object>>;

    /// Remove everything under the storage root. Irreversible.
    async fn purge(&self) -> Result<()>;
}

/// Normalize a slash-delimited key: empty and `.` segments are dropped and
/// `..` pops the previous segment. Returns `None` when the key climbs above
/// its root.
pub(crate) fn clean_key(key: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// Like [`clean_key`], but also rejects keys that normalize to nothing.
pub(crate) fn object_key(key: &str) -> Result<String> {
    match clean_key(key) {
        Some(cleaned) if !cleaned.is_empty() => Ok(cleaned),
        _ => Err(StorageError::InvalidKey(key.to_string())),
    }
}

/// Join two slash-delimited paths, normalizing the result.
pub(crate) fn join_key(prefix: &str, key: &str) -> Result<String> {
    let prefix = clean_key(prefix).ok_or_else(|| StorageError::InvalidKey(prefix.to_string()))?;
    let key = clean_key(key).ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
    Ok(match (prefix.is_empty(), key.is_empty()) {
        (true, _) => key,
        (false, true) => prefix,
        (false, false) => format!("{prefix}/{key}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_key_normalizes_segments() {
        assert_eq!(clean_key("a/b.json").as_deref(), Some("a/b.json"));
        assert_eq!(clean_key("/a//./b/").as_deref(), Some("a/b"));
        assert_eq!(clean_key("a/../b").as_deref(), Some("b"));
        assert_eq!(clean_key("").as_deref(), Some(""));
        assert_eq!(clean_key("../etc/passwd"), None);
        assert_eq!(clean_key("a/../../b"), None);
    }

    #[test]
    fn object_key_rejects_empty_and_escaping_keys() {
        assert_eq!(object_key("/x/y").unwrap(), "x/y");
        assert!(matches!(object_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(object_key("./"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(object_key(".."), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn join_key_handles_empty_sides() {
        assert_eq!(join_key("/tests/s3-storage", "a.json").unwrap(), "tests/s3-storage/a.json");
        assert_eq!(join_key("", "a.json").unwrap(), "a.json");
        assert_eq!(join_key("backups/", "").unwrap(), "backups");
        assert_eq!(join_key("", "").unwrap(), "");
        assert!(join_key("p", "../../x").is_err());
    }
}
