use thiserror::Error;

/// Errors surfaced by storage handles and by configuration validation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unsafe configuration: {0}")]
    UnsafeConfiguration(String),

    #[error("unsupported backend: {0:?}")]
    UnsupportedBackend(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("S3 {op} failed: {key}: {source}")]
    S3 {
        op: &'static str,
        key: String,
        #[source]
        source: s3::error::S3Error,
    },

    #[error("S3 {op} failed: {key}: HTTP {status}")]
    S3Status {
        op: &'static str,
        key: String,
        status: u16,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Classify a filesystem error for `path`, translating the kinds that
    /// have a dedicated variant.
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        let display = path.display().to_string();
        match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(display),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(display),
            _ => StorageError::Io {
                path: display,
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    #[test]
    fn io_kinds_are_translated() {
        let path = Path::new("/data/a.json");

        let err = StorageError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(err.is_not_found());

        let err = StorageError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, StorageError::PermissionDenied(p) if p == "/data/a.json"));

        let err = StorageError::from_io(path, io::Error::other("disk on fire"));
        match err {
            StorageError::Io { path, source } => {
                assert_eq!(path, "/data/a.json");
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
