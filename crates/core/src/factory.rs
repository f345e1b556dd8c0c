use std::sync::Arc;

use tracing::info;

use crate::backend::Storage;
use crate::backend::local::LocalStorage;
use crate::backend::s3::S3Storage;
use crate::config::{BackendConfig, StorageConfig, StorageOptions};
use crate::error::Result;
use crate::trace::TracedStorage;

/// Build the backend described by `config`, wrapped in a [`TracedStorage`]
/// when a tracer is configured. Either a complete handle or an error.
pub fn open(config: StorageConfig) -> Result<Arc<dyn Storage>> {
    let StorageConfig { backend, tracer } = config;

    let storage: Box<dyn Storage> = match backend {
        BackendConfig::File { root } => {
            info!(root = %root.display(), "Opening local storage");
            Box::new(LocalStorage::new(root))
        }
        BackendConfig::S3(opts) => {
            info!(bucket = %opts.bucket, prefix = %opts.path_prefix, "Opening S3 storage");
            Box::new(S3Storage::new(&opts)?)
        }
    };

    Ok(match tracer {
        Some(tracer) => Arc::new(TracedStorage::new(storage, Some(tracer))),
        None => Arc::from(storage),
    })
}

/// Apply `options`, validate them and open the storage.
pub fn new_storage(options: StorageOptions) -> Result<Arc<dyn Storage>> {
    open(options.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::s3::S3Options;
    use crate::config::BackendKind;
    use crate::error::StorageError;
    use crate::trace::SubscriberTracer;

    #[tokio::test]
    async fn opens_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("root");
        let storage = new_storage(
            StorageOptions::new()
                .backend(BackendKind::File)
                .prefix(root.to_str().unwrap()),
        )
        .unwrap();

        storage.put("a/b.json", br#"{"x":1}"#).await.unwrap();
        assert_eq!(storage.get("a/b.json").await.unwrap(), br#"{"x":1}"#);
        assert!(storage.exists("a/b.json").await.unwrap());
        storage.delete("a/b.json").await.unwrap();
        assert!(storage.get("a/b.json").await.unwrap_err().is_not_found());
        assert!(!storage.exists("a/b.json").await.unwrap());
    }

    #[tokio::test]
    async fn traced_handle_keeps_contract() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("traced");
        let storage = StorageOptions::new()
            .backend(BackendKind::File)
            .prefix(root.to_str().unwrap())
            .tracer(Arc::new(SubscriberTracer))
            .build()
            .unwrap();

        storage.put("k", b"first").await.unwrap();
        storage.put("k", b"second").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), b"first");
        storage.purge().await.unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn invalid_options_yield_no_handle() {
        assert!(matches!(
            new_storage(StorageOptions::new()),
            Err(StorageError::UnsupportedBackend(_))
        ));
        assert!(matches!(
            new_storage(StorageOptions::new().backend(BackendKind::S3)),
            Err(StorageError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            new_storage(
                StorageOptions::new()
                    .backend(BackendKind::File)
                    .prefix("/tmp")
            ),
            Err(StorageError::UnsafeConfiguration(_))
        ));
    }

    #[test]
    fn opens_s3_storage_without_network() {
        let storage = new_storage(StorageOptions::new().backend(BackendKind::S3).s3(S3Options {
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            key: "access".into(),
            secret: "secret".into(),
            bucket: "bucket".into(),
            path_prefix: "tests".into(),
        }));
        assert!(storage.is_ok());
    }
}
