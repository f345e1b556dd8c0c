pub mod backend;
pub mod config;
pub mod error;
pub mod factory;
pub mod object;
pub mod trace;

pub use backend::Storage;
pub use backend::local::LocalStorage;
pub use backend::s3::{S3Options, S3Storage};
pub use config::{BackendKind, StorageConfig, StorageOptions, StorageSettings};
pub use error::{Result, StorageError};
pub use factory::{new_storage, open};
pub use object::Object;
pub use trace::{Operation, StorageExt, SubscriberTracer, TracedStorage, Tracer};
