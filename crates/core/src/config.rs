use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::s3::S3Options;
use crate::error::{Result, StorageError};
use crate::trace::Tracer;

/// Directory name used under the system temp dir when no prefix is given.
pub const DEFAULT_DIR_NAME: &str = "stowage";

/// Minimum number of path segments a filesystem root must have.
const MIN_ROOT_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    S3,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::S3 => "s3",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "s3" => Ok(BackendKind::S3),
            _ => Err(StorageError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Draft configuration, filled in through chained setters and checked once
/// by [`StorageOptions::validate`].
#[derive(Clone, Default)]
pub struct StorageOptions {
    backend: Option<String>,
    prefix: String,
    tracer: Option<Arc<dyn Tracer>>,
    s3: Option<S3Options>,
}

impl fmt::Debug for StorageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("backend", &self.backend)
            .field("prefix", &self.prefix)
            .field("tracer", &self.tracer.is_some())
            .field("s3", &self.s3.as_ref().map(|o| &o.bucket))
            .finish()
    }
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = Some(kind.as_str().to_string());
        self
    }

    /// Select the backend by name; unknown names fail at validation.
    pub fn backend_name(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }

    /// Root directory for the filesystem backend.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn s3(mut self, opts: S3Options) -> Self {
        self.s3 = Some(opts);
        self
    }

    pub fn validate(self) -> Result<StorageConfig> {
        let name = self.backend.as_deref().unwrap_or_default();
        let kind: BackendKind = name.parse()?;

        let backend = match kind {
            BackendKind::S3 => {
                let opts = self.s3.ok_or_else(|| {
                    StorageError::InvalidConfiguration("no S3 config provided".into())
                })?;
                opts.validate()?;
                BackendConfig::S3(opts)
            }
            BackendKind::File => {
                let root = if self.prefix.is_empty() {
                    default_root()
                } else {
                    PathBuf::from(&self.prefix)
                };
                check_root(&root)?;
                BackendConfig::File { root }
            }
        };

        Ok(StorageConfig {
            backend,
            tracer: self.tracer,
        })
    }

    /// Validate and open in one step.
    pub fn build(self) -> Result<Arc<dyn crate::Storage>> {
        crate::factory::open(self.validate()?)
    }
}

/// `<temp dir>/stowage`, used when the filesystem backend gets no prefix.
pub fn default_root() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DIR_NAME)
}

/// Refuse roots like `/` or `/tmp` that are too shallow to purge safely.
fn check_root(root: &Path) -> Result<()> {
    let segments = root
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    if segments < MIN_ROOT_SEGMENTS {
        return Err(StorageError::UnsafeConfiguration(format!(
            "storage root {} needs at least {MIN_ROOT_SEGMENTS} path segments",
            root.display()
        )));
    }
    Ok(())
}

/// Validated, immutable configuration.
#[derive(Clone)]
pub struct StorageConfig {
    pub(crate) backend: BackendConfig,
    pub(crate) tracer: Option<Arc<dyn Tracer>>,
}

impl StorageConfig {
    pub fn kind(&self) -> BackendKind {
        match self.backend {
            BackendConfig::File { .. } => BackendKind::File,
            BackendConfig::S3(_) => BackendKind::S3,
        }
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn is_traced(&self) -> bool {
        self.tracer.is_some()
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("kind", &self.kind())
            .field("traced", &self.is_traced())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    File { root: PathBuf },
    S3(S3Options),
}

/// On-disk (TOML) form of the configuration.
///
/// ```toml
/// backend = "s3"
///
/// [s3]
/// endpoint = "https://fra1.digitaloceanspaces.com"
/// region = "us-east-1"
/// key = "..."
/// secret = "..."
/// bucket = "assets"
/// path_prefix = "prod/cache"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Options>,
}

impl StorageSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| StorageError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| StorageError::Config(e.to_string()))
    }

    pub fn into_options(self) -> StorageOptions {
        let mut options = StorageOptions::new().prefix(self.prefix);
        if !self.backend.is_empty() {
            options = options.backend_name(self.backend);
        }
        if let Some(s3) = self.s3 {
            options = options.s3(s3);
        }
        options
    }
}
