use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use stowage_core::{Storage, StorageSettings, SubscriberTracer};

const CONFIG_FILE: &str = "stowage.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageSettings,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stowage")
            .join(CONFIG_FILE)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        toml::from_str(&content).context("failed to parse config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn open_storage(&self, trace: bool) -> Result<Arc<dyn Storage>> {
        let mut options = self.storage.clone().into_options();
        if trace {
            options = options.tracer(Arc::new(SubscriberTracer));
        }
        options.build().context("failed to open storage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::S3Options;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = AppConfig {
            storage: StorageSettings {
                backend: "s3".into(),
                prefix: String::new(),
                s3: Some(S3Options {
                    endpoint: "http://localhost:9000".into(),
                    region: "us-east-1".into(),
                    key: "access".into(),
                    secret: "secret".into(),
                    bucket: "bucket".into(),
                    path_prefix: "prod".into(),
                }),
            },
        };

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.storage, config.storage);
        assert!(loaded.open_storage(true).is_ok());
    }

    #[test]
    fn shallow_local_root_is_refused() {
        let config = AppConfig {
            storage: StorageSettings {
                backend: "file".into(),
                prefix: "/srv".into(),
                s3: None,
            },
        };
        let err = config.open_storage(false).err().unwrap();
        assert!(format!("{err:#}").contains("unsafe configuration"));
    }
}
