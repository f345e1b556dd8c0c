pub mod exists;
pub mod get;
pub mod get_many;
pub mod init;
pub mod ls;
pub mod purge;
pub mod put;
pub mod rm;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;

use stowage_core::Storage;

use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum Command {
    /// Write a config file for a storage backend
    Init(init::InitArgs),
    /// Store a file under a key
    Put(put::PutArgs),
    /// Read the value stored under a key
    Get(get::GetArgs),
    /// Fetch several keys into a directory
    GetMany(get_many::GetManyArgs),
    /// Check whether a key exists
    Exists(exists::ExistsArgs),
    /// Delete a key
    Rm(rm::RmArgs),
    /// List entries under a prefix
    Ls(ls::LsArgs),
    /// Remove everything under the storage root
    Purge(purge::PurgeArgs),
}

/// Global flags shared by every command.
pub struct Context {
    pub config_path: PathBuf,
    pub trace: bool,
    pub timeout: Option<Duration>,
}

impl Context {
    pub fn open(&self) -> Result<Arc<dyn Storage>> {
        AppConfig::load(&self.config_path)?.open_storage(self.trace)
    }

    /// Await a storage call, giving up once the configured timeout elapses.
    /// Dropping the call cancels the underlying request.
    pub async fn bounded<T>(
        &self,
        fut: impl Future<Output = stowage_core::Result<T>>,
    ) -> Result<T> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => Ok(result?),
                Err(_) => anyhow::bail!("operation timed out after {}s", limit.as_secs_f64()),
            },
            None => Ok(fut.await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(timeout: Option<Duration>) -> Context {
        Context {
            config_path: PathBuf::from("unused.toml"),
            trace: false,
            timeout,
        }
    }

    #[tokio::test]
    async fn bounded_times_out_slow_calls() {
        let ctx = context(Some(Duration::from_millis(10)));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, stowage_core::StorageError>(())
        };
        let err = ctx.bounded(slow).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn bounded_passes_errors_through() {
        let ctx = context(None);
        let failing = async { Err::<(), _>(stowage_core::StorageError::NotFound("k".into())) };
        let err = ctx.bounded(failing).await.unwrap_err();
        assert!(
            err.downcast_ref::<stowage_core::StorageError>()
                .is_some_and(|e| e.is_not_found())
        );
    }
}
