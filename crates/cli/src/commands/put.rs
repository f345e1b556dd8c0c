use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use super::Context;

#[derive(Args)]
pub struct PutArgs {
    /// Key to store under
    key: String,

    /// File whose contents become the value
    file: PathBuf,
}

pub async fn run(args: PutArgs, ctx: &Context) -> Result<()> {
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let storage = ctx.open()?;
    ctx.bounded(storage.put(&args.key, &data)).await?;
    info!(key = %args.key, bytes = data.len(), "Stored");
    Ok(())
}
