use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tokio::io::AsyncWriteExt;

use super::Context;

#[derive(Args)]
pub struct GetArgs {
    /// Key to read
    key: String,

    /// Write the value here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;
    let data = ctx.bounded(storage.get(&args.key)).await?;

    match args.output {
        Some(path) => tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
