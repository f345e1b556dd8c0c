use anyhow::Result;
use clap::Args;
use tracing::info;

use super::Context;

#[derive(Args)]
pub struct RmArgs {
    /// Key to delete
    key: String,
}

pub async fn run(args: RmArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;
    ctx.bounded(storage.delete(&args.key)).await?;
    info!(key = %args.key, "Deleted");
    Ok(())
}
