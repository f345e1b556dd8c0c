use anyhow::Result;
use clap::Args;

use super::Context;

#[derive(Args)]
pub struct ExistsArgs {
    /// Key to check
    key: String,
}

/// Prints `true`/`false`; exits non-zero only when the check itself fails.
pub async fn run(args: ExistsArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;
    let exists = ctx.bounded(storage.exists(&args.key)).await?;
    println!("{exists}");
    Ok(())
}
