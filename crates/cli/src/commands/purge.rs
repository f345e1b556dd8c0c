use anyhow::Result;
use clap::Args;
use dialoguer::Confirm;
use tracing::info;

use super::Context;

#[derive(Args)]
pub struct PurgeArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    yes: bool,
}

pub async fn run(args: PurgeArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt("Permanently delete everything under the storage root?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    ctx.bounded(storage.purge()).await?;
    info!(config_path = %ctx.config_path.display(), "Storage purged");
    Ok(())
}
