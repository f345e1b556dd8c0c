use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::progress;

#[derive(Args)]
pub struct GetManyArgs {
    /// Keys to fetch; any missing key aborts the whole fetch
    #[arg(required = true)]
    keys: Vec<String>,

    /// Target directory for the fetched values
    #[arg(long)]
    target: PathBuf,
}

pub async fn run(args: GetManyArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;

    let spinner = progress::create_spinner(&format!("Fetching {} keys...", args.keys.len()));
    let objects = ctx.bounded(storage.get_multiple(&args.keys)).await?;
    spinner.finish_with_message("done");

    let pb = progress::create_progress(objects.len() as u64, "files");
    for obj in &objects {
        let file_path = args.target.join(obj.key.trim_start_matches('/'));
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, obj.data.as_deref().unwrap_or_default()).await?;
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("Fetched {} keys to {}", objects.len(), args.target.display());
    Ok(())
}
