mod commands;
mod config;
mod progress;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, Context};
use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "stowage",
    version,
    about = "Key/value storage over a local directory or an S3 bucket"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a tracing span around every storage call
    #[arg(long, global = true)]
    trace: bool,

    /// Abort a storage call after this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context {
        config_path: cli.config.unwrap_or_else(AppConfig::default_path),
        trace: cli.trace,
        timeout: cli.timeout.map(Duration::from_secs),
    };

    match cli.command {
        Command::Init(args) => commands::init::run(args, &ctx).await,
        Command::Put(args) => commands::put::run(args, &ctx).await,
        Command::Get(args) => commands::get::run(args, &ctx).await,
        Command::GetMany(args) => commands::get_many::run(args, &ctx).await,
        Command::Exists(args) => commands::exists::run(args, &ctx).await,
        Command::Rm(args) => commands::rm::run(args, &ctx).await,
        Command::Ls(args) => commands::ls::run(args, &ctx).await,
        Command::Purge(args) => commands::purge::run(args, &ctx).await,
    }
}
