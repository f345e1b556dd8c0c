use anyhow::Result;
use clap::Args;
use tracing::info;

use stowage_core::backend::s3::DIGITAL_OCEAN_REGION;
use stowage_core::{BackendKind, S3Options, StorageSettings};

use super::Context;
use crate::config::AppConfig;

#[derive(Args)]
pub struct InitArgs {
    /// Backend type: file or s3
    #[arg(long)]
    backend: String,

    /// Root directory for the file backend
    #[arg(long)]
    path: Option<String>,

    /// S3 endpoint URL
    #[arg(long, default_value = "")]
    endpoint: String,

    /// S3 bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// S3 region
    #[arg(long, default_value = DIGITAL_OCEAN_REGION)]
    region: String,

    /// S3 access key
    #[arg(long)]
    access_key: Option<String>,

    /// S3 secret key
    #[arg(long)]
    secret_key: Option<String>,

    /// S3 path prefix
    #[arg(long, default_value = "")]
    prefix: String,
}

pub async fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let storage = match args.backend.parse::<BackendKind>()? {
        BackendKind::File => StorageSettings {
            backend: BackendKind::File.to_string(),
            prefix: args.path.unwrap_or_default(),
            s3: None,
        },
        BackendKind::S3 => {
            let bucket = args
                .bucket
                .ok_or_else(|| anyhow::anyhow!("--bucket required for S3 backend"))?;
            let access_key = args
                .access_key
                .ok_or_else(|| anyhow::anyhow!("--access-key required for S3 backend"))?;
            let secret_key = args
                .secret_key
                .ok_or_else(|| anyhow::anyhow!("--secret-key required for S3 backend"))?;
            StorageSettings {
                backend: BackendKind::S3.to_string(),
                prefix: String::new(),
                s3: Some(S3Options {
                    endpoint: args.endpoint,
                    region: args.region,
                    key: access_key,
                    secret: secret_key,
                    bucket,
                    path_prefix: args.prefix,
                }),
            }
        }
    };

    // Refuse to save settings that could never open.
    storage.clone().into_options().validate()?;

    let config = AppConfig { storage };
    config.save(&ctx.config_path)?;

    info!(config_path = %ctx.config_path.display(), "Config saved");
    println!("Config: {}", ctx.config_path.display());
    Ok(())
}
