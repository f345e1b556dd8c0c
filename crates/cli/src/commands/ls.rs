use anyhow::Result;
use clap::Args;
use console::style;

use super::Context;

#[derive(Args)]
pub struct LsArgs {
    /// Prefix to list; for the file backend this is a directory path
    #[arg(default_value = "")]
    prefix: String,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: LsArgs, ctx: &Context) -> Result<()> {
    let storage = ctx.open()?;
    let objects = ctx.bounded(storage.list(&args.prefix)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    if objects.is_empty() {
        println!("No entries found.");
        return Ok(());
    }

    println!("{}", style(format!("{:<12} {}", "SIZE", "KEY")).bold());
    for obj in &objects {
        println!("{:<12} {}", format_bytes(obj.size), obj.key);
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
