//! `mailgov sync` - run one reconciliation pass.

use clap::Args;

use crate::context::AppContext;

#[derive(Args)]
pub struct SyncArgs {
    /// Preview changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Sync only this mail domain
    #[arg(long, default_value = "")]
    pub domain: String,
}

pub async fn execute(args: SyncArgs) -> anyhow::Result<()> {
    let ctx = AppContext::init().await?;
    let engine = ctx.sync_engine();

    if args.dry_run {
        println!("Starting sync (dry run)...");
    } else {
        println!("Starting sync...");
    }
    if !args.domain.is_empty() {
        println!("Filtering domain: {}", args.domain);
    }

    let summary = engine.run(&args.domain, args.dry_run).await?;

    println!();
    println!("Sync complete:");
    println!("  Total:     {}", summary.total);
    println!("  Created:   {}", summary.created);
    println!("  Updated:   {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Errors:    {}", summary.errors);

    if !summary.error_details.is_empty() {
        println!();
        println!("Errors:");
        for detail in summary.error_details.iter().take(20) {
            println!("  - {}: {}", detail.account, detail.error);
        }
    }

    Ok(())
}
