//! `mailgov purge` - process due purge-queue entries.

use clap::Args;

use mailgov_lifecycle::PurgeProcessor;

use crate::context::AppContext;

#[derive(Args)]
pub struct PurgeArgs {
    /// Preview without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: PurgeArgs) -> anyhow::Result<()> {
    let ctx = AppContext::init().await?;
    let service = ctx.lifecycle();

    if args.dry_run {
        println!("Processing purge queue (dry run)...");
    } else {
        println!("Processing purge queue...");
    }

    let results = PurgeProcessor::new(&service).process(args.dry_run).await?;

    println!();
    println!("Purge complete:");
    println!("  Processed: {}", results.processed);
    println!("  Purged:    {}", results.purged);
    println!("  Skipped:   {}", results.skipped);
    println!("  Errors:    {}", results.errors);

    if !results.details.is_empty() {
        println!();
        println!("Details:");
        for detail in &results.details {
            match &detail.reason {
                Some(reason) => println!("  - {}: {} ({reason})", detail.email, detail.action),
                None => println!("  - {}: {}", detail.email, detail.action),
            }
        }
    }

    Ok(())
}
