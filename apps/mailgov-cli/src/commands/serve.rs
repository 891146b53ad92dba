//! `mailgov serve` - host the sync scheduler until interrupted.

use std::sync::Arc;

use clap::Args;

use mailgov_core::settings::parse_sync_interval_hours;
use mailgov_core::{SettingsStore, SETTING_SYNC_INTERVAL_HOURS};
use mailgov_sync::Scheduler;

use crate::context::AppContext;

#[derive(Args)]
pub struct ServeArgs {
    /// Trigger one reconciliation immediately on startup
    #[arg(long)]
    pub sync_now: bool,
}

pub async fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let ctx = AppContext::init().await?;

    let scheduler = Scheduler::new(Arc::new(ctx.sync_engine()));
    let raw = ctx
        .settings
        .get(SETTING_SYNC_INTERVAL_HOURS, "0")
        .await?;
    let hours = parse_sync_interval_hours(&raw);
    scheduler.apply(hours).await;

    if hours == 0 {
        println!("Scheduler running; automatic sync is disabled (set with `mailgov schedule <hours>`).");
    } else {
        println!("Scheduler running; automatic sync every {hours} hour(s).");
        if let Some(next) = scheduler.next_run_time().await {
            println!("Next run at {next}.");
        }
    }

    if args.sync_now {
        scheduler.trigger_now();
    }

    tokio::signal::ctrl_c().await?;
    println!("Shutting down.");
    scheduler.shutdown().await;
    Ok(())
}
