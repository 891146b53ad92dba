//! `mailgov schedule` - show or set the automatic sync interval.

use clap::Args;

use mailgov_core::settings::parse_sync_interval_hours;
use mailgov_core::{SettingsStore, SETTING_SYNC_INTERVAL_HOURS};

use crate::context::AppContext;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Interval in whole hours; 0 disables the scheduled sync. Omit to show
    /// the current setting.
    pub hours: Option<u32>,
}

pub async fn execute(args: ScheduleArgs) -> anyhow::Result<()> {
    let ctx = AppContext::init().await?;

    match args.hours {
        Some(hours) => {
            ctx.settings
                .set(SETTING_SYNC_INTERVAL_HOURS, &hours.to_string())
                .await?;
            if hours == 0 {
                println!("Automatic sync disabled.");
            } else {
                println!("Automatic sync set to every {hours} hour(s).");
            }
            println!("A running `mailgov serve` picks this up on restart.");
        }
        None => {
            let raw = ctx
                .settings
                .get(SETTING_SYNC_INTERVAL_HOURS, "0")
                .await?;
            match parse_sync_interval_hours(&raw) {
                0 => println!("Automatic sync is disabled."),
                hours => println!("Automatic sync runs every {hours} hour(s)."),
            }
        }
    }

    Ok(())
}
