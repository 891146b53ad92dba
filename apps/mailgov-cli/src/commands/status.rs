//! `mailgov status` - change one account's lifecycle status.

use anyhow::{anyhow, bail};
use clap::Args;

use mailgov_core::AccountStatus;

use crate::context::AppContext;

#[derive(Args)]
pub struct StatusArgs {
    /// Account email address
    pub email: String,

    /// Target status: active, locked, or closed
    pub target: String,

    /// Free-text reason recorded in the audit trail
    #[arg(long, default_value = "")]
    pub reason: String,
}

pub async fn execute(args: StatusArgs) -> anyhow::Result<()> {
    let target: AccountStatus = args
        .target
        .parse()
        .map_err(|e: String| anyhow!("{e}; expected one of: active, locked, closed"))?;

    let ctx = AppContext::init().await?;
    let service = ctx.lifecycle();

    let Some(account) = service.account_by_email(&args.email).await? else {
        bail!("no local account for {}", args.email);
    };

    let outcome = service
        .change_status(&account, target, None, &args.reason)
        .await?;

    println!("{}", outcome.message);
    if !outcome.ok {
        std::process::exit(1);
    }
    Ok(())
}
