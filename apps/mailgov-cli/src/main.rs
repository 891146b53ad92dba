//! mailgov CLI - operator interface for the mail-account lifecycle service
//!
//! Subcommands:
//! - `sync` - run a reconciliation pass against the directory
//! - `purge` - process due purge-queue entries
//! - `status` - change one account's lifecycle status
//! - `schedule` - show or set the automatic sync interval
//! - `serve` - host the sync scheduler until interrupted

use clap::{Parser, Subcommand};

mod commands;
mod context;

/// mailgov - mail-account lifecycle governance
#[derive(Parser)]
#[command(name = "mailgov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize accounts from the directory
    Sync(commands::sync::SyncArgs),

    /// Process the purge queue
    Purge(commands::purge::PurgeArgs),

    /// Change an account's lifecycle status
    Status(commands::status::StatusArgs),

    /// Show or set the automatic sync interval
    Schedule(commands::schedule::ScheduleArgs),

    /// Run the sync scheduler until interrupted
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Sync(args) => commands::sync::execute(args).await,
        Commands::Purge(args) => commands::purge::execute(args).await,
        Commands::Status(args) => commands::status::execute(args).await,
        Commands::Schedule(args) => commands::schedule::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
    }
}
