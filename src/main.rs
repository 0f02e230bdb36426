use anyhow::Context;
use clap::{Parser, Subcommand};
use signal_watch::services::rebuild_from_log;
use signal_watch::{Config, SignalRunner, SnapshotStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "signal-watch",
    about = "Technical-indicator signal scanner",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every configured pair once.
    Run,
    /// Evaluate every configured pair every RUN_INTERVAL_SECS.
    Watch,
    /// Rebuild the snapshot from the signal log.
    Rebuild {
        /// Signal log to read. Defaults to SIGNAL_LOG_PATH.
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signal_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Run => {
            let runner = SignalRunner::new(config).context("failed to start scanner")?;
            let report = runner.run_once().await?;
            info!(
                "{} items, {} changes, {} pairs skipped",
                report.items,
                report.changes.len(),
                report.skipped.len()
            );
        }
        Commands::Watch => {
            let interval = Duration::from_secs(config.run_interval_secs.max(1));
            let runner = SignalRunner::new(config).context("failed to start scanner")?;
            info!("Watching every {}s", interval.as_secs());

            tokio::select! {
                _ = runner.watch(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                }
            }
        }
        Commands::Rebuild { log } => {
            let log_path = log.unwrap_or_else(|| config.signal_log_path.clone());
            let store = SnapshotStore::new(config.out_dir.clone());
            let report = rebuild_from_log(&log_path, &store)
                .with_context(|| format!("failed to rebuild from {}", log_path.display()))?;
            info!("{} items, {} changes", report.items, report.changes.len());
        }
    }

    Ok(())
}
