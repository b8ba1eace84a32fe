mod cli;
mod ui;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use accessgate::config::AccessConfig;
use accessgate::service::{Services, watch};
use cli::{Cli, Command};
use ui::PassProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AccessConfig::load(cli.config.as_deref())?;
    let services = Services::from_config(&config)?;

    match cli.command {
        Command::Reconcile => {
            let progress = PassProgress::start("Checking platform health");
            match services.reconciler.reconcile().await {
                Ok(outcome) => progress.finish_reconcile(&outcome),
                Err(e) => {
                    progress.fail(&e);
                    return Err(e.into());
                }
            }
        }
        Command::Reclaim => {
            let progress = PassProgress::start("Looking for orphaned jobs");
            match services.reclaimer.reclaim() {
                Ok(report) => progress.finish_reclaim(&report),
                Err(e) => {
                    progress.fail(&e);
                    return Err(e.into());
                }
            }
        }
        Command::Status => {
            let state = services.reconciler.current()?;
            ui::print_state(&state);
        }
        Command::Set { mode } => {
            let progress = PassProgress::start(&format!("Setting platform access to {mode}"));
            match services.reconciler.apply_admin_request(&mode).await {
                Ok(outcome) => progress.finish_reconcile(&outcome),
                Err(e) => {
                    progress.fail(&e);
                    return Err(e.into());
                }
            }
        }
        Command::Watch => {
            watch(
                &services,
                Duration::from_secs(config.reconcile_interval_secs),
                Duration::from_secs(config.reclaim_interval_secs),
                async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "failed to listen for Ctrl-C");
                    }
                },
            )
            .await;
        }
    }

    Ok(())
}
