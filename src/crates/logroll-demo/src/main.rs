//! logroll standalone binary
//!
//! Writes sample records through a rotation manager so the rotation and
//! retention behaviour of a preset or configuration file can be observed.

mod cli;
mod status;
mod tracing_setup;

use anyhow::{Context, Result};
use clap::Parser;
use logroll_writer::{Level, RotationManager};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One batch of sample records at mixed levels.
fn write_batch(manager: &RotationManager, counter: u64) -> logroll_writer::Result<()> {
    manager.log(Level::Debug, format!("[{}] Debug message", counter))?;
    manager.log(Level::Info, format!("[{}] Info message", counter))?;

    if counter % 3 == 0 {
        manager.log(Level::Warn, format!("[{}] Warning message", counter))?;
    }

    if counter % 5 == 0 {
        manager.log(Level::Error, format!("[{}] Error message", counter))?;
    }

    Ok(())
}

/// The fixed sequence written when not running for a duration.
fn write_sample(manager: &RotationManager) -> logroll_writer::Result<()> {
    manager.log(Level::Info, "application started")?;
    manager.log(Level::Info, "configuration loaded")?;
    manager.log(Level::Debug, "debug details")?;
    manager.log(Level::Warn, "this is a warning")?;
    manager.log(Level::Error, "this is an error")?;
    manager.log(Level::Info, "application stopped")?;
    Ok(())
}

async fn run_batches(
    manager: &RotationManager,
    args: &cli::Args,
    duration: Duration,
    cancellation: &CancellationToken,
) -> Result<()> {
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    let mut cadence = tokio::time::interval(args.cadence);
    let mut counter: u64 = 0;

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => {
                info!("interrupted after {} batches", counter);
                break;
            }
            _ = &mut deadline => {
                info!("finished after {} batches", counter);
                break;
            }
            _ = cadence.tick() => {
                counter += 1;
                write_batch(manager, counter).context("writing sample records")?;
                status::print_status(manager, args.json)?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_setup::init_tracing(&args.log_filter);

    let config = args.config()?;
    let manager = Arc::new(
        RotationManager::new(config).context("failed to open the active log file")?,
    );

    let cancellation = CancellationToken::new();
    let ticker = manager
        .spawn_ticker(args.tick, cancellation.clone())
        .context("failed to start the rotation ticker")?;

    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancellation.cancel(),
                Err(e) => warn!("failed to listen for Ctrl-C: {}", e),
            }
        });
    }

    let result = match args.run_duration() {
        Some(duration) => {
            info!(
                "writing a batch every {} for {} (Ctrl-C to stop)",
                humantime::format_duration(args.cadence),
                humantime::format_duration(duration)
            );
            run_batches(&manager, &args, duration, &cancellation).await
        }
        None => write_sample(&manager).context("writing sample records"),
    };

    cancellation.cancel();
    if let Err(e) = ticker.await {
        warn!("rotation ticker panicked: {}", e);
    }

    manager.shutdown().context("failed to close the active log file")?;
    status::print_status(&manager, args.json)?;

    result
}
