//! roster-sync - Run one background data-sync job
//!
//! One-shot runner meant to be invoked by an external scheduler (cron, a
//! systemd timer). Performs a single sync run and reports the outcome on
//! stdout; retries, if wanted, belong to the scheduler.

use clap::Parser;
use libroster::logging::{LogFormat, LoggingConfig};
use libroster::service::{Event, EventBus, SyncWorker};
use libroster::{Config, Result, RosterError};

#[derive(Parser, Debug)]
#[command(name = "roster-sync")]
#[command(version)]
#[command(about = "Run one background data-sync job")]
#[command(long_about = "\
roster-sync - Run one background data-sync job

DESCRIPTION:
    roster-sync performs a single sync run and prints the tagged outcome.
    It defines no retry policy of its own; schedule and retry it externally,
    for example from cron:

        */15 * * * * roster-sync --format json >> /var/log/roster-sync.log

CONFIGURATION:
    Configuration file: ~/.config/roster/config.toml

    [sync]
    duration = \"2s\"    # simulated work duration

EXIT CODES:
    0 - Sync succeeded
    1 - Sync failed
    2 - Configuration error
")]
struct Cli {
    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Print progress events to stderr as they happen
    #[arg(short, long)]
    progress: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        libroster::logging::init_default();
    }

    match run(cli).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    if cli.format != "text" && cli.format != "json" {
        return Err(RosterError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            cli.format
        )));
    }

    let config = Config::load_or_default()?;
    let duration = config.sync.parsed_duration()?;

    let event_bus = EventBus::default();
    let progress = cli.progress.then(|| {
        let mut events = event_bus.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    Event::SyncStarted => eprintln!("sync: started"),
                    Event::SyncCompleted { result } => eprintln!("sync: {}", result),
                    Event::SyncFailed { error } => eprintln!("sync: failed: {}", error),
                    _ => {}
                }
            }
        })
    });

    let worker = SyncWorker::new(duration, event_bus);
    let outcome = worker.run().await;
    drop(worker);

    if let Some(handle) = progress {
        // The last sender is gone; the drain task ends after the final event
        let _ = handle.await;
    }

    if cli.format == "json" {
        println!("{}", serde_json::to_string(&outcome).unwrap());
    } else {
        match &outcome {
            libroster::service::SyncOutcome::Success { result } => println!("{}", result),
            libroster::service::SyncOutcome::Failure { error } => println!("failed: {}", error),
        }
    }

    Ok(outcome.exit_code())
}
