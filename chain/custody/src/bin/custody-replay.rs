//! custody-replay: run a call script against an in-memory custody host
//!
//! Prints a JSON summary (records, notifications, per-call outcomes) to
//! stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use custody::config::ReplayConfig;
use custody::host::{Clock, InMemoryCustody, ManualClock, SystemClock};
use custody::script::{self, Call, ReplaySummary};
use custody::snapshot::{self, LedgerSnapshot};
use custody::CustodyController;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "custody-replay")]
#[command(about = "Replay custody calls against an in-memory host", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "CUSTODY_CONFIG")]
    config: PathBuf,

    /// JSON array of calls to execute in order
    #[arg(short, long)]
    script: PathBuf,

    /// Resume from a snapshot instead of an empty ledger
    #[arg(long)]
    snapshot_in: Option<PathBuf>,

    /// Write the final snapshot here (overrides `snapshot_path` in the config)
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Log filter directive
    #[arg(long, env = "CUSTODY_LOG", default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("Invalid log filter")?)
        .with_writer(std::io::stderr)
        .init();

    let config = ReplayConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    let mut custody = InMemoryCustody::new();
    for recipient in &config.rejecting_recipients {
        custody.reject_recipient(*recipient);
    }
    let clock = ManualClock::new(config.start_time_ms.unwrap_or_else(|| SystemClock.now()));

    let mut controller = match &cli.snapshot_in {
        Some(path) => {
            let saved = LedgerSnapshot::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            snapshot::resume_in_memory(saved, &config.owner, custody, clock)
                .with_context(|| format!("Failed to resume from snapshot {}", path.display()))?
        }
        None => CustodyController::new(config.owner, custody, clock)?,
    };

    let text = fs::read_to_string(&cli.script)
        .with_context(|| format!("Failed to read script {}", cli.script.display()))?;
    let calls: Vec<Call> = serde_json::from_str(&text).context("Failed to parse script")?;
    tracing::info!(calls = calls.len(), owner = %config.owner, "Starting replay");

    let mut outcomes = Vec::with_capacity(calls.len());
    for call in &calls {
        outcomes.push(script::execute(&mut controller, call));
        controller.clock().advance(config.clock_step_ms);
    }

    if let Some(path) = cli.snapshot_out.as_ref().or(config.snapshot_path.as_ref()) {
        controller
            .snapshot()?
            .save(path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    }

    let summary = ReplaySummary::collect(&mut controller, outcomes);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
