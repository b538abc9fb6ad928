//! `idsweep`: validate a JSON file of identifier records in place.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use idsweep::config::Config;
use idsweep::core::{Phase, PipelineError};
use idsweep::orchestrator::{BatchSettings, Orchestrator};
use idsweep::store::JsonFileStore;
use idsweep::validator::Registry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sweep {
    Fast,
    Slow,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "idsweep", version, about = "Validate URL, IBAN and VAT-ID records")]
struct Args {
    /// JSON array of records, rewritten as batches complete.
    #[arg(long)]
    records: PathBuf,

    /// TOML configuration; defaults apply when omitted.
    #[arg(long, env = "IDSWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// Which sweeps to run.
    #[arg(long, value_enum, default_value_t = Sweep::All)]
    phase: Sweep,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, default_value = "info")]
    log_level: String,
}

async fn run(args: Args) -> Result<(), PipelineError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };

    let store = JsonFileStore::open(&args.records).await?;
    info!(path = %store.path().display(), "loaded record file");
    let registry = Registry::from_config(&config)?;
    let orchestrator = Orchestrator::new(store, registry, BatchSettings::from_config(&config));

    for classification in orchestrator.unhandled_classifications().await? {
        info!(%classification, "records of this classification will be skipped");
    }

    match args.phase {
        Sweep::All => {
            let report = orchestrator.run().await?;
            println!(
                "fast: {} records in {} rounds; slow: {} records in {} rounds",
                report.fast.records, report.fast.rounds, report.slow.records, report.slow.rounds
            );
        }
        Sweep::Fast | Sweep::Slow => {
            let phase = if args.phase == Sweep::Fast {
                Phase::Fast
            } else {
                Phase::Slow
            };
            let report = orchestrator.run_phase(phase).await?;
            println!(
                "{phase}: {} records in {} rounds",
                report.records, report.rounds
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
