use anyhow::{Context, Result};
use balrec_core::{reconcile, CleanedSeries, ReconConfig, Reconciliation};
use balrec_ingest::{extract, RawSource};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::{ConfigArgs, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "balrec",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BALREC_BUILD_SHA"), ")"),
    about = "Bank vs ERP closing balance reconciliation"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare closing balances of a bank statement and an ERP export
    Reconcile {
        /// Bank statement (.csv or .pdf)
        #[arg(long)]
        bank: PathBuf,

        /// ERP / ledger export (.csv or .pdf)
        #[arg(long)]
        erp: PathBuf,

        #[command(flatten)]
        settings: ConfigArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Fail when the two statements share no dates
        #[arg(long)]
        strict: bool,
    },

    /// Print the cleaned (date, closing) series of one statement
    Extract {
        /// Statement file (.csv or .pdf)
        file: PathBuf,

        #[command(flatten)]
        settings: ConfigArgs,

        /// Print the series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with the default settings
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

/// Process exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success = 0,
    /// Mismatches found, or nothing compared under `--strict`
    Discrepant = 1,
    /// Extraction or configuration error
    Failed = 2,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status as u8)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    finish(run(cli.command).await).into()
}

/// Report a failed command on stderr and map it to its exit status.
fn finish(outcome: Result<Status>) -> Status {
    outcome.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        Status::Failed
    })
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Command) -> Result<Status> {
    match command {
        Command::Reconcile {
            bank,
            erp,
            settings,
            json,
            strict,
        } => {
            let cfg = settings.resolve()?;
            let result = reconcile_files(bank, erp, &cfg).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_reconciliation(&result));
            }

            if result.is_vacuous() && strict {
                eprintln!("error: the bank and ERP statements have no dates in common");
                return Ok(Status::Discrepant);
            }

            Ok(if result.is_reconciled() {
                Status::Success
            } else {
                Status::Discrepant
            })
        }

        Command::Extract {
            file,
            settings,
            json,
        } => {
            let cfg = settings.resolve()?;
            let series = extract_file(file, cfg).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                print!("{}", report::render_series(&series));
            }
            Ok(Status::Success)
        }

        Command::InitConfig { path } => {
            config::init_config(&path)?;
            Ok(Status::Success)
        }
    }
}

/// Extract both statements and compare them. Nothing is compared unless both
/// extractions succeed.
async fn reconcile_files(bank: PathBuf, erp: PathBuf, cfg: &ReconConfig) -> Result<Reconciliation> {
    // The two files share nothing, so extract them side by side
    let (bank_series, erp_series) = tokio::try_join!(
        extract_file(bank, cfg.clone()),
        extract_file(erp, cfg.clone()),
    )?;

    let result = reconcile(&bank_series, &erp_series, cfg.tolerance);
    info!(
        compared = result.compared,
        mismatches = result.mismatches().len(),
        "reconciliation finished"
    );
    if result.is_vacuous() {
        warn!(
            bank = bank_series.len(),
            erp = erp_series.len(),
            "nothing was compared; check the column names and date formats"
        );
    }
    Ok(result)
}

/// Read and extract one statement on the blocking pool.
async fn extract_file(path: PathBuf, cfg: ReconConfig) -> Result<CleanedSeries> {
    let label = path.display().to_string();
    tokio::task::spawn_blocking(move || {
        let raw = RawSource::from_path(&path)?;
        extract(&raw, &cfg)
    })
    .await
    .with_context(|| format!("extraction of {label} did not complete"))?
    .with_context(|| format!("extracting {label}"))
}
