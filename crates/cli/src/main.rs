// acctsync CLI - reconcile a workbook against QuickBooks and write a JSON report

mod exit_codes;
mod logging;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use acctsync_io::write_report;
use acctsync_qb::{GatewayConfig, QbGateway};
use acctsync_recon::Dataset;
use clap::{Parser, Subcommand, ValueEnum};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use runner::SyncOptions;

#[derive(Parser)]
#[command(name = "acctsync")]
#[command(about = "Sync chart of accounts and payment terms from a workbook into QuickBooks")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the workbook against QuickBooks, create missing entries, write a report
    #[command(after_help = "\
Examples:
  acctsync sync --workbook company.xlsx
  acctsync sync --workbook company.xlsx --dataset terms --output out/terms.json
  acctsync sync --workbook company.xlsx --config gateway.toml --dry-run
  ACCTSYNC_ENDPOINT=http://10.0.0.5:8080/qbxml acctsync sync --workbook company.xlsx

Config keys (all optional): app_name, endpoint, company_file,
query_version, add_version, timeout_secs.

The report is written even when the run fails; its `status` and `error`
fields say what happened. Exit code 2 means bad arguments or config.")]
    Sync {
        /// Workbook holding the dataset's sheet (.xlsx, .xls, .xlsb, .ods or .csv)
        #[arg(long, short = 'w')]
        workbook: PathBuf,

        /// Report path [default: chart_of_accounts_report.json or payment_terms_report.json]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Which entity family to sync
        #[arg(long, value_enum, default_value_t = DatasetArg::Accounts)]
        dataset: DatasetArg,

        /// Gateway config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// qbXML bridge URL (overrides config)
        #[arg(long, env = "ACCTSYNC_ENDPOINT")]
        endpoint: Option<String>,

        /// QuickBooks company file (overrides config; empty = currently open file)
        #[arg(long, env = "ACCTSYNC_COMPANY_FILE")]
        company_file: Option<String>,

        /// Reconcile and report without creating anything
        #[arg(long)]
        dry_run: bool,

        /// Only log warnings and errors
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DatasetArg {
    Accounts,
    Terms,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Accounts => Dataset::Accounts,
            DatasetArg::Terms => Dataset::Terms,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nqbxml:   query 16.0, add 13.0 (defaults)",
    )
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            workbook,
            output,
            dataset,
            config,
            endpoint,
            company_file,
            dry_run,
            quiet,
        } => {
            logging::init(if quiet { "warn" } else { "info" });
            cmd_sync(workbook, output, dataset.into(), config, endpoint, company_file, dry_run)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// sync
// ============================================================================

/// Config file (or defaults) with flag/env overrides applied, then validated.
fn resolve_config(
    path: Option<PathBuf>,
    endpoint: Option<String>,
    company_file: Option<String>,
) -> Result<GatewayConfig, CliError> {
    let mut config = match &path {
        Some(p) => GatewayConfig::load(p).map_err(|e| {
            CliError::usage(e.to_string()).with_hint("see `acctsync sync --help` for config keys")
        })?,
        None => GatewayConfig::default(),
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(company_file) = company_file {
        config.company_file = company_file;
    }

    config.validate().map_err(|e| CliError::usage(e.to_string()))?;
    Ok(config)
}

fn cmd_sync(
    workbook: PathBuf,
    output: Option<PathBuf>,
    dataset: Dataset,
    config: Option<PathBuf>,
    endpoint: Option<String>,
    company_file: Option<String>,
    dry_run: bool,
) -> Result<(), CliError> {
    let config = resolve_config(config, endpoint, company_file)?;
    let output = output.unwrap_or_else(|| PathBuf::from(dataset.default_report_name()));

    let options = SyncOptions {
        workbook,
        dataset,
        dry_run,
    };

    let payload = match QbGateway::connect(config) {
        Ok(mut gateway) => runner::run(&options, &mut gateway),
        Err(e) => runner::failed(e),
    };

    let path = write_report(&payload, &output).map_err(|e| CliError::io(e.to_string()))?;
    println!("Report written to {}", path.display());
    Ok(())
}
