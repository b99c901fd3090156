mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::currency::ParseCurrencyArgs;
use commands::debt::DebtSummaryArgs;
use commands::dscr::DscrArgs;
use commands::record::{RecordArgs, ReportArgs};

/// Debt summaries, DSCR and record normalization for loan applications
#[derive(Parser)]
#[command(
    name = "advisor",
    version,
    about = "Debt summaries, DSCR and record normalization for loan applications",
    long_about = "Works on the financial data collected by the loan-advisory intake \
                  forms: parses formatted currency, aggregates debt schedules, \
                  computes the Debt Service Coverage Ratio and rebuilds stored \
                  application records into fully numeric form."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML configuration file (store location, loan defaults)
    #[arg(long, global = true, env = "ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse formatted currency values
    ParseCurrency(ParseCurrencyArgs),
    /// Summarize a debt schedule by category
    DebtSummary(DebtSummaryArgs),
    /// Calculate the Debt Service Coverage Ratio
    Dscr(DscrArgs),
    /// Load a stored application record and normalize it
    Reconstruct(RecordArgs),
    /// Build the fully numeric report payload for a stored record
    Report(ReportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = match config::AdvisorConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ParseCurrency(args) => commands::currency::run_parse_currency(args),
        Commands::DebtSummary(args) => commands::debt::run_debt_summary(args),
        Commands::Dscr(args) => commands::dscr::run_dscr(args),
        Commands::Reconstruct(args) => commands::record::run_reconstruct(args, &settings),
        Commands::Report(args) => commands::record::run_report(args, &settings),
        Commands::Version => {
            println!("advisor {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
