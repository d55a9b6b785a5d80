mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::prelude::*;

use commands::config::ConfigArgs;
use commands::distribution::DistributeArgs;
use commands::loans::{ApplyPaymentArgs, EarlyRepaymentArgs, LoanTermsArgs, RepayArgs, ScheduleArgs};

/// Loan schedules, repayments and member distributions for an investment club
#[derive(Parser)]
#[command(
    name = "club",
    version,
    about = "Loan schedules, repayments and member distributions for an investment club",
    long_about = "A CLI for the club's loan and distribution arithmetic with decimal \
                  precision. Computes loan terms, builds repayment schedules with custom \
                  month amounts, spreads overpayments over later installments, quotes \
                  early repayment and splits earnings across members."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Club configuration file (.json, .yaml or .yml); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Interest and total payable for a principal
    LoanTerms(LoanTermsArgs),
    /// Build a repayment schedule, optionally with custom month amounts
    Schedule(ScheduleArgs),
    /// Pay one installment and spread any overpayment forward
    ApplyPayment(ApplyPaymentArgs),
    /// Post a repayment against a loan and its schedule
    Repay(RepayArgs),
    /// Quote the amount needed to settle a balance early
    EarlyRepayment(EarlyRepaymentArgs),
    /// Split a pool across members equally or by savings balance
    Distribute(DistributeArgs),
    /// Show the effective club configuration
    Config(ConfigArgs),
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

fn init_tracing(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match input::file::read_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::LoanTerms(args) => commands::loans::run_loan_terms(args, &config),
        Commands::Schedule(args) => commands::loans::run_schedule(args),
        Commands::ApplyPayment(args) => commands::loans::run_apply_payment(args),
        Commands::Repay(args) => commands::loans::run_repay(args),
        Commands::EarlyRepayment(args) => commands::loans::run_early_repayment(args, &config),
        Commands::Distribute(args) => commands::distribution::run_distribute(args, &config),
        Commands::Config(args) => commands::config::run_config(args, &config),
        Commands::Version => {
            println!("club {}", env!("CARGO_PKG_VERSION"));
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
