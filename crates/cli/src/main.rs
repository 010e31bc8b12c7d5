// roster CLI - merge and audit user lists exported from several systems

mod config_cmd;
mod consolidate;
mod diff;
mod exit_codes;
mod profile;
mod report;
mod util;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use config_cmd::ConfigCommands;
use consolidate::ConsolidateArgs;
use diff::DiffArgs;
use exit_codes::{EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use profile::ProfileArgs;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Reconcile user lists from a system extract, a manual sheet and a payment ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge system, manual and payment exports into one user base
    #[command(after_help = "\
Examples:
  roster consolidate sistema.csv planilha.csv pagamentos.csv
  roster consolidate sistema.csv planilha.csv pagamentos.csv --out out/
  roster consolidate sistema.csv planilha.csv pagamentos.csv --config recon.toml --json > result.json

Writes base_consolidada.csv, script_importacao.sql and
usuarios_para_revisar.csv (header only when no user has an alert).")]
    Consolidate(ConsolidateArgs),

    /// Compare two user lists by email
    #[command(after_help = "\
Examples:
  roster diff planilha.csv sistema.csv
  roster diff planilha.csv sistema.csv --out diff/
  roster diff a.csv b.csv --json --quiet")]
    Diff(DiffArgs),

    /// Show fill rates, plans, referrers and duplicate emails of one file
    #[command(after_help = "\
Examples:
  roster profile planilha.csv
  roster profile sistema.csv --json")]
    Profile(ProfileArgs),

    /// Config file operations
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  roster-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Consolidate(args) => consolidate::cmd_consolidate(args),
        Commands::Diff(args) => diff::cmd_diff(args),
        Commands::Profile(args) => profile::cmd_profile(args),
        Commands::Config(cmd) => config_cmd::cmd_config(cmd),
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

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
