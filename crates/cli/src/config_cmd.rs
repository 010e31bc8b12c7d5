//! `roster config`: Inspect and validate reconciliation configs.

use std::path::PathBuf;

use clap::Subcommand;
use roster_recon::ReconConfig;

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::util::load_config;
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a config without running
    #[command(after_help = "\
Examples:
  roster config validate recon.toml")]
    Validate {
        /// Path to the TOML config file
        file: PathBuf,
    },

    /// Print the built-in config, with every alias table written out
    #[command(after_help = "\
Examples:
  roster config defaults > recon.toml")]
    Defaults,
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { file } => cmd_config_validate(file),
        ConfigCommands::Defaults => cmd_config_defaults(),
    }
}

fn config_err(msg: impl Into<String>) -> CliError {
    CliError::new(EXIT_INVALID_CONFIG, msg)
}

fn cmd_config_validate(file: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(file.as_path()))?;
    eprintln!("config OK: {} (input '{}', output '{}')", config.name, config.delimiter, config.output_delimiter);
    Ok(())
}

fn cmd_config_defaults() -> Result<(), CliError> {
    let text = ReconConfig::default()
        .expanded()
        .and_then(|c| c.to_toml())
        .map_err(|e| config_err(e.to_string()))?;
    print!("{text}");
    Ok(())
}
