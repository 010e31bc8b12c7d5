//! `roster profile`: Fill rates, distributions and duplicates of one file.

use std::path::PathBuf;

use clap::Args;
use roster_recon::ingest::load_roster;
use roster_recon::profile::profile_table;

use crate::report;
use crate::util::{display_name, load_config, print_json, read_input, recon_err, require_inputs};
use crate::CliError;

#[derive(Args)]
pub struct ProfileArgs {
    /// User list to profile (CSV)
    pub file: PathBuf,

    /// Reconciliation config (TOML); built-in defaults when omitted
    #[arg(long, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the profile as JSON to stdout instead of the human report
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_profile(args: ProfileArgs) -> Result<(), CliError> {
    require_inputs(&[&args.file])?;
    let config = load_config(args.config.as_deref())?;

    let csv = read_input(&args.file)?;
    let table = load_roster(&display_name(&args.file), &csv, &config).map_err(recon_err)?;
    let profile = profile_table(&table);

    if args.json {
        print_json(&profile)
    } else {
        report::print_profile(&profile);
        Ok(())
    }
}
