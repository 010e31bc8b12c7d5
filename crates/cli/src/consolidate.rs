//! `roster consolidate`: Merge the three exports into one user base.

use std::path::PathBuf;

use clap::Args;
use roster_recon::export::{
    write_consolidated_csv, write_import_instructions, write_review_csv, CONSOLIDATED_FILE,
    INSTRUCTIONS_FILE, REVIEW_FILE,
};
use roster_recon::{ReconInput, ReconResult};

use crate::report;
use crate::util::{load_config, print_json, read_input, recon_err, require_inputs, write_outputs};
use crate::CliError;

#[derive(Args)]
pub struct ConsolidateArgs {
    /// System extract (CSV)
    pub system: PathBuf,

    /// Manual control sheet (CSV)
    pub manual: PathBuf,

    /// Payment ledger (CSV)
    pub payments: PathBuf,

    /// Reconciliation config (TOML); built-in defaults when omitted
    #[arg(long, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Print the full result as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Suppress the human report
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Rendered output files, in write order.
fn render(result: &ReconResult, delimiter: u8) -> Result<Vec<(&'static str, Vec<u8>)>, CliError> {
    let mut base = Vec::new();
    write_consolidated_csv(&mut base, &result.users, delimiter).map_err(recon_err)?;

    let mut instructions = Vec::new();
    write_import_instructions(&mut instructions, &result.users, CONSOLIDATED_FILE, delimiter)
        .map_err(recon_err)?;

    // Always written; header-only when nobody is flagged.
    let mut review = Vec::new();
    write_review_csv(&mut review, &result.users, delimiter).map_err(recon_err)?;

    Ok(vec![
        (CONSOLIDATED_FILE, base),
        (INSTRUCTIONS_FILE, instructions),
        (REVIEW_FILE, review),
    ])
}

pub fn cmd_consolidate(args: ConsolidateArgs) -> Result<(), CliError> {
    require_inputs(&[&args.system, &args.manual, &args.payments])?;
    let config = load_config(args.config.as_deref())?;

    let input = ReconInput {
        system: read_input(&args.system)?,
        manual: read_input(&args.manual)?,
        payments: read_input(&args.payments)?,
    };

    let result = roster_recon::run(&config, &input).map_err(recon_err)?;
    let delimiter = config.output_delimiter_byte().map_err(recon_err)?;
    let files = render(&result, delimiter)?;
    let written = write_outputs(&args.out, &files)?;

    if args.json {
        print_json(&result)?;
    }

    if !args.quiet {
        report::print_consolidation(&result);
        for path in &written {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}
