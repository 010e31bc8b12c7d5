//! `roster diff`: Compare two user lists by email.

use std::path::PathBuf;

use clap::Args;
use roster_recon::export::{write_diff_csvs, DiffSinks};

use crate::report;
use crate::util::{display_name, load_config, print_json, read_input, recon_err, require_inputs, write_outputs};
use crate::CliError;

#[derive(Args)]
pub struct DiffArgs {
    /// First user list (CSV)
    pub left: PathBuf,

    /// Second user list (CSV)
    pub right: PathBuf,

    /// Reconciliation config (TOML); built-in defaults when omitted
    #[arg(long, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the left-only, right-only, in-both and differences files here
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the diff as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Suppress the human report
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

pub fn cmd_diff(args: DiffArgs) -> Result<(), CliError> {
    require_inputs(&[&args.left, &args.right])?;
    let config = load_config(args.config.as_deref())?;

    let left_csv = read_input(&args.left)?;
    let right_csv = read_input(&args.right)?;
    let (left_label, right_label) = (display_name(&args.left), display_name(&args.right));

    let result = roster_recon::run_diff(
        &config,
        (left_label.as_str(), left_csv.as_str()),
        (right_label.as_str(), right_csv.as_str()),
    )
    .map_err(recon_err)?;

    let mut written = Vec::new();
    if let Some(dir) = &args.out {
        let delimiter = config.output_delimiter_byte().map_err(recon_err)?;
        let mut sinks: DiffSinks<Vec<u8>> = DiffSinks::default();
        write_diff_csvs(&mut sinks, &result.left, &result.right, &result.diff, delimiter)
            .map_err(recon_err)?;
        let files = sinks.into_named();
        written = write_outputs(dir, &files)?;
    }

    if args.json {
        print_json(&result)?;
    }

    if !args.quiet {
        report::print_diff(&result.diff);
        for path in &written {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}
