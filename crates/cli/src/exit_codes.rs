//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 2    | CLI usage error (bad args, missing input file)     |
//! | 3    | IO error (unreadable input, unwritable output)     |
//! | 4    | Parse error (malformed CSV, no email column)       |
//! | 5    | Invalid config (TOML syntax, unknown keys, values) |
//!
//! Alerts on consolidated users are findings, not failures: a run that
//! produces a review file still exits 0.

use roster_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 3;

/// An input file could not be parsed (CSV error or missing email column).
pub const EXIT_PARSE: u8 = 4;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. } | ReconError::Csv { .. } => EXIT_PARSE,
        ReconError::Io(_) => EXIT_IO,
    }
}
