use std::io::Read;
use std::path::{Path, PathBuf};

use roster_recon::ReconConfig;

use crate::exit_codes::{recon_exit_code, EXIT_INVALID_CONFIG};
use crate::CliError;

/// Read file and convert to UTF-8 if needed (Windows-1252 fallback).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::warn!("{}: not valid UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

/// Fail before reading anything if any input is missing.
pub fn require_inputs(paths: &[&Path]) -> Result<(), CliError> {
    for path in paths {
        if !path.is_file() {
            return Err(CliError::usage(format!("input file not found: {}", path.display()))
                .with_hint("check the path; nothing was written"));
        }
    }
    Ok(())
}

pub fn read_input(path: &Path) -> Result<String, CliError> {
    let text = read_file_as_utf8(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    log::info!("read {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

/// Load `--config`, or the built-in config when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    if !path.is_file() {
        return Err(CliError::usage(format!("config file not found: {}", path.display())));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config: {e}")))?;
    ReconConfig::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", path.display()))
            .with_hint("`roster config defaults` prints a complete config")
    })
}

/// Engine error to CLI error, keeping the exit code contract.
pub fn recon_err(err: roster_recon::ReconError) -> CliError {
    CliError::new(recon_exit_code(&err), err.to_string())
}

/// Stage every file as `<name>.tmp`, then rename them into place. A failure
/// while staging removes the staged files and leaves `dir` as it was.
pub fn write_outputs(dir: &Path, files: &[(&str, Vec<u8>)]) -> Result<Vec<PathBuf>, CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let path = dir.join(name);
        let tmp_path = dir.join(format!("{name}.tmp"));
        if let Err(e) = std::fs::write(&tmp_path, bytes) {
            discard_staged(&staged);
            return Err(CliError::io(format!("cannot write {}: {e}", tmp_path.display()))
                .with_hint("no output file was changed"));
        }
        staged.push((tmp_path, path));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp_path, path) in staged {
        std::fs::rename(&tmp_path, &path)
            .map_err(|e| CliError::io(format!("failed to rename tmp to {}: {e}", path.display())))?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (tmp_path, _) in staged {
        if let Err(e) = std::fs::remove_file(tmp_path) {
            log::warn!("cannot remove {}: {e}", tmp_path.display());
        }
    }
}

/// File name for reports; falls back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}
