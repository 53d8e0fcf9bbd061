//! Log-to-report pipeline for one invocation

use crate::cli::{Cli, CliError};
use crate::locate::{GoEnv, LocateInputs, locate_log};
use std::fs;
use std::path::Path;

/// Read the whole log file
pub fn read_log(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| cachestat_core::Error::io(e, path, "read").into())
}

/// Locate, read and analyse the cache log, returning the rendered report.
///
/// Nothing is rendered unless the whole log parses.
pub fn run(cli: &Cli, go: &dyn GoEnv) -> Result<String, CliError> {
    let inputs = LocateInputs::from_env(cli.log_file.clone(), cli.cache_dir.clone());
    let path = locate_log(inputs, go)?;
    tracing::debug!(path = %path.display(), "Reading cache log");

    let bytes = read_log(&path)?;
    tracing::debug!(bytes = bytes.len(), "Cache log loaded");

    let report = cachestat_core::analyze(&bytes, cli.parse_options())?;
    Ok(report.render(&cli.report_options())?)
}
