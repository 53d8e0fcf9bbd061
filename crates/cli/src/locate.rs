//! Locating the build cache log
//!
//! Resolution order (first match wins):
//! 1) `--log-file` (explicit log path)
//! 2) `--cache-dir` / `GOCACHE`
//! 3) `go env GOCACHE`
//! 4) `<OS cache dir>/go-build` when no Go toolchain is installed

use crate::cli::CliError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the event log inside the cache directory
pub const LOG_FILE_NAME: &str = "log.txt";

/// Value of `GOCACHE` that disables the build cache
const CACHE_OFF: &str = "off";

/// Output of a `go env GOCACHE` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnvOutput {
    /// Whether the command exited successfully
    pub success: bool,
    /// Combined stdout and stderr
    pub output: String,
}

/// Source of the Go toolchain's cache directory setting
pub trait GoEnv {
    /// Run the equivalent of `go env GOCACHE`
    fn gocache(&self) -> io::Result<GoEnvOutput>;
}

/// Runs a Go toolchain binary
#[derive(Debug, Clone)]
pub struct GoCommand {
    program: PathBuf,
}

impl GoCommand {
    /// Use the given `go` binary
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl GoEnv for GoCommand {
    fn gocache(&self) -> io::Result<GoEnvOutput> {
        tracing::debug!(program = %self.program.display(), "Running go env GOCACHE");
        let output = Command::new(&self.program)
            .args(["env", "GOCACHE"])
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(GoEnvOutput {
            success: output.status.success(),
            output: combined,
        })
    }
}

/// Inputs for locating the log
#[derive(Debug, Clone, Default)]
pub struct LocateInputs {
    /// Explicit log file
    pub log_file: Option<PathBuf>,
    /// Explicit cache directory (`GOCACHE` syntax)
    pub cache_dir: Option<String>,
    /// Operating system cache directory, for the default Go location
    pub os_cache_dir: Option<PathBuf>,
}

impl LocateInputs {
    /// Inputs with the OS cache directory filled in from the environment
    #[must_use]
    pub fn from_env(log_file: Option<PathBuf>, cache_dir: Option<String>) -> Self {
        Self {
            log_file,
            cache_dir,
            os_cache_dir: dirs::cache_dir(),
        }
    }
}

/// Interpret a `GOCACHE` value
fn cache_dir_from_value(value: &str) -> Result<PathBuf, CliError> {
    match value.trim() {
        "" => Err(CliError::environment_with_help(
            "no output (old Go version?)",
            "The build cache requires Go 1.10 or later",
        )),
        CACHE_OFF => Err(CliError::CacheDisabled),
        dir => Ok(PathBuf::from(dir)),
    }
}

fn log_in(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE_NAME)
}

/// Determine which log file to analyse
pub fn locate_log(inputs: LocateInputs, go: &dyn GoEnv) -> Result<PathBuf, CliError> {
    if let Some(path) = inputs.log_file {
        return Ok(path);
    }

    if let Some(value) = inputs.cache_dir.filter(|v| !v.trim().is_empty()) {
        let dir = cache_dir_from_value(&value)?;
        return Ok(log_in(&dir));
    }

    match go.gocache() {
        Ok(GoEnvOutput {
            success: true,
            output,
        }) => cache_dir_from_value(&output).map(|dir| log_in(&dir)),
        Ok(GoEnvOutput {
            success: false,
            output,
        }) => Err(CliError::environment(format!(
            "command failed\n{}",
            output.trim_end()
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let Some(os_cache) = inputs.os_cache_dir else {
                return Err(CliError::environment_with_help(
                    format!("{e}"),
                    "Install Go or pass --cache-dir",
                ));
            };
            let dir = os_cache.join("go-build");
            tracing::warn!(
                dir = %dir.display(),
                "Go toolchain not found; using the default build cache location"
            );
            Ok(log_in(&dir))
        }
        Err(e) => Err(CliError::environment(e.to_string())),
    }
}
