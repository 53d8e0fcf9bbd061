//! Command-line arguments, CLI errors and exit codes

use crate::tracing::{LogLevel, TracingConfig, TracingFormat};
use cachestat_core::{ParseOptions, ReportFormat, ReportOptions};
use clap::{Parser, ValueEnum};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Cache directory could not be resolved or caching is disabled
pub const EXIT_ENV: i32 = 2;
/// The log could not be read or is malformed
pub const EXIT_ANALYSIS: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// The build cache location could not be determined (exit code 2)
    #[error("go env GOCACHE: {message}")]
    #[diagnostic(code(cachestat::cli::environment))]
    Environment {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The build cache is turned off (exit code 2)
    #[error("go env GOCACHE: GOCACHE=off")]
    #[diagnostic(
        code(cachestat::cli::cache_disabled),
        help("Enable the build cache or pass --log-file to analyse a saved log")
    )]
    CacheDisabled,
    /// Reading or parsing the log failed (exit code 3)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Analysis(#[from] cachestat_core::Error),
}

impl CliError {
    /// Create a new environment error
    #[must_use]
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new environment error with help text
    #[must_use]
    pub fn environment_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Environment { .. } => "environment",
            Self::CacheDisabled => "cache_disabled",
            Self::Analysis(err) if err.is_malformed_log() => "malformed_log",
            Self::Analysis(_) => "analysis",
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Environment { .. } | CliError::CacheDisabled => EXIT_ENV,
        CliError::Analysis(_) => EXIT_ANALYSIS,
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    status: &'static str,
    code: &'a str,
    message: String,
}

/// Render error appropriately based on the output format
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: CliError, json_mode: bool) {
    if json_mode {
        let envelope = ErrorEnvelope {
            status: "error",
            code: err.code(),
            message: err.to_string(),
        };
        match serde_json::to_string(&envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err);
        eprintln!("{report:?}");
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
    }
}

/// Report output format
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Default)]
pub enum OutputFormat {
    /// Plain text, as posted to the tracking issue
    #[default]
    Text,
    /// JSON document
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cachestat")]
#[command(about = "Print basic statistics about the Go build cache")]
#[command(
    long_about = "Print basic statistics about the Go build cache.\n\n\
    Reads the cache's log.txt and reports how long cached actions and their \
    outputs wait before being reused, to inform cache expiration policy."
)]
#[command(version)]
pub struct Cli {
    /// Analyse this log file instead of locating the build cache
    #[arg(long, env = "CACHESTAT_LOG", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Build cache directory; `off` means caching is disabled
    #[arg(long, env = "GOCACHE", value_name = "DIR")]
    pub cache_dir: Option<String>,

    /// Go toolchain used to run `go env GOCACHE`
    #[arg(long, env = "CACHESTAT_GO", value_name = "BIN", default_value = "go")]
    pub go: PathBuf,

    /// Also report the time between consecutive reuses of each entry
    #[arg(long, env = "CACHESTAT_SINCE_LAST_REUSE")]
    pub since_last_reuse: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Omit the tracking-issue banner from text output
    #[arg(long)]
    pub no_banner: bool,

    /// Set logging level
    #[arg(short = 'l', long, value_enum, default_value = "warn")]
    pub level: LogLevel,

    /// Diagnostic log format
    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: TracingFormat,

    /// Tracing filter directive (e.g. `cachestat_core=trace`); overrides
    /// `RUST_LOG` and `--level`
    #[arg(long, env = "CACHESTAT_LOG_FILTER", value_name = "DIRECTIVE")]
    pub log_filter: Option<String>,
}

impl Cli {
    /// Options for the log scan
    #[must_use]
    pub const fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            track_since_last_reuse: self.since_last_reuse,
        }
    }

    /// Options for rendering the report
    #[must_use]
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            format: self.format.into(),
            banner: !self.no_banner,
        }
    }

    /// Tracing configuration derived from the flags
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.level.into(),
            filter: self.log_filter.clone(),
        }
    }

    /// Whether errors should be rendered as JSON
    #[must_use]
    pub fn json_mode(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Parse the process arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
