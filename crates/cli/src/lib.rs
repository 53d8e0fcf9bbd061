//! cachestat CLI library
//!
//! Resolves the Go build cache, reads its `log.txt` and renders the reuse
//! statistics computed by [`cachestat_core`].

#![expect(
    clippy::missing_errors_doc,
    reason = "Errors are CliError variants, documented on the enum"
)]

pub mod cli;
pub mod locate;
mod run;
pub mod tracing;

pub use run::{read_log, run};
