//! cachestat prints basic statistics about the Go build cache.
//!
//! The goal is to inform the decision about cache expiration policy.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use cachestat::cli::{self, EXIT_OK, exit_code_for, render_error};
use cachestat::locate::GoCommand;
use std::io::Write;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = cachestat::tracing::init_tracing(cli.tracing_config()) {
        eprintln!("{e:?}");
    }

    let go = GoCommand::new(&cli.go);
    let exit_code = match cachestat::run(&cli, &go) {
        Ok(report) => {
            let mut stdout = std::io::stdout().lock();
            match stdout.write_all(report.as_bytes()).and_then(|()| stdout.flush()) {
                Ok(()) => EXIT_OK,
                Err(e) => {
                    let err = cachestat_core::Error::io_no_path(e, "write report");
                    let err = cli::CliError::from(err);
                    let code = exit_code_for(&err);
                    render_error(err, false);
                    code
                }
            }
        }
        Err(err) => {
            let code = exit_code_for(&err);
            render_error(err, cli.json_mode());
            code
        }
    };

    std::process::exit(exit_code);
}
