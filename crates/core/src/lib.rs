//! Build cache reuse statistics
//!
//! This crate turns a build cache's append-only `log.txt` into reuse-latency
//! statistics that inform cache eviction policy:
//! - [`parser`] replays `put`/`get`/`miss` records into an entry registry
//! - [`registry`] models action entries and the data blobs they reference
//! - [`stats`] computes nearest-below percentile distributions
//! - [`report`] renders the result as text or JSON
//!
//! # Example
//!
//! ```
//! use cachestat_core::{ParseOptions, Report, parse_log};
//!
//! let log = "1000 put A D 500\n1010 get A\n1020 get A\n";
//! let summary = parse_log(log, ParseOptions::default())?;
//! assert_eq!(summary.totals.reused_data_bytes, 500);
//!
//! let report = Report::from_summary(summary);
//! assert!(report.render_text(false).starts_with("cache age: 0.00 days"));
//! # Ok::<(), cachestat_core::Error>(())
//! ```

#![expect(
    clippy::missing_errors_doc,
    reason = "All fallible functions return the crate Error; variants are documented there"
)]

mod error;
pub mod parser;
pub mod registry;
pub mod report;
pub mod stats;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use parser::{
    EventCounts, LogEvent, LogParser, LogRecord, LogSummary, ParseOptions, RoleSamples, TimeRange,
    Totals, parse_line, parse_log,
};
pub use registry::{ACTION_ENTRY_SIZE, Entry, EntryId, EntryKey, EntryKind, Registry, Role};
pub use report::{CacheReport, Report, ReportFormat, ReportOptions, TRACKING_ISSUE_URL};
pub use stats::{Distribution, Latency, PERCENTILES, PercentileSpec, PercentileValue};

/// Parse a raw log and build its report in one step
pub fn analyze(log: &[u8], options: ParseOptions) -> Result<Report> {
    let text = String::from_utf8_lossy(log);
    let summary = parse_log(&text, options)?;
    Ok(Report::from_summary(summary))
}
