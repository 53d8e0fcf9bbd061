//! Cache statistics report
//!
//! [`Report`] gathers the totals and latency distributions for both cache
//! roles. It renders either as the plain-text summary requested on the
//! public tracking issue or as JSON.

use crate::parser::{EventCounts, LogSummary, RoleSamples, TimeRange};
use crate::registry::Role;
use crate::stats::{Distribution, Latency, to_days};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// Tracking issue that collects cache statistics from users
pub const TRACKING_ISSUE_URL: &str = "https://golang.org/issue/22990";

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Output format
    pub format: ReportFormat,
    /// Wrap text output in the tracking-issue banner and code fence
    pub banner: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            banner: true,
        }
    }
}

/// Statistics for one cache role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheReport {
    /// Action or data
    pub role: Role,
    /// Distinct entries seen
    pub entries: usize,
    /// Bytes of all entries
    pub total_bytes: i64,
    /// Bytes of entries reused at least once
    pub reused_bytes: i64,
    /// Time from creation to reuse
    pub reuse: Latency,
    /// Time between consecutive reuses, when tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_last_reuse: Option<Latency>,
}

/// Full statistics report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Span of the log in days
    pub cache_age_days: f64,
    /// Raw first and last timestamps
    pub time_range: Option<TimeRange>,
    /// First timestamp as a date
    pub log_start: Option<DateTime<Utc>>,
    /// Last timestamp as a date
    pub log_end: Option<DateTime<Utc>>,
    /// Record counters
    pub events: EventCounts,
    /// Action cache statistics
    pub action: CacheReport,
    /// Data cache statistics
    pub data: CacheReport,
}

impl Report {
    /// Build the report, sorting each sample set
    #[must_use]
    pub fn from_summary(summary: LogSummary) -> Self {
        let track = summary.options.track_since_last_reuse;
        let time_range = summary.time_range;
        let timestamp = |secs: i64| DateTime::<Utc>::from_timestamp(secs, 0);

        let role_report = |role: Role, entries: usize, samples: RoleSamples| {
            let (total_bytes, reused_bytes) = summary.totals.for_role(role);
            CacheReport {
                role,
                entries,
                total_bytes,
                reused_bytes,
                reuse: Latency::from_samples(samples.since_created),
                since_last_reuse: track.then(|| Latency::from_samples(samples.since_last_reuse)),
            }
        };

        let action = role_report(Role::Action, summary.action_entries, summary.action);
        let data = role_report(Role::Data, summary.data_entries, summary.data);

        Self {
            cache_age_days: time_range.map_or(0.0, |r| to_days(r.span())),
            time_range,
            log_start: time_range.and_then(|r| timestamp(r.first)),
            log_end: time_range.and_then(|r| timestamp(r.last)),
            events: summary.events,
            action,
            data,
        }
    }

    /// Render with the given options
    pub fn render(&self, options: &ReportOptions) -> Result<String> {
        match options.format {
            ReportFormat::Text => Ok(self.render_text(options.banner)),
            ReportFormat::Json => serde_json::to_string_pretty(self)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|e| Error::serialization(format!("Failed to serialize report: {e}"))),
        }
    }

    /// Plain-text rendering
    #[must_use]
    pub fn render_text(&self, banner: bool) -> String {
        let mut out = String::new();

        if banner {
            let _ = writeln!(
                out,
                "Please add the following output (including the quotes) to {TRACKING_ISSUE_URL}\n"
            );
            out.push_str("```\n");
        }

        let _ = writeln!(out, "cache age: {:.2} days", self.cache_age_days);
        write_cache(&mut out, &self.action);
        write_cache(&mut out, &self.data);

        if banner {
            out.push_str("```\n");
        }
        out
    }
}

fn write_cache(out: &mut String, cache: &CacheReport) {
    let _ = writeln!(
        out,
        "{} cache: {} bytes, {} reused",
        cache.role, cache.total_bytes, cache.reused_bytes
    );
    match &cache.reuse {
        Latency::NoReuse => out.push_str("\tno reuse\n"),
        Latency::Distribution(dist) => {
            write_distribution(out, "reuse time percentiles", dist);
            if let Some(Latency::Distribution(since)) = &cache.since_last_reuse {
                write_distribution(out, "time since last reuse percentiles", since);
            }
        }
    }
}

fn write_distribution(out: &mut String, title: &str, dist: &Distribution) {
    let _ = writeln!(out, "\t{title}");
    for p in &dist.percentiles {
        let _ = writeln!(out, "\t{} {:.2} days", p.label, p.days);
    }
    let _ = writeln!(out, "\tmax {:.2} days", dist.max_days);
}
