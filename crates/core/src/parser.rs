//! Cache log parsing
//!
//! The build cache appends one record per line to `log.txt`:
//!
//! ```text
//! <time> put <action-id> <output-id> <size>
//! <time> get <action-id>
//! <time> miss <action-id>
//! ```
//!
//! [`LogParser`] replays those records into a [`Registry`] and collects the
//! reuse-latency samples consumed by [`crate::stats`]. Any malformed record
//! aborts the scan; a partial summary is never returned.

use crate::registry::{Entry, EntryId, EntryKey, Registry, Role};
use crate::{Error, Result};
use serde::Serialize;

/// Parsing options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Also record the time since the previous reuse of each entry
    pub track_since_last_reuse: bool,
}

/// A parsed log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    /// Event timestamp
    pub time: i64,
    /// What happened
    pub event: LogEvent<'a>,
}

/// Event kinds understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent<'a> {
    /// A new action result and its output were written
    Put {
        /// Action identifier
        action: &'a str,
        /// Output identifier
        data: &'a str,
        /// Output size in bytes
        size: i64,
    },
    /// An action was looked up (`get` or `miss`)
    Reuse {
        /// Action identifier
        action: &'a str,
    },
    /// Any other event kind; only its timestamp is used
    Other(&'a str),
}

/// Parse a single line.
///
/// Returns `Ok(None)` for blank lines. `line_number` is only used for error
/// reporting.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<LogRecord<'_>>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() < 3 || (fields[1] == "put" && fields.len() != 5) {
        return Err(Error::malformed(line_number, line));
    }

    let time = fields[0]
        .parse::<i64>()
        .map_err(|source| Error::InvalidTimestamp {
            line_number,
            line: line.to_string(),
            source,
        })?;

    let event = match fields[1] {
        "put" => {
            let size = fields[4]
                .parse::<i64>()
                .map_err(|source| Error::InvalidSize {
                    line_number,
                    line: line.to_string(),
                    source,
                })?;
            LogEvent::Put {
                action: fields[2],
                data: fields[3],
                size,
            }
        }
        "get" | "miss" => LogEvent::Reuse { action: fields[2] },
        other => LogEvent::Other(other),
    };

    Ok(Some(LogRecord { time, event }))
}

/// Running byte totals for both cache roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Bytes of all action entries
    pub action_bytes: i64,
    /// Bytes of action entries read back at least once
    pub reused_action_bytes: i64,
    /// Bytes of all data entries
    pub data_bytes: i64,
    /// Bytes of data entries read back at least once
    pub reused_data_bytes: i64,
}

impl Totals {
    /// Total and reused bytes for one role
    #[must_use]
    pub const fn for_role(&self, role: Role) -> (i64, i64) {
        match role {
            Role::Action => (self.action_bytes, self.reused_action_bytes),
            Role::Data => (self.data_bytes, self.reused_data_bytes),
        }
    }
}

/// How many records of each kind were seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    /// `put` records
    pub puts: usize,
    /// `get`/`miss` records for known actions
    pub reuses: usize,
    /// `get`/`miss` records for actions never put
    pub orphans: usize,
    /// Records with an unrecognized event kind
    pub ignored: usize,
}

/// First and last timestamps in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// Timestamp of the first record
    pub first: i64,
    /// Timestamp of the last record
    pub last: i64,
}

impl TimeRange {
    /// Span of the log in raw time units, wrapping on overflow
    #[must_use]
    pub const fn span(&self) -> i64 {
        self.last.wrapping_sub(self.first)
    }
}

/// Reuse-latency samples for one role, in log order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSamples {
    /// Time from creation to each reuse
    pub since_created: Vec<i64>,
    /// Time from the previous reuse (or creation) to each reuse
    pub since_last_reuse: Vec<i64>,
}

/// Everything extracted from a complete log scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSummary {
    /// Byte accumulators
    pub totals: Totals,
    /// Samples keyed off action entries
    pub action: RoleSamples,
    /// Samples keyed off data entries
    pub data: RoleSamples,
    /// Time range, absent when the log has no records
    pub time_range: Option<TimeRange>,
    /// Record counters
    pub events: EventCounts,
    /// Distinct action entries
    pub action_entries: usize,
    /// Distinct data entries
    pub data_entries: usize,
    /// Options the scan ran with
    pub options: ParseOptions,
}

impl LogSummary {
    /// Samples for one role
    #[must_use]
    pub const fn samples(&self, role: Role) -> &RoleSamples {
        match role {
            Role::Action => &self.action,
            Role::Data => &self.data,
        }
    }
}

/// Incremental log scanner
#[derive(Debug, Default)]
pub struct LogParser {
    options: ParseOptions,
    registry: Registry,
    summary: LogSummary,
    line_number: usize,
}

impl LogParser {
    /// Create a parser with the given options
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            summary: LogSummary {
                options,
                ..LogSummary::default()
            },
            ..Self::default()
        }
    }

    /// Feed the next line of the log
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.line_number += 1;
        let Some(record) = parse_line(self.line_number, line)? else {
            return Ok(());
        };
        self.apply(record);
        Ok(())
    }

    /// Apply an already parsed record
    pub fn apply(&mut self, record: LogRecord<'_>) {
        let t = record.time;
        let range = self
            .summary
            .time_range
            .get_or_insert(TimeRange { first: t, last: t });
        range.last = t;

        match record.event {
            LogEvent::Put { action, data, size } => self.put(t, action, data, size),
            LogEvent::Reuse { action } => self.reuse(t, action),
            LogEvent::Other(kind) => {
                tracing::trace!(line = self.line_number, kind, "Ignoring unknown event kind");
                self.summary.events.ignored += 1;
            }
        }
    }

    fn put(&mut self, t: i64, action: &str, data: &str, size: i64) {
        self.summary.events.puts += 1;

        let (data_id, inserted) = self
            .registry
            .get_or_insert_with(EntryKey::data(data), || Entry::data(t, size));
        if inserted {
            self.summary.totals.data_bytes = self.summary.totals.data_bytes.wrapping_add(size);
        }

        let (action_id, inserted) = self
            .registry
            .get_or_insert_with(EntryKey::action(action), || Entry::action(t, data_id));
        if inserted {
            let size = self.registry.get(action_id).size;
            self.summary.totals.action_bytes = self.summary.totals.action_bytes.wrapping_add(size);
        }
    }

    fn reuse(&mut self, t: i64, action: &str) {
        let Some(action_id) = self.registry.lookup(&EntryKey::action(action)) else {
            tracing::trace!(line = self.line_number, action, "Skipping reuse of unknown action");
            self.summary.events.orphans += 1;
            return;
        };
        self.summary.events.reuses += 1;

        let data_id = self.reuse_entry(t, action_id, Role::Action);
        if let Some(data_id) = data_id {
            self.reuse_entry(t, data_id, Role::Data);
        }
    }

    /// Record one reuse of an entry, returning the data entry it points at.
    fn reuse_entry(&mut self, t: i64, id: EntryId, role: Role) -> Option<EntryId> {
        let track = self.options.track_since_last_reuse;
        let entry = self.registry.get_mut(id);

        if let Some(size) = entry.mark_reused() {
            let total = match role {
                Role::Action => &mut self.summary.totals.reused_action_bytes,
                Role::Data => &mut self.summary.totals.reused_data_bytes,
            };
            *total = total.wrapping_add(size);
        }

        let samples = match role {
            Role::Action => &mut self.summary.action,
            Role::Data => &mut self.summary.data,
        };
        samples.since_created.push(t.wrapping_sub(entry.created));
        if track {
            samples.since_last_reuse.push(entry.advance_last_reused(t));
        }
        entry.data_id()
    }

    /// Finish the scan and return the summary
    #[must_use]
    pub fn finish(self) -> LogSummary {
        let mut summary = self.summary;
        summary.action_entries = self.registry.count(Role::Action);
        summary.data_entries = self.registry.count(Role::Data);

        tracing::debug!(
            lines = self.line_number,
            puts = summary.events.puts,
            reuses = summary.events.reuses,
            orphans = summary.events.orphans,
            ignored = summary.events.ignored,
            action_entries = summary.action_entries,
            data_entries = summary.data_entries,
            "Cache log scanned"
        );
        summary
    }
}

/// Scan a complete log.
///
/// Lines are separated by `\n`; a trailing `\r` is treated as whitespace.
pub fn parse_log(input: &str, options: ParseOptions) -> Result<LogSummary> {
    let mut parser = LogParser::new(options);
    for line in input.split('\n') {
        parser.feed_line(line)?;
    }
    Ok(parser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_blank() {
        assert_eq!(parse_line(1, "").unwrap(), None);
        assert_eq!(parse_line(1, "  \t ").unwrap(), None);
    }

    #[test]
    fn test_parse_line_put() {
        let record = parse_line(1, "1000 put A D 500").unwrap().unwrap();
        assert_eq!(record.time, 1000);
        assert_eq!(
            record.event,
            LogEvent::Put {
                action: "A",
                data: "D",
                size: 500
            }
        );
    }

    #[test]
    fn test_parse_line_get_ignores_trailing_fields() {
        let record = parse_line(1, "7\tget\tA extra fields").unwrap().unwrap();
        assert_eq!(record.event, LogEvent::Reuse { action: "A" });
        let record = parse_line(1, "7 miss A").unwrap().unwrap();
        assert_eq!(record.event, LogEvent::Reuse { action: "A" });
    }

    #[test]
    fn test_parse_line_unknown_kind() {
        let record = parse_line(1, "9 trim x").unwrap().unwrap();
        assert_eq!(record.event, LogEvent::Other("trim"));
    }

    #[test]
    fn test_parse_line_too_few_fields() {
        let err = parse_line(4, "100 get").unwrap_err();
        assert!(matches!(err, Error::MalformedLine { line_number: 4, .. }));
    }

    #[test]
    fn test_parse_line_put_field_count() {
        assert!(matches!(
            parse_line(1, "100 put A D").unwrap_err(),
            Error::MalformedLine { .. }
        ));
        assert!(matches!(
            parse_line(1, "100 put A D 5 6").unwrap_err(),
            Error::MalformedLine { .. }
        ));
    }

    #[test]
    fn test_parse_line_bad_numbers() {
        assert!(matches!(
            parse_line(2, "abc get A").unwrap_err(),
            Error::InvalidTimestamp { line_number: 2, .. }
        ));
        assert!(matches!(
            parse_line(2, "1 put A D big").unwrap_err(),
            Error::InvalidSize { line_number: 2, .. }
        ));
    }

    #[test]
    fn test_field_count_checked_before_timestamp() {
        assert!(matches!(
            parse_line(1, "abc put A D").unwrap_err(),
            Error::MalformedLine { .. }
        ));
    }

    #[test]
    fn test_shared_data_entry() {
        let log = "10 put A1 D 100\n20 put A2 D 999\n30 get A1\n40 get A2\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();

        assert_eq!(summary.totals.data_bytes, 100);
        assert_eq!(summary.totals.action_bytes, 308);
        assert_eq!(summary.totals.reused_action_bytes, 308);
        assert_eq!(summary.totals.reused_data_bytes, 100);
        assert_eq!(summary.action.since_created, vec![20, 20]);
        assert_eq!(summary.data.since_created, vec![20, 30]);
        assert_eq!(summary.action_entries, 2);
        assert_eq!(summary.data_entries, 1);
    }

    #[test]
    fn test_existing_action_is_not_repointed() {
        let log = "10 put A D1 100\n20 put A D2 200\n30 get A\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();

        // D2 is still registered and counted, but A keeps pointing at D1.
        assert_eq!(summary.totals.data_bytes, 300);
        assert_eq!(summary.totals.action_bytes, 154);
        assert_eq!(summary.totals.reused_data_bytes, 100);
        assert_eq!(summary.data.since_created, vec![20]);
        assert_eq!(summary.action.since_created, vec![20]);
    }

    #[test]
    fn test_since_last_reuse_tracking() {
        let log = "0 put A D 1\n10 get A\n25 get A\n5 put B D 1\n40 get B\n";
        let options = ParseOptions {
            track_since_last_reuse: true,
        };
        let summary = parse_log(log, options).unwrap();

        assert_eq!(summary.action.since_created, vec![10, 25, 35]);
        assert_eq!(summary.action.since_last_reuse, vec![10, 15, 35]);
        assert_eq!(summary.data.since_created, vec![10, 25, 40]);
        assert_eq!(summary.data.since_last_reuse, vec![10, 15, 15]);
        assert!(summary.options.track_since_last_reuse);
    }

    #[test]
    fn test_since_last_reuse_off_by_default() {
        let log = "0 put A D 1\n10 get A\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();
        assert!(summary.action.since_last_reuse.is_empty());
        assert!(summary.data.since_last_reuse.is_empty());
    }

    #[test]
    fn test_unknown_kind_updates_last_time_only() {
        let log = "100 put A D 1\n200 trim whatever\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();
        assert_eq!(
            summary.time_range,
            Some(TimeRange {
                first: 100,
                last: 200
            })
        );
        assert_eq!(summary.events.ignored, 1);
        assert_eq!(summary.totals.action_bytes, 154);
    }

    #[test]
    fn test_crlf_lines() {
        let log = "1 put A D 3\r\n2 get A\r\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();
        assert_eq!(summary.action.since_created, vec![1]);
    }

    #[test]
    fn test_error_reports_line_number() {
        let log = "1 put A D 3\n\n3 put A D\n";
        let err = parse_log(log, ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedLine { line_number: 3, .. }));
    }

    #[test]
    fn test_extreme_timestamps_wrap() {
        let log = "-9223372036854775808 put A D 1\n9223372036854775807 get A\n";
        let options = ParseOptions {
            track_since_last_reuse: true,
        };
        let summary = parse_log(log, options).unwrap();

        assert_eq!(summary.action.since_created, vec![-1]);
        assert_eq!(summary.data.since_created, vec![-1]);
        assert_eq!(summary.action.since_last_reuse, vec![-1]);
        assert_eq!(summary.time_range.unwrap().span(), -1);
    }

    #[test]
    fn test_extreme_sizes_wrap() {
        let log = "1 put A D 9223372036854775807\n2 put B E 1\n3 get A\n4 get B\n";
        let summary = parse_log(log, ParseOptions::default()).unwrap();

        assert_eq!(summary.totals.data_bytes, i64::MIN);
        assert_eq!(summary.totals.reused_data_bytes, i64::MIN);
        assert_eq!(summary.totals.action_bytes, 308);
    }

    #[test]
    fn test_empty_log() {
        let summary = parse_log("", ParseOptions::default()).unwrap();
        assert_eq!(summary.time_range, None);
        assert_eq!(summary.totals, Totals::default());
    }
}
