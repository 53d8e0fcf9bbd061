//! End-to-end scenarios for the log-to-report pipeline

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cachestat_core::{
    Error, Latency, ParseOptions, Report, TimeRange, Totals, analyze, parse_log,
};

#[test]
fn test_repeated_gets_credit_once() {
    let log = "1000 put A D 500\n1010 get A\n1020 get A\n";
    let summary = parse_log(log, ParseOptions::default()).unwrap();

    assert_eq!(
        summary.totals,
        Totals {
            action_bytes: 154,
            reused_action_bytes: 154,
            data_bytes: 500,
            reused_data_bytes: 500,
        }
    );
    assert_eq!(summary.action.since_created, vec![10, 20]);
    assert_eq!(summary.data.since_created, vec![10, 20]);
    assert_eq!(
        summary.time_range,
        Some(TimeRange {
            first: 1000,
            last: 1020
        })
    );
}

#[test]
fn test_orphan_get() {
    let summary = parse_log("500 get X", ParseOptions::default()).unwrap();

    assert_eq!(summary.totals, Totals::default());
    assert!(summary.action.since_created.is_empty());
    assert!(summary.data.since_created.is_empty());
    assert_eq!(
        summary.time_range,
        Some(TimeRange {
            first: 500,
            last: 500
        })
    );
    assert_eq!(summary.events.orphans, 1);

    let report = Report::from_summary(summary);
    assert_eq!(report.action.reuse, Latency::NoReuse);
    assert_eq!(report.data.reuse, Latency::NoReuse);
    assert_eq!(report.render_text(false).matches("\tno reuse\n").count(), 2);
}

#[test]
fn test_malformed_put_aborts() {
    let err = analyze(b"100 put A D", ParseOptions::default()).unwrap_err();
    assert!(err.is_malformed_log());
    assert!(matches!(err, Error::MalformedLine { line_number: 1, .. }));
}

#[test]
fn test_malformed_line_after_valid_records_aborts() {
    let log = b"1 put A D 1\n2 get A\n3 get\n4 get A\n";
    let err = analyze(log, ParseOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedLine { line_number: 3, .. }));
}

#[test]
fn test_second_put_is_noop_for_action() {
    let log = "100 put A D1 10\n200 put A D2 20\n300 get A\n";
    let summary = parse_log(log, ParseOptions::default()).unwrap();

    assert_eq!(summary.totals.action_bytes, 154);
    assert_eq!(summary.action.since_created, vec![200]);
    // Reuse is credited to the original data entry, not the second one.
    assert_eq!(summary.totals.reused_data_bytes, 10);
    assert_eq!(summary.data.since_created, vec![200]);
}

#[test]
fn test_first_and_last_time_ignore_kind() {
    let log = "\n  \n50 trim x\n60 put A D 1\n70 unknown y\n\n";
    let summary = parse_log(log, ParseOptions::default()).unwrap();
    assert_eq!(summary.time_range, Some(TimeRange { first: 50, last: 70 }));
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut log = b"10 put A D 5\n20 get A \xff\n".to_vec();
    log.extend_from_slice(b"30 get A\n");
    let report = analyze(&log, ParseOptions::default()).unwrap();
    assert_eq!(report.action.total_bytes, 154);
    assert_eq!(report.action.reuse.distribution().unwrap().samples, 2);
}

#[test]
fn test_cache_age_in_days() {
    let log = b"0 put A D 1\n129600 get A\n";
    let report = analyze(log, ParseOptions::default()).unwrap();
    assert!((report.cache_age_days - 1.5).abs() < f64::EPSILON);
    assert!(report.render_text(false).starts_with("cache age: 1.50 days\n"));
}

#[test]
fn test_extreme_time_range_wraps() {
    let log = b"-9223372036854775808 trim x\n9223372036854775807 trim x\n";
    let report = analyze(log, ParseOptions::default()).unwrap();

    assert_eq!(report.time_range.unwrap().span(), -1);
    assert!(report.cache_age_days < 0.0);
    assert_eq!(report.log_start, None);
    assert_eq!(report.events.ignored, 2);
}
