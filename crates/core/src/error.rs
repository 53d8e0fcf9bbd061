//! Error types for the cache log analysis crate

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;

/// Error type for cache log analysis
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A record has the wrong number of fields for its event kind
    #[error("invalid log.txt line {line_number}: {line}")]
    #[diagnostic(
        code(cachestat::log::malformed),
        help("Records are `<time> put <action> <data> <size>` or `<time> get|miss <action>`")
    )]
    MalformedLine {
        /// 1-based line number within the log
        line_number: usize,
        /// The offending line, verbatim
        line: String,
    },

    /// The timestamp field is not a base-10 integer
    #[error("invalid log.txt time on line {line_number}: {line}")]
    #[diagnostic(code(cachestat::log::time))]
    InvalidTimestamp {
        /// 1-based line number within the log
        line_number: usize,
        /// The offending line, verbatim
        line: String,
        /// The integer parse failure
        #[source]
        source: ParseIntError,
    },

    /// The size field of a put record is not a base-10 integer
    #[error("invalid log.txt size on line {line_number}: {line}")]
    #[diagnostic(code(cachestat::log::size))]
    InvalidSize {
        /// 1-based line number within the log
        line_number: usize,
        /// The offending line, verbatim
        line: String,
        /// The integer parse failure
        #[source]
        source: ParseIntError,
    },

    /// I/O error while reading the log
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(cachestat::io),
        help("Check that the build cache exists and its log.txt is readable")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read")
        operation: String,
    },

    /// Serialization error while rendering a report
    #[error("Serialization error: {message}")]
    #[diagnostic(code(cachestat::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },
}

impl Error {
    /// Create a malformed-line error
    #[must_use]
    pub fn malformed(line_number: usize, line: impl Into<String>) -> Self {
        Self::MalformedLine {
            line_number,
            line: line.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Whether this error was caused by the log contents rather than the environment
    #[must_use]
    pub const fn is_malformed_log(&self) -> bool {
        matches!(
            self,
            Self::MalformedLine { .. } | Self::InvalidTimestamp { .. } | Self::InvalidSize { .. }
        )
    }
}

/// Result type for cache log analysis
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_line() {
        let err = Error::malformed(3, "100 put a b");
        assert_eq!(err.to_string(), "invalid log.txt line 3: 100 put a b");
        assert!(err.is_malformed_log());
    }

    #[test]
    fn test_io_display_with_and_without_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io(source, "/tmp/cache/log.txt", "read");
        assert_eq!(err.to_string(), "I/O read failed: /tmp/cache/log.txt");
        assert!(!err.is_malformed_log());

        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io_no_path(source, "read");
        assert_eq!(err.to_string(), "I/O read failed");
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = Error::malformed(1, "x");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("cachestat::log::malformed"));
    }
}
