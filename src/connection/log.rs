//! Per-connection diagnostic log.
//!
//! # Responsibilities
//! - Keep an append-only, structured record of everything odd the parser saw
//! - Tag each entry with the source location that raised it
//! - Mirror entries to `tracing` so they reach the process log as well
//!
//! # Design Decisions
//! - Locations come from `#[track_caller]`, so they name the parser call
//!   site rather than this module
//! - Entries less severe than the configured threshold go to `tracing` at
//!   debug level only and are not stored

use std::fmt;
use std::panic;

use serde::{Deserialize, Serialize};

use crate::connection::Direction;

/// Diagnostic severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
        };
        f.write_str(s)
    }
}

/// Source location that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: &'static str,
    pub line: u32,
}

impl Location {
    /// Location of the caller, following `#[track_caller]` frames.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub location: Location,
    pub severity: Severity,
    pub code: Option<u16>,
    pub message: String,
    pub direction: Option<Direction>,
    /// Index of the transaction concerned, if any.
    pub tx: Option<usize>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(code) = self.code {
            write!(f, " (code {code})")?;
        }
        write!(f, " at {}", self.location)
    }
}

/// Append-only diagnostic sink.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: Vec<LogEntry>,
    threshold: Severity,
}

impl DiagnosticLog {
    pub fn new(threshold: Severity) -> Self {
        Self {
            entries: Vec::new(),
            threshold,
        }
    }

    /// Record `entry`. Returns false if it fell below the threshold.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        let direction = entry.direction.map(|d| d.as_str()).unwrap_or("-");
        let tx = entry.tx.map(|i| i as i64).unwrap_or(-1);

        if entry.severity > self.threshold {
            tracing::debug!(
                location = %entry.location,
                direction,
                tx,
                code = entry.code,
                severity = %entry.severity,
                "{}",
                entry.message
            );
            return false;
        }

        match entry.severity {
            Severity::Error => tracing::error!(
                location = %entry.location,
                direction,
                tx,
                code = entry.code,
                "{}",
                entry.message
            ),
            Severity::Warning => tracing::warn!(
                location = %entry.location,
                direction,
                tx,
                code = entry.code,
                "{}",
                entry.message
            ),
            Severity::Notice | Severity::Info => tracing::info!(
                location = %entry.location,
                direction,
                tx,
                code = entry.code,
                "{}",
                entry.message
            ),
            Severity::Debug => tracing::debug!(
                location = %entry.location,
                direction,
                tx,
                code = entry.code,
                "{}",
                entry.message
            ),
        }

        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Serialize for DiagnosticLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(severity: Severity) -> LogEntry {
        LogEntry {
            location: Location::caller(),
            severity,
            code: Some(1),
            message: "test".into(),
            direction: Some(Direction::Response),
            tx: Some(0),
        }
    }

    #[test]
    fn severity_orders_most_severe_first() {
        assert!(Severity::Error < Severity::Warning);
        assert!(Severity::Notice < Severity::Debug);
    }

    #[test]
    fn entries_below_threshold_are_dropped() {
        let mut log = DiagnosticLog::new(Severity::Warning);
        assert!(log.push(entry(Severity::Error)));
        assert!(log.push(entry(Severity::Warning)));
        assert!(!log.push(entry(Severity::Notice)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn location_points_at_caller() {
        let loc = Location::caller();
        assert!(loc.file.ends_with("log.rs"));
        assert!(loc.line > 0);
    }

    #[test]
    fn entry_display() {
        let e = entry(Severity::Warning);
        let text = e.to_string();
        assert!(text.starts_with("[warning] test (code 1) at "));
    }
}
