//! Text codec for timestamped usage snapshots.
//!
//! The historical log is an append-only file of lines of the form
//! `<timestamp> <json>`, where the payload is the nested
//! user -> type -> node -> count map. Sorted map keys make the payload
//! stable; zero-valued entries survive the round trip.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::usage::Usage;

/// Timestamp format of a snapshot line, e.g. `2026-08-04_09:30:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub timestamp: NaiveDateTime,
    pub usage: Usage,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot line {line} has no usage payload")]
    MissingPayload { line: usize },
    #[error("snapshot line {line} has an invalid timestamp '{timestamp}'")]
    InvalidTimestamp { line: usize, timestamp: String },
    #[error("snapshot line {line} has an invalid usage payload: {source}")]
    InvalidPayload {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Render one snapshot as a log line (without a trailing newline).
pub fn format_snapshot_line(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(&snapshot.usage)?;
    Ok(format!(
        "{} {}",
        snapshot.timestamp.format(TIMESTAMP_FORMAT),
        payload
    ))
}

/// Parse one log line. `line_number` is 1-based and only used in errors.
pub fn parse_snapshot_line(line: &str, line_number: usize) -> Result<Snapshot, SnapshotError> {
    let (timestamp, payload) = line
        .split_once(' ')
        .ok_or(SnapshotError::MissingPayload { line: line_number })?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|_| {
        SnapshotError::InvalidTimestamp {
            line: line_number,
            timestamp: timestamp.to_string(),
        }
    })?;
    let usage = serde_json::from_str(payload).map_err(|source| SnapshotError::InvalidPayload {
        line: line_number,
        source,
    })?;
    Ok(Snapshot { timestamp, usage })
}

/// Parse the full historical log, in file order. Blank lines are
/// tolerated; anything else malformed is surfaced with its line number.
pub fn parse_snapshot_log(contents: &str) -> Result<Vec<Snapshot>, SnapshotError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_snapshot_line(line, idx + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_usage() -> Usage {
        let mut usage = Usage::new();
        usage
            .entry("alice".to_string())
            .or_default()
            .entry("v100".to_string())
            .or_default()
            .insert("node001".to_string(), 2);
        usage
            .entry("bob".to_string())
            .or_default()
            .entry("p40".to_string())
            .or_default()
            .insert("node002".to_string(), 0);
        usage
    }

    fn sample_timestamp() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-08-04_09:30:00", TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn round_trips_including_zero_values() {
        let snapshot = Snapshot {
            timestamp: sample_timestamp(),
            usage: sample_usage(),
        };
        let line = format_snapshot_line(&snapshot).unwrap();
        let parsed = parse_snapshot_line(&line, 1).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.usage["bob"]["p40"]["node002"], 0);
    }

    #[test]
    fn payload_keys_are_sorted_and_stable() {
        let snapshot = Snapshot {
            timestamp: sample_timestamp(),
            usage: sample_usage(),
        };
        let line = format_snapshot_line(&snapshot).unwrap();
        assert_eq!(
            line,
            "2026-08-04_09:30:00 {\"alice\":{\"v100\":{\"node001\":2}},\"bob\":{\"p40\":{\"node002\":0}}}"
        );
    }

    #[test]
    fn log_parsing_skips_blank_lines_and_keeps_order() {
        let contents = "2026-08-04_09:30:00 {\"alice\":{\"v100\":{\"n1\":1}}}\n\n2026-08-04_21:30:00 {\"alice\":{\"v100\":{\"n1\":2}}}\n";
        let snapshots = parse_snapshot_log(contents).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].timestamp < snapshots[1].timestamp);
    }

    #[test]
    fn malformed_line_reports_its_line_number() {
        let contents = "2026-08-04_09:30:00 {\"alice\":{\"v100\":{\"n1\":1}}}\nnot-a-timestamp {}\n";
        let err = parse_snapshot_log(contents).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidTimestamp { line: 2, .. }
        ));
    }

    #[test]
    fn line_without_payload_is_rejected() {
        let err = parse_snapshot_line("2026-08-04_09:30:00", 7).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingPayload { line: 7 }));
    }
}
