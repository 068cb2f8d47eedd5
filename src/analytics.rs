//! Aggregates over model log entries.
//!
//! Everything here is a pure transform of the fetched list; nothing is
//! cached between page loads.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::models::ModelLogEntry;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Success versus correction counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSummary {
    pub total: usize,
    pub successes: usize,
    pub corrections: usize,
}

impl LogSummary {
    pub fn from_entries(entries: &[ModelLogEntry]) -> Self {
        let successes = entries.iter().filter(|e| e.success).count();
        Self {
            total: entries.len(),
            successes,
            corrections: entries.len() - successes,
        }
    }

    pub fn success_pct(&self) -> f64 {
        percentage(self.successes, self.total)
    }

    pub fn correction_pct(&self) -> f64 {
        percentage(self.corrections, self.total)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Entries sharing the same minute.
#[derive(Debug, Clone, PartialEq)]
pub struct MinuteBucket {
    pub minute: NaiveDateTime,
    pub total: usize,
    pub successes: usize,
}

impl MinuteBucket {
    /// Fraction of successful entries, between 0.0 and 1.0.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successes as f64 / self.total as f64
        }
    }
}

/// Parse a backend timestamp. Offsets are converted to UTC; naive values
/// are taken as-is.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

pub fn truncate_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Group entries by minute in chronological order.
///
/// Entries without a parseable `created_at` are skipped here but still
/// count in [`LogSummary`].
pub fn bucket_by_minute(entries: &[ModelLogEntry]) -> Vec<MinuteBucket> {
    let mut buckets: BTreeMap<NaiveDateTime, (usize, usize)> = BTreeMap::new();

    for entry in entries {
        let Some(ts) = entry.created_at.as_deref().and_then(parse_timestamp) else {
            continue;
        };
        let slot = buckets.entry(truncate_to_minute(ts)).or_insert((0, 0));
        slot.0 += 1;
        if entry.success {
            slot.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(minute, (total, successes))| MinuteBucket {
            minute,
            total,
            successes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(success: bool, created_at: Option<&str>) -> ModelLogEntry {
        ModelLogEntry {
            success,
            created_at: created_at.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_counts_add_up() {
        let entries = vec![
            entry(true, None),
            entry(false, None),
            entry(true, None),
            entry(true, Some("garbage")),
        ];
        let summary = LogSummary::from_entries(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.corrections, 1);
        assert_eq!(summary.successes + summary.corrections, summary.total);
        assert!((summary.success_pct() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary() {
        let summary = LogSummary::from_entries(&[]);
        assert_eq!(summary, LogSummary::default());
        assert_eq!(summary.success_pct(), 0.0);
        assert_eq!(summary.correction_pct(), 0.0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDateTime::parse_from_str("2024-05-01 10:15:30", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 10:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:15:30Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:15:30+02:00"), Some(expected));
        assert!(parse_timestamp("2024-05-01T10:15:30.123456").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_bucket_by_minute() {
        let entries = vec![
            entry(true, Some("2024-05-01T10:15:01")),
            entry(false, Some("2024-05-01T10:15:59.900")),
            entry(true, Some("2024-05-01T10:14:30")),
            entry(true, Some("not a date")),
            entry(false, None),
        ];
        let buckets = bucket_by_minute(&entries);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].minute.format("%H:%M").to_string(), "10:14");
        assert_eq!(buckets[0].success_rate(), 1.0);
        assert_eq!(buckets[1].minute.format("%H:%M:%S").to_string(), "10:15:00");
        assert_eq!(buckets[1].total, 2);
        assert_eq!(buckets[1].success_rate(), 0.5);
    }
}
