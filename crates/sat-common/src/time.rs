//! Time window handling for archive searches.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format accepted for `--start` / `--end` (interpreted as UTC).
pub const CLI_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format used in output file names.
pub const OUTPUT_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A closed search window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeParseError> {
        if start > end {
            return Err(TimeParseError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two CLI strings in [`CLI_TIME_FORMAT`].
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Self::new(parse_utc(start)?, parse_utc(end)?)
    }

    /// The window ending at `now` and reaching `lookback` into the past.
    pub fn latest(now: DateTime<Utc>, lookback: Duration) -> Self {
        Self {
            start: now - lookback,
            end: now,
        }
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        t >= &self.start && t <= &self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Parse a naive `%Y-%m-%dT%H:%M:%S` string as a UTC instant.
pub fn parse_utc(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    NaiveDateTime::parse_from_str(s.trim(), CLI_TIME_FORMAT)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0} (expected YYYY-MM-DDTHH:MM:SS)")]
    InvalidFormat(String),

    #[error("Time window start {start} is after end {end}")]
    Reversed {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_window() {
        let window = TimeWindow::parse("2025-07-17T14:08:00", "2025-07-17T14:23:00").unwrap();
        assert_eq!(window.start.hour(), 14);
        assert_eq!(window.duration(), Duration::minutes(15));
    }

    #[test]
    fn test_reversed_window_rejected() {
        let result = TimeWindow::parse("2025-07-17T15:00:00", "2025-07-17T14:00:00");
        assert!(matches!(result, Err(TimeParseError::Reversed { .. })));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = TimeWindow::parse("2025-07-17 14:08", "2025-07-17T14:23:00");
        assert!(matches!(result, Err(TimeParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_latest_window() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::latest(now, Duration::minutes(20));
        assert_eq!(window.end, now);
        assert!(window.contains(&(now - Duration::minutes(10))));
        assert!(!window.contains(&(now - Duration::minutes(21))));
    }
}
