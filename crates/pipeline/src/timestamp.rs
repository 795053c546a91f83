//! Sensing-time extraction from archive entry names.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Where the timestamp sits inside an entry's file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimestampPattern {
    /// `length` characters right after the first `marker`
    AfterMarker {
        marker: String,
        length: usize,
        format: String,
    },
    /// The `index`-th `-`-separated field, up to its first `.`
    DashField { index: usize, format: String },
}

impl TimestampPattern {
    /// MTG FCI: `..._C_EUMT_20250717120651_...`
    pub fn fci() -> Self {
        Self::AfterMarker {
            marker: "_C_EUMT_".to_string(),
            length: 14,
            format: "%Y%m%d%H%M%S".to_string(),
        }
    }

    /// SEVIRI native: `MSG3-SEVI-MSG15-0100-NA-20250717121241.524000000Z-NA.nat`
    pub fn seviri_native() -> Self {
        Self::DashField {
            index: 5,
            format: "%Y%m%d%H%M%S".to_string(),
        }
    }

    /// Parse the base name of `entry` into a UTC instant.
    pub fn parse(&self, entry: &str) -> Result<DateTime<Utc>, String> {
        let name = base_name(entry);
        let (raw, format) = match self {
            Self::AfterMarker { marker, length, format } => {
                let start = name
                    .find(marker.as_str())
                    .ok_or_else(|| format!("marker '{marker}' not found"))?
                    + marker.len();
                let raw = name
                    .get(start..start + length)
                    .ok_or_else(|| format!("fewer than {length} characters after '{marker}'"))?;
                (raw, format)
            }
            Self::DashField { index, format } => {
                let field = name
                    .split('-')
                    .nth(*index)
                    .ok_or_else(|| format!("no dash-separated field {index}"))?;
                (field.split('.').next().unwrap_or(field), format)
            }
        };
        NaiveDateTime::parse_from_str(raw, format)
            .map(|ndt| Utc.from_utc_datetime(&ndt))
            .map_err(|e| format!("'{raw}' does not match {format}: {e}"))
    }
}

/// Last path component of an entry name.
pub fn base_name(entry: &str) -> &str {
    Path::new(entry)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use test_utils::fixtures::entries;

    #[test]
    fn test_fci_timestamp() {
        let name = entries::mtg_chunk("20250717120651", "0034");
        let t = TimestampPattern::fci().parse(&name).unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (12, 6, 51));
    }

    #[test]
    fn test_seviri_timestamp() {
        let name = entries::msg_native("20250717121241");
        let t = TimestampPattern::seviri_native().parse(&name).unwrap();
        assert_eq!(t.to_rfc3339(), "2025-07-17T12:12:41+00:00");
    }

    #[test]
    fn test_directory_prefix_ignored() {
        let name = format!("BODY/{}", entries::msg_native("20250717121241"));
        assert!(TimestampPattern::seviri_native().parse(&name).is_ok());
    }

    #[test]
    fn test_unparseable_names() {
        assert!(TimestampPattern::fci().parse("manifest.xml").is_err());
        assert!(TimestampPattern::fci().parse("x_C_EUMT_2025").is_err());
        assert!(TimestampPattern::seviri_native().parse("MSG3-SEVI.nat").is_err());
        assert!(TimestampPattern::seviri_native()
            .parse("MSG3-SEVI-MSG15-0100-NA-notatime.5Z-NA.nat")
            .is_err());
    }
}
