//! Deterministic output file names.

use chrono::{DateTime, Utc};
use sat_common::OUTPUT_TIME_FORMAT;

/// Output artefact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Jpeg,
    Npy,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Npy => "npy",
        }
    }
}

/// `{channel_lower}_{family_tag}_{region_tag}_{%Y%m%dT%H%M%S}.{ext}`
pub fn output_file_name(
    channel: &str,
    family_tag: &str,
    region_tag: &str,
    timestamp: DateTime<Utc>,
    kind: OutputKind,
) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        channel.to_lowercase(),
        family_tag,
        region_tag,
        timestamp.format(OUTPUT_TIME_FORMAT),
        kind.extension()
    )
}

/// Resume key of a product: `{channel}_{%Y%m%dT%H%M%S}`, lowercase.
pub fn resume_key(channel: &str, timestamp: DateTime<Utc>) -> String {
    format!("{}_{}", channel, timestamp.format(OUTPUT_TIME_FORMAT)).to_lowercase()
}
