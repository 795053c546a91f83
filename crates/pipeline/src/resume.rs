//! Index of products already present in the output directory.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::naming::resume_key;

/// Append-only set of resume keys, built once per run.
///
/// A stem counts for `{channel}_{ts}` when it equals the key, or when it
/// has the form `{channel}_{family_tag}_{region}_{ts}`. Matching is
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct OutputIndex {
    family_tag: String,
    keys: HashSet<String>,
}

impl OutputIndex {
    pub fn new(family_tag: &str) -> Self {
        Self {
            family_tag: family_tag.to_lowercase(),
            keys: HashSet::new(),
        }
    }

    /// Scan `dir` for existing outputs. A missing directory gives an empty index.
    pub fn scan(dir: &Path, family_tag: &str) -> std::io::Result<Self> {
        let mut index = Self::new(family_tag);
        if !dir.exists() {
            return Ok(index);
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // in-flight temp files of an atomic write
            if name.starts_with('.') {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                index.insert(stem);
            }
        }
        debug!(dir = %dir.display(), keys = index.len(), "Scanned output directory");
        Ok(index)
    }

    /// Record an output stem.
    pub fn insert(&mut self, stem: &str) {
        let stem = stem.to_lowercase();
        let key = self.normalize(&stem).unwrap_or_else(|| stem.clone());
        self.keys.insert(key);
    }

    pub fn contains(&self, channel: &str, timestamp: DateTime<Utc>) -> bool {
        self.keys.contains(&resume_key(channel, timestamp))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `{channel}_{family}_{region}_{ts}` → `{channel}_{ts}`
    fn normalize(&self, stem: &str) -> Option<String> {
        if self.family_tag.is_empty() {
            return None;
        }
        let marker = format!("_{}_", self.family_tag);
        let at = stem.find(&marker)?;
        let channel = &stem[..at];
        let (_, ts) = stem.rsplit_once('_')?;
        if channel.is_empty() || ts.is_empty() {
            return None;
        }
        Some(format!("{channel}_{ts}"))
    }
}
