//! Family configuration registry with optional YAML overrides.
//!
//! Built-in settings are always present. Files in `{config_dir}/families/`
//! can override individual fields of one family each:
//!
//! ```yaml
//! family: msg-rss
//! lookback_minutes: 30
//! extra_channels:
//!   - name: IR_108_fine
//!     bands: [IR_108]
//!     gsd_m: 1500
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::family::{ChannelSpec, DefaultSizing, FamilyConfig, ProductLayout, SatelliteFamily};
use crate::timestamp::TimestampPattern;

/// Partial family settings read from YAML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyOverride {
    pub family: SatelliteFamily,
    pub collection_id: Option<String>,
    pub reader_id: Option<String>,
    pub output_tag: Option<String>,
    pub layout: Option<ProductLayout>,
    pub timestamp: Option<TimestampPattern>,
    pub region_table: Option<String>,
    pub default_sizing: Option<DefaultSizing>,
    pub lookback_minutes: Option<i64>,
    pub default_channel: Option<String>,
    /// Replaces the whole channel table
    pub channels: Option<Vec<ChannelSpec>>,
    /// Appended to (or replacing same-named entries of) the channel table
    #[serde(default)]
    pub extra_channels: Vec<ChannelSpec>,
}

impl FamilyOverride {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidFamily(e.to_string()))
    }

    /// Apply on top of `base`, returning the merged and validated result.
    pub fn apply(self, base: &FamilyConfig) -> ConfigResult<FamilyConfig> {
        let mut merged = base.clone();
        if let Some(v) = self.collection_id {
            merged.collection_id = v;
        }
        if let Some(v) = self.reader_id {
            merged.reader_id = v;
        }
        if let Some(v) = self.output_tag {
            merged.output_tag = v;
        }
        if let Some(v) = self.layout {
            merged.layout = v;
        }
        if let Some(v) = self.timestamp {
            merged.timestamp = v;
        }
        if let Some(v) = self.region_table {
            merged.region_table = v;
        }
        if let Some(v) = self.default_sizing {
            merged.default_sizing = v;
        }
        if let Some(v) = self.lookback_minutes {
            merged.lookback_minutes = v;
        }
        if let Some(v) = self.default_channel {
            merged.default_channel = v;
        }
        if let Some(v) = self.channels {
            merged.channels = v;
        }
        for extra in self.extra_channels {
            match merged
                .channels
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(&extra.name))
            {
                Some(existing) => *existing = extra,
                None => merged.channels.push(extra),
            }
        }
        merged.validate()?;
        Ok(merged)
    }
}

/// Effective configuration of every family.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    mtg: FamilyConfig,
    msg: FamilyConfig,
    msg_rss: FamilyConfig,
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FamilyRegistry {
    pub fn builtin() -> Self {
        Self {
            mtg: FamilyConfig::builtin(SatelliteFamily::Mtg),
            msg: FamilyConfig::builtin(SatelliteFamily::Msg),
            msg_rss: FamilyConfig::builtin(SatelliteFamily::MsgRss),
        }
    }

    /// Built-ins with overrides from `{config_dir}/families/*.yaml` applied.
    ///
    /// A missing directory is not an error. A file that fails to load or
    /// validate is logged and skipped.
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let mut registry = Self::builtin();
        let families_dir = config_dir.join("families");

        if !families_dir.exists() {
            debug!(path = %families_dir.display(), "Family config directory not found, using built-ins");
            return Ok(registry);
        }

        let read_dir = std::fs::read_dir(&families_dir).map_err(|source| ConfigError::Io {
            path: families_dir.clone(),
            source,
        })?;
        let mut paths: Vec<_> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "yaml" || ext == "yml"))
            .collect();
        paths.sort();

        let mut applied = 0;
        for path in paths {
            match FamilyOverride::load(&path).and_then(|o| registry.apply(o)) {
                Ok(family) => {
                    info!(family = %family, path = %path.display(), "Loaded family override");
                    applied += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load family config");
                }
            }
        }

        info!(count = applied, "Loaded family overrides");
        Ok(registry)
    }

    fn apply(&mut self, over: FamilyOverride) -> ConfigResult<SatelliteFamily> {
        let family = over.family;
        let merged = over.apply(self.get(family))?;
        *self.slot(family) = merged;
        Ok(family)
    }

    pub fn get(&self, family: SatelliteFamily) -> &FamilyConfig {
        match family {
            SatelliteFamily::Mtg => &self.mtg,
            SatelliteFamily::Msg => &self.msg,
            SatelliteFamily::MsgRss => &self.msg_rss,
        }
    }

    fn slot(&mut self, family: SatelliteFamily) -> &mut FamilyConfig {
        match family {
            SatelliteFamily::Mtg => &mut self.mtg,
            SatelliteFamily::Msg => &mut self.msg,
            SatelliteFamily::MsgRss => &mut self.msg_rss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::write_fixture_file;

    #[test]
    fn test_parse_override() {
        let yaml = r#"
family: msg-rss
lookback_minutes: 30
extra_channels:
  - name: IR_108_fine
    bands: [IR_108]
    gsd_m: 1500
"#;
        let over = FamilyOverride::parse(yaml).unwrap();
        let merged = over
            .apply(&FamilyConfig::builtin(SatelliteFamily::MsgRss))
            .unwrap();
        assert_eq!(merged.lookback_minutes, 30);
        assert_eq!(merged.channel("ir_108_fine").unwrap().gsd_m, 1500.0);
        assert_eq!(merged.collection_id, "EO:EUM:DAT:MSG:MSG15-RSS");
    }

    #[test]
    fn test_extra_channel_replaces_same_name() {
        let yaml = "family: mtg\nextra_channels:\n  - {name: VIS_06, bands: [vis_06], gsd_m: 1000}\n";
        let merged = FamilyOverride::parse(yaml)
            .unwrap()
            .apply(&FamilyConfig::builtin(SatelliteFamily::Mtg))
            .unwrap();
        assert_eq!(merged.channels.len(), 4);
        let vis = merged.channel("vis_06").unwrap();
        assert_eq!(vis.gsd_m, 1000.0);
        assert_eq!(vis.display_scale, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(FamilyOverride::parse("family: mtg\nlookback: 5\n").is_err());
    }

    #[test]
    fn test_missing_dir_gives_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FamilyRegistry::load(dir.path()).unwrap();
        assert_eq!(
            registry.get(SatelliteFamily::Mtg),
            &FamilyConfig::builtin(SatelliteFamily::Mtg)
        );
    }

    #[test]
    fn test_invalid_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let families = dir.path().join("families");
        std::fs::create_dir(&families).unwrap();
        write_fixture_file(&families, "a.yaml", "family: msg\nlookback_minutes: 45\n");
        write_fixture_file(&families, "b.yaml", "family: mtg\nregion_table: nowhere\n");
        write_fixture_file(&families, "c.yaml", "not: [valid");
        write_fixture_file(&families, "notes.txt", "family: mtg\nlookback_minutes: 1\n");

        let registry = FamilyRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.get(SatelliteFamily::Msg).lookback_minutes, 45);
        assert_eq!(registry.get(SatelliteFamily::Mtg).region_table, "europe_macro");
        assert_eq!(registry.get(SatelliteFamily::Mtg).lookback_minutes, 20);
    }
}
