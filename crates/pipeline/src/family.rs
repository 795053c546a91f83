//! Satellite family configuration.
//!
//! Every family is described by data: collection, reader, layout, timestamp
//! pattern, region table and channel table. One pipeline serves all of them.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use region::catalog::table_by_name;
use region::{RegionSpec, RegionTable};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::timestamp::TimestampPattern;

/// Supported satellite families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SatelliteFamily {
    /// Meteosat Third Generation, FCI full-disk chunks
    Mtg,
    /// Meteosat Second Generation, SEVIRI full disk
    Msg,
    /// Meteosat Second Generation, SEVIRI rapid scan
    MsgRss,
}

/// Named regions MSG serves from the rapid-scan collection.
pub const RAPID_SCAN_REGIONS: &[&str] = &["greece"];

/// Custom centres inside this lat/lon box go to rapid scan.
const RAPID_SCAN_LAT: RangeInclusive<f64> = 33.0..=44.0;
const RAPID_SCAN_LON: RangeInclusive<f64> = 18.0..=30.0;

impl SatelliteFamily {
    pub const ALL: [SatelliteFamily; 3] = [Self::Mtg, Self::Msg, Self::MsgRss];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mtg => "mtg",
            Self::Msg => "msg",
            Self::MsgRss => "msg-rss",
        }
    }

    /// Family that serves `region` when `self` was asked for.
    ///
    /// Only MSG is rerouted. Bounding boxes never are.
    pub fn route(self, region: &RegionSpec) -> Self {
        match (self, region) {
            (Self::Msg, RegionSpec::Named(id)) if RAPID_SCAN_REGIONS.iter().any(|r| r.eq_ignore_ascii_case(id.trim())) => {
                Self::MsgRss
            }
            (Self::Msg, RegionSpec::CenterRadius { lat, lon, .. })
                if RAPID_SCAN_LAT.contains(lat) && RAPID_SCAN_LON.contains(lon) =>
            {
                Self::MsgRss
            }
            _ => self,
        }
    }
}

impl fmt::Display for SatelliteFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SatelliteFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtg" => Ok(Self::Mtg),
            "msg" => Ok(Self::Msg),
            "msg-rss" | "msg_rss" | "rss" => Ok(Self::MsgRss),
            _ => Err(ConfigError::UnknownFamily(s.to_string())),
        }
    }
}

/// How a product is split into entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductLayout {
    /// Many entries per product, one per latitude chunk (`..._{chunk}.nc`)
    Chunked,
    /// One full-disk file per entry
    FullDisk { extension: String },
}

/// Sizing applied when the user gives no `--base-pixels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultSizing {
    /// Web Mercator extent over the channel GSD
    Metric,
    Aspect { base_pixels: usize },
}

/// One selectable band or composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    /// Decoder band names, in output order (1 or 3)
    pub bands: Vec<String>,
    pub gsd_m: f64,
    /// Fixed display multiplier for the default rendering
    #[serde(default)]
    pub display_scale: Option<f32>,
}

impl ChannelSpec {
    fn single(name: &str, gsd_m: f64) -> Self {
        Self {
            name: name.to_string(),
            bands: vec![name.to_string()],
            gsd_m,
            display_scale: None,
        }
    }
}

/// Per-family settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub family: SatelliteFamily,
    pub collection_id: String,
    pub reader_id: String,
    /// Family fragment of output file names
    pub output_tag: String,
    pub layout: ProductLayout,
    pub timestamp: TimestampPattern,
    /// Name of the built-in region table (`europe_macro` or `countries`)
    pub region_table: String,
    pub default_sizing: DefaultSizing,
    /// Window length of most-recent mode
    pub lookback_minutes: i64,
    pub default_channel: String,
    pub channels: Vec<ChannelSpec>,
}

/// Visible 0.6 µm FCI radiances are dim; this brings them to display range.
pub const FCI_VIS06_DISPLAY_SCALE: f32 = 4.0;

const SEVIRI_BANDS: &[&str] = &[
    "IR_016", "IR_039", "IR_087", "IR_097", "IR_108", "IR_120", "IR_134", "VIS006", "VIS008", "WV_062",
    "WV_073",
];

const SEVIRI_HRV_COMPOSITES: &[&str] = &["hrv_clouds", "hrv_fog", "hrv_severe_storms", "hrv_severe_storms_masked"];

const SEVIRI_COMPOSITES: &[&str] = &[
    "24h_microphysics",
    "airmass",
    "ash",
    "cloud_phase_distinction",
    "cloud_phase_distinction_raw",
    "cloudtop",
    "cloudtop_daytime",
    "colorized_ir_clouds",
    "convection",
    "day_microphysics",
    "day_microphysics_winter",
    "day_severe_storms",
    "day_severe_storms_tropical",
    "dust",
    "fog",
    "green_snow",
    "ir108_3d",
    "ir_cloud_day",
    "ir_overview",
    "ir_sandwich",
    "natural_color",
    "natural_color_nocorr",
    "natural_color_raw",
    "natural_color_raw_with_night_ir",
    "natural_color_with_night_ir",
    "natural_color_with_night_ir_hires",
    "natural_enh",
    "natural_enh_with_night_ir",
    "natural_enh_with_night_ir_hires",
    "natural_with_night_fog",
    "night_fog",
    "night_ir_alpha",
    "night_ir_with_background",
    "night_ir_with_background_hires",
    "night_microphysics",
    "night_microphysics_tropical",
    "overshooting_tops",
    "overview",
    "overview_raw",
    "realistic_colors",
    "rocket_plume_day",
    "rocket_plume_night",
    "snow",
    "vis_sharpened_ir",
];

fn fci_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec {
            display_scale: Some(FCI_VIS06_DISPLAY_SCALE),
            ..ChannelSpec::single("vis_06", 500.0)
        },
        ChannelSpec::single("nir_22", 500.0),
        ChannelSpec::single("ir_38", 1000.0),
        ChannelSpec::single("ir_105", 1000.0),
    ]
}

fn seviri_channels(with_rgb: bool) -> Vec<ChannelSpec> {
    let mut channels = vec![ChannelSpec::single("HRV", 1000.0)];
    channels.extend(SEVIRI_BANDS.iter().map(|b| ChannelSpec::single(b, 3000.0)));
    channels.extend(SEVIRI_HRV_COMPOSITES.iter().map(|c| ChannelSpec::single(c, 1000.0)));
    channels.extend(SEVIRI_COMPOSITES.iter().map(|c| ChannelSpec::single(c, 3000.0)));
    if with_rgb {
        channels.push(ChannelSpec {
            name: "rgb".to_string(),
            bands: vec!["IR_016".to_string(), "VIS008".to_string(), "VIS006".to_string()],
            gsd_m: 3000.0,
            display_scale: None,
        });
    }
    channels
}

impl FamilyConfig {
    /// Built-in configuration of a family.
    pub fn builtin(family: SatelliteFamily) -> Self {
        let seviri_ts = TimestampPattern::seviri_native();
        let full_disk = ProductLayout::FullDisk {
            extension: ".nat".to_string(),
        };
        match family {
            SatelliteFamily::Mtg => Self {
                family,
                collection_id: "EO:EUM:DAT:0665".to_string(),
                reader_id: "fci_l1c_nc".to_string(),
                output_tag: "MTG_FCI".to_string(),
                layout: ProductLayout::Chunked,
                timestamp: TimestampPattern::fci(),
                region_table: "europe_macro".to_string(),
                default_sizing: DefaultSizing::Metric,
                lookback_minutes: 20,
                default_channel: "vis_06".to_string(),
                channels: fci_channels(),
            },
            SatelliteFamily::Msg => Self {
                family,
                collection_id: "EO:EUM:DAT:MSG:HRSEVIRI".to_string(),
                reader_id: "seviri_l1b_native".to_string(),
                output_tag: "MSG_HRSEVIRI".to_string(),
                layout: full_disk,
                timestamp: seviri_ts,
                region_table: "countries".to_string(),
                default_sizing: DefaultSizing::Aspect { base_pixels: 1000 },
                lookback_minutes: 15,
                default_channel: "HRV".to_string(),
                channels: seviri_channels(true),
            },
            SatelliteFamily::MsgRss => Self {
                family,
                collection_id: "EO:EUM:DAT:MSG:MSG15-RSS".to_string(),
                reader_id: "seviri_l1b_native".to_string(),
                output_tag: "MSG_RSS".to_string(),
                layout: full_disk,
                timestamp: seviri_ts,
                region_table: "europe_macro".to_string(),
                default_sizing: DefaultSizing::Metric,
                lookback_minutes: 15,
                default_channel: "HRV".to_string(),
                channels: seviri_channels(false),
            },
        }
    }

    /// Case-insensitive channel lookup.
    pub fn channel(&self, name: &str) -> ConfigResult<&ChannelSpec> {
        let wanted = name.trim();
        self.channels
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownChannel {
                channel: name.to_string(),
                valid: self
                    .channels
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// The family's named-region table.
    pub fn regions(&self) -> ConfigResult<&'static RegionTable> {
        table_by_name(&self.region_table).ok_or_else(|| {
            ConfigError::InvalidFamily(format!(
                "{}: unknown region table '{}'",
                self.family, self.region_table
            ))
        })
    }

    /// Check internal consistency; used for YAML overrides.
    pub fn validate(&self) -> ConfigResult<()> {
        self.regions()?;
        if self.channels.is_empty() {
            return Err(ConfigError::InvalidFamily(format!("{}: no channels", self.family)));
        }
        for channel in &self.channels {
            if !matches!(channel.bands.len(), 1 | 3) {
                return Err(ConfigError::InvalidFamily(format!(
                    "{}: channel '{}' must list 1 or 3 bands, got {}",
                    self.family,
                    channel.name,
                    channel.bands.len()
                )));
            }
            if !(channel.gsd_m.is_finite() && channel.gsd_m > 0.0) {
                return Err(ConfigError::InvalidFamily(format!(
                    "{}: channel '{}' has invalid GSD {}",
                    self.family, channel.name, channel.gsd_m
                )));
            }
        }
        if self.lookback_minutes <= 0 {
            return Err(ConfigError::InvalidFamily(format!(
                "{}: lookback_minutes must be positive",
                self.family
            )));
        }
        if let DefaultSizing::Aspect { base_pixels: 0 } = self.default_sizing {
            return Err(ConfigError::InvalidFamily(format!("{}: base_pixels must be positive", self.family)));
        }
        self.channel(&self.default_channel)?;
        Ok(())
    }

    /// Channel and resolution listing for `--list-channels`.
    pub fn describe_channels(&self) -> String {
        let mut out = format!("Available channels for {} ({}):\n", self.family, self.collection_id);
        for c in &self.channels {
            let mut line = format!("  {:<36} {:>5} m", c.name, c.gsd_m);
            if c.bands.len() > 1 {
                line.push_str(&format!("  bands: {}", c.bands.join(", ")));
            }
            if let Some(scale) = c.display_scale {
                line.push_str(&format!("  display x{scale}"));
            }
            if c.name.eq_ignore_ascii_case(&self.default_channel) {
                line.push_str("  (default)");
            }
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
