//! Command line arguments and their translation into pipeline inputs.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pipeline::{default_render_mode, ChannelSpec, ConfigError, OutputMode, RunRequest};
use region::{RegionParts, RegionSpec};
use renderer::{RenderMode, DEFAULT_JPEG_QUALITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stretch {
    /// Per-channel percentile clip and rescale
    Percentile,
    /// Multiply by the channel's display constant and clamp
    Fixed,
    /// Global min/max with gamma
    Minmax,
}

#[derive(Parser, Debug)]
#[command(name = "satfetch")]
#[command(about = "Download and render EUMETSAT satellite imagery for a region")]
pub struct Args {
    /// Satellite family: mtg, msg or msg-rss
    #[arg(long, default_value = "mtg")]
    pub family: String,

    /// Window start, UTC (YYYY-MM-DDTHH:MM:SS); omit with --end for the latest product
    #[arg(long)]
    pub start: Option<String>,

    /// Window end, UTC (YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    pub end: Option<String>,

    /// Directory for output images
    #[arg(long, default_value = "imgs")]
    pub output_dir: PathBuf,

    /// Named region of the family's region table
    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon_min: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat_min: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lon_max: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub lat_max: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub center_lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub center_lon: Option<f64>,

    /// Half side of the square around the centre, in km
    #[arg(long)]
    pub half_side_km: Option<f64>,

    /// Band or composite (see --list-channels)
    #[arg(long)]
    pub channel: Option<String>,

    /// Skip products whose sun elevation is below this many degrees
    #[arg(long, allow_negative_numbers = true)]
    pub sun_angle: Option<f64>,

    /// Sun reference latitude (default: region centre)
    #[arg(long, allow_negative_numbers = true)]
    pub sun_lat: Option<f64>,

    /// Sun reference longitude (default: region centre)
    #[arg(long, allow_negative_numbers = true)]
    pub sun_lon: Option<f64>,

    /// Resize rendered images to this width
    #[arg(long)]
    pub width: Option<usize>,

    /// Size the longer side to this many pixels instead of using the channel GSD
    #[arg(long)]
    pub base_pixels: Option<usize>,

    /// Stretch mode (default: fixed for channels with a display constant, else percentile)
    #[arg(long, value_enum)]
    pub stretch: Option<Stretch>,

    #[arg(long, default_value = "1.0")]
    pub qmin: f64,

    #[arg(long, default_value = "99.0")]
    pub qmax: f64,

    #[arg(long, default_value = "1.0")]
    pub gamma: f32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,

    /// Write raw float arrays (.npy) instead of JPEG
    #[arg(long)]
    pub raw: bool,

    /// Root for per-product scratch directories
    #[arg(long, env = "SATFETCH_SCRATCH_DIR", default_value = "/tmp/satfetch-scratch")]
    pub scratch_dir: PathBuf,

    /// WKT footprint catalog of FCI chunks
    #[arg(long, env = "SATFETCH_CHUNK_CATALOG", default_value = "FCI_chunks.wkt")]
    pub chunk_catalog: PathBuf,

    /// Configuration directory (contains families/*.yaml)
    #[arg(long, env = "CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Decode and resample program
    #[arg(long, env = "SATFETCH_DECODER", default_value = "satfetch-decode")]
    pub decoder_program: PathBuf,

    /// Maximum retry attempts per download
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    #[arg(long, env = "EUMETSAT_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: Option<String>,

    #[arg(long, env = "EUMETSAT_CONSUMER_SECRET", hide_env_values = true)]
    pub consumer_secret: Option<String>,

    /// Print the family's channels and exit
    #[arg(long)]
    pub list_channels: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn run_request(&self) -> Result<RunRequest, ConfigError> {
        let region = RegionSpec::from_parts(&RegionParts {
            region: self.region.clone(),
            lon_min: self.lon_min,
            lat_min: self.lat_min,
            lon_max: self.lon_max,
            lat_max: self.lat_max,
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            half_side_km: self.half_side_km,
        })?;

        Ok(RunRequest {
            channel: self.channel.clone(),
            region,
            base_pixels: self.base_pixels,
            sun_angle: self.sun_angle,
            sun_lat: self.sun_lat,
            sun_lon: self.sun_lon,
            chunk_catalog: self.chunk_catalog.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        })
    }

    pub fn output_mode(&self, channel: &ChannelSpec) -> OutputMode {
        if self.raw {
            return OutputMode::Raw;
        }
        let mode = match self.stretch {
            None => default_render_mode(channel),
            Some(Stretch::Percentile) => RenderMode::PercentileStretch {
                qmin: self.qmin,
                qmax: self.qmax,
            },
            Some(Stretch::Fixed) => RenderMode::FixedScale {
                multiplier: channel.display_scale.unwrap_or(1.0),
            },
            Some(Stretch::Minmax) => RenderMode::MinMax { gamma: self.gamma },
        };
        OutputMode::Rendered {
            mode,
            width: self.width,
            quality: self.jpeg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{FamilyConfig, SatelliteFamily};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("satfetch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--region", "iberia"]);
        assert_eq!(args.family, "mtg");
        assert_eq!(args.output_dir, PathBuf::from("imgs"));
        assert_eq!(args.chunk_catalog, PathBuf::from("FCI_chunks.wkt"));
        assert!(!args.raw);
        assert_eq!(args.run_request().unwrap().region, RegionSpec::Named("iberia".to_string()));
    }

    #[test]
    fn test_negative_bbox() {
        let args = parse(&["--lon-min", "-10", "--lat-min", "35", "--lon-max", "4.5", "--lat-max", "44.5"]);
        match args.run_request().unwrap().region {
            RegionSpec::BoundingBox(b) => assert_eq!(b.lon_min, -10.0),
            other => panic!("expected bbox, got {other:?}"),
        }
    }

    #[test]
    fn test_conflicting_region_inputs() {
        let args = parse(&["--region", "iberia", "--center-lat", "40"]);
        assert!(matches!(args.run_request(), Err(ConfigError::Region(_))));
    }

    #[test]
    fn test_output_mode_defaults_follow_channel() {
        let mtg = FamilyConfig::builtin(SatelliteFamily::Mtg);
        let args = parse(&["--region", "iberia", "--width", "800"]);
        assert_eq!(
            args.output_mode(mtg.channel("vis_06").unwrap()),
            OutputMode::Rendered {
                mode: RenderMode::FixedScale { multiplier: 4.0 },
                width: Some(800),
                quality: DEFAULT_JPEG_QUALITY,
            }
        );
        assert!(matches!(
            args.output_mode(mtg.channel("ir_105").unwrap()),
            OutputMode::Rendered {
                mode: RenderMode::PercentileStretch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_explicit_stretch_and_raw() {
        let mtg = FamilyConfig::builtin(SatelliteFamily::Mtg);
        let channel = mtg.channel("vis_06").unwrap();

        let args = parse(&["--region", "iberia", "--stretch", "minmax", "--gamma", "2.2"]);
        assert!(matches!(
            args.output_mode(channel),
            OutputMode::Rendered {
                mode: RenderMode::MinMax { gamma },
                ..
            } if gamma == 2.2
        ));

        let args = parse(&["--region", "iberia", "--raw", "--width", "100"]);
        assert_eq!(args.output_mode(channel), OutputMode::Raw);
    }
}
