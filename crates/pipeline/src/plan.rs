//! Turning user inputs into an immutable run plan.
//!
//! Everything here happens before the first network request, so every
//! failure is a [`ConfigError`].

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use illumination::IlluminationGate;
use region::{resolve, select_for_region, FootprintCatalog, GridSizing, RegionSpec, ResolvedArea};
use renderer::RenderMode;
use sat_common::TimeWindow;
use tracing::{debug, info, warn};

use crate::config::FamilyRegistry;
use crate::error::{ConfigError, ConfigResult};
use crate::family::{ChannelSpec, DefaultSizing, FamilyConfig, ProductLayout, SatelliteFamily};

/// User inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Channel name; the family default when `None`
    pub channel: Option<String>,
    pub region: RegionSpec,
    /// Forces aspect-preserving sizing
    pub base_pixels: Option<usize>,
    /// Minimum sun elevation in degrees; no gate when `None`
    pub sun_angle: Option<f64>,
    pub sun_lat: Option<f64>,
    pub sun_lon: Option<f64>,
    /// Footprint catalog, read only when a chunk set must be computed
    pub chunk_catalog: PathBuf,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Search window of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowMode {
    Range(TimeWindow),
    /// `[now - lookback, now]`, first product only
    Latest { lookback: Duration },
}

impl WindowMode {
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        match *self {
            Self::Range(window) => window,
            Self::Latest { lookback } => TimeWindow::latest(now, lookback),
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest { .. })
    }
}

/// Fully validated inputs of a run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub family: FamilyConfig,
    pub channel: ChannelSpec,
    pub area: ResolvedArea,
    /// Selected chunk ids; empty for full-disk layouts
    pub chunks: Vec<String>,
    pub gate: IlluminationGate,
    pub window: WindowMode,
}

/// Validate a request against a family configuration.
pub fn plan(family: &FamilyConfig, request: &RunRequest) -> ConfigResult<RunPlan> {
    let channel = family
        .channel(request.channel.as_deref().unwrap_or(&family.default_channel))?
        .clone();
    let table = family.regions()?;

    let sizing = match (request.base_pixels, family.default_sizing) {
        (Some(base_pixels), _) => GridSizing::AspectPreserving { base_pixels },
        (None, DefaultSizing::Aspect { base_pixels }) => GridSizing::AspectPreserving { base_pixels },
        (None, DefaultSizing::Metric) => GridSizing::Metric { gsd_m: channel.gsd_m },
    };
    let area = resolve(&request.region, sizing, table)?;

    let chunks = match family.layout {
        ProductLayout::Chunked if area.static_chunks.is_some() => select_for_region(&area, None)?,
        ProductLayout::Chunked => {
            let catalog = FootprintCatalog::load(&request.chunk_catalog)?;
            select_for_region(&area, Some(&catalog))?
        }
        ProductLayout::FullDisk { .. } => Vec::new(),
    };

    let (ref_lat, ref_lon) = match (request.sun_lat, request.sun_lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        (None, None) => (area.mean_lat, area.mean_lon),
        _ => return Err(ConfigError::IncompleteSunReference),
    };
    let gate = IlluminationGate::new(request.sun_angle, ref_lat, ref_lon)?;

    let window = match (&request.start, &request.end) {
        (Some(start), Some(end)) => WindowMode::Range(TimeWindow::parse(start, end)?),
        (None, None) => WindowMode::Latest {
            lookback: Duration::minutes(family.lookback_minutes),
        },
        _ => return Err(ConfigError::IncompleteTimeWindow),
    };

    debug!(
        width = area.grid.width,
        height = area.grid.height,
        gsd_m = area.grid.ground_sampling_distance_m,
        "Resolved target grid"
    );
    info!(
        family = %family.family,
        channel = %channel.name,
        region = %area.canonical_name,
        chunks = ?chunks,
        sun_threshold = ?request.sun_angle,
        "Run planned"
    );

    Ok(RunPlan {
        family: family.clone(),
        channel,
        area,
        chunks,
        gate,
        window,
    })
}

/// Plan a run for `family`, switching to the family that serves the
/// request's region when that family carries the requested channel.
pub fn plan_routed(registry: &FamilyRegistry, family: SatelliteFamily, request: &RunRequest) -> ConfigResult<RunPlan> {
    let requested = registry.get(family);
    let routed = family.route(&request.region);
    if routed != family {
        let target = registry.get(routed);
        let channel = request.channel.as_deref().unwrap_or(&requested.default_channel);
        if target.channel(channel).is_ok() {
            info!(
                from = %family,
                to = %routed,
                collection = %target.collection_id,
                "Region is served by another collection"
            );
            return plan(target, &RunRequest {
                channel: Some(channel.to_string()),
                ..request.clone()
            });
        }
        warn!(
            family = %family,
            rerouted = %routed,
            channel = %channel,
            "Channel missing from the rerouted collection, keeping the requested family"
        );
    }
    plan(requested, request)
}

/// Rendering used when the user picks no stretch.
pub fn default_render_mode(channel: &ChannelSpec) -> RenderMode {
    match channel.display_scale {
        Some(multiplier) => RenderMode::FixedScale { multiplier },
        None => RenderMode::default(),
    }
}
