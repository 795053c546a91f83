//! Region to pixel-grid resolution.

use projection::{geodesic, mercator};
use sat_common::{BoundingBox, PixelGrid};
use tracing::debug;

use crate::catalog::RegionTable;
use crate::error::{RegionError, RegionResult};

/// How the user described the area of interest.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionSpec {
    /// Identifier in the family's named-region table
    Named(String),
    BoundingBox(BoundingBox),
    /// Square of `2 * half_side_km` around a centre point
    CenterRadius { lat: f64, lon: f64, half_side_km: f64 },
}

/// Raw optional region inputs, as they come off the command line.
#[derive(Debug, Clone, Default)]
pub struct RegionParts {
    pub region: Option<String>,
    pub lon_min: Option<f64>,
    pub lat_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub lat_max: Option<f64>,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub half_side_km: Option<f64>,
}

impl RegionSpec {
    /// Assemble exactly one region kind from the optional inputs.
    pub fn from_parts(parts: &RegionParts) -> RegionResult<Self> {
        let bbox_fields = [parts.lon_min, parts.lat_min, parts.lon_max, parts.lat_max];
        let center_fields = [parts.center_lat, parts.center_lon, parts.half_side_km];

        let bbox_given = bbox_fields.iter().filter(|v| v.is_some()).count();
        let center_given = center_fields.iter().filter(|v| v.is_some()).count();

        let mut kinds = Vec::new();
        if parts.region.is_some() {
            kinds.push("region name");
        }
        if bbox_given > 0 {
            kinds.push("bounding box");
        }
        if center_given > 0 {
            kinds.push("centre and half side");
        }

        match kinds.len() {
            0 => return Err(RegionError::MissingRegionSpec),
            1 => {}
            _ => return Err(RegionError::ConflictingRegionSpec(kinds.join(" + "))),
        }

        if let Some(name) = &parts.region {
            return Ok(Self::Named(name.clone()));
        }

        if bbox_given > 0 {
            return match bbox_fields {
                [Some(lon_min), Some(lat_min), Some(lon_max), Some(lat_max)] => Ok(Self::BoundingBox(
                    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)?,
                )),
                _ => Err(RegionError::IncompleteRegionSpec(
                    "all of --lon-min, --lat-min, --lon-max, --lat-max are required".to_string(),
                )),
            };
        }

        match center_fields {
            [Some(lat), Some(lon), Some(half_side_km)] => Ok(Self::CenterRadius {
                lat,
                lon,
                half_side_km,
            }),
            _ => Err(RegionError::IncompleteRegionSpec(
                "--center-lat, --center-lon and --half-side-km must be given together".to_string(),
            )),
        }
    }
}

/// Grid sizing rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridSizing {
    /// Pixel count from Web Mercator extent divided by a fixed GSD
    Metric { gsd_m: f64 },
    /// Longest side gets `base_pixels`, the other follows the degree aspect
    AspectPreserving { base_pixels: usize },
}

/// A fully resolved target area.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArea {
    pub bbox: BoundingBox,
    pub grid: PixelGrid,
    /// Region id, bbox tag or `custom_{lat}_{lon}`; used in file names
    pub canonical_name: String,
    pub mean_lon: f64,
    pub mean_lat: f64,
    /// Static chunk ids of a named region, if the table has any
    pub static_chunks: Option<Vec<String>>,
}

/// Resolve a region against a named-region table and a sizing rule.
pub fn resolve(spec: &RegionSpec, sizing: GridSizing, table: &RegionTable) -> RegionResult<ResolvedArea> {
    let area = match spec {
        RegionSpec::Named(name) => {
            let region = table.get(name).ok_or_else(|| RegionError::UnknownRegion {
                name: name.clone(),
                valid: table.ids().join(", "),
            })?;
            let (mean_lon, mean_lat) = region.bbox.center();
            ResolvedArea {
                bbox: region.bbox,
                grid: size_grid(&region.bbox, sizing)?,
                canonical_name: region.id.to_string(),
                mean_lon,
                mean_lat,
                static_chunks: (!region.chunks.is_empty())
                    .then(|| region.chunks.iter().map(|c| c.to_string()).collect()),
            }
        }
        RegionSpec::BoundingBox(bbox) => {
            let (mean_lon, mean_lat) = bbox.center();
            ResolvedArea {
                bbox: *bbox,
                grid: size_grid(bbox, sizing)?,
                canonical_name: bbox.tag(),
                mean_lon,
                mean_lat,
                static_chunks: None,
            }
        }
        RegionSpec::CenterRadius {
            lat,
            lon,
            half_side_km,
        } => {
            let bbox = square_around(*lat, *lon, *half_side_km)?;
            let grid = match sizing {
                GridSizing::AspectPreserving { base_pixels } => {
                    let n = checked_base(base_pixels)?;
                    PixelGrid::new(n, n, mercator_gsd(&bbox, n), bbox)
                }
                GridSizing::Metric { .. } => size_grid(&bbox, sizing)?,
            };
            ResolvedArea {
                bbox,
                grid,
                canonical_name: format!("custom_{:.2}_{:.2}", lat, lon),
                mean_lon: *lon,
                mean_lat: *lat,
                static_chunks: None,
            }
        }
    };

    debug!(
        region = %area.canonical_name,
        width = area.grid.width,
        height = area.grid.height,
        gsd_m = area.grid.ground_sampling_distance_m,
        "Resolved region"
    );
    Ok(area)
}

/// Box through the four points `half_side_km` away at bearings 0/90/180/270.
fn square_around(lat: f64, lon: f64, half_side_km: f64) -> RegionResult<BoundingBox> {
    if !half_side_km.is_finite() || half_side_km <= 0.0 {
        return Err(RegionError::InvalidSizing(format!(
            "half side must be a positive number of km, got {half_side_km}"
        )));
    }
    let distance = half_side_km * 1000.0;

    let mut lats = Vec::with_capacity(4);
    let mut lons = Vec::with_capacity(4);
    for azimuth in [0.0, 90.0, 180.0, 270.0] {
        let (plat, plon) = geodesic::direct(lat, lon, azimuth, distance)?;
        lats.push(plat);
        lons.push(plon);
    }

    // Bearings 0/90/180/270 land at N/E/S/W. The north point looping back
    // south means the square passes over the pole.
    if lats[0] <= lat || lats[2] >= lat {
        return Err(RegionError::WrapsAround {
            lat,
            lon,
            boundary: "pole",
        });
    }
    if lons[1] < lons[3] {
        return Err(RegionError::WrapsAround {
            lat,
            lon,
            boundary: "antimeridian",
        });
    }

    let fold = |v: &[f64], init: f64, f: fn(f64, f64) -> f64| v.iter().copied().fold(init, f);
    Ok(BoundingBox::new(
        fold(&lons, f64::INFINITY, f64::min),
        fold(&lats, f64::INFINITY, f64::min),
        fold(&lons, f64::NEG_INFINITY, f64::max),
        fold(&lats, f64::NEG_INFINITY, f64::max),
    )?)
}

fn size_grid(bbox: &BoundingBox, sizing: GridSizing) -> RegionResult<PixelGrid> {
    match sizing {
        GridSizing::Metric { gsd_m } => {
            if !gsd_m.is_finite() || gsd_m <= 0.0 {
                return Err(RegionError::InvalidSizing(format!(
                    "ground sampling distance must be positive, got {gsd_m}"
                )));
            }
            let (dx, dy) = mercator::extent(bbox.lon_min, bbox.lat_min, bbox.lon_max, bbox.lat_max);
            let width = (dx / gsd_m).floor() as usize;
            let height = (dy / gsd_m).floor() as usize;
            Ok(PixelGrid::new(width, height, gsd_m, *bbox))
        }
        GridSizing::AspectPreserving { base_pixels } => {
            let n = checked_base(base_pixels)?;
            let (dlon, dlat) = (bbox.delta_lon(), bbox.delta_lat());
            let (width, height) = if dlon > dlat {
                (n, (n as f64 * dlat / dlon).floor() as usize)
            } else {
                ((n as f64 * dlon / dlat).floor() as usize, n)
            };
            let width = width.max(1);
            Ok(PixelGrid::new(width, height, mercator_gsd(bbox, width), *bbox))
        }
    }
}

fn checked_base(base_pixels: usize) -> RegionResult<usize> {
    if base_pixels == 0 {
        return Err(RegionError::InvalidSizing("base pixel dimension must be at least 1".to_string()));
    }
    Ok(base_pixels)
}

/// Mercator width in metres divided by the pixel width.
fn mercator_gsd(bbox: &BoundingBox, width: usize) -> f64 {
    let (dx, _) = mercator::extent(bbox.lon_min, bbox.lat_min, bbox.lon_max, bbox.lat_max);
    dx / width.max(1) as f64
}
