//! Error types for region resolution and tile selection.

use std::path::PathBuf;

use projection::GeodesicError;
use sat_common::BboxError;
use thiserror::Error;

/// Errors raised while resolving a region or selecting tiles.
///
/// All of these are configuration problems: they surface before any
/// archive traffic happens.
#[derive(Error, Debug)]
pub enum RegionError {
    /// Region name not present in the family's table.
    #[error("Unknown region '{name}'. Valid regions: {valid}")]
    UnknownRegion { name: String, valid: String },

    #[error("No region given: use --region, the four bbox corners, or --center-lat/--center-lon/--half-side-km")]
    MissingRegionSpec,

    #[error("Conflicting region inputs: {0}")]
    ConflictingRegionSpec(String),

    #[error("Incomplete region input: {0}")]
    IncompleteRegionSpec(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(#[from] BboxError),

    #[error("Geodesic computation failed: {0}")]
    Geodesic(#[from] GeodesicError),

    #[error("Invalid grid sizing: {0}")]
    InvalidSizing(String),

    /// A centre/radius square that would wrap across the antimeridian or a pole.
    #[error("Area around ({lat}, {lon}) crosses the {boundary}; pick a smaller radius or an explicit bbox")]
    WrapsAround { lat: f64, lon: f64, boundary: &'static str },

    /// Tile footprint catalog file missing.
    #[error("Tile footprint catalog not found: {0}")]
    CatalogNotFound(PathBuf),

    #[error("Failed to read tile footprint catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed catalog line.
    #[error("Tile footprint catalog line {line}: {message}")]
    CatalogParse { line: usize, message: String },

    /// A region without static chunks needs the footprint catalog.
    #[error("Region '{0}' needs the tile footprint catalog for live intersection")]
    CatalogRequired(String),

    /// No tile intersects the requested area.
    #[error("No tile footprint intersects region {0}")]
    NoCoverage(String),
}

pub type RegionResult<T> = Result<T, RegionError>;
