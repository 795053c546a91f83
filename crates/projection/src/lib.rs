//! Coordinate transformations used for region sizing.
//!
//! Implements the two transforms we need from scratch without external
//! dependencies: Web Mercator forward projection and the WGS84 direct
//! geodesic problem.

pub mod geodesic;
pub mod mercator;

pub use geodesic::{direct, GeodesicError};

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
