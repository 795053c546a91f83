//! Geographic bounding box in WGS84 degrees.

use serde::{Deserialize, Serialize};

/// A lon/lat bounding box.
///
/// Always non-degenerate: `lon_min < lon_max` and `lat_min < lat_max`.
/// The full-globe box (-180, -90, 180, 90) is a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Create a validated bounding box from corner coordinates.
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Result<Self, BboxError> {
        let corners = [lon_min, lat_min, lon_max, lat_max];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(BboxError::NonFinite);
        }
        if !(-180.0..=180.0).contains(&lon_min) || !(-180.0..=180.0).contains(&lon_max) {
            return Err(BboxError::OutOfRange(format!(
                "longitude must be within [-180, 180], got {lon_min}..{lon_max}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(BboxError::OutOfRange(format!(
                "latitude must be within [-90, 90], got {lat_min}..{lat_max}"
            )));
        }
        if lon_min >= lon_max || lat_min >= lat_max {
            return Err(BboxError::Degenerate {
                lon_min,
                lat_min,
                lon_max,
                lat_max,
            });
        }

        Ok(Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        })
    }

    /// Build a box from trusted catalog constants without validation.
    pub const fn from_corners_unchecked(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        }
    }

    /// The whole-Earth sentinel box.
    pub const fn full_globe() -> Self {
        Self::from_corners_unchecked(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn is_full_globe(&self) -> bool {
        *self == Self::full_globe()
    }

    /// Longitude extent in degrees.
    pub fn delta_lon(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Latitude extent in degrees.
    pub fn delta_lat(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Centroid as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }

    /// Check if a point is contained within this bbox (edges included).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    /// Closed `(lon, lat)` ring through the four corners, clockwise.
    pub fn corner_ring(&self) -> [(f64, f64); 5] {
        [
            (self.lon_min, self.lat_min),
            (self.lon_min, self.lat_max),
            (self.lon_max, self.lat_max),
            (self.lon_max, self.lat_min),
            (self.lon_min, self.lat_min),
        ]
    }

    /// File name fragment for a custom box, e.g. `LON-10.0S4.5_LAT35.0S44.5`.
    pub fn tag(&self) -> String {
        format!(
            "LON{:?}S{:?}_LAT{:?}S{:?}",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("Bounding box coordinates must be finite")]
    NonFinite,

    #[error("Bounding box out of range: {0}")]
    OutOfRange(String),

    #[error(
        "Degenerate bounding box ({lon_min}, {lat_min}, {lon_max}, {lat_max}): min must be below max on both axes"
    )]
    Degenerate {
        lon_min: f64,
        lat_min: f64,
        lon_max: f64,
        lat_max: f64,
    },
}
