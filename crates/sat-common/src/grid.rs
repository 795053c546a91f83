//! Target pixel grids for resampled scenes.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Projection of a target grid. Only plate carrée is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridProjection {
    /// Regular lat/lon grid (`+proj=latlong +datum=WGS84`)
    Equirectangular,
}

/// A regular output grid covering a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelGrid {
    /// Number of columns (always >= 1)
    pub width: usize,
    /// Number of rows (always >= 1)
    pub height: usize,
    /// Ground size of one pixel in meters
    pub ground_sampling_distance_m: f64,
    pub projection: GridProjection,
    /// Geographic extent the grid is laid over
    pub bbox: BoundingBox,
}

impl PixelGrid {
    /// Create a grid, clamping both dimensions to at least one pixel.
    pub fn new(width: usize, height: usize, ground_sampling_distance_m: f64, bbox: BoundingBox) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ground_sampling_distance_m,
            projection: GridProjection::Equirectangular,
            bbox,
        }
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel size in degrees as `(dlon, dlat)`.
    pub fn resolution_degrees(&self) -> (f64, f64) {
        (
            self.bbox.delta_lon() / self.width as f64,
            self.bbox.delta_lat() / self.height as f64,
        )
    }
}
