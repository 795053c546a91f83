//! Illumination gate.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::solar::{self, validate_location};
use crate::{IlluminationError, IlluminationResult};

/// Outcome of evaluating the gate for one timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IlluminationDecision {
    /// `None` when no threshold is configured and nothing was computed
    pub elevation_degrees: Option<f64>,
    pub keep: bool,
}

/// Keep-or-skip rule on sun elevation at a fixed reference point.
///
/// Built once at startup and shared by reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IlluminationGate {
    threshold_degrees: Option<f64>,
    reference_lat: f64,
    reference_lon: f64,
}

impl IlluminationGate {
    pub fn new(threshold_degrees: Option<f64>, reference_lat: f64, reference_lon: f64) -> IlluminationResult<Self> {
        if let Some(threshold) = threshold_degrees {
            if !threshold.is_finite() {
                return Err(IlluminationError::InvalidThreshold(threshold));
            }
        }
        validate_location(reference_lat, reference_lon)?;
        Ok(Self {
            threshold_degrees,
            reference_lat,
            reference_lon,
        })
    }

    /// A gate that keeps everything.
    pub fn disabled() -> Self {
        Self {
            threshold_degrees: None,
            reference_lat: 0.0,
            reference_lon: 0.0,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold_degrees
    }

    /// Reference point as `(lat, lon)`.
    pub fn reference(&self) -> (f64, f64) {
        (self.reference_lat, self.reference_lon)
    }

    pub fn evaluate(&self, t: DateTime<Utc>) -> IlluminationResult<IlluminationDecision> {
        let Some(threshold) = self.threshold_degrees else {
            return Ok(IlluminationDecision {
                elevation_degrees: None,
                keep: true,
            });
        };

        let elevation = solar::elevation(t, self.reference_lat, self.reference_lon)?;
        let keep = elevation >= threshold;
        debug!(
            timestamp = %t,
            elevation = elevation,
            threshold = threshold,
            keep = keep,
            "Evaluated sun elevation"
        );
        Ok(IlluminationDecision {
            elevation_degrees: Some(elevation),
            keep,
        })
    }
}
