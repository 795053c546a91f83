//! Sun elevation and the illumination gate.
//!
//! The gate decides, per product timestamp, whether the scene is lit
//! enough to be worth downloading.

pub mod gate;
pub mod solar;

pub use gate::{IlluminationDecision, IlluminationGate};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IlluminationError {
    #[error("Invalid location for solar position: lat={lat}, lon={lon}")]
    InvalidLocation { lat: f64, lon: f64 },

    #[error("Invalid sun elevation threshold: {0}")]
    InvalidThreshold(f64),
}

pub type IlluminationResult<T> = Result<T, IlluminationError>;
