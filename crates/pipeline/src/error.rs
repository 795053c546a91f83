//! Error taxonomy for a pipeline run.
//!
//! - [`ConfigError`]: bad inputs, raised before any network traffic. Fatal.
//! - [`PipelineError::Discovery`]: the archive search failed. Fatal.
//! - [`EntryError`]: one work unit failed. Logged, the run continues.
//! - [`CleanupError`]: scratch removal failed. Logged at warn only.

use std::path::PathBuf;

use archive::ArchiveError;
use decoder::DecodeError;
use illumination::IlluminationError;
use region::RegionError;
use renderer::RenderError;
use sat_common::TimeParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("Unknown channel '{channel}'. Valid channels: {valid}")]
    UnknownChannel { channel: String, valid: String },

    #[error("Unknown satellite family '{0}'. Valid families: mtg, msg, msg-rss")]
    UnknownFamily(String),

    #[error("Invalid family configuration: {0}")]
    InvalidFamily(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(#[from] TimeParseError),

    #[error("--start and --end must be given together")]
    IncompleteTimeWindow,

    #[error("--sun-lat and --sun-lon must be given together")]
    IncompleteSunReference,

    #[error("Invalid illumination settings: {0}")]
    Illumination(#[from] IlluminationError),

    #[error("Invalid render settings: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Credentials(ArchiveError),

    #[error("Cannot use directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Product discovery failed: {0}")]
    Discovery(#[source] ArchiveError),
}

/// Failure of a single work unit.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error("Cannot parse timestamp from '{entry}': {message}")]
    TimestampParse { entry: String, message: String },

    #[error("No entry of product {0} has a parseable timestamp")]
    NoTimestamp(String),

    #[error("Sun elevation computation failed: {0}")]
    Illumination(#[from] IlluminationError),

    #[error("Download of '{entry}' failed after {attempts} attempts: {message}")]
    Download {
        entry: String,
        attempts: u32,
        message: String,
    },

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Decoder returned no data for band '{0}'")]
    MissingBand(String),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Scratch directory error: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Failure while deleting scratch files.
#[derive(Error, Debug)]
#[error("Failed to remove scratch path {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type EntryResult<T> = Result<T, EntryError>;
