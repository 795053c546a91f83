//! Decode + resample collaborator.
//!
//! Reading level-1 satellite formats and reprojecting them is delegated to
//! an external tool. [`SceneDecoder`] is the seam; [`CommandDecoder`] runs a
//! program that writes one `.npy` file per band.

pub mod command;

pub use command::CommandDecoder;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use renderer::{RawArray, RenderError};
use sat_common::PixelGrid;
use thiserror::Error;

/// What to decode and where to put it.
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    /// Downloaded level-1 files of one work unit
    pub files: Vec<PathBuf>,
    /// Band or composite names, in output order
    pub bands: Vec<String>,
    /// Reader for the file format (e.g. `fci_l1c_nc`)
    pub reader_id: String,
    /// Target grid to resample onto
    pub grid: PixelGrid,
    /// Scratch directory the decoder may write into
    pub work_dir: PathBuf,
}

/// Resampled bands keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResampledScene {
    bands: BTreeMap<String, RawArray>,
}

impl ResampledScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, band: impl Into<String>, array: RawArray) {
        self.bands.insert(band.into(), array);
    }

    pub fn get(&self, band: &str) -> Option<&RawArray> {
        self.bands.get(band)
    }

    pub fn remove(&mut self, band: &str) -> Option<RawArray> {
        self.bands.remove(band)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Nothing to decode: {0}")]
    EmptyRequest(String),

    #[error("Failed to run decoder '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Decoder exited unsuccessfully.
    #[error("Decoder '{program}' failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Decoder produced no output for band '{band}' at {path}")]
    MissingBand { band: String, path: PathBuf },

    /// Band array shape differs from the requested grid.
    #[error("Decoded band '{band}' is {actual_width}x{actual_height}, expected {width}x{height}")]
    GridMismatch {
        band: String,
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Failed to read decoded band '{band}': {source}")]
    ReadBand {
        band: String,
        #[source]
        source: RenderError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Load named channels from files and reproject them onto a grid.
#[async_trait]
pub trait SceneDecoder: Send + Sync {
    async fn decode(&self, request: &DecodeRequest) -> DecodeResult<ResampledScene>;
}
