//! Rendering of resampled satellite fields.
//!
//! Implements:
//! - Percentile, fixed-scale and min/max stretches to 8-bit
//! - JPEG output with width-based resizing
//! - NPY read/write for raw float arrays

pub mod array;
mod atomic;
pub mod error;
pub mod jpeg;
pub mod npy;
pub mod stretch;

pub use array::{RawArray, RenderedImage};
pub use error::{RenderError, RenderResult};
pub use jpeg::{resize_to_width, write_jpeg, DEFAULT_JPEG_QUALITY};
pub use npy::{read_npy, write_npy};
pub use stretch::{render, RenderMode};
