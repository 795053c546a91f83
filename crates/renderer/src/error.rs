//! Error types for rendering and array I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Data length or channel count does not match the stated shape.
    #[error("invalid array shape: {0}")]
    InvalidShape(String),

    #[error("invalid render mode: {0}")]
    InvalidMode(String),

    #[error("malformed NPY data: {0}")]
    Npy(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
