//! Error types for archive access.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Consumer key or secret missing or empty.
    #[error("Missing archive credentials: {0}")]
    MissingCredentials(String),

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Unexpected archive response: {0}")]
    Decode(String),

    #[error("Invalid archive URL: {0}")]
    InvalidUrl(String),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
