//! Common types shared across the satfetch crates.

pub mod bbox;
pub mod grid;
pub mod time;

pub use bbox::{BboxError, BoundingBox};
pub use grid::{GridProjection, PixelGrid};
pub use time::{TimeParseError, TimeWindow, CLI_TIME_FORMAT, OUTPUT_TIME_FORMAT};
