//! Region handling for satellite product requests.
//!
//! Turns a user region (named, explicit box, or centre plus half side) into
//! a target pixel grid, and picks the raw data tiles whose footprints cover
//! it.

pub mod catalog;
pub mod error;
pub mod footprint;
pub mod polygon;
pub mod resolver;
pub mod selector;

pub use catalog::{NamedRegion, RegionTable, COUNTRIES, EUROPE_MACRO};
pub use error::{RegionError, RegionResult};
pub use footprint::{FootprintCatalog, TileFootprint};
pub use resolver::{resolve, GridSizing, RegionParts, RegionSpec, ResolvedArea};
pub use selector::{select, select_for_region};
