//! Tile selection for a resolved area.

use sat_common::BoundingBox;
use tracing::{debug, info};

use crate::error::{RegionError, RegionResult};
use crate::footprint::FootprintCatalog;
use crate::polygon::rect_intersects_ring;
use crate::resolver::ResolvedArea;

/// Tile ids, in catalog order, whose footprint touches the closed bbox.
pub fn select(bbox: &BoundingBox, catalog: &FootprintCatalog) -> RegionResult<Vec<String>> {
    let selected: Vec<String> = catalog
        .iter()
        .filter(|fp| fp.rings.iter().any(|ring| rect_intersects_ring(bbox, ring)))
        .map(|fp| fp.tile_id.clone())
        .collect();

    if selected.is_empty() {
        return Err(RegionError::NoCoverage(bbox.tag()));
    }
    debug!(bbox = %bbox.tag(), tiles = ?selected, "Selected tiles by footprint intersection");
    Ok(selected)
}

/// Static chunk set for named regions that carry one, live intersection
/// against the catalog otherwise.
pub fn select_for_region(area: &ResolvedArea, catalog: Option<&FootprintCatalog>) -> RegionResult<Vec<String>> {
    if let Some(chunks) = &area.static_chunks {
        info!(region = %area.canonical_name, chunks = ?chunks, "Using static chunk set");
        return Ok(chunks.clone());
    }
    let catalog = catalog.ok_or_else(|| RegionError::CatalogRequired(area.canonical_name.clone()))?;
    let selected = select(&area.bbox, catalog).map_err(|e| match e {
        RegionError::NoCoverage(_) => RegionError::NoCoverage(area.canonical_name.clone()),
        other => other,
    })?;
    info!(region = %area.canonical_name, chunks = ?selected, "Selected chunks by intersection");
    Ok(selected)
}
