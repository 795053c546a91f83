//! Tests for tile footprint loading and selection.

use region::{
    resolve, select, select_for_region, FootprintCatalog, GridSizing, RegionError, RegionSpec, EUROPE_MACRO,
};
use sat_common::BoundingBox;
use test_utils::fixtures::{bbox, footprints};

fn fixture_catalog() -> FootprintCatalog {
    FootprintCatalog::parse(&footprints::catalog_text()).unwrap()
}

fn to_bbox(b: (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(b.0, b.1, b.2, b.3).unwrap()
}

// ============================================================================
// Catalog loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let dir = test_utils::temp_dir();
    let path = test_utils::write_fixture_file(dir.path(), "FCI_chunks.wkt", &footprints::catalog_text());
    let catalog = FootprintCatalog::load(&path).unwrap();
    assert_eq!(catalog.len(), footprints::BANDS.len());
    assert!(catalog.get("0034").is_some());
}

#[test]
fn test_missing_catalog() {
    let dir = test_utils::temp_dir();
    let result = FootprintCatalog::load(&dir.path().join("absent.wkt"));
    assert!(matches!(result, Err(RegionError::CatalogNotFound(_))));
}

#[test]
fn test_blank_lines_ignored() {
    let text = format!("\n{}\n\n", footprints::catalog_text());
    assert_eq!(FootprintCatalog::parse(&text).unwrap().len(), footprints::BANDS.len());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_select_iberia() {
    let chunks = select(&to_bbox(bbox::IBERIA), &fixture_catalog()).unwrap();
    assert_eq!(chunks, vec!["0033", "0034", "0035", "0036"]);
}

#[test]
fn test_select_small_island() {
    let chunks = select(&to_bbox(bbox::MALLORCA), &fixture_catalog()).unwrap();
    assert_eq!(chunks, vec!["0034", "0035"]);
}

#[test]
fn test_select_touching_edge_included() {
    // Top edge sits exactly on the 0033/0034 boundary
    let b = BoundingBox::new(0.0, 36.0, 1.0, 38.0).unwrap();
    assert_eq!(select(&b, &fixture_catalog()).unwrap(), vec!["0033", "0034"]);
}

#[test]
fn test_select_no_coverage() {
    let result = select(&to_bbox(bbox::OPEN_PACIFIC), &fixture_catalog());
    assert!(matches!(result, Err(RegionError::NoCoverage(_))));
}

#[test]
fn test_static_sets_match_live_intersection() {
    let catalog = fixture_catalog();
    for region in EUROPE_MACRO.regions {
        let live = select(&region.bbox, &catalog).unwrap();
        assert_eq!(live, region.chunks, "chunk mismatch for {}", region.id);
    }
}

#[test]
fn test_select_for_region_prefers_static_set() {
    let area = resolve(
        &RegionSpec::Named("mallorca".to_string()),
        GridSizing::Metric { gsd_m: 500.0 },
        &EUROPE_MACRO,
    )
    .unwrap();
    // No catalog needed for a named region
    assert_eq!(select_for_region(&area, None).unwrap(), vec!["0034", "0035"]);
}

#[test]
fn test_select_for_custom_box_needs_catalog() {
    let area = resolve(
        &RegionSpec::BoundingBox(to_bbox(bbox::MALLORCA)),
        GridSizing::Metric { gsd_m: 500.0 },
        &EUROPE_MACRO,
    )
    .unwrap();
    assert!(matches!(
        select_for_region(&area, None),
        Err(RegionError::CatalogRequired(_))
    ));
    let catalog = fixture_catalog();
    assert_eq!(select_for_region(&area, Some(&catalog)).unwrap(), vec!["0034", "0035"]);
}
