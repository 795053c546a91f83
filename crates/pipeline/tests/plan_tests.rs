//! Tests for run planning: channel, sizing, chunks, gate and window.

use std::path::PathBuf;

use chrono::Duration;
use pipeline::{
    default_render_mode, plan, plan_routed, ConfigError, FamilyConfig, FamilyRegistry, RunRequest, SatelliteFamily,
    WindowMode,
};
use region::{RegionError, RegionSpec};
use renderer::RenderMode;
use sat_common::BoundingBox;
use test_utils::fixtures::{bbox, footprints};
use test_utils::write_fixture_file;
use tokio_test::{assert_err, assert_ok};

fn request(region: RegionSpec) -> RunRequest {
    RunRequest {
        channel: None,
        region,
        base_pixels: None,
        sun_angle: None,
        sun_lat: None,
        sun_lon: None,
        chunk_catalog: PathBuf::from("does-not-exist.wkt"),
        start: None,
        end: None,
    }
}

fn named(id: &str) -> RegionSpec {
    RegionSpec::Named(id.to_string())
}

fn iberia() -> RegionSpec {
    let (a, b, c, d) = bbox::IBERIA;
    RegionSpec::BoundingBox(BoundingBox::new(a, b, c, d).unwrap())
}

#[test]
fn test_defaults_for_mtg() {
    let config = FamilyConfig::builtin(SatelliteFamily::Mtg);
    let run = assert_ok!(plan(&config, &request(named("mallorca"))));

    assert_eq!(run.channel.name, "vis_06");
    assert_eq!(run.chunks, vec!["0034", "0035"]);
    assert_eq!(run.area.grid.ground_sampling_distance_m, 500.0);
    assert_eq!(run.gate.threshold(), None);
    assert_eq!(
        run.window,
        WindowMode::Latest {
            lookback: Duration::minutes(20)
        }
    );
}

#[test]
fn test_base_pixels_forces_aspect_sizing() {
    let config = FamilyConfig::builtin(SatelliteFamily::Mtg);
    let mut req = request(iberia());
    req.base_pixels = Some(1000);
    let dir = tempfile::tempdir().unwrap();
    req.chunk_catalog = write_fixture_file(dir.path(), "chunks.wkt", &footprints::catalog_text());

    let run = assert_ok!(plan(&config, &req));
    assert_eq!((run.area.grid.width, run.area.grid.height), (1000, 655));
}

#[test]
fn test_msg_defaults_to_aspect_1000() {
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let run = assert_ok!(plan(&config, &request(iberia())));
    assert_eq!(run.area.grid.width, 1000);
    assert!(run.chunks.is_empty());
    assert_eq!(run.channel.name, "HRV");
}

#[test]
fn test_custom_box_needs_catalog_for_chunked_layout() {
    let config = FamilyConfig::builtin(SatelliteFamily::Mtg);
    let err = assert_err!(plan(&config, &request(iberia())));
    assert!(matches!(err, ConfigError::Region(RegionError::CatalogNotFound(_))));
}

#[test]
fn test_custom_box_chunks_from_catalog() {
    let config = FamilyConfig::builtin(SatelliteFamily::Mtg);
    let dir = tempfile::tempdir().unwrap();
    let mut req = request(iberia());
    req.chunk_catalog = write_fixture_file(dir.path(), "chunks.wkt", &footprints::catalog_text());

    let run = assert_ok!(plan(&config, &req));
    assert_eq!(run.chunks, vec!["0033", "0034", "0035", "0036"]);
    assert_eq!(run.area.canonical_name, "LON-10.0S4.5_LAT35.0S44.5");
}

#[test]
fn test_unknown_channel_and_region() {
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let mut req = request(named("spain"));
    req.channel = Some("vis_06".to_string());
    assert!(matches!(
        assert_err!(plan(&config, &req)),
        ConfigError::UnknownChannel { .. }
    ));

    let err = assert_err!(plan(&config, &request(named("atlantis"))));
    assert!(matches!(err, ConfigError::Region(RegionError::UnknownRegion { .. })));
}

#[test]
fn test_sun_reference_defaults_to_area_mean() {
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let mut req = request(named("spain"));
    req.sun_angle = Some(5.0);
    let run = assert_ok!(plan(&config, &req));
    assert_eq!(run.gate.reference(), (run.area.mean_lat, run.area.mean_lon));
    assert_eq!(run.gate.threshold(), Some(5.0));

    req.sun_lat = Some(60.0);
    req.sun_lon = Some(10.0);
    let run = assert_ok!(plan(&config, &req));
    assert_eq!(run.gate.reference(), (60.0, 10.0));
}

#[test]
fn test_half_sun_reference_rejected() {
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let mut req = request(named("spain"));
    req.sun_lat = Some(60.0);
    assert!(matches!(
        assert_err!(plan(&config, &req)),
        ConfigError::IncompleteSunReference
    ));
}

#[test]
fn test_time_window_rules() {
    let config = FamilyConfig::builtin(SatelliteFamily::Msg);
    let mut req = request(named("spain"));
    req.start = Some("2025-07-17T14:08:00".to_string());
    assert!(matches!(
        assert_err!(plan(&config, &req)),
        ConfigError::IncompleteTimeWindow
    ));

    req.end = Some("2025-07-17T14:23:00".to_string());
    let run = assert_ok!(plan(&config, &req));
    assert!(matches!(run.window, WindowMode::Range(_)));

    req.end = Some("17/07/2025".to_string());
    assert!(matches!(
        assert_err!(plan(&config, &req)),
        ConfigError::InvalidTimeWindow(_)
    ));
}

#[test]
fn test_default_render_mode() {
    let mtg = FamilyConfig::builtin(SatelliteFamily::Mtg);
    assert_eq!(
        default_render_mode(mtg.channel("vis_06").unwrap()),
        RenderMode::FixedScale { multiplier: 4.0 }
    );
    assert_eq!(default_render_mode(mtg.channel("ir_105").unwrap()), RenderMode::default());
}

// ============================================================================
// Collection routing
// ============================================================================

#[test]
fn test_msg_greece_uses_rapid_scan() {
    let registry = FamilyRegistry::builtin();
    let run = assert_ok!(plan_routed(&registry, SatelliteFamily::Msg, &request(named("greece"))));

    assert_eq!(run.family.family, SatelliteFamily::MsgRss);
    assert_eq!(run.family.collection_id, "EO:EUM:DAT:MSG:MSG15-RSS");
    assert_eq!(run.channel.name, "HRV");
    assert_eq!(run.area.canonical_name, "greece");
}

#[test]
fn test_msg_custom_centre_over_aegean_uses_rapid_scan() {
    let registry = FamilyRegistry::builtin();
    let centre = RegionSpec::CenterRadius {
        lat: 37.9,
        lon: 23.7,
        half_side_km: 100.0,
    };
    let run = assert_ok!(plan_routed(&registry, SatelliteFamily::Msg, &request(centre)));
    assert_eq!(run.family.family, SatelliteFamily::MsgRss);
}

#[test]
fn test_msg_elsewhere_stays_full_disk() {
    let registry = FamilyRegistry::builtin();
    let run = assert_ok!(plan_routed(&registry, SatelliteFamily::Msg, &request(named("spain"))));
    assert_eq!(run.family.family, SatelliteFamily::Msg);
    assert_eq!(run.family.collection_id, "EO:EUM:DAT:MSG:HRSEVIRI");
}

#[test]
fn test_routing_keeps_family_without_the_channel() {
    let registry = FamilyRegistry::builtin();
    let mut req = request(named("greece"));
    req.channel = Some("rgb".to_string());
    let run = assert_ok!(plan_routed(&registry, SatelliteFamily::Msg, &req));
    assert_eq!(run.family.family, SatelliteFamily::Msg);
    assert_eq!(run.channel.bands, vec!["IR_016", "VIS008", "VIS006"]);
}

#[test]
fn test_mtg_is_never_rerouted() {
    let registry = FamilyRegistry::builtin();
    let run = assert_ok!(plan_routed(&registry, SatelliteFamily::Mtg, &request(named("greece"))));
    assert_eq!(run.family.family, SatelliteFamily::Mtg);
    assert_eq!(run.chunks, vec!["0033", "0034", "0035"]);
}
