//! Common test fixtures for satfetch tests.
//!
//! This module provides pre-defined regions, archive entry names and a
//! synthetic chunk footprint catalog that mirror the shapes of real data.

/// Common bounding box definitions for testing, as `(lon_min, lat_min, lon_max, lat_max)`.
pub mod bbox {
    /// Global bounding box (-180 to 180, -90 to 90)
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -90.0, 180.0, 90.0);

    /// Iberian peninsula
    pub const IBERIA: (f64, f64, f64, f64) = (-10.0, 35.0, 4.5, 44.5);

    /// Mallorca, a small island box
    pub const MALLORCA: (f64, f64, f64, f64) = (2.25, 39.1, 3.75, 40.2);

    /// Outside every fixture chunk footprint
    pub const OPEN_PACIFIC: (f64, f64, f64, f64) = (150.0, 10.0, 160.0, 20.0);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// Chunk footprint catalog fixtures.
pub mod footprints {
    /// Latitude bands `(chunk_id, lat_start, lat_end)` spanning lon -80..80.
    ///
    /// The band edges are chosen so that intersecting the European macro
    /// regions against them gives the same chunk sets as the static table.
    pub const BANDS: &[(&str, f64, f64)] = &[
        ("0032", 25.0, 30.0),
        ("0033", 30.0, 38.0),
        ("0034", 38.0, 40.0),
        ("0035", 40.0, 43.5),
        ("0036", 43.5, 48.5),
        ("0037", 48.5, 53.0),
        ("0038", 53.0, 57.5),
        ("0039", 57.5, 63.0),
        ("0040", 63.0, 72.0),
        ("0041", 72.0, 80.0),
    ];

    /// Western and eastern limit of every band.
    pub const LON_RANGE: (f64, f64) = (-80.0, 80.0);

    /// Catalog text in the `id,WKT` line format.
    pub fn catalog_text() -> String {
        let (w, e) = LON_RANGE;
        let mut out = String::new();
        for (id, s, n) in BANDS {
            out.push_str(&format!(
                "{id},POLYGON (({w} {s}, {e} {s}, {e} {n}, {w} {n}, {w} {s}))\n"
            ));
        }
        out
    }
}

/// Archive entry names shaped like the operational products.
pub mod entries {
    /// An MTG FCI body chunk entry whose name embeds `ts` (`%Y%m%d%H%M%S`)
    /// after the `_C_EUMT_` marker.
    pub fn mtg_chunk(ts: &str, chunk_id: &str) -> String {
        format!(
            "W_XX-EUMETSAT-Darmstadt,IMG+SAT,MTI1+FCI-1C-RRAD-FDHSI-FD--CHK-BODY--DIS-NC4E_C_EUMT_{ts}_IDPFI_OPE_{ts}_{ts}_N_JLS_C_0072_{chunk_id}.nc"
        )
    }

    /// An MTG trailer entry, never selected as a chunk.
    pub fn mtg_trailer(ts: &str) -> String {
        format!(
            "W_XX-EUMETSAT-Darmstadt,IMG+SAT,MTI1+FCI-1C-RRAD-FDHSI-FD--CHK-TRAIL--DIS-NC4E_C_EUMT_{ts}_IDPFI_OPE_{ts}_{ts}_N_JLS_C_0072_0000.nc"
        )
    }

    /// A SEVIRI native full-disk entry; the sixth dash field holds `ts`.
    pub fn msg_native(ts: &str) -> String {
        format!("MSG3-SEVI-MSG15-0100-NA-{ts}.524000000Z-NA.nat")
    }
}

/// Common timestamps used across tests (`%Y-%m-%dT%H:%M:%S`).
pub mod time {
    /// Northern summer, local midday over Iberia
    pub const SUMMER_NOON: &str = "2025-07-17T12:00:00";

    /// Northern summer, local midnight over Iberia
    pub const SUMMER_MIDNIGHT: &str = "2025-07-17T00:00:00";

    /// March equinox 2025
    pub const EQUINOX_NOON: &str = "2025-03-20T12:00:00";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_text_has_one_line_per_band() {
        let text = footprints::catalog_text();
        assert_eq!(text.lines().count(), footprints::BANDS.len());
        assert!(text.starts_with("0032,POLYGON (("));
    }

    #[test]
    fn test_mtg_entry_contains_chunk_suffix() {
        let name = entries::mtg_chunk("20250717120651", "0034");
        assert!(name.ends_with("_0034.nc"));
        assert!(name.contains("_C_EUMT_20250717120651"));
    }

    #[test]
    fn test_msg_entry_dash_field() {
        let name = entries::msg_native("20250717121241");
        let field = name.split('-').nth(5).unwrap();
        assert_eq!(field.split('.').next().unwrap(), "20250717121241");
    }
}
