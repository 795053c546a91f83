//! Built-in named region tables.

use sat_common::BoundingBox;

/// A predefined region, optionally with the FCI chunk ids known to cover it.
#[derive(Debug, Clone, Copy)]
pub struct NamedRegion {
    pub id: &'static str,
    pub bbox: BoundingBox,
    /// Static chunk set; empty when the region has none.
    pub chunks: &'static [&'static str],
}

/// A family's table of named regions.
#[derive(Debug)]
pub struct RegionTable {
    pub name: &'static str,
    pub regions: &'static [NamedRegion],
}

impl RegionTable {
    /// Case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<&NamedRegion> {
        self.regions.iter().find(|r| r.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.regions.iter().map(|r| r.id).collect()
    }
}

/// Look up a built-in table by name (used by YAML family overrides).
pub fn table_by_name(name: &str) -> Option<&'static RegionTable> {
    [&EUROPE_MACRO, &COUNTRIES]
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}

const fn region(
    id: &'static str,
    lon_min: f64,
    lat_min: f64,
    lon_max: f64,
    lat_max: f64,
    chunks: &'static [&'static str],
) -> NamedRegion {
    NamedRegion {
        id,
        bbox: BoundingBox::from_corners_unchecked(lon_min, lat_min, lon_max, lat_max),
        chunks,
    }
}

/// European macro regions used by the MTG and rapid-scan families.
pub static EUROPE_MACRO: RegionTable = RegionTable {
    name: "europe_macro",
    regions: &[
        region("mallorca", 2.0, 39.1, 3.7, 40.2, &["0034", "0035"]),
        region("balearic_islands", 1.0, 38.5, 4.5, 40.27, &["0034", "0035"]),
        region("iberia", -10.0, 35.0, 4.5, 44.5, &["0033", "0034", "0035", "0036"]),
        region("france", -5.5, 41.0, 9.5, 51.5, &["0035", "0036", "0037"]),
        region("uk_ireland", -11.0, 49.5, 3.5, 60.0, &["0037", "0038", "0039"]),
        region("germany_benelux", 2.5, 47.0, 14.5, 55.0, &["0036", "0037", "0038"]),
        region("scandinavia", 5.0, 55.0, 25.0, 71.5, &["0038", "0039", "0040"]),
        region("italy", 6.0, 36.0, 19.0, 47.0, &["0033", "0034", "0035", "0036"]),
        region("greece", 19.0, 34.5, 29.5, 42.5, &["0033", "0034", "0035"]),
        region("balkans", 13.0, 36.0, 30.0, 47.5, &["0033", "0034", "0035", "0036"]),
    ],
};

/// Country boxes used by the high-rate SEVIRI family.
pub static COUNTRIES: RegionTable = RegionTable {
    name: "countries",
    regions: &[
        region("spain", -10.5, 34.8, 4.5, 45.0, &[]),
        region("france", -5.5, 42.0, 8.64, 51.44, &[]),
        region("germany", 5.5, 47.0, 15.5, 55.0, &[]),
        region("italy", 6.5, 36.5, 19.0, 47.5, &[]),
        region("united_kingdom", -8.0, 49.5, 2.5, 60.5, &[]),
        region("portugal", -9.7, 36.8, -6.0, 42.2, &[]),
        region("greece", 19.0, 34.5, 28.5, 42.0, &[]),
        region("full_globe", -180.0, -90.0, 180.0, 90.0, &[]),
    ],
};
