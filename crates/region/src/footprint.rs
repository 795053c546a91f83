//! Tile footprint catalog.
//!
//! One footprint per line, `tile_id,WKT`, where the WKT is a `POLYGON` or
//! `MULTIPOLYGON` in lon/lat degrees. Only outer rings are kept.

use std::path::Path;

use tracing::info;

use crate::error::{RegionError, RegionResult};

/// Closed ring of `(lon, lat)` vertices.
pub type Ring = Vec<(f64, f64)>;

#[derive(Debug, Clone, PartialEq)]
pub struct TileFootprint {
    pub tile_id: String,
    /// Outer rings, one per polygon part
    pub rings: Vec<Ring>,
}

/// Footprints in file order. Loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct FootprintCatalog {
    footprints: Vec<TileFootprint>,
}

impl FootprintCatalog {
    pub fn load(path: &Path) -> RegionResult<Self> {
        if !path.exists() {
            return Err(RegionError::CatalogNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| RegionError::CatalogIo {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&text)?;
        info!(path = %path.display(), tiles = catalog.len(), "Loaded tile footprint catalog");
        Ok(catalog)
    }

    /// Parse catalog text. Line numbers in errors are 1-based.
    pub fn parse(text: &str) -> RegionResult<Self> {
        let mut footprints = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let parse_err = |message: String| RegionError::CatalogParse {
                line: idx + 1,
                message,
            };
            let (id, wkt) = line
                .split_once(',')
                .ok_or_else(|| parse_err("expected 'tile_id,WKT'".to_string()))?;
            let id = id.trim();
            if id.is_empty() {
                return Err(parse_err("empty tile id".to_string()));
            }
            let rings = parse_wkt(wkt).map_err(parse_err)?;
            footprints.push(TileFootprint {
                tile_id: id.to_string(),
                rings,
            });
        }
        Ok(Self { footprints })
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileFootprint> {
        self.footprints.iter()
    }

    pub fn get(&self, tile_id: &str) -> Option<&TileFootprint> {
        self.footprints.iter().find(|f| f.tile_id == tile_id)
    }
}

/// Parse a WKT polygon or multipolygon into its outer rings.
pub fn parse_wkt(wkt: &str) -> Result<Vec<Ring>, String> {
    let wkt = wkt.trim();
    let upper = wkt.to_ascii_uppercase();

    if let Some(rest) = upper.strip_prefix("MULTIPOLYGON") {
        let body = &wkt[wkt.len() - rest.len()..];
        let mut parser = WktParser::new(body);
        let mut rings = Vec::new();
        parser.expect(b'(')?;
        loop {
            let mut polygon = parser.polygon()?;
            rings.push(polygon.swap_remove(0));
            if !parser.consume(b',') {
                break;
            }
        }
        parser.expect(b')')?;
        parser.finish()?;
        Ok(rings)
    } else if let Some(rest) = upper.strip_prefix("POLYGON") {
        let body = &wkt[wkt.len() - rest.len()..];
        let mut parser = WktParser::new(body);
        let mut polygon = parser.polygon()?;
        parser.finish()?;
        Ok(vec![polygon.swap_remove(0)])
    } else {
        Err(format!("unsupported geometry: {}", wkt.chars().take(24).collect::<String>()))
    }
}

struct WktParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WktParser<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn consume(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), String> {
        if self.consume(c) {
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", c as char, self.pos))
        }
    }

    fn finish(&mut self) -> Result<(), String> {
        self.skip_ws();
        if self.pos == self.bytes.len() {
            Ok(())
        } else {
            Err(format!("trailing characters at offset {}", self.pos))
        }
    }

    fn number(&mut self) -> Option<f64> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()?.parse().ok()
    }

    /// `((ring), (ring), ...)`; the first ring is the outer one.
    fn polygon(&mut self) -> Result<Vec<Ring>, String> {
        self.expect(b'(')?;
        let mut rings = vec![self.ring()?];
        while self.consume(b',') {
            rings.push(self.ring()?);
        }
        self.expect(b')')?;
        Ok(rings)
    }

    fn ring(&mut self) -> Result<Ring, String> {
        self.expect(b'(')?;
        let mut ring = Vec::new();
        loop {
            let lon = self.number().ok_or_else(|| format!("bad coordinate at offset {}", self.pos))?;
            let lat = self.number().ok_or_else(|| format!("bad coordinate at offset {}", self.pos))?;
            // Z / M ordinates are ignored
            while self.number().is_some() {}
            ring.push((lon, lat));
            if !self.consume(b',') {
                break;
            }
        }
        self.expect(b')')?;

        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        if ring.len() < 4 {
            return Err("ring needs at least three distinct vertices".to_string());
        }
        Ok(ring)
    }
}
