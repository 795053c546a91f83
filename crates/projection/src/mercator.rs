//! Web Mercator (EPSG:3857) forward projection.

use std::f64::consts::PI;

use crate::WGS84_A;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Project geographic degrees to Web Mercator metres.
///
/// Latitudes beyond ±[`MAX_LATITUDE`] are clamped so that the poles map to
/// finite values.
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = WGS84_A * lon.to_radians();
    let y = WGS84_A * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Absolute Mercator extent `(|dx|, |dy|)` between two corners.
pub fn extent(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> (f64, f64) {
    let (x0, y0) = forward(lon_min, lat_min);
    let (x1, y1) = forward(lon_max, lat_max);
    ((x1 - x0).abs(), (y1 - y0).abs())
}
