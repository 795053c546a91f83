//! Direct geodesic problem on the WGS84 ellipsoid.
//!
//! Given a start point, an initial azimuth and a distance, find the end
//! point. Uses Vincenty's iterative formulae, which converge for every
//! direct problem (unlike the inverse problem near antipodes).

use crate::{WGS84_A, WGS84_F};

const CONVERGENCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeodesicError {
    #[error("Non-finite geodesic input: lat={lat}, lon={lon}, azimuth={azimuth}, distance={distance}")]
    NonFinite {
        lat: f64,
        lon: f64,
        azimuth: f64,
        distance: f64,
    },

    #[error("Latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Vincenty direct formula did not converge after {0} iterations")]
    NoConvergence(usize),
}

/// Travel `distance_m` metres from `(lat, lon)` along `azimuth_deg`
/// (clockwise from north) and return the destination `(lat, lon)` in degrees.
///
/// The returned longitude is normalized to [-180, 180].
pub fn direct(lat: f64, lon: f64, azimuth_deg: f64, distance_m: f64) -> Result<(f64, f64), GeodesicError> {
    if !(lat.is_finite() && lon.is_finite() && azimuth_deg.is_finite() && distance_m.is_finite()) {
        return Err(GeodesicError::NonFinite {
            lat,
            lon,
            azimuth: azimuth_deg,
            distance: distance_m,
        });
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeodesicError::LatitudeOutOfRange(lat));
    }

    let a = WGS84_A;
    let f = WGS84_F;
    let b = (1.0 - f) * a;

    let alpha1 = azimuth_deg.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let tan_u1 = (1.0 - f) * lat.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let base = distance_m / (b * big_a);
    let mut sigma = base;
    let mut cos_2sigma_m;
    let mut sin_sigma;
    let mut cos_sigma;
    let mut iterations = 0;

    loop {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        sin_sigma = sigma.sin();
        cos_sigma = sigma.cos();
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let next = base + delta_sigma;
        let converged = (next - sigma).abs() < CONVERGENCE;
        sigma = next;
        iterations += 1;
        if converged {
            break;
        }
        if iterations >= MAX_ITERATIONS {
            return Err(GeodesicError::NoConvergence(MAX_ITERATIONS));
        }
    }

    // Refresh the trig terms for the final sigma
    cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    sin_sigma = sigma.sin();
    cos_sigma = sigma.cos();

    let x = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + x * x).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    let lon2 = normalize_lon(lon + l.to_degrees());
    Ok((lat2.to_degrees(), lon2))
}

/// Wrap a longitude into [-180, 180].
pub fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(10.0), 10.0);
        assert_approx_eq!(normalize_lon(190.0), -170.0, 1e-9);
        assert_approx_eq!(normalize_lon(-190.0), 170.0, 1e-9);
        assert_eq!(normalize_lon(540.0), 180.0);
    }

    #[test]
    fn test_zero_distance() {
        let (lat, lon) = direct(39.6, 2.9, 45.0, 0.0).unwrap();
        assert_approx_eq!(lat, 39.6, 1e-9);
        assert_approx_eq!(lon, 2.9, 1e-9);
    }

    #[test]
    fn test_nan_rejected() {
        assert!(matches!(
            direct(f64::NAN, 0.0, 0.0, 1000.0),
            Err(GeodesicError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert_eq!(
            direct(91.0, 0.0, 0.0, 1000.0),
            Err(GeodesicError::LatitudeOutOfRange(91.0))
        );
    }
}
