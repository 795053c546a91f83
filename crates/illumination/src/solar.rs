//! NOAA solar position algorithm.
//!
//! Follows the NOAA solar calculator (based on Meeus, "Astronomical
//! Algorithms"). The result is the geometric elevation; atmospheric
//! refraction is not applied.

use chrono::{DateTime, Timelike, Utc};

use crate::{IlluminationError, IlluminationResult};

const JULIAN_UNIX_EPOCH: f64 = 2_440_587.5;
const J2000: f64 = 2_451_545.0;

/// Sun elevation in degrees above the horizon at `t` for `(lat, lon)`.
pub fn elevation(t: DateTime<Utc>, lat: f64, lon: f64) -> IlluminationResult<f64> {
    validate_location(lat, lon)?;

    let jd = julian_day(t);
    let jc = (jd - J2000) / 36_525.0;

    let geom_mean_long = (280.466_46 + jc * (36_000.769_83 + jc * 0.000_303_2)).rem_euclid(360.0);
    let geom_mean_anom = 357.529_11 + jc * (35_999.050_29 - 0.000_153_7 * jc);
    let eccent = 0.016_708_634 - jc * (0.000_042_037 + 0.000_000_126_7 * jc);

    let m = geom_mean_anom.to_radians();
    let eq_of_center = m.sin() * (1.914_602 - jc * (0.004_817 + 0.000_014 * jc))
        + (2.0 * m).sin() * (0.019_993 - 0.000_101 * jc)
        + (3.0 * m).sin() * 0.000_289;

    let true_long = geom_mean_long + eq_of_center;
    let omega = (125.04 - 1_934.136 * jc).to_radians();
    let apparent_long = true_long - 0.005_69 - 0.004_78 * omega.sin();

    let mean_obliq = 23.0 + (26.0 + (21.448 - jc * (46.815 + jc * (0.000_59 - jc * 0.001_813))) / 60.0) / 60.0;
    let obliq = (mean_obliq + 0.002_56 * omega.cos()).to_radians();

    let declination = (obliq.sin() * apparent_long.to_radians().sin()).asin();

    let y = (obliq / 2.0).tan().powi(2);
    let l0 = geom_mean_long.to_radians();
    let eq_of_time_min = 4.0
        * (y * (2.0 * l0).sin() - 2.0 * eccent * m.sin() + 4.0 * eccent * y * m.sin() * (2.0 * l0).cos()
            - 0.5 * y * y * (4.0 * l0).sin()
            - 1.25 * eccent * eccent * (2.0 * m).sin())
        .to_degrees();

    let minutes_utc = t.hour() as f64 * 60.0 + t.minute() as f64 + t.second() as f64 / 60.0;
    let true_solar_time = (minutes_utc + eq_of_time_min + 4.0 * lon).rem_euclid(1440.0);
    let hour_angle = (true_solar_time / 4.0 - 180.0).to_radians();

    let lat_rad = lat.to_radians();
    let cos_zenith = (lat_rad.sin() * declination.sin() + lat_rad.cos() * declination.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let zenith = cos_zenith.acos().to_degrees();

    Ok(90.0 - zenith)
}

/// Julian day number (with fraction) of a UTC instant.
pub fn julian_day(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 * 1e-9;
    seconds / 86_400.0 + JULIAN_UNIX_EPOCH
}

pub(crate) fn validate_location(lat: f64, lon: f64) -> IlluminationResult<()> {
    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(IlluminationError::InvalidLocation { lat, lon });
    }
    Ok(())
}
