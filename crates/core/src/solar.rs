//! Solar exposure model
//!
//! Estimates how strongly the sun shines on a point of the globe at a given
//! instant, as the sine of the solar altitude clipped at zero. Uses the
//! empirical day-of-year formulas for the equation of time and the solar
//! declination; accurate to a few degrees of altitude, which is plenty for a
//! day/night overlay.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::geo::{window, CoordinatePair};

const SECONDS_PER_DAY: f64 = 86_400.0;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Maximum solar declination (Earth's axial tilt) in degrees.
const AXIAL_TILT: f64 = 23.45;

/// Day of year of the March equinox used by the empirical formulas.
const EQUINOX_DAY: f64 = 81.0;

/// Intermediate solar angles at a point and instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarGeometry {
    /// Solar declination in radians
    pub declination: f64,
    /// Equation of time in minutes
    pub equation_of_time: f64,
    /// Hour angle in radians (zero at local solar noon)
    pub hour_angle: f64,
    /// Solar altitude above the horizon in radians
    pub altitude: f64,
}

impl SolarGeometry {
    /// Solar altitude in degrees
    pub fn altitude_degrees(&self) -> f64 {
        self.altitude.to_degrees()
    }
}

/// Compute the solar angles at `lat_long` (degrees) and `instant`.
///
/// The instant is converted to UTC first; the result does not depend on the
/// time zone it was expressed in. Inverse-trig inputs are clamped so polar
/// latitudes and exact solar noon stay finite.
pub fn solar_geometry<Tz: TimeZone>(lat_long: &CoordinatePair, instant: &DateTime<Tz>) -> SolarGeometry {
    let utc = instant.with_timezone(&Utc);
    let now_utc = utc.ordinal() as f64 + utc.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY;

    let latitude = window(lat_long.latitude(), -90.0, 90.0).to_radians();
    let longitude = window(lat_long.longitude(), -180.0, 180.0).to_radians();

    // Fractional local day, shifted by longitude
    let now_local = now_utc + longitude / (2.0 * PI);
    let local_day = now_local.floor();

    let b = ((360.0 / 364.0) * (now_local - EQUINOX_DAY)).to_radians();
    let equation_of_time = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();

    let solar_noon = local_day + (MINUTES_PER_DAY / 2.0 - equation_of_time) / MINUTES_PER_DAY;
    let solar_time = (now_local * MINUTES_PER_DAY + equation_of_time) / MINUTES_PER_DAY;
    let hour_angle = 2.0 * PI * (solar_noon - solar_time);

    let declination =
        AXIAL_TILT.to_radians() * ((360.0 / 365.0) * (local_day - EQUINOX_DAY)).to_radians().sin();

    let sin_altitude = latitude.cos() * declination.cos() * hour_angle.cos()
        + latitude.sin() * declination.sin();
    let altitude = sin_altitude.clamp(-1.0, 1.0).asin();

    SolarGeometry {
        declination,
        equation_of_time,
        hour_angle,
        altitude,
    }
}

/// Normalized solar exposure in [0, 1] at `lat_long` (degrees) and `instant`.
///
/// Zero when the sun is below the horizon. Pure: the instant is an input,
/// the clock is never read.
pub fn exposure<Tz: TimeZone>(lat_long: &CoordinatePair, instant: &DateTime<Tz>) -> f64 {
    let value = solar_geometry(lat_long, instant).altitude.sin();
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
