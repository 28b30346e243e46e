//! Spherical Web Mercator projection.
//!
//!   forward: x = λ / 2π + ½, y = ln(tan(π/4 + φ/2)) / 2π + ½
//!   inverse: λ = 2π (x − ½), φ = 2·atan(exp(2π (y − ½))) − π/2
//!
//! Latitude is clamped to ±85.051129° so the map is a square; geographic
//! points beyond that band do not survive a round trip.

use std::f64::consts::{FRAC_PI_4, PI};

use super::MapProjection;
use crate::geo::{clamp, window, CoordinatePair};

/// Latitude (degrees) at which Web Mercator's y reaches the square's edge.
pub const MAX_LATITUDE: f64 = 85.051129;

/// Web Mercator (EPSG:3857) on a sphere, normalized to the unit square.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl MapProjection for WebMercator {
    fn name(&self) -> &'static str {
        "Web Mercator"
    }

    fn image_name(&self) -> &'static str {
        "projections/web-mercator.JPG"
    }

    fn latitude_range(&self) -> (f64, f64) {
        (-MAX_LATITUDE, MAX_LATITUDE)
    }

    fn to_geographic_into(&self, surface: &CoordinatePair, out: &mut CoordinatePair) {
        let lng = (surface.x() - 0.5) * 2.0 * PI;
        let y = surface.y() - 0.5;
        let lat = 2.0 * ((2.0 * PI * y).exp().atan() - FRAC_PI_4);
        out.set(
            window(lat.to_degrees(), -90.0, 90.0),
            window(lng.to_degrees(), -180.0, 180.0),
        );
    }

    fn to_surface_into(&self, geographic: &CoordinatePair, out: &mut CoordinatePair) {
        let lat = clamp(
            window(geographic.latitude(), -90.0, 90.0),
            -MAX_LATITUDE,
            MAX_LATITUDE,
        )
        .to_radians();
        let lng = window(geographic.longitude(), -180.0, 180.0).to_radians();
        let y = (FRAC_PI_4 + lat / 2.0).tan().ln() / (2.0 * PI);
        out.set(lng / (2.0 * PI) + 0.5, y + 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn to_surface(lat: f64, long: f64) -> CoordinatePair {
        WebMercator.to_surface(&CoordinatePair::lat_long(lat, long))
    }

    fn to_geographic(x: f64, y: f64) -> CoordinatePair {
        WebMercator.to_geographic(&CoordinatePair::new(x, y))
    }

    #[test]
    fn centre_maps_to_middle() {
        let xy = to_surface(0.0, 0.0);
        assert_abs_diff_eq!(xy.x(), 0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(xy.y(), 0.5, epsilon = 1e-2);
    }

    #[test]
    fn longitude_wraps_like_equirectangular() {
        let west = to_surface(0.0, 181.0);
        assert_abs_diff_eq!(west.x(), 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(west.y(), 0.5, epsilon = 1e-2);

        let east = to_surface(0.0, 179.0);
        assert_abs_diff_eq!(east.x(), 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(east.y(), 0.5, epsilon = 1e-2);
    }

    #[test]
    fn surface_edges_map_to_antimeridian() {
        let centre = to_geographic(0.5, 0.5);
        assert_abs_diff_eq!(centre.latitude(), 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!(centre.longitude(), 0.0, epsilon = 1e-2);

        let west = to_geographic(0.0, 0.5);
        assert_abs_diff_eq!(west.longitude(), -180.0, epsilon = 1e-2);

        let east = to_geographic(1.0, 0.5);
        assert_abs_diff_eq!(east.longitude(), 180.0, epsilon = 1e-2);
    }

    #[test]
    fn round_trip_reference_point() {
        let back = WebMercator.to_geographic(&to_surface(37.0, -137.0));
        assert_abs_diff_eq!(back.latitude(), 37.0, epsilon = 1e-2);
        assert_abs_diff_eq!(back.longitude(), -137.0, epsilon = 1e-2);
    }

    #[test]
    fn latitude_beyond_band_is_clamped() {
        let xy = to_surface(89.0, 0.0);
        assert_abs_diff_eq!(xy.y(), 1.0, epsilon = 1e-6);
        let back = WebMercator.to_geographic(&xy);
        assert_abs_diff_eq!(back.latitude(), MAX_LATITUDE, epsilon = 1e-4);
    }
}
