//! Spherical Cassini projection (transverse equirectangular).
//!
//!   forward: x = asin(cos φ · sin λ) / π + ½
//!            y = atan2(sin φ, cos φ · cos λ) / 2π + ½
//!   inverse: λ = atan2(tan x′, cos y′), φ = asin(sin y′ · cos x′)
//!            where x′ = π (x − ½), y′ = 2π (y − ½)
//!
//! The forward `atan2` keeps the far hemisphere (|λ| > 90°) distinguishable
//! from the near one, so the inverse recovers it.

use std::f64::consts::PI;

use super::MapProjection;
use crate::geo::{window, CoordinatePair};

/// Cassini projection normalized to the unit square.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cassini;

impl MapProjection for Cassini {
    fn name(&self) -> &'static str {
        "Cassini"
    }

    fn image_name(&self) -> &'static str {
        "projections/cassini.jpg"
    }

    fn latitude_range(&self) -> (f64, f64) {
        (-90.0, 90.0)
    }

    fn to_geographic_into(&self, surface: &CoordinatePair, out: &mut CoordinatePair) {
        let x = (surface.x() - 0.5) * PI;
        let y = (surface.y() - 0.5) * 2.0 * PI;
        let lng = x.tan().atan2(y.cos());
        let lat = (y.sin() * x.cos()).clamp(-1.0, 1.0).asin();
        out.set(
            window(lat.to_degrees(), -90.0, 90.0),
            window(lng.to_degrees(), -180.0, 180.0),
        );
    }

    fn to_surface_into(&self, geographic: &CoordinatePair, out: &mut CoordinatePair) {
        let lat = window(geographic.latitude(), -90.0, 90.0).to_radians();
        let lng = window(geographic.longitude(), -180.0, 180.0).to_radians();
        let x = (lat.cos() * lng.sin()).clamp(-1.0, 1.0).asin();
        let y = lat.sin().atan2(lat.cos() * lng.cos());
        out.set(x / PI + 0.5, y / (2.0 * PI) + 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centre_maps_to_middle() {
        let xy = Cassini.to_surface(&CoordinatePair::lat_long(0.0, 0.0));
        assert_abs_diff_eq!(xy.x(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(xy.y(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn far_hemisphere_round_trips() {
        for &(lat, long) in &[(37.0, -137.0), (-45.0, 120.0), (10.0, 179.0), (-80.0, -95.0)] {
            let back = Cassini.to_geographic(&Cassini.to_surface(&CoordinatePair::lat_long(lat, long)));
            assert_abs_diff_eq!(back.latitude(), lat, epsilon = 1e-2);
            assert_abs_diff_eq!(back.longitude(), long, epsilon = 1e-2);
        }
    }

    #[test]
    fn north_pole_is_quarter_turn_up() {
        let xy = Cassini.to_surface(&CoordinatePair::lat_long(90.0, 0.0));
        assert_abs_diff_eq!(xy.x(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(xy.y(), 0.75, epsilon = 1e-9);
    }
}
