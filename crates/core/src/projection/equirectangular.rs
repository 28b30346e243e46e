//! Equirectangular (plate carrée) projection.
//!
//!   forward: x = λ / 2π + ½, y = φ / π + ½
//!   inverse: λ = 2π (x − ½), φ = π (y − ½)

use std::f64::consts::PI;

use super::MapProjection;
use crate::geo::{window, CoordinatePair};

/// Longitude and latitude mapped linearly onto the surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Equirectangular;

impl MapProjection for Equirectangular {
    fn name(&self) -> &'static str {
        "Equirectangular"
    }

    fn image_name(&self) -> &'static str {
        "projections/equirectangular.JPG"
    }

    fn latitude_range(&self) -> (f64, f64) {
        (-90.0, 90.0)
    }

    fn to_geographic_into(&self, surface: &CoordinatePair, out: &mut CoordinatePair) {
        let lng = (surface.x() - 0.5) * 2.0 * PI;
        let lat = (surface.y() - 0.5) * PI;
        out.set(
            window(lat.to_degrees(), -90.0, 90.0),
            window(lng.to_degrees(), -180.0, 180.0),
        );
    }

    fn to_surface_into(&self, geographic: &CoordinatePair, out: &mut CoordinatePair) {
        let lat = window(geographic.latitude(), -90.0, 90.0).to_radians();
        let lng = window(geographic.longitude(), -180.0, 180.0).to_radians();
        out.set(lng / (2.0 * PI) + 0.5, lat / PI + 0.5);
    }
}
