//! Map projections between surface and geographic coordinates
//!
//! Surface coordinates are normalized to [0, 1] × [0, 1] with the origin at
//! the bottom-left of the map picture. Geographic coordinates are
//! (latitude, longitude) in degrees, normalized to [-90, 90] and [-180, 180].
//!
//! Every projection is a stateless unit struct implementing [`MapProjection`];
//! [`Projection`] is the closed set of variants the application offers.

mod cassini;
mod equirectangular;
mod web_mercator;

pub use cassini::Cassini;
pub use equirectangular::Equirectangular;
pub use web_mercator::WebMercator;

use crate::error::Error;
use crate::geo::CoordinatePair;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bidirectional transform between surface and geographic coordinates.
pub trait MapProjection: Send + Sync {
    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Resource path of the base map picture drawn in this projection
    fn image_name(&self) -> &'static str;

    /// Valid latitude band as (min, max) in degrees
    fn latitude_range(&self) -> (f64, f64);

    /// Surface (x, y) → geographic (lat, long), written into `out`.
    fn to_geographic_into(&self, surface: &CoordinatePair, out: &mut CoordinatePair);

    /// Geographic (lat, long) → surface (x, y), written into `out`.
    fn to_surface_into(&self, geographic: &CoordinatePair, out: &mut CoordinatePair);

    /// Surface (x, y) → a fresh geographic (lat, long) pair.
    fn to_geographic(&self, surface: &CoordinatePair) -> CoordinatePair {
        let mut out = CoordinatePair::default();
        self.to_geographic_into(surface, &mut out);
        out
    }

    /// Geographic (lat, long) → a fresh surface (x, y) pair.
    fn to_surface(&self, geographic: &CoordinatePair) -> CoordinatePair {
        let mut out = CoordinatePair::default();
        self.to_surface_into(geographic, &mut out);
        out
    }
}

/// The projections a map display can be switched between.
///
/// Serialized with the legacy constant names (`EQUIRECTANGULAR`,
/// `WEB_MERCATOR`, `CASSINI`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Projection {
    Equirectangular,
    WebMercator,
    Cassini,
}

impl Projection {
    /// All projections, in menu order.
    pub const ALL: [Projection; 3] = [
        Projection::Equirectangular,
        Projection::WebMercator,
        Projection::Cassini,
    ];

    /// Legacy constant name used by persisted options.
    pub fn key(&self) -> &'static str {
        match self {
            Projection::Equirectangular => "EQUIRECTANGULAR",
            Projection::WebMercator => "WEB_MERCATOR",
            Projection::Cassini => "CASSINI",
        }
    }

    fn implementation(&self) -> &'static dyn MapProjection {
        match self {
            Projection::Equirectangular => &Equirectangular,
            Projection::WebMercator => &WebMercator,
            Projection::Cassini => &Cassini,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Equirectangular
    }
}

impl MapProjection for Projection {
    fn name(&self) -> &'static str {
        self.implementation().name()
    }

    fn image_name(&self) -> &'static str {
        self.implementation().image_name()
    }

    fn latitude_range(&self) -> (f64, f64) {
        self.implementation().latitude_range()
    }

    fn to_geographic_into(&self, surface: &CoordinatePair, out: &mut CoordinatePair) {
        self.implementation().to_geographic_into(surface, out)
    }

    fn to_surface_into(&self, geographic: &CoordinatePair, out: &mut CoordinatePair) {
        self.implementation().to_surface_into(geographic, out)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Projection {
    type Err = Error;

    /// Accepts the legacy constant name or the display name, ignoring case,
    /// spaces, dashes and underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Projection::ALL
            .into_iter()
            .find(|p| {
                let key: String = p
                    .key()
                    .chars()
                    .filter(|c| *c != '_')
                    .flat_map(char::to_lowercase)
                    .collect();
                key == wanted
            })
            .ok_or_else(|| Error::InvalidParameter {
                name: "projection",
                value: s.to_string(),
                reason: "expected one of EQUIRECTANGULAR, WEB_MERCATOR, CASSINI".into(),
            })
    }
}
