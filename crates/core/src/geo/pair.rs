//! Mutable (x, y) pair reused for surface and geographic coordinates

use crate::pool::Poolable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pair of `f64` values.
///
/// The same type carries two interpretations and callers track which one
/// applies:
///
/// - surface coordinates: `x`, `y` in [0, 1], origin at the bottom-left
/// - geographic coordinates: `x` = latitude, `y` = longitude, in degrees
///
/// Pairs are not `Copy`; they are handed out by an
/// [`InstancePool`](crate::InstancePool) and owned by exactly one thread
/// between acquire and release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair {
    x: f64,
    y: f64,
}

impl CoordinatePair {
    /// Create a pair from two values
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a geographic pair from latitude and longitude in degrees
    pub fn lat_long(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Latitude in degrees (geographic interpretation of `x`)
    pub fn latitude(&self) -> f64 {
        self.x
    }

    /// Longitude in degrees (geographic interpretation of `y`)
    pub fn longitude(&self) -> f64 {
        self.y
    }

    /// Overwrite both values
    pub fn set(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

impl Poolable for CoordinatePair {
    fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }
}

impl From<(f64, f64)> for CoordinatePair {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for CoordinatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.6}, {:.6}]", self.x, self.y)
    }
}
