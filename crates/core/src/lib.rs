//! # Sunclock Core
//!
//! Core types and pure math for the sunclock light-map renderer.
//!
//! This crate provides:
//! - `CoordinatePair`: reusable (x, y) scratch value for surface and geographic coordinates
//! - `InstancePool<T>`: thread-safe free-list of reusable values
//! - `Projection`: Equirectangular, Web Mercator and Cassini transforms
//! - `exposure`: solar exposure at a geographic point and instant
//! - `Raster<T>`: generic 2D grid used for the light map

pub mod error;
pub mod geo;
pub mod pool;
pub mod projection;
pub mod raster;
pub mod solar;

pub use error::{Error, Result};
pub use geo::CoordinatePair;
pub use pool::{InstancePool, Poolable, Pooled};
pub use projection::{MapProjection, Projection};
pub use raster::{Raster, RasterElement};
pub use solar::{exposure, solar_geometry, SolarGeometry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geo::CoordinatePair;
    pub use crate::pool::{InstancePool, Poolable, Pooled};
    pub use crate::projection::{MapProjection, Projection};
    pub use crate::raster::{Raster, RasterElement};
    pub use crate::solar::exposure;
}
