//! Raster data structures

mod element;
mod grid;

pub use element::RasterElement;
pub use grid::Raster;
