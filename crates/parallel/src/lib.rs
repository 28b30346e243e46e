//! # Sunclock Parallel
//!
//! Tile decomposition and parallel tile execution for sunclock rasters.
//!
//! This crate provides:
//! - `tile_step`: square tile edge for a raster size and grid resolution
//! - `TileIterator`: tiles covering a raster, left to right, bottom to top
//! - `TileRunner`: hands each tile's disjoint pixel view to a worker pool and
//!   blocks until every tile has finished

pub mod strategy;
pub mod tiled;

pub use strategy::{num_cpus, ProcessingMode};
pub use tiled::{split_tiles, tile_step, Tile, TileIterator, TileRun, TileRunner};
