//! Cell types a raster can hold

use num_traits::Zero;
use std::fmt::Debug;

/// Anything `Copy` with a zero value can be a raster cell.
///
/// Tiles are written from worker threads, so cells must be `Send + Sync`.
/// The light map uses `u32` (packed ARGB).
pub trait RasterElement: Copy + Debug + PartialEq + Zero + Send + Sync + 'static {}

impl<T> RasterElement for T where T: Copy + Debug + PartialEq + Zero + Send + Sync + 'static {}
