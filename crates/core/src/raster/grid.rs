//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::RasterElement;
use ndarray::{Array2, ArrayViewMut2};

/// A 2D raster grid in image orientation.
///
/// Row 0 is the top of the picture. The light map stores one packed ARGB
/// `u32` per pixel in a `Raster<u32>`.
///
/// # Example
///
/// ```
/// use sunclock_core::Raster;
///
/// let mut raster: Raster<u32> = Raster::new(2, 3);
/// raster.set(1, 2, 0xFF00_0000).unwrap();
/// assert_eq!(raster.get(1, 2).unwrap(), 0xFF00_0000);
/// assert_eq!((raster.width(), raster.height()), (3, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Width in pixels (same as [`cols`](Self::cols))
    pub fn width(&self) -> usize {
        self.cols()
    }

    /// Height in pixels (same as [`rows`](Self::rows))
    pub fn height(&self) -> usize {
        self.rows()
    }

    /// Whether the raster is exactly `width × height` pixels
    pub fn has_size(&self, width: usize, height: usize) -> bool {
        self.width() == width && self.height() == height
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<u32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!((raster.width(), raster.height()), (200, 100));
        assert!(raster.has_size(200, 100));
        assert!(!raster.has_size(100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<u32> = Raster::new(10, 10);
        raster.set(5, 5, 42).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1).is_err());
    }

    #[test]
    fn test_zero_area() {
        let r: Raster<u32> = Raster::new(0, 40);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
    }
}
