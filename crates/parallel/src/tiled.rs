//! Tiled processing for rasters
//!
//! A raster is covered by square `step × step` tiles anchored at its top-left
//! pixel. Tiles on the right and bottom edges are clipped to the raster, so
//! every pixel belongs to exactly one tile.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{ArrayViewMut2, Axis};
use sunclock_core::raster::{Raster, RasterElement};
use sunclock_core::{Error, Result};
use tracing::debug;

use crate::strategy::ProcessingMode;

/// Edge length of the square tiles for a `width × height` raster divided into
/// at most `resolution` cells per axis.
///
/// `max(max(⌊W/R⌋, 1), max(⌊H/R⌋, 1))`; a resolution of 0 is treated as 1.
pub fn tile_step(width: usize, height: usize, resolution: u32) -> usize {
    let r = resolution.max(1) as usize;
    let x = (width / r).max(1);
    let y = (height / r).max(1);
    x.max(y)
}

/// A square tile of a raster, clipped at the raster edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Row of the tile's top-left pixel
    pub row_offset: usize,
    /// Column of the tile's top-left pixel
    pub col_offset: usize,
    /// Number of rows in this tile after clipping
    pub rows: usize,
    /// Number of columns in this tile after clipping
    pub cols: usize,
    /// Unclipped edge length shared by every tile of the pass
    pub step: usize,
}

impl Tile {
    /// Centre of the unclipped tile as fractions of the raster size,
    /// `(col_fraction, row_fraction)`, with row fraction 0 at the top.
    pub fn centre_fraction(&self, width: usize, height: usize) -> (f64, f64) {
        let half = self.step as f64 / 2.0;
        (
            (self.col_offset as f64 + half) / width as f64,
            (self.row_offset as f64 + half) / height as f64,
        )
    }
}

/// Iterator over tiles covering a raster.
///
/// Yields tiles row-major, left to right within a band, starting with the
/// bottom band and moving up.
pub struct TileIterator {
    width: usize,
    height: usize,
    step: usize,
    /// Index of the current band counted from the top; `None` when exhausted
    band: Option<usize>,
    current_col: usize,
}

impl TileIterator {
    /// Create a new tile iterator; a step of 0 is treated as 1
    pub fn new(width: usize, height: usize, step: usize) -> Self {
        let step = step.max(1);
        let band = if width == 0 || height == 0 {
            None
        } else {
            Some(height.div_ceil(step) - 1)
        };
        Self {
            width,
            height,
            step,
            band,
            current_col: 0,
        }
    }

    /// Number of tiles the iterator yields in total
    pub fn tile_count(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        self.width.div_ceil(self.step) * self.height.div_ceil(self.step)
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        let band = self.band?;

        let row_offset = band * self.step;
        let col_offset = self.current_col;
        let tile = Tile {
            row_offset,
            col_offset,
            rows: self.step.min(self.height - row_offset),
            cols: self.step.min(self.width - col_offset),
            step: self.step,
        };

        // Move to next tile
        self.current_col += self.step;
        if self.current_col >= self.width {
            self.current_col = 0;
            self.band = band.checked_sub(1);
        }

        Some(tile)
    }
}

/// Split a mutable 2D view into disjoint per-tile views, in [`TileIterator`] order.
///
/// The views borrow from `view` for its whole lifetime, so they can be moved
/// to different threads.
pub fn split_tiles<'a, T>(view: ArrayViewMut2<'a, T>, step: usize) -> Vec<(Tile, ArrayViewMut2<'a, T>)> {
    let step = step.max(1);
    let (height, width) = view.dim();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut bands: Vec<Vec<(Tile, ArrayViewMut2<'a, T>)>> = Vec::with_capacity(height.div_ceil(step));
    let mut rest = view;
    let mut row_offset = 0;
    while rest.nrows() > 0 {
        let rows = step.min(rest.nrows());
        let (band, below) = rest.split_at(Axis(0), rows);
        rest = below;

        let mut band_tiles = Vec::with_capacity(width.div_ceil(step));
        let mut right = band;
        let mut col_offset = 0;
        while right.ncols() > 0 {
            let cols = step.min(right.ncols());
            let (tile_view, remainder) = right.split_at(Axis(1), cols);
            right = remainder;
            band_tiles.push((
                Tile {
                    row_offset,
                    col_offset,
                    rows,
                    cols,
                    step,
                },
                tile_view,
            ));
            col_offset += cols;
        }
        bands.push(band_tiles);
        row_offset += rows;
    }

    bands.into_iter().rev().flatten().collect()
}

/// Summary of one [`TileRunner::run`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRun {
    /// Tile edge length used
    pub step: usize,
    /// Tiles submitted
    pub tiles: usize,
    /// Tiles whose work finished
    pub completed: usize,
}

/// Runs independent per-tile work on a dedicated worker pool.
///
/// [`run`](Self::run) is a fan-in barrier: it submits one task per tile and
/// does not return until every task has finished, so a completed call leaves
/// the raster fully written.
pub struct TileRunner {
    mode: ProcessingMode,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl TileRunner {
    /// Create a runner, building its worker pool for `mode`.
    pub fn new(mode: ProcessingMode) -> Result<Self> {
        Ok(Self {
            mode,
            #[cfg(feature = "parallel")]
            pool: mode.build_pool()?,
        })
    }

    /// Processing mode the runner was built with
    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Number of worker threads available to tile work
    pub fn worker_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.current_num_threads();
        }
        1
    }

    /// Apply `f` to every `step × step` tile of `raster`.
    ///
    /// Each call of `f` receives the tile and an exclusive view of exactly
    /// the tile's pixels. Tiles run in any order on any worker. If a tile
    /// task panics, the remaining tiles still run to completion and the call
    /// returns [`Error::RenderAborted`].
    pub fn run<T, F>(&self, raster: &mut Raster<T>, step: usize, f: F) -> Result<TileRun>
    where
        T: RasterElement,
        F: Fn(&Tile, ArrayViewMut2<'_, T>) + Sync,
    {
        let tiles = split_tiles(raster.view_mut(), step);
        let submitted = tiles.len();
        let completed = AtomicUsize::new(0);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(tiles, &f, &completed);
        }));

        let completed = completed.into_inner();
        debug!(step, tiles = submitted, completed, "tile run finished");

        match outcome {
            Ok(()) => Ok(TileRun {
                step: step.max(1),
                tiles: submitted,
                completed,
            }),
            Err(_) => Err(Error::aborted(format!(
                "tile task panicked ({} of {} tiles completed)",
                completed, submitted
            ))),
        }
    }

    fn dispatch<'a, T, F>(&self, tiles: Vec<(Tile, ArrayViewMut2<'a, T>)>, f: &F, completed: &AtomicUsize)
    where
        T: RasterElement,
        F: Fn(&Tile, ArrayViewMut2<'_, T>) + Sync,
    {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            // rayon::Scope::spawn joins every spawned task before scope returns
            pool.scope(|s| {
                for (tile, view) in tiles {
                    s.spawn(move |_| {
                        f(&tile, view);
                        completed.fetch_add(1, Ordering::Relaxed);
                    });
                }
            });
            return;
        }

        let mut first_panic = None;
        for (tile, view) in tiles {
            match panic::catch_unwind(AssertUnwindSafe(|| f(&tile, view))) {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                Err(payload) => {
                    first_panic.get_or_insert(payload);
                }
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

impl std::fmt::Debug for TileRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileRunner")
            .field("mode", &self.mode)
            .field("worker_threads", &self.worker_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tile_step() {
        assert_eq!(tile_step(1024, 512, 128), 8);
        assert_eq!(tile_step(100, 50, 128), 1);
        assert_eq!(tile_step(300, 100, 10), 30);
        assert_eq!(tile_step(10, 10, 0), 10);
    }

    #[test]
    fn test_tile_iterator_order() {
        let tiles: Vec<_> = TileIterator::new(10, 7, 4).collect();
        // two bands (rows 4..7 at the bottom, rows 0..4 at the top), three tiles each
        assert_eq!(tiles.len(), 6);
        assert_eq!((tiles[0].row_offset, tiles[0].col_offset), (4, 0));
        assert_eq!((tiles[1].row_offset, tiles[1].col_offset), (4, 4));
        assert_eq!((tiles[2].row_offset, tiles[2].col_offset), (4, 8));
        assert_eq!((tiles[2].rows, tiles[2].cols), (3, 2));
        assert_eq!((tiles[3].row_offset, tiles[3].col_offset), (0, 0));
        assert_eq!((tiles[5].rows, tiles[5].cols), (4, 2));
    }

    #[test]
    fn test_empty_raster_has_no_tiles() {
        assert_eq!(TileIterator::new(0, 10, 2).count(), 0);
        assert_eq!(TileIterator::new(10, 0, 2).count(), 0);
        assert_eq!(TileIterator::new(0, 0, 2).tile_count(), 0);
    }

    #[test]
    fn test_tile_coverage_exactly_once() {
        for &(w, h) in &[(1, 1), (7, 3), (100, 100), (101, 37), (640, 480), (33, 257)] {
            for &res in &[1u32, 2, 3, 7, 16, 128, 1000] {
                let step = tile_step(w, h, res);
                let mut hits = vec![0u32; w * h];
                let iter = TileIterator::new(w, h, step);
                let expected = iter.tile_count();
                let mut seen = 0;
                for tile in iter {
                    seen += 1;
                    for r in tile.row_offset..tile.row_offset + tile.rows {
                        for c in tile.col_offset..tile.col_offset + tile.cols {
                            hits[r * w + c] += 1;
                        }
                    }
                }
                assert_eq!(seen, expected, "{}x{} R={}", w, h, res);
                assert!(
                    hits.iter().all(|&n| n == 1),
                    "{}x{} R={} step={} has gaps or overlaps",
                    w,
                    h,
                    res,
                    step
                );
            }
        }
    }

    #[test]
    fn test_split_matches_iterator() {
        let mut raster: Raster<u32> = Raster::new(23, 41);
        let step = 6;
        let split: Vec<Tile> = split_tiles(raster.view_mut(), step)
            .into_iter()
            .map(|(tile, view)| {
                assert_eq!(view.dim(), (tile.rows, tile.cols));
                tile
            })
            .collect();
        let iterated: Vec<Tile> = TileIterator::new(41, 23, step).collect();
        assert_eq!(split, iterated);
    }

    #[test]
    fn test_centre_fraction_uses_unclipped_step() {
        let tile = Tile {
            row_offset: 8,
            col_offset: 8,
            rows: 2,
            cols: 2,
            step: 4,
        };
        assert_eq!(tile.centre_fraction(10, 10), (1.0, 1.0));
    }

    fn run_and_count(mode: ProcessingMode) {
        let runner = TileRunner::new(mode).unwrap();
        let mut raster: Raster<u32> = Raster::new(45, 67);
        let step = tile_step(67, 45, 8);
        let run = runner
            .run(&mut raster, step, |_, mut view| {
                view.map_inplace(|px| *px += 1);
            })
            .unwrap();

        assert_eq!(run.tiles, TileIterator::new(67, 45, step).tile_count());
        assert_eq!(run.completed, run.tiles);
        assert!(raster.data().iter().all(|&px| px == 1));
    }

    #[test]
    fn test_runner_writes_every_pixel_once_parallel() {
        run_and_count(ProcessingMode::ParallelWith(4));
    }

    #[test]
    fn test_runner_writes_every_pixel_once_sequential() {
        run_and_count(ProcessingMode::Sequential);
    }

    #[test]
    fn test_runner_tile_ids_are_unique() {
        let runner = TileRunner::new(ProcessingMode::ParallelWith(3)).unwrap();
        let mut raster: Raster<u32> = Raster::new(30, 30);
        let seen = std::sync::Mutex::new(HashSet::new());
        runner
            .run(&mut raster, 7, |tile, _| {
                assert!(seen.lock().unwrap().insert((tile.row_offset, tile.col_offset)));
            })
            .unwrap();
        assert_eq!(seen.into_inner().unwrap().len(), 25);
    }

    fn panic_in_first_tile(mode: ProcessingMode) {
        let runner = TileRunner::new(mode).unwrap();
        let mut raster: Raster<u32> = Raster::new(10, 10);
        let err = runner
            .run(&mut raster, 5, |tile, mut view| {
                if tile.row_offset == 0 && tile.col_offset == 0 {
                    panic!("boom");
                }
                view.fill(7);
            })
            .unwrap_err();
        assert!(err.is_aborted());
        // the other three tiles still ran
        assert_eq!(raster.data().iter().filter(|&&px| px == 7).count(), 75);
    }

    #[test]
    fn test_runner_panic_aborts_after_draining_parallel() {
        panic_in_first_tile(ProcessingMode::ParallelWith(2));
    }

    #[test]
    fn test_runner_panic_aborts_after_draining_sequential() {
        panic_in_first_tile(ProcessingMode::Sequential);
    }

    #[test]
    fn test_runner_on_empty_raster() {
        let runner = TileRunner::new(ProcessingMode::Sequential).unwrap();
        let mut raster: Raster<u32> = Raster::new(0, 0);
        let run = runner.run(&mut raster, 1, |_, _| unreachable!()).unwrap();
        assert_eq!(run.tiles, 0);
    }
}
