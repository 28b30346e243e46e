//! Light-map rendering
//!
//! One colour per tile: the tile's centre is projected to geographic
//! coordinates, the solar exposure there is shaded, and the resulting ARGB
//! pixel is written to every pixel of the tile. Tiles run in parallel on the
//! renderer's worker pool and [`LightMapRenderer::render`] returns only after
//! all of them are done.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sunclock_colormap::{exposure_to_argb, ShadeParams};
use sunclock_core::projection::{MapProjection, Projection};
use sunclock_core::raster::Raster;
use sunclock_core::{exposure, CoordinatePair, InstancePool, Result};
use sunclock_parallel::{tile_step, ProcessingMode, TileRunner};
use tracing::debug;

/// What one render pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Tiles computed
    pub tiles: usize,
    /// Tile edge length in pixels
    pub step: usize,
    pub elapsed: Duration,
}

/// Fills light maps with shaded solar exposure.
pub struct LightMapRenderer {
    runner: TileRunner,
    scratch: InstancePool<CoordinatePair>,
    shade: ShadeParams,
}

impl LightMapRenderer {
    pub fn new(mode: ProcessingMode, shade: ShadeParams) -> Result<Self> {
        Ok(Self {
            runner: TileRunner::new(mode)?,
            scratch: InstancePool::new(CoordinatePair::default),
            shade,
        })
    }

    pub fn shade(&self) -> &ShadeParams {
        &self.shade
    }

    /// Pool of scratch coordinate pairs shared by tile tasks.
    pub fn scratch(&self) -> &InstancePool<CoordinatePair> {
        &self.scratch
    }

    pub fn worker_threads(&self) -> usize {
        self.runner.worker_threads()
    }

    /// Render `light_map` for `projection` at `instant`, with at most
    /// `resolution` tiles along each axis.
    ///
    /// Row 0 of the light map is the top of the map, surface y = 1.
    pub fn render(
        &self,
        light_map: &mut Raster<u32>,
        resolution: u32,
        projection: Projection,
        instant: &DateTime<Utc>,
    ) -> Result<RenderStats> {
        let start = Instant::now();
        let (width, height) = (light_map.width(), light_map.height());
        let step = tile_step(width, height, resolution);

        let run = self.runner.run(light_map, step, |tile, mut pixels| {
            let (fx, fy) = tile.centre_fraction(width, height);

            let mut surface = self.scratch.checkout();
            surface.set(fx, 1.0 - fy);
            let mut geographic = self.scratch.checkout();
            projection.to_geographic_into(&surface, &mut geographic);

            let argb = exposure_to_argb(exposure(&geographic, instant), &self.shade);
            pixels.fill(argb);
        })?;

        let stats = RenderStats {
            tiles: run.tiles,
            step: run.step,
            elapsed: start.elapsed(),
        };
        debug!(
            projection = %projection,
            width,
            height,
            tiles = stats.tiles,
            step = stats.step,
            "light map rendered in {:?}",
            stats.elapsed
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for LightMapRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightMapRenderer")
            .field("runner", &self.runner)
            .field("shade", &self.shade)
            .finish()
    }
}
