//! The display surface and its gate
//!
//! All render state lives behind one mutex, the gate. Every operation that
//! touches the state holds it for its whole duration:
//!
//! - resize: refitting the geometry and recreating the light map
//! - render: the complete render pass, including the wait for every tile
//! - paint: reading the base image and light map through a [`Frame`]
//! - configure: swapping projection, base image or resolution
//!
//! A paint therefore never sees a half-written light map, and a finished
//! render pass is visible to the next paint that acquires the gate.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::Serialize;
use sunclock_colormap::{composite_over, ShadeParams};
use sunclock_core::projection::{MapProjection, Projection};
use sunclock_core::raster::Raster;
use sunclock_core::{exposure, CoordinatePair, Error, Result};
use sunclock_parallel::ProcessingMode;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::geometry::Geometry;
use crate::options::{ListenerId, Options, DEFAULT_RESOLUTION};
use crate::renderer::{LightMapRenderer, RenderStats};
use crate::resources::ImageSource;
use crate::scheduler::RenderScheduler;

/// Delay between periodic render passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Construction parameters for a [`DisplaySurface`].
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Delay between the end of one periodic pass and the start of the next
    pub interval: Duration,
    /// Worker pool used for tile computation
    pub mode: ProcessingMode,
    pub shade: ShadeParams,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            mode: ProcessingMode::Parallel,
            shade: ShadeParams::default(),
        }
    }
}

/// Operations that hold the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOp {
    Resize,
    Render,
    Paint,
    Configure,
    /// Snapshot of a single setting.
    Read,
}

/// Notified on every gate acquisition and release, while the gate is held.
pub trait GateObserver: Send + Sync {
    fn entered(&self, op: GateOp);
    fn exited(&self, op: GateOp);
}

/// Why a render pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoProjection,
    /// The map has no pixels yet (no geometry, or zero area).
    NoLightMap,
}

/// Result of a completed render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderStats),
    Skipped(SkipReason),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    pub fn stats(&self) -> Option<&RenderStats> {
        match self {
            RenderOutcome::Rendered(stats) => Some(stats),
            RenderOutcome::Skipped(_) => None,
        }
    }
}

/// A point on the map and the sun's exposure there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    /// Surface coordinates, origin bottom-left
    pub surface: CoordinatePair,
    /// Latitude, longitude in degrees
    pub geographic: CoordinatePair,
    pub exposure: f64,
}

/// Consistent view of the render state, borrowed under the gate.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub projection: Option<Projection>,
    pub geometry: Geometry,
    pub base_image: Option<&'a RgbaImage>,
    pub light_map: Option<&'a Raster<u32>>,
}

impl Frame<'_> {
    /// The map at its fitted size: the base image scaled to the map (black
    /// when absent) with the light map blended over it.
    pub fn composite(&self) -> RgbaImage {
        let (w, h) = (self.geometry.map_width as u32, self.geometry.map_height as u32);
        let mut map = match self.base_image {
            Some(base) if w > 0 && h > 0 => {
                if base.dimensions() == (w, h) {
                    base.clone()
                } else {
                    imageops::resize(base, w, h, FilterType::Triangle)
                }
            }
            _ => RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])),
        };

        if let Some(light_map) = self.light_map {
            if let Err(e) = composite_over(&mut map, light_map) {
                warn!("light map not composited: {}", e);
            }
        }
        map
    }

    /// [`composite`](Self::composite) centred on a black window-sized canvas.
    pub fn composite_window(&self) -> RgbaImage {
        let g = self.geometry;
        let mut canvas = RgbaImage::from_pixel(g.window_width as u32, g.window_height as u32, Rgba([0, 0, 0, 255]));
        imageops::overlay(&mut canvas, &self.composite(), g.offset_x as i64, g.offset_y as i64);
        canvas
    }
}

struct RenderState {
    projection: Option<Projection>,
    resolution: u32,
    base_image: Option<RgbaImage>,
    geometry: Geometry,
    light_map: Option<Raster<u32>>,
}

impl RenderState {
    fn refit(&mut self, window_width: usize, window_height: usize) {
        let aspect = self
            .base_image
            .as_ref()
            .map(|img| img.width() as f64 / img.height() as f64);
        let g = Geometry::fit(window_width, window_height, aspect);
        self.geometry = g;

        if g.is_empty() {
            if self.light_map.take().is_some() {
                debug!("light map dropped for zero-area geometry");
            }
            return;
        }

        let stale = self
            .light_map
            .as_ref()
            .map_or(true, |lm| !lm.has_size(g.map_width, g.map_height));
        if stale {
            debug!(width = g.map_width, height = g.map_height, "light map recreated");
            self.light_map = Some(Raster::new(g.map_height, g.map_width));
        }
    }
}

/// Exclusive access to the render state. Reports exit to the observer
/// before the mutex is released.
struct Gate<'a> {
    state: MutexGuard<'a, RenderState>,
    op: GateOp,
    observer: Option<Arc<dyn GateObserver>>,
}

impl Deref for Gate<'_> {
    type Target = RenderState;

    fn deref(&self) -> &RenderState {
        &self.state
    }
}

impl DerefMut for Gate<'_> {
    fn deref_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }
}

impl Drop for Gate<'_> {
    fn drop(&mut self) {
        if let Some(observer) = &self.observer {
            observer.exited(self.op);
        }
    }
}

struct Shared {
    state: Mutex<RenderState>,
    renderer: LightMapRenderer,
    images: Box<dyn ImageSource>,
    clock: Box<dyn Clock>,
    observer: RwLock<Option<Arc<dyn GateObserver>>>,
    closed: AtomicBool,
}

impl Shared {
    fn enter(&self, op: GateOp) -> Result<Gate<'_>> {
        let state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                drop(poisoned);
                self.state.clear_poison();
                warn!(?op, "render state gate poisoned");
                return Err(Error::aborted(format!("{:?} abandoned: render state gate poisoned", op)));
            }
        };

        let observer = self.observer.read().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(observer) = &observer {
            observer.entered(op);
        }
        Ok(Gate { state, op, observer })
    }

    fn render(&self) -> Result<RenderOutcome> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::aborted("surface has been shut down"));
        }

        let mut gate = self.enter(GateOp::Render)?;
        let Some(projection) = gate.projection else {
            return Ok(RenderOutcome::Skipped(SkipReason::NoProjection));
        };
        let resolution = gate.resolution;
        let Some(light_map) = gate.light_map.as_mut() else {
            return Ok(RenderOutcome::Skipped(SkipReason::NoLightMap));
        };

        info!("redrawing light-map ...");
        let now = self.clock.now();
        match self.renderer.render(light_map, resolution, projection, &now) {
            Ok(stats) => {
                info!(tiles = stats.tiles, step = stats.step, "light-map redrawn in {:?}", stats.elapsed);
                Ok(RenderOutcome::Rendered(stats))
            }
            Err(e) => {
                warn!("render pass abandoned: {}", e);
                Err(e)
            }
        }
    }
}

struct OptionsBinding {
    options: Arc<Options>,
    projection: ListenerId,
    resolution: ListenerId,
}

/// The map display: render state, its gate, the renderer and the timer.
pub struct DisplaySurface {
    shared: Arc<Shared>,
    scheduler: RenderScheduler,
    binding: Mutex<Option<OptionsBinding>>,
}

impl DisplaySurface {
    /// Create a hidden surface with no projection and no geometry.
    pub fn new<I, C>(images: I, clock: C, config: SurfaceConfig) -> Result<Self>
    where
        I: ImageSource + 'static,
        C: Clock + 'static,
    {
        let renderer = LightMapRenderer::new(config.mode, config.shade)?;
        let workers = renderer.worker_threads();

        let shared = Arc::new(Shared {
            state: Mutex::new(RenderState {
                projection: None,
                resolution: DEFAULT_RESOLUTION,
                base_image: None,
                geometry: Geometry::default(),
                light_map: None,
            }),
            renderer,
            images: Box::new(images),
            clock: Box::new(clock),
            observer: RwLock::new(None),
            closed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&shared);
        let scheduler = RenderScheduler::new(config.interval, move || {
            if let Some(shared) = weak.upgrade() {
                if let Err(e) = shared.render() {
                    debug!("scheduled render failed: {}", e);
                }
            }
        })?;

        debug!(workers, interval = ?config.interval, "display surface created");
        Ok(Self {
            shared,
            scheduler,
            binding: Mutex::new(None),
        })
    }

    /// Switch projection, loading its base image.
    ///
    /// Returns `None` if the projection is unchanged; otherwise renders once
    /// and makes sure the timer is running. A base image that cannot be
    /// loaded is logged and the map is drawn without one.
    pub fn set_projection(&self, projection: Option<Projection>) -> Result<Option<RenderOutcome>> {
        if self.projection()? == projection {
            return Ok(None);
        }

        let base_image = projection.and_then(|p| self.load_base_image(p));
        {
            let mut gate = self.shared.enter(GateOp::Configure)?;
            gate.projection = projection;
            gate.base_image = base_image;
            let g = gate.geometry;
            gate.refit(g.window_width, g.window_height);
        }

        match projection {
            Some(p) => info!("projection set to {}", p),
            None => info!("projection cleared"),
        }
        self.changed().map(Some)
    }

    /// Change the maximum number of tiles per axis.
    ///
    /// Returns `None` if the resolution is unchanged.
    pub fn set_resolution(&self, resolution: u32) -> Result<Option<RenderOutcome>> {
        {
            let mut gate = self.shared.enter(GateOp::Configure)?;
            if gate.resolution == resolution {
                return Ok(None);
            }
            gate.resolution = resolution;
        }

        info!("light-map resolution set to {}", resolution);
        self.changed().map(Some)
    }

    /// New window size: refit the map, re-render and make sure the timer runs.
    pub fn on_resize(&self, width: usize, height: usize) -> Result<RenderOutcome> {
        {
            let mut gate = self.shared.enter(GateOp::Resize)?;
            gate.refit(width, height);
            debug!(width, height, geometry = ?gate.geometry, "resized");
        }
        self.scheduler.start();
        self.render_now()
    }

    /// The surface became visible: start the periodic timer.
    pub fn on_show(&self) -> bool {
        self.scheduler.start()
    }

    /// The surface was hidden: stop the periodic timer.
    pub fn on_hide(&self) -> bool {
        self.scheduler.stop()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Periodic passes run so far.
    pub fn scheduled_passes(&self) -> u64 {
        self.scheduler.ticks()
    }

    /// Run one render pass on the calling thread and wait for all tiles.
    pub fn render_now(&self) -> Result<RenderOutcome> {
        self.shared.render()
    }

    /// Call `f` with a consistent frame while holding the gate.
    pub fn paint<R>(&self, f: impl FnOnce(&Frame<'_>) -> R) -> Result<R> {
        let gate = self.shared.enter(GateOp::Paint)?;
        let frame = Frame {
            projection: gate.projection,
            geometry: gate.geometry,
            base_image: gate.base_image.as_ref(),
            light_map: gate.light_map.as_ref(),
        };
        Ok(f(&frame))
    }

    /// Describe the map point under a window pixel.
    ///
    /// Returns `None` outside the map, without a projection, or when the
    /// gate is unavailable.
    pub fn inspect(&self, window_x: f64, window_y: f64) -> Option<Inspection> {
        let (projection, geometry) = self.read(|s| (s.projection, s.geometry)).ok()?;
        let projection = projection?;
        let (mx, my) = geometry.to_map(window_x, window_y)?;

        let surface = CoordinatePair::new(
            mx / geometry.map_width as f64,
            1.0 - my / geometry.map_height as f64,
        );
        let geographic = projection.to_geographic(&surface);
        let exposure = exposure(&geographic, &self.shared.clock.now());

        info!("Click [{}] --> [{}] -- exposure = {:.4}", surface, geographic, exposure);
        Some(Inspection {
            surface,
            geographic,
            exposure,
        })
    }

    /// Follow `options`: apply its current values now and every later change.
    ///
    /// Replaces any earlier binding. Listeners hold only a weak reference to
    /// the surface.
    pub fn bind_options(self: &Arc<Self>, options: &Arc<Options>) -> Result<()> {
        self.unbind_options();

        let weak = Arc::downgrade(self);
        let projection = options.projection.add_listener(move |_, new| {
            if let Some(surface) = weak.upgrade() {
                if let Err(e) = surface.set_projection(*new) {
                    warn!("projection change not applied: {}", e);
                }
            }
        });

        let weak = Arc::downgrade(self);
        let resolution = options.light_resolution.add_listener(move |_, new| {
            if let Some(surface) = weak.upgrade() {
                if let Err(e) = surface.set_resolution(*new) {
                    warn!("resolution change not applied: {}", e);
                }
            }
        });

        *self.binding.lock().unwrap_or_else(|e| e.into_inner()) = Some(OptionsBinding {
            options: Arc::clone(options),
            projection,
            resolution,
        });

        self.set_projection(options.projection.get())?;
        self.set_resolution(options.light_resolution.get())?;
        Ok(())
    }

    /// Stop following options. Returns `false` if none were bound.
    pub fn unbind_options(&self) -> bool {
        let binding = self.binding.lock().unwrap_or_else(|e| e.into_inner()).take();
        match binding {
            Some(b) => {
                b.options.projection.remove_listener(b.projection);
                b.options.light_resolution.remove_listener(b.resolution);
                true
            }
            None => false,
        }
    }

    /// Attach or detach the gate observer.
    pub fn set_gate_observer(&self, observer: Option<Arc<dyn GateObserver>>) {
        *self.shared.observer.write().unwrap_or_else(|e| e.into_inner()) = observer;
    }

    pub fn projection(&self) -> Result<Option<Projection>> {
        self.read(|s| s.projection)
    }

    pub fn resolution(&self) -> Result<u32> {
        self.read(|s| s.resolution)
    }

    pub fn geometry(&self) -> Result<Geometry> {
        self.read(|s| s.geometry)
    }

    pub fn has_base_image(&self) -> Result<bool> {
        self.read(|s| s.base_image.is_some())
    }

    pub fn renderer(&self) -> &LightMapRenderer {
        &self.shared.renderer
    }

    /// Stop the timer, drop option listeners and refuse further render
    /// passes. A pass already running finishes.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scheduler.shutdown();
        self.unbind_options();
        info!("display surface shut down");
    }

    fn changed(&self) -> Result<RenderOutcome> {
        self.scheduler.start();
        self.render_now()
    }

    fn read<R>(&self, f: impl FnOnce(&RenderState) -> R) -> Result<R> {
        let gate = self.shared.enter(GateOp::Read)?;
        Ok(f(&*gate))
    }

    fn load_base_image(&self, projection: Projection) -> Option<RgbaImage> {
        match self.shared.images.load(projection.image_name()) {
            Ok(image) => {
                debug!(width = image.width(), height = image.height(), "loaded {}", projection.image_name());
                Some(image)
            }
            Err(e) => {
                warn!("Cannot open image {} associated with the projection {}: {}", projection.image_name(), projection, e);
                None
            }
        }
    }
}

impl Drop for DisplaySurface {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DisplaySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySurface")
            .field("scheduler", &self.scheduler)
            .field("closed", &self.shared.closed.load(Ordering::SeqCst))
            .finish()
    }
}
