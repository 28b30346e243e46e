//! # Sunclock Display
//!
//! The stateful half of sunclock: a [`DisplaySurface`] owns the render state
//! (projection, resolution, base image, geometry and light map) behind a
//! single gate, re-renders it on a fixed-delay timer and on geometry or
//! configuration changes, and hands consistent [`Frame`]s to presenters.
//!
//! ```ignore
//! use std::sync::Arc;
//! use sunclock_display::{DirectoryImageSource, DisplaySurface, Options, SurfaceConfig, SystemClock};
//!
//! let options = Arc::new(Options::default());
//! let surface = Arc::new(DisplaySurface::new(
//!     DirectoryImageSource::new("assets"),
//!     SystemClock,
//!     SurfaceConfig::default(),
//! )?);
//! surface.bind_options(&options)?;
//! surface.on_resize(1280, 720)?;
//! let png = surface.paint(|frame| frame.composite())?;
//! ```

pub mod clock;
pub mod geometry;
pub mod options;
pub mod renderer;
pub mod resources;
pub mod scheduler;
pub mod surface;

pub use clock::{Clock, FixedClock, SystemClock};
pub use geometry::Geometry;
pub use options::{ListenerId, OptionCell, Options, OptionsSnapshot};
pub use renderer::{LightMapRenderer, RenderStats};
pub use resources::{DirectoryImageSource, ImageSource, MemoryImageSource};
pub use scheduler::RenderScheduler;
pub use surface::{
    DisplaySurface, Frame, GateObserver, GateOp, Inspection, RenderOutcome, SkipReason, SurfaceConfig,
};
