//! # Sunclock Colormap
//!
//! Exposure shading and overlay compositing for sunclock.
//!
//! A light-map pixel is a packed `0xAARRGGBB` value: a fixed tint whose
//! alpha darkens the base map where the sun is low. [`exposure_to_argb`]
//! produces those pixels and [`composite_over`] blends a finished light map
//! onto an RGBA base image.
//!
//! ## Usage
//!
//! ```ignore
//! use sunclock_colormap::{exposure_to_argb, ShadeParams};
//!
//! let params = ShadeParams::default();
//! let pixel = exposure_to_argb(0.25, &params);
//! ```

mod render;
mod shade;

pub use render::{argb_to_rgba, composite_over};
pub use shade::{alpha_for, exposure_to_argb, intensity, pack_argb, unpack_argb, Rgb, ShadeParams};
