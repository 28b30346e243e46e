//! Light-map to RGBA conversion and compositing.

use crate::shade::unpack_argb;
use sunclock_core::raster::Raster;
use sunclock_core::{Error, Result};

/// Convert a packed-ARGB light map to an RGBA pixel buffer.
///
/// Returns a `Vec<u8>` of length `rows * cols * 4` in row-major order.
pub fn argb_to_rgba(light_map: &Raster<u32>) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(light_map.len() * 4);
    for &px in light_map.data().iter() {
        let (a, c) = unpack_argb(px);
        rgba.extend_from_slice(&[c.r, c.g, c.b, a]);
    }
    rgba
}

/// Alpha-blend a light map over an RGBA base buffer of the same size, in place.
///
/// The base is treated as opaque; its alpha channel is set to 255.
pub fn composite_over(base: &mut [u8], light_map: &Raster<u32>) -> Result<()> {
    let expected = light_map.len() * 4;
    if base.len() != expected {
        return Err(Error::InvalidDimensions {
            width: light_map.width(),
            height: light_map.height(),
        });
    }

    for (dst, &px) in base.chunks_exact_mut(4).zip(light_map.data().iter()) {
        let (a, c) = unpack_argb(px);
        let a = a as u32;
        let inv = 255 - a;
        dst[0] = ((c.r as u32 * a + dst[0] as u32 * inv + 127) / 255) as u8;
        dst[1] = ((c.g as u32 * a + dst[1] as u32 * inv + 127) / 255) as u8;
        dst[2] = ((c.b as u32 * a + dst[2] as u32 * inv + 127) / 255) as u8;
        dst[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_to_rgba_basic() {
        let mut r = Raster::<u32>::new(1, 2);
        r.set(0, 0, 0xFF102030).unwrap();
        r.set(0, 1, 0x00000000).unwrap();

        let rgba = argb_to_rgba(&r);
        assert_eq!(rgba, vec![0x10, 0x20, 0x30, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn composite_extremes() {
        let mut r = Raster::<u32>::new(1, 3);
        r.set(0, 0, 0xFF000000).unwrap(); // opaque black
        r.set(0, 1, 0x00000000).unwrap(); // transparent
        r.set(0, 2, 0x80FFFFFF).unwrap(); // half white

        let mut base = vec![200, 100, 50, 255, 200, 100, 50, 255, 0, 0, 0, 0];
        composite_over(&mut base, &r).unwrap();

        assert_eq!(&base[0..4], &[0, 0, 0, 255]);
        assert_eq!(&base[4..8], &[200, 100, 50, 255]);
        assert_eq!(&base[8..12], &[128, 128, 128, 255]);
    }

    #[test]
    fn composite_rejects_size_mismatch() {
        let r = Raster::<u32>::new(2, 2);
        let mut base = vec![0u8; 12];
        assert!(composite_over(&mut base, &r).is_err());
    }
}
