//! Exposure → packed ARGB shading.

/// RGB color (0-255 per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color from a `0xRRGGBB` value; the top byte is ignored.
    pub const fn from_hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    pub const fn to_hex(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Parameters for light-map shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeParams {
    /// Overlay color. Only its opacity varies with exposure.
    pub tint: Rgb,
    /// Intensity assigned to zero exposure (night).
    pub floor: f64,
    /// Scale applied to `sqrt(exposure)` before adding `floor`.
    pub gain: f64,
}

/// Near-black tint. Callers wanting a pale warm overlay pass their own
/// through [`ShadeParams::with_tint`].
impl Default for ShadeParams {
    fn default() -> Self {
        Self {
            tint: Rgb::from_hex(0x0F0F0F),
            floor: 0.1,
            gain: 0.9,
        }
    }
}

impl ShadeParams {
    pub fn with_tint(tint: Rgb) -> Self {
        Self {
            tint,
            ..Self::default()
        }
    }
}

/// Perceived brightness for an exposure: `clamp(gain * sqrt(e) + floor, 0, 1)`.
///
/// Negative or NaN exposure counts as 0.
pub fn intensity(exposure: f64, params: &ShadeParams) -> f64 {
    let e = if exposure.is_nan() { 0.0 } else { exposure.max(0.0) };
    (params.gain * e.sqrt() + params.floor).clamp(0.0, 1.0)
}

/// Overlay alpha for an intensity: `255 - round(256 * intensity)`, clamped.
pub fn alpha_for(intensity: f64) -> u8 {
    (255.0 - (256.0 * intensity).round()).clamp(0.0, 255.0) as u8
}

/// Pack channels into `0xAARRGGBB`.
pub const fn pack_argb(a: u8, rgb: Rgb) -> u32 {
    ((a as u32) << 24) | rgb.to_hex()
}

/// Split `0xAARRGGBB` into alpha and color.
pub const fn unpack_argb(argb: u32) -> (u8, Rgb) {
    ((argb >> 24) as u8, Rgb::from_hex(argb))
}

/// Light-map pixel for an exposure value.
pub fn exposure_to_argb(exposure: f64, params: &ShadeParams) -> u32 {
    pack_argb(alpha_for(intensity(exposure, params)), params.tint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_is_mostly_opaque() {
        let p = ShadeParams::default();
        assert!((intensity(0.0, &p) - 0.1).abs() < 1e-12);
        // 255 - round(25.6) = 229
        assert_eq!(alpha_for(intensity(0.0, &p)), 229);
    }

    #[test]
    fn full_sun_is_transparent() {
        let p = ShadeParams::default();
        assert_eq!(intensity(1.0, &p), 1.0);
        assert_eq!(alpha_for(1.0), 0);
        assert_eq!(exposure_to_argb(1.0, &p), 0x000F0F0F);
    }

    #[test]
    fn alpha_decreases_with_exposure() {
        let p = ShadeParams::default();
        let mut last = u8::MAX;
        for i in 0..=20 {
            let a = alpha_for(intensity(i as f64 / 20.0, &p));
            assert!(a <= last);
            last = a;
        }
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let p = ShadeParams::default();
        assert_eq!(intensity(f64::NAN, &p), intensity(0.0, &p));
        assert_eq!(intensity(-3.0, &p), intensity(0.0, &p));
        assert_eq!(intensity(50.0, &p), 1.0);
        assert_eq!(alpha_for(-1.0), 255);
        assert_eq!(alpha_for(2.0), 0);
    }

    #[test]
    fn pack_and_unpack() {
        let tint = Rgb::new(0xFF, 0xEE, 0xAA);
        let argb = pack_argb(0x80, tint);
        assert_eq!(argb, 0x80FFEEAA);
        assert_eq!(unpack_argb(argb), (0x80, tint));
    }

    #[test]
    fn custom_tint_is_carried() {
        let p = ShadeParams::with_tint(Rgb::from_hex(0xFFE4B5));
        assert_eq!(exposure_to_argb(0.0, &p) & 0x00FF_FFFF, 0xFFE4B5);
    }
}
