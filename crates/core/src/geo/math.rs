//! Periodic wrapping and clamping of angles

/// Wrap `v` into `[min, max]` by adding or subtracting the range width.
///
/// Values already inside the range (including either endpoint) are returned
/// as-is. Non-finite values cannot be wrapped and are returned unchanged.
pub fn window(v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() || (min..=max).contains(&v) {
        return v;
    }
    let width = max - min;
    if v < min {
        let turns = ((min - v) / width).ceil();
        let wrapped = v + turns * width;
        // rounding can leave the value a hair past the upper bound
        if wrapped > max { wrapped - width } else { wrapped }
    } else {
        let turns = ((v - max) / width).ceil();
        let wrapped = v - turns * width;
        if wrapped < min { wrapped + width } else { wrapped }
    }
}

/// Clamp `v` into `[min, max]`.
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.max(min).min(max)
}
