//! Fitting the map into a window

use serde::{Deserialize, Serialize};

/// Size and placement of the map inside a window, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub window_width: usize,
    pub window_height: usize,
    pub map_width: usize,
    pub map_height: usize,
    pub offset_x: usize,
    pub offset_y: usize,
}

impl Geometry {
    /// Largest map of the given aspect ratio (width / height) that fits the
    /// window, centred.
    ///
    /// Without a usable aspect the map fills the window.
    pub fn fit(window_width: usize, window_height: usize, aspect: Option<f64>) -> Self {
        if window_width == 0 || window_height == 0 {
            return Self {
                window_width,
                window_height,
                ..Self::default()
            };
        }

        let ww = window_width as f64;
        let wh = window_height as f64;
        let window_aspect = ww / wh;
        let aspect = aspect
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(window_aspect);

        let (map_width, map_height) = if aspect >= window_aspect {
            (window_width, (ww / aspect).floor() as usize)
        } else {
            ((wh * aspect).floor() as usize, window_height)
        };
        let map_width = map_width.min(window_width);
        let map_height = map_height.min(window_height);

        Self {
            window_width,
            window_height,
            map_width,
            map_height,
            offset_x: (window_width - map_width) / 2,
            offset_y: (window_height - map_height) / 2,
        }
    }

    /// Whether the map has no pixels.
    pub fn is_empty(&self) -> bool {
        self.map_width == 0 || self.map_height == 0
    }

    /// Map-local pixel for a window pixel, if it falls on the map (edges inclusive).
    pub fn to_map(&self, window_x: f64, window_y: f64) -> Option<(f64, f64)> {
        if self.is_empty() || !window_x.is_finite() || !window_y.is_finite() {
            return None;
        }
        let x = window_x - self.offset_x as f64;
        let y = window_y - self.offset_y as f64;
        if x < 0.0 || y < 0.0 || x > self.map_width as f64 || y > self.map_height as f64 {
            return None;
        }
        Some((x, y))
    }
}
