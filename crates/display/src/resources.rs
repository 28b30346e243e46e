//! Base-image sources for projections

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use sunclock_core::{Error, Result};
use tracing::debug;

/// Supplies decoded base images by name.
pub trait ImageSource: Send + Sync {
    /// Decode the image called `name`, such as `projections/cassini.jpg`.
    fn load(&self, name: &str) -> Result<RgbaImage>;
}

/// Reads images from files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageSource for DirectoryImageSource {
    fn load(&self, name: &str) -> Result<RgbaImage> {
        let path = self.root.join(name);
        debug!("loading base image {}", path.display());

        let unavailable = |reason: String| Error::ImageUnavailable {
            name: name.to_string(),
            reason,
        };

        let reader = ImageReader::open(&path)
            .map_err(|e| unavailable(format!("{}: {}", path.display(), e)))?
            .with_guessed_format()
            .map_err(|e| unavailable(e.to_string()))?;
        let image = reader.decode().map_err(|e| unavailable(e.to_string()))?;
        Ok(image.to_rgba8())
    }
}

/// In-memory images keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: HashMap<String, RgbaImage>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, name: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(name, image);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, image: RgbaImage) {
        self.images.insert(name.into(), image);
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, name: &str) -> Result<RgbaImage> {
        self.images.get(name).cloned().ok_or_else(|| Error::ImageUnavailable {
            name: name.to_string(),
            reason: "not registered".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn memory_source_lookup() {
        let source = MemoryImageSource::new().with_image("a.png", RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255])));
        let img = source.load("a.png").unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert!(matches!(source.load("b.png"), Err(Error::ImageUnavailable { .. })));
    }

    #[test]
    fn directory_source_missing_file() {
        let source = DirectoryImageSource::new(std::env::temp_dir().join("sunclock-no-such-dir"));
        let err = source.load("projections/cassini.jpg").unwrap_err();
        assert!(matches!(err, Error::ImageUnavailable { ref name, .. } if name == "projections/cassini.jpg"));
    }

    #[test]
    fn directory_source_decodes_png() {
        let root = std::env::temp_dir().join(format!("sunclock-images-{}", std::process::id()));
        std::fs::create_dir_all(root.join("projections")).unwrap();
        let path = root.join("projections/test.png");
        RgbaImage::from_pixel(3, 5, Rgba([9, 8, 7, 255])).save(&path).unwrap();

        let img = DirectoryImageSource::new(&root).load("projections/test.png").unwrap();
        assert_eq!(img.dimensions(), (3, 5));
        assert_eq!(img.get_pixel(1, 1), &Rgba([9, 8, 7, 255]));

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn directory_source_rejects_garbage() {
        let root = std::env::temp_dir().join(format!("sunclock-garbage-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("broken.jpg"), b"not an image").unwrap();

        let err = DirectoryImageSource::new(&root).load("broken.jpg").unwrap_err();
        assert!(matches!(err, Error::ImageUnavailable { .. }));

        std::fs::remove_dir_all(&root).ok();
    }
}
