//! Page Layer
//!
//! The host side of the pipeline: source images with their natural and
//! displayed sizes, and the container that holds the generated views next to
//! each image and switches them on click.

pub mod container;

pub use container::{Figure, ViewContainer, Visibility};

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::vision::AnalysisImage;

/// One image entry in a page manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    /// Image file, relative to the manifest
    pub path: PathBuf,
    /// Alternative text shown in the full-image caption
    #[serde(default)]
    pub alt: Option<String>,
    /// Laid-out width; defaults to the natural width
    #[serde(default)]
    pub display_width: Option<u32>,
    /// Laid-out height; defaults to the natural height
    #[serde(default)]
    pub display_height: Option<u32>,
}

impl PageEntry {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            alt: None,
            display_width: None,
            display_height: None,
        }
    }
}

/// Ordered list of images making up a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageManifest {
    #[serde(default)]
    pub images: Vec<PageEntry>,
}

/// Load a page manifest, resolving image paths against its directory
pub fn load_manifest(path: &Path) -> Result<PageManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page manifest: {:?}", path))?;
    let mut manifest: PageManifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse page manifest: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for entry in &mut manifest.images {
        if entry.path.is_relative() {
            entry.path = base.join(&entry.path);
        }
    }

    Ok(manifest)
}

/// A decoded page image
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position on the page
    pub index: usize,
    pub path: PathBuf,
    pub alt: String,
    /// Full-resolution pixels
    pub raster: RgbaImage,
    /// Laid-out size (width, height)
    pub display: (u32, u32),
}

impl PageImage {
    pub fn new(index: usize, path: PathBuf, alt: String, raster: RgbaImage, display: Option<(u32, u32)>) -> Self {
        let display = display.unwrap_or_else(|| raster.dimensions());
        Self {
            index,
            path,
            alt,
            raster,
            display,
        }
    }

    /// Decode an image file described by a manifest entry
    pub fn load(index: usize, entry: &PageEntry) -> Result<Self> {
        let raster = image::open(&entry.path)
            .with_context(|| format!("Failed to load image: {:?}", entry.path))?
            .to_rgba8();
        let (natural_width, natural_height) = raster.dimensions();
        let shown = (
            entry.display_width.unwrap_or(natural_width),
            entry.display_height.unwrap_or(natural_height),
        );
        debug!(
            "Loaded {:?}: natural {}x{}, displayed {}x{}",
            entry.path, natural_width, natural_height, shown.0, shown.1
        );

        Ok(Self::new(
            index,
            entry.path.clone(),
            entry.alt.clone().unwrap_or_default(),
            raster,
            Some(shown),
        ))
    }

    /// Intrinsic size (width, height)
    pub fn natural(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Raster for the detector, resampled to the displayed size
    pub fn analysis_image(&self) -> AnalysisImage {
        let (width, height) = self.display;
        let raster = if self.display == self.natural() || width == 0 || height == 0 {
            self.raster.clone()
        } else {
            imageops::resize(&self.raster, width, height, FilterType::Triangle)
        };

        AnalysisImage {
            source: self.path.clone(),
            raster,
        }
    }
}

/// An image that produced no views
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFailure {
    /// 0-based position on the page
    pub index: usize,
    pub path: PathBuf,
    pub reason: String,
}

/// Decode every image of a manifest in page order
///
/// Images that fail to decode are returned as failures and keep their page
/// index, so the rest of the page is still processed.
pub fn load_images(manifest: &PageManifest) -> (Vec<PageImage>, Vec<ImageFailure>) {
    let mut images = Vec::with_capacity(manifest.images.len());
    let mut failures = Vec::new();

    for (index, entry) in manifest.images.iter().enumerate() {
        match PageImage::load(index, entry) {
            Ok(image) => images.push(image),
            Err(e) => {
                warn!("Image {} ({:?}) skipped: {:#}", index + 1, entry.path, e);
                failures.push(ImageFailure {
                    index,
                    path: entry.path.clone(),
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    info!(
        "Loaded {} of {} page images",
        images.len(),
        manifest.images.len()
    );
    (images, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_display_defaults_to_natural() {
        let image = PageImage::new(0, PathBuf::from("a.png"), String::new(), RgbaImage::new(40, 30), None);
        assert_eq!(image.display, (40, 30));
        assert_eq!(image.natural(), (40, 30));
    }

    #[test]
    fn test_analysis_image_uses_display_size() {
        let image = PageImage::new(
            0,
            PathBuf::from("a.png"),
            String::new(),
            RgbaImage::new(400, 300),
            Some((200, 150)),
        );
        let analysis = image.analysis_image();
        assert_eq!(analysis.raster.dimensions(), (200, 150));
        assert_eq!(analysis.source, PathBuf::from("a.png"));
    }

    #[test]
    fn test_load_manifest_resolves_paths() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[images]]
path = "photo.jpg"
alt = "Two people"
display_width = 640

[[images]]
path = "/abs/other.png"
"#
        )
        .unwrap();

        let manifest = load_manifest(file.path()).unwrap();
        let base = file.path().parent().unwrap();

        assert_eq!(manifest.images.len(), 2);
        assert_eq!(manifest.images[0].path, base.join("photo.jpg"));
        assert_eq!(manifest.images[0].alt.as_deref(), Some("Two people"));
        assert_eq!(manifest.images[0].display_width, Some(640));
        assert_eq!(manifest.images[0].display_height, None);
        assert_eq!(manifest.images[1].path, PathBuf::from("/abs/other.png"));
    }

    #[test]
    fn test_load_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbaImage::new(6, 4).save(&path).unwrap();

        let mut entry = PageEntry::from_path(&path);
        entry.display_height = Some(2);
        let image = PageImage::load(3, &entry).unwrap();

        assert_eq!(image.index, 3);
        assert_eq!(image.natural(), (6, 4));
        assert_eq!(image.display, (6, 2));
    }

    #[test]
    fn test_load_missing_image_fails() {
        let entry = PageEntry::from_path("/nonexistent/image.png");
        assert!(PageImage::load(0, &entry).is_err());
    }

    #[test]
    fn test_load_images_keeps_going_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbaImage::new(4, 4).save(&good).unwrap();
        let missing = dir.path().join("missing.png");

        let manifest = PageManifest {
            images: vec![
                PageEntry::from_path(&good),
                PageEntry::from_path(&missing),
                PageEntry::from_path(&good),
            ],
        };
        let (images, failures) = load_images(&manifest);

        let indices: Vec<_> = images.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].path, missing);
        assert!(!failures[0].reason.is_empty());
    }
}
