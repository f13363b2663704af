//! View compositing
//!
//! Every view is scaled to exactly the viewport width with its aspect ratio
//! preserved. Region views are cut from the full-resolution source in two
//! stages: the crop is first copied at native size into its own buffer, then
//! that buffer is scaled into the output.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::{MultiplexError, Result};
use crate::navigation::ViewId;
use crate::vision::{CropRect, PlannedCrop};

/// Default viewport width in pixels, matching the narrow-layout breakpoint
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 320;

/// A scaled raster belonging to one view
#[derive(Debug, Clone)]
pub struct RenderedView {
    pub id: ViewId,
    pub caption: String,
    pub raster: RgbaImage,
}

impl RenderedView {
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }
}

/// Renders region and full-image views at viewport width
#[derive(Debug, Clone)]
pub struct ViewCompositor {
    viewport_width: u32,
    filter: FilterType,
}

impl Default for ViewCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH)
    }
}

impl ViewCompositor {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            viewport_width,
            filter: FilterType::Triangle,
        }
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Output height for a crop, `None` when the crop is degenerate
    pub fn region_height(&self, rect: &CropRect) -> Option<u32> {
        let aspect = rect.aspect_ratio()?;
        Some((self.viewport_width as f64 / aspect).round() as u32)
    }

    /// Output height for the full image
    pub fn full_height(&self, natural_width: u32, natural_height: u32) -> u32 {
        (self.viewport_width as f64 * natural_height as f64 / natural_width as f64).round() as u32
    }

    /// Render one cropped region of `source`
    pub fn render_region(&self, source: &RgbaImage, crop: &PlannedCrop) -> RenderedView {
        let region = &crop.region;
        let caption = format!(
            "Cropped image {} ({}):",
            region.id, region.detection.class_label
        );

        let raster = match self.region_height(&crop.rect) {
            Some(height) if height > 0 => {
                let block = extract_block(source, &crop.rect);
                self.scale_into(&block, height)
            }
            _ => {
                debug!(
                    "Region {} has a degenerate crop {:?}, rendering empty view",
                    region.id, crop.rect
                );
                RgbaImage::new(self.viewport_width, 0)
            }
        };

        debug!(
            "Rendered {} at {}x{} from crop {:?}",
            region.id,
            raster.width(),
            raster.height(),
            crop.rect
        );

        RenderedView {
            id: region.id,
            caption,
            raster,
        }
    }

    /// Render the uncropped image
    pub fn render_full(
        &self,
        source: &RgbaImage,
        image_index: usize,
        alt: &str,
        view_count: usize,
    ) -> Result<RenderedView> {
        let (natural_width, natural_height) = source.dimensions();
        if natural_width == 0 || natural_height == 0 {
            return Err(MultiplexError::InvalidDimensions {
                natural_width,
                natural_height,
                display_width: self.viewport_width,
                display_height: 0,
            });
        }

        let height = self.full_height(natural_width, natural_height);
        let raster = if height > 0 {
            self.scale_into(source, height)
        } else {
            RgbaImage::new(self.viewport_width, 0)
        };

        Ok(RenderedView {
            id: ViewId::root(image_index),
            caption: format!(
                "Full image {}: \"{}\" ({} views)",
                image_index + 1,
                alt,
                view_count
            ),
            raster,
        })
    }

    fn scale_into(&self, block: &RgbaImage, height: u32) -> RgbaImage {
        let mut output = RgbaImage::new(self.viewport_width, height);
        let scaled = imageops::resize(block, self.viewport_width, height, self.filter);
        imageops::replace(&mut output, &scaled, 0, 0);
        output
    }
}

/// Copy `rect` out of `source` at native size
///
/// Parts of the rectangle that fall outside the source stay transparent.
pub fn extract_block(source: &RgbaImage, rect: &CropRect) -> RgbaImage {
    let mut block = RgbaImage::new(rect.width, rect.height);
    imageops::replace(&mut block, source, -rect.x, -rect.y);
    block
}
