//! Vision Layer
//!
//! Turns the detector's raw boxes into ordered, natural-space crop
//! rectangles:
//! - `detection`: detector interface and sidecar backend
//! - `ordering`: reading order and ranks
//! - `coords`: analysis space to natural space
//! - `crop`: shrink policy and crop rectangles

pub mod coords;
pub mod crop;
pub mod detection;
pub mod ordering;

pub use coords::{to_natural_space, ScaleFactors};
pub use crop::{CropRect, ShrinkPolicy};
pub use detection::{AnalysisImage, BoundingBox, Detection, Detector, SidecarDetector};
pub use ordering::{order_regions, OrderedRegion, MAX_ORDERED_REGIONS};

use tracing::{debug, warn};

/// A region ready for compositing
#[derive(Debug, Clone)]
pub struct PlannedCrop {
    pub region: OrderedRegion,
    /// Crop in natural-image pixels
    pub rect: CropRect,
}

/// Run ordering, coordinate mapping and the shrink policy for one image
pub fn plan_crops(
    image_index: usize,
    detections: Vec<Detection>,
    scale: ScaleFactors,
    policy: &ShrinkPolicy,
) -> Vec<PlannedCrop> {
    order_regions(image_index, detections)
        .into_iter()
        .map(|region| {
            let natural = to_natural_space(region.detection.bbox, scale.x, scale.y);
            let rect = policy.apply(natural);
            debug!(
                "Region {} ranked {} ({}), crop {:?}",
                region.id, region.rank, region.detection.class_label, rect
            );
            if rect.is_empty() {
                warn!(
                    "Region {} ({}) shrinks to an empty crop {:?}",
                    region.id, region.detection.class_label, rect
                );
            }
            PlannedCrop { region, rect }
        })
        .collect()
}
