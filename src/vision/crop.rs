//! Crop rectangles and the shrink policy applied before compositing

use serde::{Deserialize, Serialize};

use crate::vision::detection::BoundingBox;

/// Crop rectangle in natural-image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; `None` for empty rectangles
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

/// How far detected boxes are pulled in before cropping
///
/// Detector boxes are loose, so each side loses `1/divisor` of the box size.
/// The top edge is left alone by default: with people the crop otherwise
/// ends up cutting through heads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShrinkPolicy {
    /// Fraction denominator for the trim on each edge
    pub divisor: f64,
    /// Also trim the top edge
    pub trim_top: bool,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self {
            divisor: 10.0,
            trim_top: false,
        }
    }
}

impl ShrinkPolicy {
    /// Shrink a natural-space box into a crop rectangle
    ///
    /// Negative sizes clamp to zero; fractional coordinates truncate toward
    /// zero the way canvas pixel reads do.
    pub fn apply(&self, bbox: BoundingBox) -> CropRect {
        let dx = (bbox.width / self.divisor).round();
        let dy = (bbox.height / self.divisor).round();

        let x = bbox.x + dx;
        let width = bbox.width - 2.0 * dx;
        let (y, height) = if self.trim_top {
            (bbox.y + dy, bbox.height - 2.0 * dy)
        } else {
            (bbox.y, bbox.height - dy)
        };

        CropRect::new(
            x.trunc() as i64,
            y.trunc() as i64,
            clamp_extent(width),
            clamp_extent(height),
        )
    }
}

fn clamp_extent(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.trunc().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shrink_keeps_top_edge() {
        let rect = ShrinkPolicy::default().apply(BoundingBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect, CropRect::new(10, 0, 80, 45));
    }

    #[test]
    fn test_shrink_trim_top() {
        let policy = ShrinkPolicy {
            divisor: 10.0,
            trim_top: true,
        };
        let rect = policy.apply(BoundingBox::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(rect, CropRect::new(10, 5, 80, 40));
    }

    #[test]
    fn test_shrink_rounds_half_up() {
        // dx = round(2.5) = 3, dy = round(1.5) = 2
        let rect = ShrinkPolicy::default().apply(BoundingBox::new(4.0, 7.0, 25.0, 15.0));
        assert_eq!(rect, CropRect::new(7, 7, 19, 13));
    }

    #[test]
    fn test_degenerate_clamps_to_zero() {
        let policy = ShrinkPolicy {
            divisor: 2.0,
            trim_top: false,
        };
        let rect = policy.apply(BoundingBox::new(10.0, 10.0, 3.0, 3.0));
        assert_eq!(rect.width, 0);
        assert!(rect.is_empty());
        assert_eq!(rect.aspect_ratio(), None);
    }

    #[test]
    fn test_aspect_ratio() {
        let rect = CropRect::new(0, 0, 80, 40);
        assert_eq!(rect.aspect_ratio(), Some(2.0));
    }
}
