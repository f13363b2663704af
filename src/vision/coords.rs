//! Coordinate mapping between analysis/display space and natural space

use crate::error::{MultiplexError, Result};
use crate::vision::detection::BoundingBox;

/// Ratio of natural to displayed size along each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Derive scale factors from an image's natural and displayed sizes
    ///
    /// Zero sizes are rejected instead of producing infinite or NaN scales.
    pub fn from_metrics(natural: (u32, u32), display: (u32, u32)) -> Result<Self> {
        let (natural_width, natural_height) = natural;
        let (display_width, display_height) = display;

        if natural_width == 0 || natural_height == 0 || display_width == 0 || display_height == 0 {
            return Err(MultiplexError::InvalidDimensions {
                natural_width,
                natural_height,
                display_width,
                display_height,
            });
        }

        Ok(Self {
            x: natural_width as f64 / display_width as f64,
            y: natural_height as f64 / display_height as f64,
        })
    }
}

/// Scale a box from analysis space into natural space
pub fn to_natural_space(bbox: BoundingBox, scale_x: f64, scale_y: f64) -> BoundingBox {
    BoundingBox {
        x: bbox.x * scale_x,
        y: bbox.y * scale_y,
        width: bbox.width * scale_x,
        height: bbox.height * scale_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factors() {
        let scale = ScaleFactors::from_metrics((1600, 900), (800, 300)).unwrap();
        assert!((scale.x - 2.0).abs() < 1e-9);
        assert!((scale.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            ScaleFactors::from_metrics((800, 600), (0, 600)),
            Err(MultiplexError::InvalidDimensions { display_width: 0, .. })
        ));
        assert!(ScaleFactors::from_metrics((800, 0), (400, 300)).is_err());
    }

    #[test]
    fn test_to_natural_space() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let mapped = to_natural_space(bbox, 2.0, 0.5);
        assert_eq!(mapped, BoundingBox::new(20.0, 10.0, 60.0, 20.0));
    }

    #[test]
    fn test_identity_scale() {
        let bbox = BoundingBox::new(5.0, 6.0, 7.0, 8.0);
        assert_eq!(to_natural_space(bbox, 1.0, 1.0), bbox);
    }
}
