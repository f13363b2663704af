//! Object detection module
//!
//! The detector itself is an external service: it receives a raster of one
//! image and answers with labelled bounding boxes. This module defines the
//! shapes exchanged with it and a sidecar-file backend that reads
//! precomputed COCO-SSD style predictions from disk.

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MultiplexError, Result};

/// Axis-aligned box as (x, y, width, height)
///
/// Serialized as a `[x, y, width, height]` array, matching the prediction
/// format emitted by COCO-SSD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// A single detected object, in analysis-space pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label reported by the detector (e.g. "person")
    #[serde(rename = "class")]
    pub class_label: String,
    /// Detector confidence (0.0 - 1.0)
    #[serde(rename = "score")]
    pub confidence: f32,
    /// Bounding box in analysis space
    pub bbox: BoundingBox,
}

impl Detection {
    #[cfg(test)]
    pub fn new(class_label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bbox,
        }
    }
}

/// Raster handed to the detector for one page image
#[derive(Debug, Clone)]
pub struct AnalysisImage {
    /// Where the source image came from
    pub source: PathBuf,
    /// Pixels at the displayed size (analysis space)
    pub raster: RgbaImage,
}

/// External object detector
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects in one image
    async fn detect(&self, image: &AnalysisImage) -> Result<Vec<Detection>>;
}

/// Detector backed by `<stem>.<suffix>` files stored next to each image
#[derive(Debug, Clone)]
pub struct SidecarDetector {
    /// File suffix appended to the image stem
    pub suffix: String,
    /// Predictions scoring below this are dropped
    pub min_score: f32,
    /// Maximum number of predictions kept per image
    pub max_boxes: usize,
}

impl Default for SidecarDetector {
    fn default() -> Self {
        Self {
            suffix: "detections.json".to_string(),
            // COCO-SSD defaults
            min_score: 0.5,
            max_boxes: 20,
        }
    }
}

impl SidecarDetector {
    pub fn new(suffix: &str, min_score: f32, max_boxes: usize) -> Self {
        Self {
            suffix: suffix.to_string(),
            min_score,
            max_boxes,
        }
    }

    /// Path of the sidecar file for a given image
    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        image.with_file_name(format!("{}.{}", stem, self.suffix))
    }

    /// Apply the score threshold and box limit, best scores first
    fn filter(&self, mut predictions: Vec<Detection>) -> Vec<Detection> {
        predictions.retain(|p| p.confidence >= self.min_score);
        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        predictions.truncate(self.max_boxes);
        predictions
    }
}

#[async_trait]
impl Detector for SidecarDetector {
    async fn detect(&self, image: &AnalysisImage) -> Result<Vec<Detection>> {
        let path = self.sidecar_path(&image.source);
        let (width, height) = image.raster.dimensions();
        debug!("Reading detections for a {}x{} analysis image from {:?}", width, height, path);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            MultiplexError::Detector(format!("cannot read {}: {}", path.display(), e))
        })?;
        let predictions: Vec<Detection> = serde_json::from_str(&content)?;

        let total = predictions.len();
        let kept = self.filter(predictions);
        info!(
            "Detector returned {} objects for {:?} ({} kept)",
            total,
            image.source,
            kept.len()
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_parses_coco_ssd_shape() {
        let json = r#"[{"bbox": [10, 20, 30, 40], "class": "person", "score": 0.87}]"#;
        let parsed: Vec<Detection> = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].class_label, "person");
        assert_eq!(parsed[0].bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert!((parsed[0].confidence - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_diagonal() {
        let bbox = BoundingBox::new(0.0, 0.0, 30.0, 40.0);
        assert!((bbox.diagonal() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sidecar_path() {
        let detector = SidecarDetector::default();
        let path = detector.sidecar_path(Path::new("/tmp/page/cat.jpg"));
        assert_eq!(path, PathBuf::from("/tmp/page/cat.detections.json"));
    }

    #[test]
    fn test_filter_threshold_and_limit() {
        let detector = SidecarDetector::new("detections.json", 0.5, 2);
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let kept = detector.filter(vec![
            Detection::new("a", 0.4, bbox),
            Detection::new("b", 0.6, bbox),
            Detection::new("c", 0.9, bbox),
            Detection::new("d", 0.7, bbox),
        ]);

        let labels: Vec<_> = kept.iter().map(|d| d.class_label.as_str()).collect();
        assert_eq!(labels, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_sidecar_detector_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("dog.png");
        std::fs::write(
            dir.path().join("dog.detections.json"),
            r#"[{"bbox": [1, 2, 3, 4], "class": "dog", "score": 0.95}]"#,
        )
        .unwrap();

        let detector = SidecarDetector::default();
        let image = AnalysisImage {
            source: image_path,
            raster: RgbaImage::new(4, 4),
        };
        let detections = detector.detect(&image).await.unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_label, "dog");
    }

    #[tokio::test]
    async fn test_sidecar_detector_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let detector = SidecarDetector::default();
        let image = AnalysisImage {
            source: dir.path().join("missing.png"),
            raster: RgbaImage::new(1, 1),
        };

        let result = detector.detect(&image).await;
        assert!(matches!(result, Err(MultiplexError::Detector(_))));
    }
}
