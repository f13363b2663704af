//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::DEFAULT_VIEWPORT_WIDTH;
use crate::vision::{ShrinkPolicy, MAX_ORDERED_REGIONS};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Layout settings
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Crop shrink policy
    #[serde(default)]
    pub crop: ShrinkPolicy,
    /// Detector settings
    #[serde(default)]
    pub detector: DetectorSettings,
    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

impl AppConfig {
    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(self.layout.viewport_width > 0, "layout.viewport_width must be at least 1");
        ensure!(
            self.crop.divisor.is_finite() && self.crop.divisor > 0.0,
            "crop.divisor must be a positive number, got {}",
            self.crop.divisor
        );
        ensure!(
            (0.0..=1.0).contains(&self.detector.min_score),
            "detector.min_score must be between 0 and 1, got {}",
            self.detector.min_score
        );
        ensure!(
            self.detector.max_boxes <= MAX_ORDERED_REGIONS,
            "detector.max_boxes must not exceed {}",
            MAX_ORDERED_REGIONS
        );
        Ok(())
    }
}

/// Narrow layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width every view is scaled to; must match the host's breakpoint
    pub viewport_width: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
        }
    }
}

/// Detector-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// Suffix of the detection files stored next to each image
    pub sidecar_suffix: String,
    /// Minimum prediction score (0.0 - 1.0)
    pub min_score: f32,
    /// Maximum number of predictions per image
    pub max_boxes: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            sidecar_suffix: "detections.json".to_string(),
            min_score: 0.5,
            max_boxes: 20,
        }
    }
}

/// Output-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory receiving rendered views and the manifest
    pub dir: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("multiplexed"),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
