//! Page Analysis Driver
//!
//! Launches one pipeline per page image and lets them run concurrently:
//! detect, order, map, crop, render, then publish the image's navigation
//! cycle and views in one step. A failing image only loses its own views,
//! and that includes a pipeline that panics.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::navigation::CycleBuilder;
use crate::page::{ImageFailure, PageImage};
use crate::render::ViewCompositor;
use crate::shared::SharedPageState;
use crate::vision::{plan_crops, Detector, ScaleFactors, ShrinkPolicy};

/// Outcome of one successfully processed image
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub index: usize,
    pub path: PathBuf,
    /// Number of region views generated
    pub regions: usize,
}

/// Summary of a page run, both lists in page order
#[derive(Debug, Default)]
pub struct PageReport {
    pub completed: Vec<ImageReport>,
    pub failed: Vec<ImageFailure>,
}

impl PageReport {
    /// Merge failures from outside the pipelines, e.g. images that did not decode
    pub fn add_failures(&mut self, failures: impl IntoIterator<Item = ImageFailure>) {
        self.failed.extend(failures);
        self.failed.sort_by_key(|f| f.index);
    }
}

/// Runs the detection-to-view pipeline for every image of a page
#[derive(Clone)]
pub struct PageAnalysisDriver {
    detector: Arc<dyn Detector>,
    compositor: ViewCompositor,
    policy: ShrinkPolicy,
    state: Arc<SharedPageState>,
}

impl PageAnalysisDriver {
    /// Create a driver with a fresh page state
    pub fn new(detector: Arc<dyn Detector>, config: &AppConfig) -> Self {
        Self {
            detector,
            compositor: ViewCompositor::new(config.layout.viewport_width),
            policy: config.crop.clone(),
            state: Arc::new(SharedPageState::default()),
        }
    }

    /// Page state written by the pipelines
    pub fn state(&self) -> Arc<SharedPageState> {
        self.state.clone()
    }

    pub fn viewport_width(&self) -> u32 {
        self.compositor.viewport_width()
    }

    /// Process all images concurrently and wait for every pipeline
    pub async fn run(&self, images: Vec<PageImage>) -> PageReport {
        info!("Analysing {} images", images.len());

        let mut tasks = JoinSet::new();
        for image in images {
            let driver = self.clone();
            let busy = self.state.busy.begin();
            let index = image.index;
            let path = image.path.clone();
            tasks.spawn(async move {
                let _busy = busy;
                // Run the pipeline as its own task so a panic is reported
                // against this image instead of tearing down the join loop
                let pipeline = tokio::spawn(async move { driver.process(image).await });
                let outcome = match pipeline.await {
                    Ok(result) => result.map_err(|e| e.to_string()),
                    Err(e) => Err(format!("pipeline aborted: {}", e)),
                };
                (index, path, outcome)
            });
        }

        let mut report = PageReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, path, Ok(regions))) => {
                    info!("Image {} ({:?}): {} regions", index + 1, path, regions);
                    report.completed.push(ImageReport { index, path, regions });
                }
                Ok((index, path, Err(reason))) => {
                    warn!("Image {} ({:?}) skipped: {}", index + 1, path, reason);
                    report.failed.push(ImageFailure { index, path, reason });
                }
                Err(e) => {
                    error!("Image pipeline task failed: {}", e);
                }
            }
            debug!("{} images still in flight", self.state.busy.pending());
        }

        report.completed.sort_by_key(|r| r.index);
        report.failed.sort_by_key(|f| f.index);
        report
    }

    /// Pipeline for a single image, returns the number of regions
    async fn process(&self, image: PageImage) -> Result<usize> {
        let scale = ScaleFactors::from_metrics(image.natural(), image.display)?;
        let detections = self.detector.detect(&image.analysis_image()).await?;
        debug!("Image {}: {} detections", image.index + 1, detections.len());

        let planned = plan_crops(image.index, detections, scale, &self.policy);

        let mut cycle = CycleBuilder::new(image.index);
        let mut regions = Vec::with_capacity(planned.len());
        for crop in &planned {
            regions.push(self.compositor.render_region(&image.raster, crop));
            cycle.push(crop.region.id);
        }
        let full = self
            .compositor
            .render_full(&image.raster, image.index, &image.alt, planned.len())?;

        self.state.publish(cycle.finish(), regions, full)?;
        Ok(planned.len())
    }
}
