//! Persisting rendered views
//!
//! Views are written as PNG files next to a `views.json` manifest that keeps
//! the figures in display order together with the navigation map.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::navigation::{NavigationGraph, ViewId};
use crate::page::{ViewContainer, Visibility};
use crate::render::RenderedView;

/// Name of the manifest written into the output directory
pub const MANIFEST_FILE: &str = "views.json";

/// One figure as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureRecord {
    pub id: ViewId,
    pub caption: String,
    /// PNG file relative to the manifest; absent for empty views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub visibility: Visibility,
}

/// Everything needed to replay a multiplexed page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewsManifest {
    pub viewport_width: u32,
    pub figures: Vec<FigureRecord>,
    pub navigation: NavigationGraph,
}

/// File name used for a view's raster
pub fn view_file_name(id: ViewId) -> String {
    match id.rank() {
        Some(rank) => format!("view_{}_{}.png", id.image_index() + 1, rank),
        None => format!("view_{}.png", id.image_index() + 1),
    }
}

/// Write every figure and the manifest into `dir`
pub fn write_views(
    dir: &Path,
    viewport_width: u32,
    container: &ViewContainer,
    graph: &NavigationGraph,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut figures = Vec::with_capacity(container.len());
    for figure in container.iter() {
        let (width, height) = figure.view.dimensions();
        let file = if width == 0 || height == 0 {
            warn!("View {} is empty, no image written", figure.id());
            None
        } else {
            let name = PathBuf::from(view_file_name(figure.id()));
            figure.view.raster.save(dir.join(&name))?;
            Some(name)
        };

        figures.push(FigureRecord {
            id: figure.id(),
            caption: figure.view.caption.clone(),
            file,
            width,
            height,
            visibility: figure.visibility,
        });
    }

    let manifest = ViewsManifest {
        viewport_width,
        figures,
        navigation: graph.clone(),
    };
    let path = dir.join(MANIFEST_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;

    info!("Wrote {} views to {:?}", manifest.figures.len(), dir);
    Ok(path)
}

/// Read a manifest written by [`write_views`]
pub fn read_manifest(path: &Path) -> Result<ViewsManifest> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Rebuild the figure container from a manifest and the PNGs next to it
///
/// Figures keep their display order and visibility. Views written without a
/// file come back as empty rasters of the recorded size.
pub fn restore_container(dir: &Path, manifest: &ViewsManifest) -> Result<ViewContainer> {
    let mut container = ViewContainer::default();

    // `place` puts each figure first, so feed them back to front
    for record in manifest.figures.iter().rev() {
        let raster = match &record.file {
            Some(file) => image::open(dir.join(file))?.to_rgba8(),
            None => RgbaImage::new(record.width, record.height),
        };
        container.place(
            RenderedView {
                id: record.id,
                caption: record.caption.clone(),
                raster,
            },
            record.visibility,
        );
    }

    debug!("Restored {} figures from {:?}", container.len(), dir);
    Ok(container)
}
