//! Image Multiplexer - narrow-viewport views of page images
//!
//! Detects salient regions in each image of a page, renders every region as
//! its own viewport-width view and links the views into a click cycle:
//! full image, region 1, region 2, ..., full image.

mod app;
mod config;
mod error;
mod navigation;
mod page;
mod render;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::PageAnalysisDriver;
use crate::config::AppConfig;
use crate::navigation::ViewId;
use crate::page::{PageEntry, PageManifest};
use crate::shared::SharedPageState;
use crate::vision::SidecarDetector;

/// Image Multiplexer - split page images into clickable region views
#[derive(Parser, Debug)]
#[command(name = "image-multiplexer")]
#[command(about = "Cut detected regions out of page images and cycle through them")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect regions and render all views of a page
    Render {
        /// Image files, in page order
        images: Vec<PathBuf>,

        /// Page manifest (TOML) listing images with alt text and display sizes
        #[arg(short, long)]
        page: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Viewport width in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        viewport: Option<u32>,
    },
    /// Replay clicks through a rendered page
    Navigate {
        /// views.json written by `render`
        #[arg(long)]
        views: PathBuf,

        /// Identifier of the view being clicked first, e.g. "1." or "2.3"
        #[arg(long)]
        from: String,

        /// Number of clicks to replay
        #[arg(long, default_value = "1")]
        clicks: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_or_create_config(args.config.as_deref())?;

    match args.command {
        Command::Render {
            images,
            page,
            out,
            viewport,
        } => {
            if let Some(width) = viewport {
                config.layout.viewport_width = width;
            }
            if let Some(dir) = out {
                config.output.dir = dir;
            }
            config.validate()?;
            run_render(&config, images, page.as_deref())
        }
        Command::Navigate {
            views,
            from,
            clicks,
        } => run_navigate(&views, &from, clicks),
    }
}

/// Load configuration from an explicit path, the config directory, or defaults
fn load_or_create_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    let config = AppConfig::default();
    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring configuration {:?}: {:#}", config_path, e),
            }
        } else if let Err(e) = config::save_config(&config, &config_path) {
            warn!("Failed to write default configuration to {:?}: {:#}", config_path, e);
        } else {
            info!("Wrote default configuration to {:?}", config_path);
        }
    }
    info!("Using default configuration");
    Ok(config)
}

/// Detect, render and write every view of a page
fn run_render(config: &AppConfig, images: Vec<PathBuf>, page_file: Option<&Path>) -> Result<()> {
    let mut manifest = match page_file {
        Some(path) => page::load_manifest(path)?,
        None => PageManifest::default(),
    };
    manifest
        .images
        .extend(images.into_iter().map(PageEntry::from_path));
    if manifest.images.is_empty() {
        anyhow::bail!("No images given; pass image paths or --page");
    }

    let (images, load_failures) = page::load_images(&manifest);

    let detector = SidecarDetector::new(
        &config.detector.sidecar_suffix,
        config.detector.min_score,
        config.detector.max_boxes,
    );
    let driver = PageAnalysisDriver::new(Arc::new(detector), config);

    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let mut report = rt.block_on(driver.run(images));
    report.add_failures(load_failures);

    let state = driver.state();
    let container = state.container.lock();
    let graph = state.graph.read();
    if container.is_empty() {
        warn!("No image produced any views");
    }
    let manifest_path =
        render::write_views(&config.output.dir, driver.viewport_width(), &container, &graph)?;

    println!(
        "Rendered {} views ({} links) to {}",
        container.len(),
        graph.len(),
        manifest_path.display()
    );
    for image in &report.completed {
        println!(
            "  [{}] {} - {} regions",
            image.index + 1,
            image.path.display(),
            image.regions
        );
    }
    for failure in &report.failed {
        println!(
            "  [{}] {} - skipped: {}",
            failure.index + 1,
            failure.path.display(),
            failure.reason
        );
    }

    Ok(())
}

/// Restore a rendered page and replay clicks starting at one view
fn run_navigate(views: &Path, from: &str, clicks: usize) -> Result<()> {
    let manifest = render::read_manifest(views)
        .with_context(|| format!("Failed to read views manifest: {:?}", views))?;
    if manifest.navigation.is_empty() {
        anyhow::bail!("{:?} has no navigation links", views);
    }
    let mut current: ViewId = from.parse()?;

    let cycle = manifest.navigation.cycle(current.image_index())?;
    info!(
        "Image {} cycles through {} views",
        current.image_index() + 1,
        cycle.len()
    );

    let dir = views.parent().unwrap_or_else(|| Path::new(""));
    let container = render::restore_container(dir, &manifest)?;
    let state = SharedPageState::from_parts(manifest.navigation, container);
    state.container.lock().show(current)?;

    let describe = |id: ViewId| {
        let container = state.container.lock();
        match container.get(id) {
            Some(figure) => {
                let (width, height) = figure.view.dimensions();
                format!("{:>6}  {}x{}  {}", id.to_string(), width, height, figure.view.caption)
            }
            None => format!("{:>6}", id.to_string()),
        }
    };

    println!("{}", describe(current));
    for _ in 0..clicks {
        current = state.click(current)?;
        println!("{}", describe(current));
    }

    if let Some(shown) = state.container.lock().visible(current.image_index()) {
        info!("Image {} now shows {}", current.image_index() + 1, shown);
    }
    Ok(())
}
