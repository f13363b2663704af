//! Render Layer
//!
//! Produces the viewport-width rasters for each view and writes them out.

pub mod compositor;
pub mod output;

pub use compositor::{RenderedView, ViewCompositor, DEFAULT_VIEWPORT_WIDTH};
pub use output::{read_manifest, restore_container, write_views};
