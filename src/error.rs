//! Error types for the multiplexing pipeline

use thiserror::Error;

/// Errors raised by the detection-to-view pipeline and the navigation graph
#[derive(Error, Debug)]
pub enum MultiplexError {
    /// Natural or displayed image size is unusable for scaling
    #[error("invalid image dimensions: natural {natural_width}x{natural_height}, displayed {display_width}x{display_height}")]
    InvalidDimensions {
        natural_width: u32,
        natural_height: u32,
        display_width: u32,
        display_height: u32,
    },
    /// A click arrived for a view that has no successor in the graph
    #[error("unknown view identifier: {0}")]
    UnknownIdentifier(String),
    /// A cycle tried to claim an identifier that is already linked
    #[error("view identifier already present in navigation graph: {0}")]
    DuplicateIdentifier(String),
    /// Following the successor links from a root never returns to it
    #[error("navigation cycle starting at {0} is broken")]
    BrokenCycle(String),
    /// Text that does not parse as `<image>.` or `<image>.<rank>`
    #[error("malformed view identifier: {0:?}")]
    InvalidIdentifier(String),
    /// The external detector failed for one image
    #[error("detector failed: {0}")]
    Detector(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MultiplexError>;
