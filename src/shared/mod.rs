//! Shared state between the per-image pipelines
//!
//! Holds the page-wide navigation map, the view container and the busy
//! indicator behind thread-safe locks.

pub mod progress;
pub mod state;

pub use state::SharedPageState;
