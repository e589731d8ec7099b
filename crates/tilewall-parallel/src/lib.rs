//! TileWall Parallel - Render Driver
//!
//! Per-process shell around one render pass of one logical view:
//! acquire the context, draw, composite across ranks, register the
//! resulting tile and flush.
//!
//! Cross-process work is delegated through two seams:
//! - `ProcessController`: rank/size plus gather and scatter of images
//! - `ImageCompositor`: merges per-rank partial images

mod controller;
mod compositor;
mod driver;

pub use controller::{LocalController, ProcessController, ThreadController, ThreadGroup};
pub use compositor::{
    tile_share, CompositeContext, CompositeMode, GatherCompositor, ImageCompositor, PassThroughCompositor,
};
pub use driver::{DrawCallback, DrawContext, ParallelRenderDriver, RenderOutcome, RenderState};

use tilewall_display::DisplayError;

/// Process controller error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Rank {rank} disconnected")]
    Disconnected { rank: usize },

    #[error("Expected one image per rank ({expected}), got {actual}")]
    RankMismatch { expected: usize, actual: usize },
}

/// Compositing error
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

/// Render pass error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Cannot acquire rendering context: {0}")]
    Context(#[from] DisplayError),

    #[error("Compositing failed: {0}")]
    Composite(#[from] CompositeError),
}
