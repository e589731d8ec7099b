//! TileWall
//!
//! Lets several logical views share one physical display, or one display
//! per rank on a tiled wall, without clobbering each other. Every view
//! keeps its last rendered image in a registry; each render pass replays
//! the others and draws its own image last.
//!
//! # Example
//! ```rust,ignore
//! use tilewall::{Config, TileWall, Viewport, LocalController, PassThroughCompositor};
//!
//! let wall = TileWall::new(Config::default())?;
//! let mut left = wall.driver(
//!     Viewport::new(0.0, 0.0, 0.5, 1.0),
//!     Box::new(LocalController),
//!     Box::new(PassThroughCompositor),
//! );
//! left.set_draw_callback(|ctx| ctx.clear(tilewall::Color::RED));
//! left.render()?;
//! wall.present().save_png("frame.png")?;
//! ```

mod config;
mod wall;

pub use config::{Config, ConfigError, TileLayoutConfig};
pub use wall::TileWall;

pub use tilewall_image::{Color, ImageError, PixelRect, PixelSink, RawImage, TileLayout, Viewport};
pub use tilewall_display::{
    DisplayError, FlushStats, RenderTarget, RenderWindow, Renderer, SharedRenderer, SharedWindow, TileHandle,
    TileKey, TileRegistry, ViewportGuard,
};
pub use tilewall_parallel::{
    CompositeContext, CompositeError, CompositeMode, ControllerError, DrawCallback, DrawContext, GatherCompositor,
    ImageCompositor, LocalController, ParallelRenderDriver, PassThroughCompositor, ProcessController, RenderError,
    RenderOutcome, RenderState, ThreadController, ThreadGroup,
};

// Re-export sub-crates for advanced usage
pub use tilewall_display as display;
pub use tilewall_image as image;
pub use tilewall_parallel as parallel;

/// TileWall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
