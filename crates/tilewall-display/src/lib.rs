//! TileWall Display - Tile Registry
//!
//! Bookkeeping that lets several logical views share one physical display.
//! Each view registers its last rendered image (a tile) under its own key;
//! `TileRegistry::flush_tiles` replays every tile into the framebuffer and
//! draws the calling view's tile last so it ends up on top.
//!
//! This crate provides:
//! - `RenderTarget`: the renderer seam (viewport get/set, framebuffer blit)
//! - `RenderWindow` / `Renderer`: software implementation over a tiny-skia framebuffer
//! - `ViewportGuard`: scoped viewport override, restored on drop
//! - `TileKey`, `TileRegistry`, `TileHandle`: the registry itself

mod key;
mod target;
mod window;
mod guard;
mod registry;

pub use key::TileKey;
pub use target::{RenderTarget, SharedRenderer, lock_renderer};
pub use window::{RenderWindow, Renderer, SharedWindow};
pub use guard::ViewportGuard;
pub use registry::{FlushStats, TileHandle, TileRegistry};

/// Display error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    #[error("Render window is closed")]
    Closed,

    #[error("Render window size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
}
