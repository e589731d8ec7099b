//! Render targets
//!
//! The seam between the tile registry and whatever actually owns a
//! framebuffer. The registry only ever needs to move a viewport around
//! and push finished pixels; it never draws.

use std::sync::{Arc, Mutex, MutexGuard};

use tilewall_image::{PixelSink, Viewport};

use crate::DisplayError;

/// A renderer attached to a render window
pub trait RenderTarget: PixelSink {
    /// Current viewport on the render window
    fn viewport(&self) -> Viewport;

    /// Replace the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Pixel size of the render window behind this target
    fn window_size(&self) -> (u32, u32);

    /// Make the rendering context current for this thread
    fn make_current(&mut self) -> Result<(), DisplayError>;
}

/// Shared, lockable renderer. Views own these; the registry only keeps
/// weak references.
pub type SharedRenderer = Arc<Mutex<dyn RenderTarget + Send>>;

/// Lock a renderer, recovering from poisoning
pub fn lock_renderer<'a>(
    renderer: &'a Mutex<dyn RenderTarget + Send + 'static>,
) -> MutexGuard<'a, dyn RenderTarget + Send + 'static> {
    renderer.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Recovering poisoned renderer lock");
        poisoned.into_inner()
    })
}
