//! Parallel Render Driver
//!
//! Runs one render pass for one logical view:
//! `Idle -> ContextAcquired -> Drawing -> Composited -> TileRegistered -> Flushed -> Idle`.
//! Nothing is retried. A failed context acquisition registers no tile, so
//! the view's previous tile stays on screen.

use std::fmt;

use tilewall_display::{lock_renderer, FlushStats, SharedRenderer, TileHandle, TileKey, TileRegistry};
use tilewall_image::{Color, PixelRect, RawImage, Viewport};

use crate::{CompositeContext, CompositeMode, ImageCompositor, ProcessController, RenderError};

/// Render pass state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    ContextAcquired,
    Drawing,
    Composited,
    TileRegistered,
    Flushed,
}

/// What the draw callback gets to work with
pub struct DrawContext<'a> {
    image: &'a mut RawImage,
    rank: usize,
    num_processes: usize,
}

impl DrawContext<'_> {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    /// Pixel size of this rank's partial image
    pub fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn clear(&mut self, color: Color) {
        self.image.fill(color);
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        self.image.fill_rect(rect, color);
    }

    pub fn image_mut(&mut self) -> &mut RawImage {
        self.image
    }
}

/// Issues the actual drawing commands for one pass
pub type DrawCallback = Box<dyn FnMut(&mut DrawContext<'_>) + Send>;

/// Result of a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Whether this rank ended up with an image to display
    pub displayable: bool,
    pub flush: FlushStats,
}

/// Drives render passes for one logical view
pub struct ParallelRenderDriver {
    tile: TileHandle,
    renderer: SharedRenderer,
    controller: Box<dyn ProcessController>,
    compositor: Box<dyn ImageCompositor>,
    view: Viewport,
    mode: CompositeMode,
    draw: Option<DrawCallback>,
    state: RenderState,
}

impl ParallelRenderDriver {
    /// Create a driver with its own key in `registry`. The view covers the
    /// whole window until `with_viewport` says otherwise.
    pub fn new(
        registry: &TileRegistry,
        renderer: SharedRenderer,
        controller: Box<dyn ProcessController>,
        compositor: Box<dyn ImageCompositor>,
    ) -> Self {
        Self {
            tile: registry.register(),
            renderer,
            controller,
            compositor,
            view: Viewport::FULL,
            mode: CompositeMode::SingleDisplay,
            draw: None,
            state: RenderState::Idle,
        }
    }

    /// View region: on the window for single display, on the whole wall
    /// for tile display
    pub fn with_viewport(mut self, view: Viewport) -> Self {
        self.view = view;
        self
    }

    pub fn with_mode(mut self, mode: CompositeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_draw_callback<F>(&mut self, draw: F)
    where
        F: FnMut(&mut DrawContext<'_>) + Send + 'static,
    {
        self.draw = Some(Box::new(draw));
    }

    pub fn key(&self) -> TileKey {
        self.tile.key()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    pub fn rank(&self) -> usize {
        self.controller.rank()
    }

    /// Run one render pass. The driver is back in `Idle` afterwards,
    /// whether the pass succeeded or not.
    pub fn render(&mut self) -> Result<RenderOutcome, RenderError> {
        let result = self.render_pass();
        if let Err(err) = &result {
            tracing::warn!("Render of {} failed in {:?}: {}", self.key(), self.state, err);
        }
        self.transition(RenderState::Idle);
        result
    }

    fn render_pass(&mut self) -> Result<RenderOutcome, RenderError> {
        let window_size = {
            let mut renderer = lock_renderer(&self.renderer);
            renderer.make_current()?;
            renderer.window_size()
        };
        self.transition(RenderState::ContextAcquired);

        let (width, height) = self.view_pixel_size(window_size);
        let mut image = RawImage::blank(width, height);
        self.transition(RenderState::Drawing);
        if let Some(draw) = self.draw.as_mut() {
            let mut ctx = DrawContext {
                image: &mut image,
                rank: self.controller.rank(),
                num_processes: self.controller.num_processes(),
            };
            draw(&mut ctx);
        }

        let ctx = CompositeContext {
            controller: self.controller.as_ref(),
            view: self.view,
            mode: self.mode,
        };
        let mut composited = self.compositor.composite(&ctx, image)?;
        self.transition(RenderState::Composited);

        let physical = self.physical_viewport();
        if physical.is_none() {
            composited.mark_invalid();
        }
        self.tile
            .set_tile(physical.unwrap_or(self.view), Some(&self.renderer), &composited);
        self.transition(RenderState::TileRegistered);

        let flush = self.tile.flush_tiles();
        self.transition(RenderState::Flushed);

        Ok(RenderOutcome {
            displayable: composited.is_valid(),
            flush,
        })
    }

    /// Pixel size of the whole view's image
    fn view_pixel_size(&self, (width, height): (u32, u32)) -> (u32, u32) {
        let (width, height) = match self.mode {
            CompositeMode::SingleDisplay => (width, height),
            CompositeMode::TileDisplay(layout) => layout.wall_size(width, height),
        };
        let rect = self.view.to_pixels(width, height);
        (rect.width, rect.height)
    }

    /// Where this rank's share goes on its own window, if anywhere
    fn physical_viewport(&self) -> Option<Viewport> {
        match self.mode {
            CompositeMode::SingleDisplay => Some(self.view),
            CompositeMode::TileDisplay(layout) => {
                let tile = layout.tile_viewport(self.controller.rank())?;
                Some(self.view.intersect(&tile)?.relative_to(&tile))
            }
        }
    }

    fn transition(&mut self, next: RenderState) {
        tracing::debug!("{}: {:?} -> {:?}", self.key(), self.state, next);
        self.state = next;
    }
}

impl fmt::Debug for ParallelRenderDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelRenderDriver")
            .field("key", &self.key())
            .field("rank", &self.controller.rank())
            .field("view", &self.view)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalController, PassThroughCompositor};
    use std::sync::{Arc, Mutex};
    use tilewall_display::{RenderWindow, Renderer};

    fn driver(registry: &TileRegistry, window: &tilewall_display::SharedWindow, view: Viewport) -> ParallelRenderDriver {
        let renderer = Renderer::shared(window.clone(), view);
        ParallelRenderDriver::new(registry, renderer, Box::new(LocalController), Box::new(PassThroughCompositor))
            .with_viewport(view)
    }

    #[test]
    fn test_render_registers_and_flushes() {
        let window = RenderWindow::new(10, 10).unwrap().into_shared();
        let registry = TileRegistry::new();
        let mut view = driver(&registry, &window, Viewport::new(0.0, 0.0, 0.5, 1.0));
        view.set_draw_callback(|ctx| ctx.clear(Color::RED));

        let outcome = view.render().unwrap();
        assert!(outcome.displayable);
        assert_eq!(outcome.flush, FlushStats { pushed: 1, skipped: 0 });
        assert_eq!(view.state(), RenderState::Idle);
        assert!(registry.contains(view.key()));

        let window = window.lock().unwrap();
        assert_eq!(window.pixel(0, 0), Some(Color::RED));
        assert_eq!(window.pixel(9, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_draw_callback_runs_once_per_pass() {
        let window = RenderWindow::new(4, 4).unwrap().into_shared();
        let registry = TileRegistry::new();
        let calls = Arc::new(Mutex::new(0));
        let mut view = driver(&registry, &window, Viewport::FULL);

        let counter = calls.clone();
        view.set_draw_callback(move |ctx| {
            assert_eq!(ctx.size(), (4, 4));
            *counter.lock().unwrap() += 1;
        });

        view.render().unwrap();
        view.render().unwrap();
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_closed_context_keeps_previous_tile() {
        let window = RenderWindow::new(4, 4).unwrap().into_shared();
        let registry = TileRegistry::new();
        let mut view = driver(&registry, &window, Viewport::FULL);
        view.set_draw_callback(|ctx| ctx.clear(Color::GREEN));
        view.render().unwrap();

        window.lock().unwrap().close();
        view.set_draw_callback(|ctx| ctx.clear(Color::RED));
        let err = view.render().unwrap_err();

        assert!(matches!(err, RenderError::Context(_)));
        assert_eq!(view.state(), RenderState::Idle);
        assert!(registry.contains(view.key()));
        assert_eq!(window.lock().unwrap().pixel(0, 0), Some(Color::GREEN));
    }

    #[test]
    fn test_drop_erases_tile() {
        let window = RenderWindow::new(4, 4).unwrap().into_shared();
        let registry = TileRegistry::new();
        let mut view = driver(&registry, &window, Viewport::FULL);
        view.render().unwrap();
        assert_eq!(registry.len(), 1);

        drop(view);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_tile_display_outside_view_is_not_displayable() {
        // 2x1 wall, this process is rank 0 (left tile); view sits on the right
        let window = RenderWindow::new(4, 4).unwrap().into_shared();
        let registry = TileRegistry::new();
        let mut view = driver(&registry, &window, Viewport::new(0.6, 0.0, 1.0, 1.0))
            .with_mode(CompositeMode::TileDisplay(tilewall_image::TileLayout::new(2, 1)));
        view.set_draw_callback(|ctx| ctx.clear(Color::RED));

        let outcome = view.render().unwrap();
        assert!(!outcome.displayable);
        assert_eq!(outcome.flush, FlushStats { pushed: 0, skipped: 1 });
    }
}
