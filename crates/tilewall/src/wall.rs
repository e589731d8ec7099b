//! TileWall context
//!
//! One process's (or rank's) render window plus the registry its views
//! share. Replaces a process-wide singleton with an explicit value.

use tilewall_display::{RenderWindow, Renderer, SharedRenderer, SharedWindow, TileRegistry};
use tilewall_image::{RawImage, Viewport};
use tilewall_parallel::{CompositeMode, ImageCompositor, ParallelRenderDriver, ProcessController};

use crate::{Config, ConfigError};

/// Window and registry for one process
#[derive(Debug)]
pub struct TileWall {
    config: Config,
    window: SharedWindow,
    registry: TileRegistry,
}

impl TileWall {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let window = RenderWindow::with_background(config.width, config.height, config.background_color())?;
        tracing::info!(
            "Created {}x{} render window ({:?})",
            config.width,
            config.height,
            config.composite_mode()
        );

        Ok(Self {
            config,
            window: window.into_shared(),
            registry: TileRegistry::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn window(&self) -> &SharedWindow {
        &self.window
    }

    /// New renderer on this wall's window
    pub fn renderer(&self, viewport: Viewport) -> SharedRenderer {
        Renderer::shared(self.window.clone(), viewport)
    }

    /// New view rendering into `view`. In tile mode `view` is a region of
    /// the whole wall.
    pub fn driver(
        &self,
        view: Viewport,
        controller: Box<dyn ProcessController>,
        compositor: Box<dyn ImageCompositor>,
    ) -> ParallelRenderDriver {
        let mode = self.config.composite_mode();
        let renderer = match mode {
            CompositeMode::SingleDisplay => self.renderer(view),
            CompositeMode::TileDisplay(_) => self.renderer(Viewport::FULL),
        };
        ParallelRenderDriver::new(&self.registry, renderer, controller, compositor)
            .with_viewport(view)
            .with_mode(mode)
    }

    /// Copy of what is on screen right now
    pub fn present(&self) -> RawImage {
        self.window
            .lock()
            .map(|window| window.snapshot())
            .unwrap_or_else(|poisoned| poisoned.into_inner().snapshot())
    }
}
