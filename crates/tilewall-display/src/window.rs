//! Software render window
//!
//! A render window owns one framebuffer; any number of renderers share it,
//! each drawing into its own viewport.

use std::sync::{Arc, Mutex, MutexGuard};

use tilewall_image::{Color, PixelRect, PixelSink, RawImage, Viewport};

use crate::{DisplayError, RenderTarget, SharedRenderer};

/// Shared render window handle
pub type SharedWindow = Arc<Mutex<RenderWindow>>;

/// Render window backed by a tiny-skia framebuffer
#[derive(Debug)]
pub struct RenderWindow {
    framebuffer: RawImage,
    background: Color,
    closed: bool,
}

impl RenderWindow {
    /// Create a window cleared to opaque black
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        Self::with_background(width, height, Color::BLACK)
    }

    pub fn with_background(width: u32, height: u32, background: Color) -> Result<Self, DisplayError> {
        let framebuffer = RawImage::filled(width, height, background);
        if !framebuffer.is_valid() {
            return Err(DisplayError::ZeroSize { width, height });
        }
        Ok(Self {
            framebuffer,
            background,
            closed: false,
        })
    }

    pub fn into_shared(self) -> SharedWindow {
        Arc::new(Mutex::new(self))
    }

    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }

    /// Reset the framebuffer to the background color
    pub fn clear(&mut self) {
        self.framebuffer.fill(self.background);
    }

    /// Blit `image` into `rect`, scaling to fit
    pub fn write(&mut self, rect: PixelRect, image: &RawImage) {
        self.framebuffer.blit_scaled(image, rect);
    }

    /// Read back a region of the framebuffer
    pub fn read(&self, rect: PixelRect) -> RawImage {
        self.framebuffer.crop(rect)
    }

    /// Copy of the whole framebuffer
    pub fn snapshot(&self) -> RawImage {
        self.framebuffer.clone()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.framebuffer.pixel(x, y)
    }

    /// Close the window; later context acquisition fails
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn make_current(&self) -> Result<(), DisplayError> {
        if self.closed {
            return Err(DisplayError::Closed);
        }
        Ok(())
    }
}

fn lock_window(window: &SharedWindow) -> MutexGuard<'_, RenderWindow> {
    window.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Recovering poisoned render window lock");
        poisoned.into_inner()
    })
}

/// Renderer drawing into a viewport of a shared window
#[derive(Debug)]
pub struct Renderer {
    viewport: Viewport,
    window: SharedWindow,
}

impl Renderer {
    pub fn new(window: SharedWindow, viewport: Viewport) -> Self {
        Self { viewport, window }
    }

    /// Create a renderer already wrapped for sharing with the registry
    pub fn shared(window: SharedWindow, viewport: Viewport) -> SharedRenderer {
        Arc::new(Mutex::new(Self::new(window, viewport)))
    }

    pub fn window(&self) -> &SharedWindow {
        &self.window
    }

    /// Read back the pixels under the current viewport
    pub fn capture(&self) -> RawImage {
        let window = lock_window(&self.window);
        let rect = self.viewport.to_pixels(window.width(), window.height());
        window.read(rect)
    }
}

impl PixelSink for Renderer {
    fn write_viewport(&mut self, image: &RawImage) {
        let mut window = lock_window(&self.window);
        let rect = self.viewport.to_pixels(window.width(), window.height());
        tracing::trace!("Blitting {}x{} image into {:?}", image.width(), image.height(), rect);
        window.write(rect, image);
    }
}

impl RenderTarget for Renderer {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn window_size(&self) -> (u32, u32) {
        let window = lock_window(&self.window);
        (window.width(), window.height())
    }

    fn make_current(&mut self) -> Result<(), DisplayError> {
        lock_window(&self.window).make_current()
    }
}
