//! RawImage
//!
//! Owned pixel buffer for one rendered sub-image. Backed by a tiny-skia
//! `Pixmap`, so pixels are premultiplied RGBA8, the same layout the
//! framebuffer uses. Cloning deep-copies the pixels.

use std::fmt;
use std::path::Path;

use tiny_skia::{BlendMode, FilterQuality, IntSize, Paint, Pixmap, PixmapPaint, PixmapRef, Rect, Transform};

use crate::{Color, ImageError, PixelRect};

/// Anything that can receive an image at its current viewport
pub trait PixelSink {
    /// Write `image` into the region covered by the sink's current viewport
    fn write_viewport(&mut self, image: &RawImage);
}

/// Raw image - pixel buffer plus validity flag
#[derive(Clone, Default)]
pub struct RawImage {
    pixmap: Option<Pixmap>,
    valid: bool,
}

impl RawImage {
    /// Create an empty, invalid image
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transparent image. Zero dimensions give an invalid image.
    pub fn blank(width: u32, height: u32) -> Self {
        match Pixmap::new(width, height) {
            Some(pixmap) => Self::from_pixmap(pixmap),
            None => Self::new(),
        }
    }

    /// Create an image filled with a single color
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut image = Self::blank(width, height);
        image.fill(color);
        image
    }

    /// Create from premultiplied RGBA8 data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let size = IntSize::from_wh(width, height).ok_or(ImageError::ZeroSize { width, height })?;
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ImageError::InvalidDataLength {
                expected,
                actual: data.len(),
            });
        }
        let actual = data.len();
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or(ImageError::InvalidDataLength { expected, actual })?;
        Ok(Self::from_pixmap(pixmap))
    }

    /// Wrap an existing pixmap
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap: Some(pixmap),
            valid: true,
        }
    }

    /// True iff storage is allocated and the image is not marked invalid
    pub fn is_valid(&self) -> bool {
        self.valid && self.pixmap.is_some()
    }

    /// Mark valid. Has no effect without allocated storage.
    pub fn mark_valid(&mut self) {
        self.valid = self.pixmap.is_some();
    }

    /// Mark invalid, keeping the pixels
    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }

    /// Reallocate as transparent pixels. The validity flag is left alone;
    /// zero dimensions release the storage.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width() == width && self.height() == height {
            return;
        }
        self.pixmap = Pixmap::new(width, height);
    }

    pub fn width(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::width)
    }

    pub fn height(&self) -> u32 {
        self.pixmap.as_ref().map_or(0, Pixmap::height)
    }

    /// Premultiplied pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.as_ref()?.pixel(x, y)?;
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Raw premultiplied RGBA bytes; empty without storage
    pub fn data(&self) -> &[u8] {
        match &self.pixmap {
            Some(pixmap) => pixmap.data(),
            None => &[],
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        self.pixmap.as_mut().map(Pixmap::data_mut)
    }

    /// Borrow the pixels of a valid image
    pub fn as_pixmap(&self) -> Option<PixmapRef<'_>> {
        if !self.is_valid() {
            return None;
        }
        self.pixmap.as_ref().map(|pixmap| pixmap.as_ref())
    }

    pub fn fill(&mut self, color: Color) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(color.to_skia());
        }
    }

    /// Overwrite a rectangle with a solid color
    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let Some(pixmap) = self.pixmap.as_mut() else { return };
        let Some(rect) = Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.blend_mode = BlendMode::Source;
        paint.anti_alias = false;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Copy out a sub-image. The rect is clipped to the image; an empty
    /// result is an invalid image.
    pub fn crop(&self, rect: PixelRect) -> RawImage {
        let cropped = self
            .as_pixmap()
            .zip(rect.to_int_rect())
            .and_then(|(pixmap, rect)| pixmap.clone_rect(rect));
        cropped.map_or_else(RawImage::new, RawImage::from_pixmap)
    }

    /// Composite `src` source-over onto this image, anchored at the origin
    pub fn blend_over(&mut self, src: &RawImage) {
        if !self.is_valid() {
            return;
        }
        let (Some(dst), Some(src)) = (self.pixmap.as_mut(), src.as_pixmap()) else {
            return;
        };
        dst.draw_pixmap(0, 0, src, &PixmapPaint::default(), Transform::identity(), None);
    }

    /// Overwrite `rect` with `src`, scaled with nearest-neighbour sampling
    pub fn blit_scaled(&mut self, src: &RawImage, rect: PixelRect) {
        if rect.is_empty() {
            return;
        }
        let (Some(dst), Some(src)) = (self.pixmap.as_mut(), src.as_pixmap()) else {
            return;
        };

        let sx = rect.width as f32 / src.width() as f32;
        let sy = rect.height as f32 / src.height() as f32;
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::Source,
            quality: FilterQuality::Nearest,
        };
        let transform = Transform::from_row(sx, 0.0, 0.0, sy, rect.x as f32, rect.y as f32);
        dst.draw_pixmap(0, 0, src, &paint, transform, None);
    }

    /// Push into the sink's current viewport. Invalid images are skipped.
    pub fn push_to_viewport<S: PixelSink + ?Sized>(&self, sink: &mut S) {
        if !self.is_valid() {
            tracing::trace!("Skipping push of invalid image");
            return;
        }
        sink.write_viewport(self);
    }

    /// Write as PNG (debugging aid)
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let pixmap = self.pixmap.as_ref().filter(|_| self.valid).ok_or(ImageError::Empty)?;
        pixmap
            .save_png(path)
            .map_err(|e| ImageError::Encode(e.to_string()))
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("valid", &self.is_valid())
            .finish()
    }
}
