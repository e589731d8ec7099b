//! TileWall Image - Raw Image Buffers
//!
//! Leaf types shared by every TileWall crate:
//! - `RawImage`: an owned, deep-copied RGBA pixel buffer with a validity flag
//! - `Viewport`: normalized [0,1] rectangle on a render window
//! - `PixelRect`: the same rectangle resolved to framebuffer pixels
//! - `TileLayout`: grid of physical displays driven by one rank each

mod raw_image;
mod viewport;
mod layout;

pub use raw_image::{PixelSink, RawImage};
pub use viewport::{PixelRect, Viewport};
pub use layout::TileLayout;

/// Color (RGBA)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array(rgba: [u8; 4]) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2], a: rgba[3] }
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Image error
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("Cannot encode an invalid image")]
    Empty,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_constants() {
        assert_eq!(Color::WHITE.r, 255);
        assert_eq!(Color::BLACK.r, 0);
        assert_eq!(Color::TRANSPARENT.a, 0);
    }

    #[test]
    fn test_color_from_array() {
        assert_eq!(Color::from_array([255, 0, 0, 255]), Color::RED);
        assert_eq!(Color::from_array([0, 0, 255, 255]), Color::rgb(0, 0, 255));
    }
}
