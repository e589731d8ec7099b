//! Viewport math
//!
//! Normalized render-window rectangles and their pixel equivalents.
//! Viewport coordinates have their origin at the bottom-left corner,
//! framebuffer pixels at the top-left.

/// Normalized `[xmin, ymin, xmax, ymax]` rectangle on a render window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

impl Viewport {
    /// The whole render window
    pub const FULL: Viewport = Viewport { xmin: 0.0, ymin: 0.0, xmax: 1.0, ymax: 1.0 };

    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    pub const fn from_array(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    pub const fn to_array(self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// All values in [0,1] with non-empty extent on both axes
    pub fn is_well_formed(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.xmin)
            && in_unit(self.ymin)
            && in_unit(self.xmax)
            && in_unit(self.ymax)
            && self.xmin < self.xmax
            && self.ymin < self.ymax
    }

    /// Overlapping region, or `None` if the two do not overlap
    pub fn intersect(&self, other: &Viewport) -> Option<Viewport> {
        let v = Viewport {
            xmin: self.xmin.max(other.xmin),
            ymin: self.ymin.max(other.ymin),
            xmax: self.xmax.min(other.xmax),
            ymax: self.ymax.min(other.ymax),
        };
        (v.xmin < v.xmax && v.ymin < v.ymax).then_some(v)
    }

    /// Re-express this viewport in the local [0,1] space of `outer`
    pub fn relative_to(&self, outer: &Viewport) -> Viewport {
        let (w, h) = (outer.width(), outer.height());
        if w <= 0.0 || h <= 0.0 {
            return *self;
        }
        Viewport {
            xmin: (self.xmin - outer.xmin) / w,
            ymin: (self.ymin - outer.ymin) / h,
            xmax: (self.xmax - outer.xmin) / w,
            ymax: (self.ymax - outer.ymin) / h,
        }
    }

    /// Resolve to a pixel rectangle on a `width`x`height` framebuffer.
    ///
    /// Edges are rounded to the nearest pixel and clamped to the
    /// framebuffer; a malformed viewport yields an empty rectangle.
    pub fn to_pixels(&self, width: u32, height: u32) -> PixelRect {
        let (w, h) = (width as f64, height as f64);
        let clamp_x = |v: f64| (v * w).round().clamp(0.0, w) as u32;
        let clamp_y = |v: f64| ((1.0 - v) * h).round().clamp(0.0, h) as u32;

        let left = clamp_x(self.xmin);
        let right = clamp_x(self.xmax);
        let top = clamp_y(self.ymax);
        let bottom = clamp_y(self.ymin);

        PixelRect {
            x: left,
            y: top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }
}

/// Pixel rectangle with a top-left origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub(crate) fn to_int_rect(self) -> Option<tiny_skia::IntRect> {
        tiny_skia::IntRect::from_xywh(self.x as i32, self.y as i32, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(Viewport::FULL.is_well_formed());
        assert!(Viewport::new(0.0, 0.0, 0.5, 1.0).is_well_formed());
        assert!(!Viewport::new(0.5, 0.0, 0.5, 1.0).is_well_formed());
        assert!(!Viewport::new(-0.1, 0.0, 0.5, 1.0).is_well_formed());
        assert!(!Viewport::new(0.0, 0.0, 0.5, 1.2).is_well_formed());
    }

    #[test]
    fn test_to_pixels_flips_y() {
        // Bottom half of a 100x50 window is rows 25..50
        let rect = Viewport::new(0.0, 0.0, 1.0, 0.5).to_pixels(100, 50);
        assert_eq!(rect, PixelRect::new(0, 25, 100, 25));

        let rect = Viewport::new(0.4, 0.0, 1.0, 1.0).to_pixels(100, 10);
        assert_eq!(rect, PixelRect::new(40, 0, 60, 10));
    }

    #[test]
    fn test_malformed_to_pixels_is_empty() {
        let rect = Viewport::new(0.8, 0.0, 0.2, 1.0).to_pixels(100, 100);
        assert!(rect.is_empty());

        let rect = Viewport::new(-1.0, -1.0, 2.0, 2.0).to_pixels(10, 10);
        assert_eq!(rect, PixelRect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_intersect() {
        let a = Viewport::new(0.0, 0.0, 0.5, 1.0);
        let b = Viewport::new(0.4, 0.0, 1.0, 1.0);
        assert_eq!(a.intersect(&b), Some(Viewport::new(0.4, 0.0, 0.5, 1.0)));

        let c = Viewport::new(0.6, 0.0, 1.0, 1.0);
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_relative_to() {
        let outer = Viewport::new(0.5, 0.0, 1.0, 0.5);
        let inner = Viewport::new(0.5, 0.0, 0.75, 0.5);
        assert_eq!(inner.relative_to(&outer), Viewport::new(0.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn test_pixel_rect_contains() {
        let rect = PixelRect::new(10, 10, 5, 5);
        assert!(rect.contains(10, 10));
        assert!(rect.contains(14, 14));
        assert!(!rect.contains(15, 10));
    }
}
