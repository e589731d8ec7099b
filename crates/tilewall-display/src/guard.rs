//! Scoped viewport override

use std::ops::{Deref, DerefMut};

use tilewall_image::Viewport;

use crate::RenderTarget;

/// Overrides a target's viewport for the guard's lifetime.
///
/// The previous viewport is captured on construction and put back on drop,
/// including during unwinding.
pub struct ViewportGuard<'a, T: RenderTarget + ?Sized> {
    target: &'a mut T,
    saved: Viewport,
}

impl<'a, T: RenderTarget + ?Sized> ViewportGuard<'a, T> {
    pub fn new(target: &'a mut T, viewport: Viewport) -> Self {
        let saved = target.viewport();
        target.set_viewport(viewport);
        Self { target, saved }
    }

    /// Viewport that will be restored
    pub fn saved(&self) -> Viewport {
        self.saved
    }
}

impl<T: RenderTarget + ?Sized> Deref for ViewportGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: RenderTarget + ?Sized> DerefMut for ViewportGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: RenderTarget + ?Sized> Drop for ViewportGuard<'_, T> {
    fn drop(&mut self) {
        self.target.set_viewport(self.saved);
    }
}
