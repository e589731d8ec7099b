//! Tile Registry
//!
//! Maps each logical view's key to its last rendered image, the physical
//! viewport it belongs to, and the renderer used to put it on screen.
//!
//! Flush order: every other tile in registration order, then the current
//! view's tile. Framebuffer blits are last-write-wins, so the current view
//! ends up on top wherever viewports overlap.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use tilewall_image::{RawImage, Viewport};

use crate::{lock_renderer, RenderTarget, SharedRenderer, TileKey, ViewportGuard};

/// One registered tile
struct Tile {
    viewport: Viewport,
    renderer: Option<Weak<Mutex<dyn RenderTarget + Send>>>,
    image: RawImage,
    /// Registration sequence; kept when the tile is replaced
    order: u64,
}

#[derive(Default)]
struct RegistryState {
    tiles: HashMap<TileKey, Tile>,
    /// Empty means every key is enabled
    enabled: HashSet<TileKey>,
    next_order: u64,
}

impl RegistryState {
    fn is_enabled(&self, key: TileKey) -> bool {
        self.enabled.is_empty() || self.enabled.contains(&key)
    }

    fn ordered_keys(&self) -> Vec<TileKey> {
        let mut keys: Vec<_> = self.tiles.iter().map(|(k, t)| (*k, t.order)).collect();
        keys.sort_by_key(|(_, order)| *order);
        keys.into_iter().map(|(k, _)| k).collect()
    }

    /// Push one tile through its renderer. Returns false if skipped.
    fn push_tile(&self, key: TileKey, tile: &Tile) -> bool {
        if !self.is_enabled(key) {
            tracing::debug!("Skipping {}: key disabled", key);
            return false;
        }
        if !tile.image.is_valid() {
            tracing::debug!("Skipping {}: invalid image", key);
            return false;
        }
        let Some(renderer) = tile.renderer.as_ref().and_then(Weak::upgrade) else {
            tracing::debug!("Skipping {}: no renderer", key);
            return false;
        };

        let mut target = lock_renderer(&renderer);
        let mut guard = ViewportGuard::new(&mut *target, tile.viewport);
        tile.image.push_to_viewport(&mut *guard);
        tracing::debug!("Pushed {} at {:?}", key, tile.viewport.to_array());
        true
    }
}

/// Counts from one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Tiles written to a framebuffer
    pub pushed: usize,
    /// Tiles skipped (invalid image, missing renderer, or disabled key)
    pub skipped: usize,
}

/// Shared tile registry handle. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct TileRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl TileRegistry {
    /// Create an isolated registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use
    pub fn global() -> TileRegistry {
        static GLOBAL: OnceLock<TileRegistry> = OnceLock::new();
        GLOBAL
            .get_or_init(|| {
                tracing::info!("Creating process-wide tile registry");
                TileRegistry::new()
            })
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovering poisoned tile registry lock");
            poisoned.into_inner()
        })
    }

    /// Register or replace the tile for `key`.
    ///
    /// The image is copied; the caller may reuse its buffer. Only a weak
    /// reference to the renderer is kept. A `None` renderer is accepted,
    /// and such a tile is skipped by `flush_tiles`.
    pub fn set_tile(&self, key: TileKey, viewport: Viewport, renderer: Option<&SharedRenderer>, image: &RawImage) {
        if !viewport.is_well_formed() {
            tracing::warn!("Tile {} registered with malformed viewport {:?}", key, viewport.to_array());
        }

        let mut state = self.lock();
        let order = match state.tiles.get(&key) {
            Some(existing) => existing.order,
            None => {
                let order = state.next_order;
                state.next_order += 1;
                order
            }
        };

        state.tiles.insert(
            key,
            Tile {
                viewport,
                renderer: renderer.map(Arc::downgrade),
                image: image.clone(),
                order,
            },
        );
        tracing::debug!("Set {} ({}x{}, valid: {})", key, image.width(), image.height(), image.is_valid());
    }

    /// Remove the tile for `key`, and the key from the enabled set.
    /// Absent keys are ignored.
    pub fn erase_tile(&self, key: TileKey) -> bool {
        let mut state = self.lock();
        state.enabled.remove(&key);
        let removed = state.tiles.remove(&key).is_some();
        drop(state);
        if removed {
            tracing::debug!("Erased {}", key);
        }
        removed
    }

    /// Write every flushable tile to its renderer, `current` last.
    ///
    /// `current` need not be registered. Each renderer's viewport is
    /// overridden only for the duration of its blit.
    pub fn flush_tiles(&self, current: TileKey) -> FlushStats {
        let state = self.lock();
        let mut stats = FlushStats::default();

        let last = state.tiles.get(&current).map(|tile| (current, tile));
        let others = state
            .ordered_keys()
            .into_iter()
            .filter(|key| *key != current)
            .filter_map(|key| state.tiles.get(&key).map(|tile| (key, tile)));

        for (key, tile) in others.chain(last) {
            if state.push_tile(key, tile) {
                stats.pushed += 1;
            } else {
                stats.skipped += 1;
            }
        }

        tracing::debug!("Flushed for {}: {} pushed, {} skipped", current, stats.pushed, stats.skipped);
        stats
    }

    /// Restrict flushing to explicitly enabled keys
    pub fn enable_key(&self, key: TileKey) {
        self.lock().enabled.insert(key);
    }

    /// Drop one key from the enabled set
    pub fn disable_key(&self, key: TileKey) {
        self.lock().enabled.remove(&key);
    }

    /// Go back to flushing every key
    pub fn reset_enabled_keys(&self) {
        self.lock().enabled.clear();
    }

    pub fn contains(&self, key: TileKey) -> bool {
        self.lock().tiles.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.lock().tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tiles.is_empty()
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> Vec<TileKey> {
        self.lock().ordered_keys()
    }

    /// Claim a fresh key whose tile is erased when the handle drops
    pub fn register(&self) -> TileHandle {
        self.handle_for(TileKey::next())
    }

    /// Tie an existing key's tile to a handle's lifetime
    pub fn handle_for(&self, key: TileKey) -> TileHandle {
        TileHandle {
            key,
            registry: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for TileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TileRegistry")
            .field("tiles", &state.tiles.len())
            .field("enabled", &state.enabled.len())
            .finish()
    }
}

/// Owns one key in a registry; dropping it erases the tile
#[derive(Debug)]
pub struct TileHandle {
    key: TileKey,
    registry: Weak<Mutex<RegistryState>>,
}

impl TileHandle {
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// The registry, if it is still alive
    pub fn registry(&self) -> Option<TileRegistry> {
        self.registry.upgrade().map(|inner| TileRegistry { inner })
    }

    pub fn set_tile(&self, viewport: Viewport, renderer: Option<&SharedRenderer>, image: &RawImage) {
        if let Some(registry) = self.registry() {
            registry.set_tile(self.key, viewport, renderer, image);
        }
    }

    pub fn erase_tile(&self) -> bool {
        self.registry().is_some_and(|registry| registry.erase_tile(self.key))
    }

    pub fn flush_tiles(&self) -> FlushStats {
        self.registry()
            .map(|registry| registry.flush_tiles(self.key))
            .unwrap_or_default()
    }
}

impl Drop for TileHandle {
    fn drop(&mut self) {
        self.erase_tile();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderWindow, Renderer};
    use std::thread;
    use tilewall_image::Color;

    fn window(width: u32, height: u32) -> crate::SharedWindow {
        RenderWindow::new(width, height).unwrap().into_shared()
    }

    #[test]
    fn test_set_and_erase() {
        let registry = TileRegistry::new();
        let key = TileKey::next();
        registry.set_tile(key, Viewport::FULL, None, &RawImage::blank(2, 2));

        assert!(registry.contains(key));
        assert!(registry.erase_tile(key));
        assert!(!registry.erase_tile(key));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_replace_keeps_registration_order() {
        let registry = TileRegistry::new();
        let (a, b) = (TileKey::next(), TileKey::next());
        registry.set_tile(a, Viewport::FULL, None, &RawImage::new());
        registry.set_tile(b, Viewport::FULL, None, &RawImage::new());
        registry.set_tile(a, Viewport::FULL, None, &RawImage::blank(1, 1));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.keys(), vec![a, b]);
    }

    #[test]
    fn test_empty_flush() {
        let registry = TileRegistry::new();
        assert_eq!(registry.flush_tiles(TileKey::next()), FlushStats::default());
    }

    #[test]
    fn test_current_drawn_last() {
        let fb = window(10, 1);
        let renderer = Renderer::shared(fb.clone(), Viewport::FULL);
        let registry = TileRegistry::new();
        let (a, b) = (TileKey::next(), TileKey::next());

        registry.set_tile(b, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::BLUE));
        registry.set_tile(a, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::RED));

        registry.flush_tiles(b);
        assert_eq!(fb.lock().unwrap().pixel(5, 0), Some(Color::BLUE));

        registry.flush_tiles(a);
        assert_eq!(fb.lock().unwrap().pixel(5, 0), Some(Color::RED));
    }

    #[test]
    fn test_others_follow_registration_order() {
        let fb = window(4, 4);
        let renderer = Renderer::shared(fb.clone(), Viewport::FULL);
        let registry = TileRegistry::new();
        let (first, second) = (TileKey::next(), TileKey::next());

        registry.set_tile(first, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::RED));
        registry.set_tile(second, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::GREEN));

        let stats = registry.flush_tiles(TileKey::next());
        assert_eq!(stats, FlushStats { pushed: 2, skipped: 0 });
        assert_eq!(fb.lock().unwrap().pixel(0, 0), Some(Color::GREEN));
    }

    #[test]
    fn test_dead_renderer_skipped() {
        let fb = window(2, 2);
        let registry = TileRegistry::new();
        let key = TileKey::next();
        {
            let renderer = Renderer::shared(fb.clone(), Viewport::FULL);
            registry.set_tile(key, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::RED));
        }

        let stats = registry.flush_tiles(key);
        assert_eq!(stats, FlushStats { pushed: 0, skipped: 1 });
        assert_eq!(fb.lock().unwrap().pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_enabled_keys() {
        let fb = window(2, 2);
        let renderer = Renderer::shared(fb.clone(), Viewport::FULL);
        let registry = TileRegistry::new();
        let (a, b) = (TileKey::next(), TileKey::next());
        registry.set_tile(a, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::RED));
        registry.set_tile(b, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::GREEN));

        registry.enable_key(a);
        let stats = registry.flush_tiles(b);
        assert_eq!(stats, FlushStats { pushed: 1, skipped: 1 });
        assert_eq!(fb.lock().unwrap().pixel(0, 0), Some(Color::RED));

        registry.reset_enabled_keys();
        assert_eq!(registry.flush_tiles(b).pushed, 2);
        assert_eq!(fb.lock().unwrap().pixel(0, 0), Some(Color::GREEN));
    }

    #[test]
    fn test_handle_erases_on_drop() {
        let registry = TileRegistry::new();
        let handle = registry.register();
        let key = handle.key();
        handle.set_tile(Viewport::FULL, None, &RawImage::blank(1, 1));
        assert!(registry.contains(key));

        drop(handle);
        assert!(!registry.contains(key));
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = TileRegistry::new();
        let handle = registry.register();
        drop(registry);

        assert!(handle.registry().is_none());
        assert_eq!(handle.flush_tiles(), FlushStats::default());
    }

    #[test]
    fn test_erased_key_leaves_enabled_set() {
        let fb = window(2, 2);
        let renderer = Renderer::shared(fb.clone(), Viewport::FULL);
        let registry = TileRegistry::new();

        let a = registry.register();
        a.set_tile(Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::RED));
        registry.enable_key(a.key());
        drop(a);

        let b = TileKey::next();
        registry.set_tile(b, Viewport::FULL, Some(&renderer), &RawImage::filled(1, 1, Color::GREEN));
        assert_eq!(registry.flush_tiles(b), FlushStats { pushed: 1, skipped: 0 });
        assert_eq!(fb.lock().unwrap().pixel(0, 0), Some(Color::GREEN));
    }

    #[test]
    fn test_concurrent_set_and_flush() {
        let fb = window(8, 8);
        let home = Viewport::new(0.25, 0.25, 0.75, 0.75);
        let renderer = Renderer::shared(fb.clone(), home);
        let registry = TileRegistry::new();

        let workers: Vec<_> = [Color::RED, Color::GREEN, Color::BLUE]
            .into_iter()
            .enumerate()
            .map(|(i, color)| {
                let registry = registry.clone();
                let renderer = renderer.clone();
                thread::spawn(move || {
                    let key = TileKey::next();
                    let viewport = Viewport::new(i as f64 / 4.0, 0.0, (i + 1) as f64 / 4.0, 1.0);
                    for _ in 0..50 {
                        registry.set_tile(key, viewport, Some(&renderer), &RawImage::filled(2, 2, color));
                        registry.flush_tiles(key);
                    }
                    key
                })
            })
            .collect();

        let keys: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.flush_tiles(keys[0]).pushed, 3);
        assert_eq!(renderer.lock().unwrap().viewport(), home);

        let fb = fb.lock().unwrap();
        assert_eq!(fb.pixel(0, 4), Some(Color::RED));
        assert_eq!(fb.pixel(2, 4), Some(Color::GREEN));
        assert_eq!(fb.pixel(4, 4), Some(Color::BLUE));
        assert_eq!(fb.pixel(7, 4), Some(Color::BLACK));
    }

    #[test]
    fn test_global_is_shared() {
        let key = TileKey::next();
        TileRegistry::global().set_tile(key, Viewport::FULL, None, &RawImage::new());
        assert!(TileRegistry::global().contains(key));
        assert!(TileRegistry::global().erase_tile(key));
    }
}
