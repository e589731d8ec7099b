//! Image Compositors
//!
//! Stand-ins for an IceT-style parallel compositing library. Each rank
//! renders a partial image of the whole view; the compositor merges them
//! and decides which rank ends up holding what.

use tilewall_image::{RawImage, TileLayout, Viewport};

use crate::{CompositeError, ProcessController};

/// Where composited pixels are displayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// One display on the root; other ranks get no displayable result
    #[default]
    SingleDisplay,
    /// A display wall; each rank shows its own tile
    TileDisplay(TileLayout),
}

/// Inputs for one composite
pub struct CompositeContext<'a> {
    pub controller: &'a dyn ProcessController,
    /// The view's region, on the window or on the whole wall
    pub view: Viewport,
    pub mode: CompositeMode,
}

/// Merges per-rank partial images (IceT-like)
pub trait ImageCompositor: Send {
    /// Composite `local` with the other ranks' images and return this
    /// rank's displayable share. An invalid image means nothing to show.
    fn composite(&self, ctx: &CompositeContext<'_>, local: RawImage) -> Result<RawImage, CompositeError>;
}

/// Part of a view image that falls on one tile of the wall.
///
/// `full` covers `view`; the result covers `view ∩ tile`, or is invalid
/// when they do not overlap.
pub fn tile_share(full: &RawImage, view: &Viewport, tile: &Viewport) -> RawImage {
    let Some(portion) = view.intersect(tile) else {
        return RawImage::new();
    };
    let rect = portion.relative_to(view).to_pixels(full.width(), full.height());
    full.crop(rect)
}

/// No cross-rank work: the local image is the result
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCompositor;

impl ImageCompositor for PassThroughCompositor {
    fn composite(&self, ctx: &CompositeContext<'_>, local: RawImage) -> Result<RawImage, CompositeError> {
        match ctx.mode {
            CompositeMode::SingleDisplay => Ok(local),
            CompositeMode::TileDisplay(layout) => Ok(layout
                .tile_viewport(ctx.controller.rank())
                .map(|tile| tile_share(&local, &ctx.view, &tile))
                .unwrap_or_default()),
        }
    }
}

/// Gathers every rank's image on the root and blends them source-over in
/// rank order, so higher ranks land on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatherCompositor;

impl GatherCompositor {
    fn blend(images: Vec<RawImage>) -> RawImage {
        let mut images = images.into_iter().filter(RawImage::is_valid);
        let Some(mut result) = images.next() else {
            return RawImage::new();
        };
        for image in images {
            result.blend_over(&image);
        }
        result
    }
}

impl ImageCompositor for GatherCompositor {
    fn composite(&self, ctx: &CompositeContext<'_>, local: RawImage) -> Result<RawImage, CompositeError> {
        let gathered = ctx.controller.gather(local)?;

        match ctx.mode {
            CompositeMode::SingleDisplay => Ok(gathered.map(Self::blend).unwrap_or_default()),
            CompositeMode::TileDisplay(layout) => {
                let shares = gathered.map(|images| {
                    let full = Self::blend(images);
                    (0..ctx.controller.num_processes())
                        .map(|rank| {
                            layout
                                .tile_viewport(rank)
                                .map(|tile| tile_share(&full, &ctx.view, &tile))
                                .unwrap_or_default()
                        })
                        .collect()
                });
                Ok(ctx.controller.scatter(shares)?)
            }
        }
    }
}
