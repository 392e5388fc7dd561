//! Rasterizing one layer onto its working canvas.
//!
//! A layer is drawn in four steps: allocate the scaled working canvas,
//! rotate its frame around the canvas center, draw the source centered in a
//! square of the canvas's shorter side, and recolor the result. Glyphs are
//! already drawn in the layer colors and skip the recolor.

use image::RgbaImage;

use crate::asset::AssetSource;
use crate::color::remap_duotone;
use crate::config::LayerConfig;
use crate::error::EmblemResult;
use crate::geometry::{PointPx, SizePx};
use crate::layer::glyph::GlyphRenderer;
use crate::part::Asset;
use crate::surface::Surface;

/// Turns layer configs into recolored working canvases.
pub struct PartRasterizer<'a, A> {
    assets: &'a A,
    glyphs: &'a GlyphRenderer,
}

impl<'a, A: AssetSource> PartRasterizer<'a, A> {
    pub fn new(assets: &'a A, glyphs: &'a GlyphRenderer) -> Self {
        Self { assets, glyphs }
    }

    /// Rasterizes `asset` with the styling in `layer`.
    ///
    /// `part_size` is the orientation's unscaled working size; the returned
    /// image is `part_size` scaled by `layer.scale`.
    pub fn rasterize<S: Surface>(
        &self,
        asset: &Asset,
        layer: &LayerConfig,
        part_size: SizePx,
    ) -> EmblemResult<RgbaImage> {
        layer.validate()?;

        let mut surface = S::allocate(part_size.scaled(layer.scale))?;
        if layer.rotation != 0.0 {
            surface.rotate(layer.rotation);
        }

        let source = self.load(asset, layer)?;
        let canvas = surface.size();
        let side = canvas.min_side();
        let origin = fit_origin(canvas);
        surface.draw_image(&source, origin.x, origin.y, SizePx::new(side, side));

        let mut pixels = surface.get_pixels();
        if asset.needs_remap() {
            remap_duotone(&mut pixels, layer.primary_color, layer.secondary_color);
        }
        Ok(pixels)
    }

    fn load(&self, asset: &Asset, layer: &LayerConfig) -> EmblemResult<RgbaImage> {
        match asset {
            Asset::Image(path) => self.assets.load_image(path),
            Asset::Glyph(text) => {
                self.glyphs
                    .render(text, layer.primary_color, layer.secondary_color)
            }
        }
    }
}

/// Top-left corner of the square that centers a source on `canvas`.
fn fit_origin(canvas: SizePx) -> PointPx {
    let w = canvas.width as i64;
    let h = canvas.height as i64;
    PointPx::new(((w - h).max(0) / 2) as i32, ((h - w).max(0) / 2) as i32)
}
