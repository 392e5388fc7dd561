//! The composition engine: configuration + orientation in, pixels out.
//!
//! [`CompositionEngine::render`] is the one entry point both the export
//! endpoint and the live preview go through, so both produce identical
//! pixels for identical inputs. [`PreviewRenderer`] wraps an engine with a
//! per-layer raster cache and a generation counter so superseded preview
//! renders are dropped instead of displayed.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetSource, FsAssetSource, TimedAssetSource};
use crate::config::{EmblemConfiguration, LayerConfig, LayerSlot};
use crate::error::EmblemResult;
use crate::geometry::SizePx;
use crate::layer::{GlyphRenderer, GlyphStyle, LayerCache, PartRasterizer, place};
use crate::orientation::Orientation;
use crate::part::Asset;
use crate::surface::{PixmapSurface, Surface};

// ============================================================================
// EngineSettings
// ============================================================================

/// Settings for building an engine that reads parts from disk.
///
/// # JSON Format
///
/// ```json
/// {
///   "assetsRoot": "public",
///   "loadTimeoutMs": 10000,
///   "glyph": { "fontFamily": "Black Ops One", "fontSize": 108.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EngineSettings {
    /// Directory that asset paths such as `/assets/images/...` resolve under.
    pub assets_root: PathBuf,
    /// How long a single asset load may take before it fails.
    pub load_timeout_ms: u64,
    pub glyph: GlyphStyle,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("."),
            load_timeout_ms: 10_000,
            glyph: GlyphStyle::default(),
        }
    }
}

impl EngineSettings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn from_json(json: &str) -> EmblemResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// CompositionEngine
// ============================================================================

/// Renders whole emblems.
///
/// Generic over where assets come from and which [`Surface`] draws them.
pub struct CompositionEngine<A, S = PixmapSurface> {
    assets: A,
    glyphs: GlyphRenderer,
    _surface: PhantomData<fn() -> S>,
}

impl<A: AssetSource> CompositionEngine<A, PixmapSurface> {
    /// Creates an engine drawing on CPU pixmaps.
    pub fn new(assets: A, glyphs: GlyphRenderer) -> Self {
        Self::with_surface(assets, glyphs)
    }
}

impl CompositionEngine<TimedAssetSource<FsAssetSource>, PixmapSurface> {
    /// Creates an engine that reads parts from `settings.assets_root`, failing
    /// any load that outlives the configured timeout.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        let assets = TimedAssetSource::new(
            FsAssetSource::new(&settings.assets_root),
            settings.load_timeout(),
        );
        Self::new(assets, GlyphRenderer::new(settings.glyph.clone()))
    }
}

impl<A: AssetSource, S: Surface> CompositionEngine<A, S> {
    /// Creates an engine drawing on an explicit surface type.
    pub fn with_surface(assets: A, glyphs: GlyphRenderer) -> Self {
        Self {
            assets,
            glyphs,
            _surface: PhantomData,
        }
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn glyphs(&self) -> &GlyphRenderer {
        &self.glyphs
    }

    /// Renders `config` for `orientation`.
    ///
    /// Layers are drawn back, front, word1, word2; layers without an asset
    /// are skipped. Any layer failure fails the whole render.
    #[tracing::instrument(skip_all, fields(%orientation))]
    pub fn render(
        &self,
        config: &EmblemConfiguration,
        orientation: Orientation,
    ) -> EmblemResult<RgbaImage> {
        self.compose(config, orientation, |_, asset, layer, part_size| {
            self.rasterize(asset, layer, part_size).map(Arc::new)
        })
    }

    /// Rasterizes a single layer onto its working canvas.
    pub fn rasterize(
        &self,
        asset: &Asset,
        layer: &LayerConfig,
        part_size: SizePx,
    ) -> EmblemResult<RgbaImage> {
        PartRasterizer::new(&self.assets, &self.glyphs).rasterize::<S>(asset, layer, part_size)
    }

    fn compose<F>(
        &self,
        config: &EmblemConfiguration,
        orientation: Orientation,
        mut rasterize: F,
    ) -> EmblemResult<RgbaImage>
    where
        F: FnMut(LayerSlot, &Asset, &LayerConfig, SizePx) -> EmblemResult<Arc<RgbaImage>>,
    {
        config.validate()?;

        let profile = orientation.profile();
        let mut canvas = S::allocate(profile.final_size)?;
        if let Some(background) = profile.background {
            canvas.fill(background);
        }

        for (slot, layer) in config.layers() {
            let Some(asset) = &layer.asset else {
                tracing::debug!(%slot, "no asset, skipping layer");
                continue;
            };
            let pixels = rasterize(slot, asset, layer, profile.part_size)?;
            place(&pixels, &mut canvas, layer.position, &profile);
        }

        Ok(canvas.get_pixels())
    }
}

// ============================================================================
// RenderGeneration
// ============================================================================

/// Identifies one requested render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

/// A monotonic counter shared by everything that requests preview renders.
///
/// Each new request takes a ticket; a finished render is only applied if its
/// ticket is still the latest.
#[derive(Debug, Clone, Default)]
pub struct RenderGeneration(Arc<AtomicU64>);

impl RenderGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, superseding every earlier ticket.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn current(&self) -> RenderTicket {
        RenderTicket(self.0.load(Ordering::Acquire))
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.current() == ticket
    }
}

// ============================================================================
// PreviewRenderer
// ============================================================================

/// An engine plus the state interactive previews need.
pub struct PreviewRenderer<A, S = PixmapSurface> {
    engine: CompositionEngine<A, S>,
    cache: LayerCache,
    generation: RenderGeneration,
}

impl<A: AssetSource, S: Surface> PreviewRenderer<A, S> {
    pub fn new(engine: CompositionEngine<A, S>) -> Self {
        Self {
            engine,
            cache: LayerCache::new(),
            generation: RenderGeneration::new(),
        }
    }

    pub fn engine(&self) -> &CompositionEngine<A, S> {
        &self.engine
    }

    /// A handle to the generation counter, for callers that issue tickets
    /// from elsewhere.
    pub fn generation(&self) -> &RenderGeneration {
        &self.generation
    }

    /// Takes a ticket for the next render.
    pub fn begin(&self) -> RenderTicket {
        self.generation.begin()
    }

    /// Renders with cached layer canvases where possible.
    ///
    /// Returns `Ok(None)` if `ticket` was superseded before or during the
    /// render; the caller should keep showing whatever it has.
    pub fn render(
        &mut self,
        ticket: RenderTicket,
        config: &EmblemConfiguration,
        orientation: Orientation,
    ) -> EmblemResult<Option<RgbaImage>> {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "preview superseded before start");
            return Ok(None);
        }

        let engine = &self.engine;
        let cache = &mut self.cache;
        let image = engine.compose(config, orientation, |slot, asset, layer, part_size| {
            if let Some(hit) = cache.lookup(slot, orientation, layer) {
                tracing::trace!(%slot, version = cache.slot(slot).version(), "layer cache hit");
                return Ok(hit);
            }
            let pixels = Arc::new(engine.rasterize(asset, layer, part_size)?);
            let entry = cache.slot_mut(slot);
            tracing::debug!(%slot, version = entry.version(), "layer rasterized");
            entry.store(orientation, Arc::clone(&pixels));
            Ok(pixels)
        })?;

        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "dropping stale preview");
            return Ok(None);
        }
        Ok(Some(image))
    }

    /// Drops every cached layer canvas.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
