//! Per-layer raster stages.
//!
//! Each present layer goes through [`PartRasterizer`] (working canvas,
//! rotation, fit, recolor) and then [`place`] onto the final canvas.
//! [`LayerCache`] keeps the working canvases between preview renders so a
//! change to one layer only re-rasterizes that layer.

pub mod glyph;
pub mod part;
pub mod placement;

pub use glyph::{GlyphRenderer, GlyphStyle};
pub use part::PartRasterizer;
pub use placement::{place, placement};

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;

use crate::config::{LayerConfig, LayerSlot};
use crate::orientation::Orientation;

// ============================================================================
// SlotCache
// ============================================================================

/// Cached working canvases for one layer slot.
///
/// Tracks the config the canvases were rendered from and a version that
/// increments whenever that config meaningfully changes. Canvases are keyed
/// by orientation since each orientation has its own part size.
#[derive(Debug, Default)]
pub struct SlotCache {
    config: Option<LayerConfig>,
    version: u64,
    canvases: HashMap<Orientation, Arc<RgbaImage>>,
}

impl SlotCache {
    pub fn config(&self) -> Option<&LayerConfig> {
        self.config.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the configuration. Returns true if it changed.
    ///
    /// Clears the cache and increments version if the config differs.
    pub fn set_config(&mut self, config: &LayerConfig) -> bool {
        let differs = match &self.config {
            None => true,
            Some(old) => old.raster_differs_from(config),
        };

        if differs {
            self.config = Some(config.clone());
            self.version = self.version.wrapping_add(1);
            self.canvases.clear();
        }
        differs
    }

    pub fn get_cached(&self, orientation: Orientation) -> Option<Arc<RgbaImage>> {
        self.canvases.get(&orientation).cloned()
    }

    pub fn store(&mut self, orientation: Orientation, canvas: Arc<RgbaImage>) {
        self.canvases.insert(orientation, canvas);
    }

    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.canvases.clear();
    }
}

// ============================================================================
// LayerCache
// ============================================================================

/// One [`SlotCache`] per layer slot.
#[derive(Debug, Default)]
pub struct LayerCache {
    slots: [SlotCache; 4],
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: LayerSlot) -> &SlotCache {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: LayerSlot) -> &mut SlotCache {
        &mut self.slots[slot.index()]
    }

    /// Returns the cached canvas for `slot` if it was rasterized from a
    /// config equivalent to `config`. A differing config evicts the slot.
    pub fn lookup(
        &mut self,
        slot: LayerSlot,
        orientation: Orientation,
        config: &LayerConfig,
    ) -> Option<Arc<RgbaImage>> {
        let entry = self.slot_mut(slot);
        if entry.set_config(config) {
            return None;
        }
        entry.get_cached(orientation)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(SlotCache::invalidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::part::Asset;

    fn canvas() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(2, 2))
    }

    #[test]
    fn unchanged_config_hits_cache() {
        let mut cache = LayerCache::new();
        let layer = LayerConfig::with_asset(Asset::image("/a.png"));

        assert!(cache.lookup(LayerSlot::Back, Orientation::Square, &layer).is_none());
        cache.slot_mut(LayerSlot::Back).store(Orientation::Square, canvas());

        assert!(cache.lookup(LayerSlot::Back, Orientation::Square, &layer).is_some());
        assert!(cache.lookup(LayerSlot::Back, Orientation::Phone, &layer).is_none());
        assert!(cache.lookup(LayerSlot::Front, Orientation::Square, &layer).is_none());
    }

    #[test]
    fn changed_config_evicts_and_bumps_version() {
        let mut cache = LayerCache::new();
        let layer = LayerConfig::with_asset(Asset::image("/a.png"));
        cache.lookup(LayerSlot::Word1, Orientation::Square, &layer);
        cache.slot_mut(LayerSlot::Word1).store(Orientation::Square, canvas());
        let version = cache.slot(LayerSlot::Word1).version();

        let recolored = LayerConfig {
            primary_color: HexColor::rgb(9, 9, 9),
            ..layer
        };
        assert!(cache.lookup(LayerSlot::Word1, Orientation::Square, &recolored).is_none());
        assert_eq!(cache.slot(LayerSlot::Word1).version(), version + 1);
        assert_eq!(cache.slot(LayerSlot::Word1).config(), Some(&recolored));
    }

    #[test]
    fn clear_drops_every_slot() {
        let mut cache = LayerCache::new();
        let layer = LayerConfig::with_asset(Asset::image("/a.png"));
        for slot in LayerSlot::ORDER {
            cache.lookup(slot, Orientation::Square, &layer);
            cache.slot_mut(slot).store(Orientation::Square, canvas());
        }
        cache.clear();
        for slot in LayerSlot::ORDER {
            assert!(cache.slot(slot).get_cached(Orientation::Square).is_none());
        }
    }
}
