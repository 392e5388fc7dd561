//! Emblem configuration: four independently styled layers.
//!
//! [`EmblemConfiguration`] is the single blob that is persisted, sent to the
//! render endpoint and replayed by the history store.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "back": {
//!     "asset": { "image": "/assets/images/full/shield.png" },
//!     "primaryColor": "#1a237e",
//!     "secondaryColor": "#ffffff",
//!     "position": { "x": 0.0, "y": -5.0 },
//!     "scale": 1.0,
//!     "rotation": 0.0
//!   },
//!   "front": {},
//!   "word1": { "asset": { "glyph": "ALPHA" } },
//!   "word2": {}
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::error::{EmblemError, EmblemResult};
use crate::geometry::Position;
use crate::part::Asset;

// ============================================================================
// LayerSlot
// ============================================================================

/// The four layers, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerSlot {
    Back,
    Front,
    Word1,
    Word2,
}

impl LayerSlot {
    /// Draw order: later slots paint over earlier ones.
    pub const ORDER: [LayerSlot; 4] = [Self::Back, Self::Front, Self::Word1, Self::Word2];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Back => "back",
            Self::Front => "front",
            Self::Word1 => "word1",
            Self::Word2 => "word2",
        })
    }
}

// ============================================================================
// LayerConfig
// ============================================================================

/// Styling for one layer.
///
/// A layer with no `asset` is absent: it is skipped entirely when rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct LayerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,

    /// Replaces black source pixels.
    #[serde(default = "HexColor::black")]
    pub primary_color: HexColor,

    /// Replaces white source pixels.
    #[serde(default = "HexColor::white")]
    pub secondary_color: HexColor,

    /// Offset from center, in percent of the layer's shorter side.
    #[serde(default)]
    pub position: Position,

    /// Multiplies the working canvas size. Must be positive.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Clockwise rotation in degrees around the layer's center.
    #[serde(default)]
    pub rotation: f64,
}

const EPSILON: f64 = 1e-9;

fn default_scale() -> f64 {
    1.0
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            asset: None,
            primary_color: HexColor::BLACK,
            secondary_color: HexColor::WHITE,
            position: Position::CENTER,
            scale: default_scale(),
            rotation: 0.0,
        }
    }
}

impl LayerConfig {
    pub fn with_asset(asset: Asset) -> Self {
        Self {
            asset: Some(asset),
            ..Self::default()
        }
    }

    pub fn is_present(&self) -> bool {
        self.asset.is_some()
    }

    /// Returns true if this config differs from another in a way that would
    /// produce different pixels.
    pub fn differs_from(&self, other: &Self) -> bool {
        self.raster_differs_from(other)
            || (self.position.x - other.position.x).abs() > EPSILON
            || (self.position.y - other.position.y).abs() > EPSILON
    }

    /// Like [`differs_from`](Self::differs_from), but ignores `position`,
    /// which only matters once the working canvas is placed.
    pub fn raster_differs_from(&self, other: &Self) -> bool {
        self.asset != other.asset
            || self.primary_color != other.primary_color
            || self.secondary_color != other.secondary_color
            || (self.scale - other.scale).abs() > EPSILON
            || (self.rotation - other.rotation).abs() > EPSILON
    }

    /// Checks the numeric fields that serde cannot constrain.
    ///
    /// Finite offsets and angles of any magnitude are accepted: a far-off
    /// layer is simply not visible, and rotation wraps at 360 degrees.
    pub fn validate(&self) -> EmblemResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(EmblemError::InvalidScale(self.scale));
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(EmblemError::InvalidPosition {
                x: self.position.x,
                y: self.position.y,
            });
        }
        if !self.rotation.is_finite() {
            return Err(EmblemError::InvalidRotation(self.rotation));
        }
        Ok(())
    }
}

// ============================================================================
// EmblemConfiguration
// ============================================================================

/// Exactly four layer slots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EmblemConfiguration {
    #[serde(default)]
    pub back: LayerConfig,
    #[serde(default)]
    pub front: LayerConfig,
    #[serde(default)]
    pub word1: LayerConfig,
    #[serde(default)]
    pub word2: LayerConfig,
}

impl EmblemConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, slot: LayerSlot, layer: LayerConfig) -> Self {
        *self.layer_mut(slot) = layer;
        self
    }

    pub fn layer(&self, slot: LayerSlot) -> &LayerConfig {
        match slot {
            LayerSlot::Back => &self.back,
            LayerSlot::Front => &self.front,
            LayerSlot::Word1 => &self.word1,
            LayerSlot::Word2 => &self.word2,
        }
    }

    pub fn layer_mut(&mut self, slot: LayerSlot) -> &mut LayerConfig {
        match slot {
            LayerSlot::Back => &mut self.back,
            LayerSlot::Front => &mut self.front,
            LayerSlot::Word1 => &mut self.word1,
            LayerSlot::Word2 => &mut self.word2,
        }
    }

    /// Iterates the layers in draw order.
    pub fn layers(&self) -> impl Iterator<Item = (LayerSlot, &LayerConfig)> {
        LayerSlot::ORDER.into_iter().map(|slot| (slot, self.layer(slot)))
    }

    /// Validates every present layer.
    pub fn validate(&self) -> EmblemResult<()> {
        self.layers()
            .filter(|(_, layer)| layer.is_present())
            .try_for_each(|(_, layer)| layer.validate())
    }

    /// Serializes the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the configuration to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Partial changes
// ============================================================================

/// A partial edit of one layer. Unset fields keep their current value.
///
/// Fields are replaced wholesale: setting `position` replaces both `x` and
/// `y`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerChange {
    /// `Some(None)` clears the layer.
    pub asset: Option<Option<Asset>>,
    pub primary_color: Option<HexColor>,
    pub secondary_color: Option<HexColor>,
    pub position: Option<Position>,
    pub scale: Option<f64>,
    pub rotation: Option<f64>,
}

impl LayerChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asset(mut self, asset: Asset) -> Self {
        self.asset = Some(Some(asset));
        self
    }

    pub fn clear_asset(mut self) -> Self {
        self.asset = Some(None);
        self
    }

    pub fn primary_color(mut self, color: HexColor) -> Self {
        self.primary_color = Some(color);
        self
    }

    pub fn secondary_color(mut self, color: HexColor) -> Self {
        self.secondary_color = Some(color);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    fn apply_to(&self, layer: &mut LayerConfig) {
        if let Some(asset) = &self.asset {
            layer.asset = asset.clone();
        }
        if let Some(color) = self.primary_color {
            layer.primary_color = color;
        }
        if let Some(color) = self.secondary_color {
            layer.secondary_color = color;
        }
        if let Some(position) = self.position {
            layer.position = position;
        }
        if let Some(scale) = self.scale {
            layer.scale = scale;
        }
        if let Some(rotation) = self.rotation {
            layer.rotation = rotation;
        }
    }
}

/// A partial edit spanning any of the four layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmblemChange {
    layers: [Option<LayerChange>; 4],
}

impl EmblemChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the change for one layer.
    pub fn layer(mut self, slot: LayerSlot, change: LayerChange) -> Self {
        self.layers[slot.index()] = Some(change);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Option::is_none)
    }

    /// Returns a new configuration with this change merged over `base`.
    pub fn merged_over(&self, base: &EmblemConfiguration) -> EmblemConfiguration {
        let mut next = base.clone();
        for slot in LayerSlot::ORDER {
            if let Some(change) = &self.layers[slot.index()] {
                change.apply_to(next.layer_mut(slot));
            }
        }
        next
    }
}
