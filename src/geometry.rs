//! Pixel-space sizes and points.

use serde::{Deserialize, Serialize};

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the smaller of the two dimensions.
    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Multiplies both dimensions by `factor`, flooring the result.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: (self.width as f64 * factor).floor().max(0.0) as u32,
            height: (self.height as f64 * factor).floor().max(0.0) as u32,
        }
    }
}

/// An integer pixel coordinate. May be negative when a layer hangs off the
/// top or left edge of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PointPx {
    pub x: i32,
    pub y: i32,
}

impl PointPx {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A layer offset as signed percentages of the layer's own size.
///
/// `{0, 0}` keeps the layer centered; `{50, 0}` moves it right by half of
/// its shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
