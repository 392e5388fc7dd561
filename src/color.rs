//! Layer colors and the duotone remap.
//!
//! Source parts are drawn in black and white. The remap swaps near-black
//! pixels for a layer's primary color and near-white pixels for its secondary
//! color, leaving mixed-tone pixels (anti-aliased edges) untouched.

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::{EmblemError, EmblemResult};

/// Channel values below this count as "dark", at or above as "light".
const TONE_THRESHOLD: u8 = 128;

// ============================================================================
// HexColor
// ============================================================================

/// A `#RRGGBB` color.
///
/// Parsing is strict: the string must be exactly seven characters, start with
/// `#`, and contain six hex digits. Short hex, named colors and alpha channels
/// are rejected with [`EmblemError::InvalidColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(Srgb<u8>);

impl HexColor {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(Srgb::new(red, green, blue))
    }

    /// Parses a `#RRGGBB` string.
    pub fn parse(value: &str) -> EmblemResult<Self> {
        let invalid = || EmblemError::InvalidColor(value.to_string());

        let digits = value.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let rgb: Srgb<u8> = digits.parse().map_err(|_| invalid())?;
        Ok(Self(rgb))
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.0.red, self.0.green, self.0.blue]
    }

    /// Serde default for primary colors.
    pub(crate) fn black() -> Self {
        Self::BLACK
    }

    /// Serde default for secondary colors.
    pub(crate) fn white() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.channels();
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for HexColor {
    type Err = EmblemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HexColor {
    type Error = EmblemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for HexColor {
    fn schema_name() -> String {
        "HexColor".to_owned()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

// ============================================================================
// Duotone remap
// ============================================================================

/// Recolors a black/white image in place.
///
/// Every pixel with nonzero alpha whose RGB channels are all dark becomes
/// `primary`; every one whose channels are all light becomes `secondary`.
/// Mixed pixels and fully transparent pixels are left alone. Alpha is never
/// changed.
pub fn remap_duotone(pixels: &mut RgbaImage, primary: HexColor, secondary: HexColor) {
    let primary = primary.channels();
    let secondary = secondary.channels();

    for pixel in pixels.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }

        let replacement = match classify_tone(r, g, b) {
            Some(Tone::Dark) => primary,
            Some(Tone::Light) => secondary,
            None => continue,
        };

        pixel.0 = [replacement[0], replacement[1], replacement[2], a];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Dark,
    Light,
}

fn classify_tone(r: u8, g: u8, b: u8) -> Option<Tone> {
    let dark = |c: u8| c < TONE_THRESHOLD;
    if dark(r) && dark(g) && dark(b) {
        Some(Tone::Dark)
    } else if !dark(r) && !dark(g) && !dark(b) {
        Some(Tone::Light)
    } else {
        None
    }
}
