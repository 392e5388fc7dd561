//! The render endpoint's wire format.
//!
//! `GET /api/draw/:object` carries a URL-encoded JSON object with one flat
//! field per layer property plus the orientation. Every layer field is
//! optional and falls back to the usual layer defaults; a layer without a
//! `*Choice` is not drawn.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "backChoice": { "name": "shield", "group": "BACK_NORMAL", "path": "/assets/images/full/shield.png" },
//!   "backPrimaryColor": "#1a237e",
//!   "backPosition": { "x": 0, "y": 0 },
//!   "word1Choice": { "name": "ALPHA", "group": "WORD_PHONETIC" },
//!   "word1Scale": 0.5,
//!   "orientation": "DESKTOP_LEFT_ALIGN"
//! }
//! ```

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::asset::AssetSource;
use crate::color::HexColor;
use crate::config::{EmblemConfiguration, LayerConfig};
use crate::engine::CompositionEngine;
use crate::error::{EmblemError, EmblemResult};
use crate::geometry::Position;
use crate::orientation::Orientation;
use crate::part::{Asset, Part, PartGroup};
use crate::surface::Surface;

/// Path prefix of the render endpoint.
pub const DRAW_ROUTE: &str = "/api/draw/";

/// Responses are immutable for a given request, so they may be cached for a
/// week.
pub const CACHE_CONTROL: &str = "public, max-age=604800";

/// Everything `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ============================================================================
// DrawRequest
// ============================================================================

/// The flat render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct DrawRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_choice: Option<Part>,
    #[serde(default = "HexColor::black")]
    pub back_primary_color: HexColor,
    #[serde(default = "HexColor::white")]
    pub back_secondary_color: HexColor,
    #[serde(default)]
    pub back_position: Position,
    #[serde(default = "default_scale")]
    pub back_scale: f64,
    #[serde(default)]
    pub back_rotation: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_choice: Option<Part>,
    #[serde(default = "HexColor::black")]
    pub front_primary_color: HexColor,
    #[serde(default = "HexColor::white")]
    pub front_secondary_color: HexColor,
    #[serde(default)]
    pub front_position: Position,
    #[serde(default = "default_scale")]
    pub front_scale: f64,
    #[serde(default)]
    pub front_rotation: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word1_choice: Option<Part>,
    #[serde(default = "HexColor::black")]
    pub word1_primary_color: HexColor,
    #[serde(default = "HexColor::white")]
    pub word1_secondary_color: HexColor,
    #[serde(default)]
    pub word1_position: Position,
    #[serde(default = "default_scale")]
    pub word1_scale: f64,
    #[serde(default)]
    pub word1_rotation: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word2_choice: Option<Part>,
    #[serde(default = "HexColor::black")]
    pub word2_primary_color: HexColor,
    #[serde(default = "HexColor::white")]
    pub word2_secondary_color: HexColor,
    #[serde(default)]
    pub word2_position: Position,
    #[serde(default = "default_scale")]
    pub word2_scale: f64,
    #[serde(default)]
    pub word2_rotation: f64,

    /// One of the [`Orientation`] names. Checked when the request is used,
    /// so an unknown value is reported as such.
    pub orientation: String,
}

fn default_scale() -> f64 {
    1.0
}

impl DrawRequest {
    /// Builds a request for `config`.
    ///
    /// Image assets become parts named after their file stem; glyphs become
    /// word parts named after their text.
    pub fn from_configuration(config: &EmblemConfiguration, orientation: Orientation) -> Self {
        let choice = |layer: &LayerConfig, group: PartGroup| {
            layer.asset.as_ref().map(|asset| part_for(asset, group))
        };
        let EmblemConfiguration {
            back,
            front,
            word1,
            word2,
        } = config;

        Self {
            back_choice: choice(back, PartGroup::BackNormal),
            back_primary_color: back.primary_color,
            back_secondary_color: back.secondary_color,
            back_position: back.position,
            back_scale: back.scale,
            back_rotation: back.rotation,
            front_choice: choice(front, PartGroup::FrontNormal),
            front_primary_color: front.primary_color,
            front_secondary_color: front.secondary_color,
            front_position: front.position,
            front_scale: front.scale,
            front_rotation: front.rotation,
            word1_choice: choice(word1, PartGroup::WordNormal),
            word1_primary_color: word1.primary_color,
            word1_secondary_color: word1.secondary_color,
            word1_position: word1.position,
            word1_scale: word1.scale,
            word1_rotation: word1.rotation,
            word2_choice: choice(word2, PartGroup::WordNormal),
            word2_primary_color: word2.primary_color,
            word2_secondary_color: word2.secondary_color,
            word2_position: word2.position,
            word2_scale: word2.scale,
            word2_rotation: word2.rotation,
            orientation: orientation.as_str().to_string(),
        }
    }

    pub fn orientation(&self) -> EmblemResult<Orientation> {
        self.orientation.parse()
    }

    /// Converts the flat request into a layered configuration.
    pub fn to_configuration(&self) -> EmblemResult<EmblemConfiguration> {
        let layer = |choice: &Option<Part>,
                     primary_color: HexColor,
                     secondary_color: HexColor,
                     position: Position,
                     scale: f64,
                     rotation: f64|
         -> EmblemResult<LayerConfig> {
            Ok(LayerConfig {
                asset: choice.as_ref().map(Part::asset).transpose()?,
                primary_color,
                secondary_color,
                position,
                scale,
                rotation,
            })
        };

        Ok(EmblemConfiguration {
            back: layer(
                &self.back_choice,
                self.back_primary_color,
                self.back_secondary_color,
                self.back_position,
                self.back_scale,
                self.back_rotation,
            )?,
            front: layer(
                &self.front_choice,
                self.front_primary_color,
                self.front_secondary_color,
                self.front_position,
                self.front_scale,
                self.front_rotation,
            )?,
            word1: layer(
                &self.word1_choice,
                self.word1_primary_color,
                self.word1_secondary_color,
                self.word1_position,
                self.word1_scale,
                self.word1_rotation,
            )?,
            word2: layer(
                &self.word2_choice,
                self.word2_primary_color,
                self.word2_secondary_color,
                self.word2_position,
                self.word2_scale,
                self.word2_rotation,
            )?,
        })
    }

    /// The endpoint path that renders this request.
    pub fn draw_path(&self) -> EmblemResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{DRAW_ROUTE}{}", utf8_percent_encode(&json, URI_COMPONENT)))
    }

    /// Suggested download name, built from the chosen part names.
    pub fn file_name(&self) -> String {
        let name = |choice: &Option<Part>| choice.as_ref().map(|p| p.name.clone());
        let stem = match (
            name(&self.word1_choice),
            name(&self.word2_choice),
            name(&self.back_choice),
            name(&self.front_choice),
        ) {
            (Some(w1), Some(w2), _, _) => format!("{w1}_{w2}"),
            (Some(w1), None, _, _) => w1,
            (None, Some(w2), _, _) => w2,
            (None, None, Some(back), Some(front)) => format!("{back}_{front}"),
            (None, None, Some(back), None) => back,
            (None, None, None, Some(front)) => front,
            (None, None, None, None) => "emblem".to_string(),
        };
        format!("{stem}.png")
    }
}

fn part_for(asset: &Asset, group: PartGroup) -> Part {
    match asset {
        Asset::Image(path) => {
            let name = Path::new(path)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(path);
            Part::new(name, group).with_path(path.clone())
        }
        Asset::Glyph(text) => Part::new(text.clone(), PartGroup::WordNormal),
    }
}

/// Decodes the `:object` segment of a draw path.
pub fn decode_draw_object(object: &str) -> EmblemResult<DrawRequest> {
    let json = percent_decode_str(object)
        .decode_utf8()
        .map_err(|e| EmblemError::request(format!("draw object is not UTF-8: {e}")))?;
    Ok(serde_json::from_str(&json)?)
}

// ============================================================================
// DrawResponse
// ============================================================================

/// A rendered emblem, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawResponse {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

/// Serves one `GET /api/draw/:object` request.
pub fn handle_draw<A: AssetSource, S: Surface>(
    engine: &CompositionEngine<A, S>,
    object: &str,
) -> EmblemResult<DrawResponse> {
    let request = decode_draw_object(object)?;
    let orientation = request.orientation()?;
    let config = request.to_configuration()?;

    let image = engine.render(&config, orientation)?;
    Ok(DrawResponse {
        body: encode_png(&image)?,
        content_type: "image/png",
        cache_control: CACHE_CONTROL,
    })
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbaImage) -> EmblemResult<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(image.clone()).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssetSource;
    use crate::config::LayerSlot;
    use crate::layer::{GlyphRenderer, GlyphStyle};
    use resvg::usvg::fontdb;

    fn minimal(orientation: &str) -> DrawRequest {
        serde_json::from_str(&format!(r#"{{"orientation": "{orientation}"}}"#)).unwrap()
    }

    fn word(name: &str) -> Part {
        Part::new(name, PartGroup::WordPhonetic)
    }

    fn engine() -> CompositionEngine<MemoryAssetSource> {
        CompositionEngine::new(
            MemoryAssetSource::new(),
            GlyphRenderer::with_fontdb(GlyphStyle::default(), fontdb::Database::new()),
        )
    }

    #[test]
    fn missing_fields_take_layer_defaults() {
        let config = minimal("SQUARE").to_configuration().unwrap();
        assert_eq!(config, EmblemConfiguration::default());
    }

    #[test]
    fn choices_become_assets() {
        let mut request = minimal("PHONE");
        request.back_choice =
            Some(Part::new("shield", PartGroup::BackNormal).with_path("/assets/images/shield.png"));
        request.word2_choice = Some(word("ALPHA"));
        request.word2_scale = 0.5;

        let config = request.to_configuration().unwrap();
        assert_eq!(config.back.asset, Some(Asset::image("/assets/images/shield.png")));
        assert_eq!(config.word2.asset, Some(Asset::glyph("ALPHA")));
        assert_eq!(config.word2.scale, 0.5);
        assert!(!config.front.is_present());
    }

    #[test]
    fn back_part_without_path_is_an_asset_error() {
        let mut request = minimal("SQUARE");
        request.back_choice = Some(Part::new("blank", PartGroup::BackSpecial));
        assert!(matches!(
            request.to_configuration(),
            Err(EmblemError::AssetLoad { .. })
        ));
    }

    #[test]
    fn unknown_orientation_is_reported() {
        assert!(matches!(
            minimal("SIDEWAYS").orientation(),
            Err(EmblemError::UnknownOrientation(o)) if o == "SIDEWAYS"
        ));
    }

    #[test]
    fn draw_path_escapes_like_encode_uri_component() {
        let path = minimal("SQUARE").draw_path().unwrap();
        assert!(path.starts_with("/api/draw/%7B%22"));
        assert!(!path[DRAW_ROUTE.len()..].contains('/'));
        assert!(path.contains("%23000000"), "hex colors escape the #");
    }

    #[test]
    fn draw_path_decodes_back_to_the_request() {
        let config = EmblemConfiguration::new()
            .with_layer(LayerSlot::Back, LayerConfig::with_asset(Asset::image("/a/star.png")))
            .with_layer(LayerSlot::Word1, LayerConfig::with_asset(Asset::glyph("Q&A (1/2)")));
        let request = DrawRequest::from_configuration(&config, Orientation::DesktopRightAlign);

        let path = request.draw_path().unwrap();
        let decoded = decode_draw_object(&path[DRAW_ROUTE.len()..]).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.to_configuration().unwrap(), config);
        assert_eq!(decoded.orientation().unwrap(), Orientation::DesktopRightAlign);
    }

    #[test]
    fn file_name_prefers_words_then_shapes() {
        let shield = Part::new("shield", PartGroup::BackNormal);
        let wolf = Part::new("wolf", PartGroup::FrontAnimals);

        let mut request = minimal("SQUARE");
        assert_eq!(request.file_name(), "emblem.png");

        request.front_choice = Some(wolf);
        assert_eq!(request.file_name(), "wolf.png");

        request.back_choice = Some(shield);
        assert_eq!(request.file_name(), "shield_wolf.png");

        request.word2_choice = Some(word("bravo"));
        assert_eq!(request.file_name(), "bravo.png");

        request.word1_choice = Some(word("alpha"));
        assert_eq!(request.file_name(), "alpha_bravo.png");
    }

    #[test]
    fn handle_draw_returns_cacheable_png() {
        let path = minimal("PHONE").draw_path().unwrap();
        let response = handle_draw(&engine(), &path[DRAW_ROUTE.len()..]).unwrap();

        assert_eq!(response.content_type, "image/png");
        assert_eq!(response.cache_control, "public, max-age=604800");
        let img = image::load_from_memory(&response.body).unwrap();
        assert_eq!((img.width(), img.height()), (759, 1334));
    }

    #[test]
    fn handle_draw_survives_far_off_words() {
        for orientation in ["DESKTOP_LEFT_ALIGN", "DESKTOP_RIGHT_ALIGN"] {
            let mut request = minimal(orientation);
            request.word1_choice = Some(Part::new("HI", PartGroup::WordNormal));
            request.word1_position = Position::new(1e12, 0.0);
            let path = request.draw_path().unwrap();

            let response = handle_draw(&engine(), &path[DRAW_ROUTE.len()..]).unwrap();
            let img = image::load_from_memory(&response.body).unwrap().to_rgba8();
            assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]), "{orientation}");
        }
    }

    #[test]
    fn handle_draw_refuses_oversized_layers() {
        let mut request = minimal("PHONE");
        request.word1_choice = Some(Part::new("HI", PartGroup::WordNormal));
        request.word1_scale = 40.0;
        let path = request.draw_path().unwrap();

        let err = handle_draw(&engine(), &path[DRAW_ROUTE.len()..]).unwrap_err();
        assert!(matches!(err, EmblemError::CanvasUnavailable { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn handle_draw_rejects_garbage() {
        let err = handle_draw(&engine(), "%7Bnot-json").unwrap_err();
        assert_eq!(err.http_status(), 400);
    }
}
