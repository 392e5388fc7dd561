//! Live text glyphs for word layers.
//!
//! A word is laid out as an SVG `<text>` element (outlined stroke under a
//! solid fill, centered on a square canvas) and rasterized with resvg. The
//! glyph is drawn directly in the layer's colors, so it skips the duotone
//! remap.

use std::sync::Arc;

use image::RgbaImage;
use resvg::tiny_skia::Transform;
use resvg::usvg::{Options, Tree, fontdb};
use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::error::{EmblemError, EmblemResult};
use crate::geometry::SizePx;
use crate::surface::{new_pixmap, pixmap_to_rgba_image};

// ============================================================================
// GlyphStyle
// ============================================================================

/// Typography for synthesized word glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct GlyphStyle {
    /// Preferred font family; falls back to any sans-serif face.
    pub font_family: String,
    pub font_size: f32,
    pub stroke_width: f32,
    /// Side length of the square glyph canvas, in pixels.
    pub canvas_size: u32,
}

impl Default for GlyphStyle {
    fn default() -> Self {
        Self {
            font_family: "Black Ops One".to_string(),
            font_size: 108.0,
            stroke_width: 4.0,
            canvas_size: 1024,
        }
    }
}

// ============================================================================
// GlyphRenderer
// ============================================================================

/// Rasterizes words using a shared font database.
#[derive(Clone)]
pub struct GlyphRenderer {
    style: GlyphStyle,
    fontdb: Arc<fontdb::Database>,
}

impl GlyphRenderer {
    /// Creates a renderer with the system fonts loaded.
    pub fn new(style: GlyphStyle) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self::with_fontdb(style, db)
    }

    /// Creates a renderer with an explicit font database.
    pub fn with_fontdb(style: GlyphStyle, fontdb: fontdb::Database) -> Self {
        Self {
            style,
            fontdb: Arc::new(fontdb),
        }
    }

    pub fn style(&self) -> &GlyphStyle {
        &self.style
    }

    /// Draws `text` centered on a transparent square canvas.
    pub fn render(&self, text: &str, fill: HexColor, stroke: HexColor) -> EmblemResult<RgbaImage> {
        let svg = glyph_svg(&self.style, text, fill, stroke);

        let mut opts = Options::default();
        opts.fontdb = Arc::clone(&self.fontdb);
        let tree = Tree::from_str(&svg, &opts).map_err(|e| EmblemError::asset_load(text, e))?;

        let size = self.style.canvas_size;
        let mut pixmap = new_pixmap(SizePx::new(size, size))?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        Ok(pixmap_to_rgba_image(&pixmap))
    }
}

impl std::fmt::Debug for GlyphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphRenderer")
            .field("style", &self.style)
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

/// Builds the SVG document for one word.
fn glyph_svg(style: &GlyphStyle, text: &str, fill: HexColor, stroke: HexColor) -> String {
    let size = style.canvas_size;
    let center = size as f32 / 2.0;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
            r#"<text x="{center}" y="{center}" text-anchor="middle" dominant-baseline="central" "#,
            r#"font-family="{family}, sans-serif" font-size="{font_size}" "#,
            r#"fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}" paint-order="stroke">"#,
            "{text}</text></svg>"
        ),
        size = size,
        center = center,
        family = escape_xml(&quote_family(&style.font_family)),
        font_size = style.font_size,
        fill = fill,
        stroke = stroke,
        stroke_width = style.stroke_width,
        text = escape_xml(text),
    )
}

fn quote_family(family: &str) -> String {
    format!("'{}'", family.replace('\'', ""))
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> GlyphRenderer {
        GlyphRenderer::with_fontdb(GlyphStyle::default(), fontdb::Database::new())
    }

    #[test]
    fn svg_places_stroke_under_fill_in_layer_colors() {
        let svg = glyph_svg(
            &GlyphStyle::default(),
            "ALPHA",
            HexColor::rgb(255, 0, 0),
            HexColor::rgb(0, 0, 255),
        );
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains(r##"stroke="#0000ff""##));
        assert!(svg.contains(r#"paint-order="stroke""#));
        assert!(svg.contains(r#"font-size="108""#));
        assert!(svg.contains(">ALPHA</text>"));
    }

    #[test]
    fn svg_escapes_markup_in_words() {
        let svg = glyph_svg(&GlyphStyle::default(), "<R&D>", HexColor::BLACK, HexColor::WHITE);
        assert!(svg.contains("&lt;R&amp;D&gt;"));
        assert!(!svg.contains("<R&D>"));
    }

    #[test]
    fn render_produces_square_canvas() {
        let style = GlyphStyle {
            canvas_size: 64,
            ..GlyphStyle::default()
        };
        let renderer = GlyphRenderer::with_fontdb(style, fontdb::Database::new());
        let img = renderer
            .render("HI", HexColor::BLACK, HexColor::WHITE)
            .unwrap();
        assert_eq!(img.dimensions(), (64, 64));
    }

    #[test]
    fn empty_or_oversized_canvas_fails() {
        let renderer = |canvas_size| {
            let style = GlyphStyle {
                canvas_size,
                ..GlyphStyle::default()
            };
            GlyphRenderer::with_fontdb(style, fontdb::Database::new())
        };
        assert!(renderer(0).render("HI", HexColor::BLACK, HexColor::WHITE).is_err());
        assert!(matches!(
            renderer(9000).render("HI", HexColor::BLACK, HexColor::WHITE),
            Err(EmblemError::CanvasUnavailable { width: 9000, height: 9000 })
        ));
    }

    #[test]
    fn default_style_matches_word_art() {
        let style = renderer().style().clone();
        assert_eq!(style.font_family, "Black Ops One");
        assert_eq!(style.canvas_size, 1024);
        assert_eq!(style.stroke_width, 4.0);
    }
}
