//! Part catalog entries and the assets they resolve to.
//!
//! A catalog (`assets.json`) maps part ids to [`Part`]s. Each part belongs to
//! a [`PartGroup`], and each group feeds exactly one kind of layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EmblemError, EmblemResult};

/// Prefix applied to catalog image paths.
pub const IMAGES_ROOT: &str = "/assets/images/";

// ============================================================================
// Asset
// ============================================================================

/// What a layer draws.
///
/// ```json
/// { "image": "/assets/images/full/star.png" }
/// // or
/// { "glyph": "ALPHA" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Asset {
    /// A black/white raster, resolved against the asset root.
    Image(String),
    /// A display string drawn as outlined text in the layer colors.
    Glyph(String),
}

impl Asset {
    pub fn image(path: impl Into<String>) -> Self {
        Self::Image(path.into())
    }

    pub fn glyph(text: impl Into<String>) -> Self {
        Self::Glyph(text.into())
    }

    /// Returns `true` if this asset is recolored after drawing.
    pub fn needs_remap(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

// ============================================================================
// PartGroup
// ============================================================================

/// The layer a part can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Back,
    Front,
    Word,
}

/// Catalog grouping of parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum PartGroup {
    BackNormal,
    BackSpecial,
    FrontNormal,
    FrontAnimals,
    FrontCodenames,
    FrontSpecial,
    WordNormal,
    WordPhonetic,
    WordCodenames,
    WordNumber,
    WordLetter,
}

impl PartGroup {
    pub fn kind(&self) -> PartKind {
        match self {
            Self::BackNormal | Self::BackSpecial => PartKind::Back,
            Self::FrontNormal | Self::FrontAnimals | Self::FrontCodenames | Self::FrontSpecial => {
                PartKind::Front
            }
            Self::WordNormal
            | Self::WordPhonetic
            | Self::WordCodenames
            | Self::WordNumber
            | Self::WordLetter => PartKind::Word,
        }
    }

    /// Label shown in the group menu.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BackNormal | Self::FrontNormal | Self::WordNormal => "Normal",
            Self::BackSpecial | Self::FrontSpecial => "Special",
            Self::FrontAnimals => "Animals",
            Self::FrontCodenames | Self::WordCodenames => "Codenames",
            Self::WordPhonetic => "Phonetic",
            Self::WordNumber => "Numbers",
            Self::WordLetter => "Letter",
        }
    }
}

// ============================================================================
// Part
// ============================================================================

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Part {
    pub name: String,
    pub group: PartGroup,

    /// Full-size image. Word parts without one are drawn as live text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Thumbnail shown in menus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_to_small_image: Option<String>,
}

impl Part {
    pub fn new(name: impl Into<String>, group: PartGroup) -> Self {
        Self {
            name: name.into(),
            group,
            path: None,
            path_to_small_image: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Resolves this part to the asset a layer should draw.
    pub fn asset(&self) -> EmblemResult<Asset> {
        match (&self.path, self.group.kind()) {
            (Some(path), _) => Ok(Asset::Image(path.clone())),
            (None, PartKind::Word) => Ok(Asset::Glyph(self.name.clone())),
            (None, _) => Err(EmblemError::asset_load(
                &self.name,
                "part has no image path",
            )),
        }
    }
}

// ============================================================================
// PartCatalog
// ============================================================================

/// Parts split by the layer kind they belong to, keyed by part id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartCatalog {
    pub back: BTreeMap<String, Part>,
    pub front: BTreeMap<String, Part>,
    pub words: BTreeMap<String, Part>,
}

impl PartCatalog {
    /// Builds a catalog from an `assets.json` document.
    ///
    /// Image paths in the document are relative to [`IMAGES_ROOT`].
    pub fn from_json(json: &str) -> EmblemResult<Self> {
        let entries: BTreeMap<String, Part> = serde_json::from_str(json)?;
        let mut catalog = Self::default();

        for (id, mut part) in entries {
            part.path = part.path.map(|p| format!("{IMAGES_ROOT}{p}"));
            part.path_to_small_image = part
                .path_to_small_image
                .map(|p| format!("{IMAGES_ROOT}{p}"));

            let table = match part.group.kind() {
                PartKind::Back => &mut catalog.back,
                PartKind::Front => &mut catalog.front,
                PartKind::Word => &mut catalog.words,
            };
            table.insert(id, part);
        }

        Ok(catalog)
    }

    /// Total number of parts across all tables.
    pub fn len(&self) -> usize {
        self.back.len() + self.front.len() + self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_classify_into_kinds() {
        assert_eq!(PartGroup::BackSpecial.kind(), PartKind::Back);
        assert_eq!(PartGroup::FrontAnimals.kind(), PartKind::Front);
        assert_eq!(PartGroup::WordLetter.kind(), PartKind::Word);
        assert_eq!(PartGroup::WordNumber.display_name(), "Numbers");
        assert_eq!(PartGroup::FrontCodenames.display_name(), "Codenames");
    }

    #[test]
    fn part_with_path_is_an_image() {
        let part = Part::new("Star", PartGroup::FrontNormal).with_path("/assets/images/star.png");
        assert_eq!(part.asset().unwrap(), Asset::image("/assets/images/star.png"));
        assert!(part.asset().unwrap().needs_remap());
    }

    #[test]
    fn word_without_path_is_a_glyph() {
        let part = Part::new("ALPHA", PartGroup::WordPhonetic);
        assert_eq!(part.asset().unwrap(), Asset::glyph("ALPHA"));
        assert!(!part.asset().unwrap().needs_remap());
    }

    #[test]
    fn shape_without_path_is_an_error() {
        let part = Part::new("Circle", PartGroup::BackNormal);
        assert!(matches!(part.asset(), Err(EmblemError::AssetLoad { .. })));
    }

    #[test]
    fn catalog_splits_by_kind_and_prefixes_paths() {
        let json = r#"{
            "b1": {"name": "Shield", "group": "BACK_NORMAL", "path": "full/b1.png", "pathToSmallImage": "small/b1.png"},
            "f1": {"name": "Wolf", "group": "FRONT_ANIMALS", "path": "full/f1.png"},
            "w1": {"name": "BRAVO", "group": "WORD_PHONETIC"}
        }"#;
        let catalog = PartCatalog::from_json(json).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.back["b1"].path.as_deref(),
            Some("/assets/images/full/b1.png")
        );
        assert_eq!(
            catalog.back["b1"].path_to_small_image.as_deref(),
            Some("/assets/images/small/b1.png")
        );
        assert_eq!(catalog.front["f1"].name, "Wolf");
        assert_eq!(catalog.words["w1"].path, None);
    }

    #[test]
    fn asset_json_shape() {
        let json = serde_json::to_string(&Asset::glyph("HI")).unwrap();
        assert_eq!(json, r#"{"glyph":"HI"}"#);
        let back: Asset = serde_json::from_str(r#"{"image":"/a.png"}"#).unwrap();
        assert_eq!(back, Asset::image("/a.png"));
    }
}
