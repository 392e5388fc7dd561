//! emblem-renderer: layered emblem compositing with undo/redo editing
//!
//! An emblem is four independently styled layers (back, front and two
//! words). Each layer is recolored from a black/white source, scaled,
//! rotated and offset, then stacked onto a canvas sized for the chosen
//! output: a square preview, a phone wallpaper, or a desktop wallpaper in
//! three alignments.
//!
//! # Example
//!
//! ```
//! use emblem_renderer::{
//!     CompositionEngine, EmblemConfiguration, GlyphRenderer, GlyphStyle,
//!     MemoryAssetSource, Orientation,
//! };
//!
//! let engine = CompositionEngine::new(
//!     MemoryAssetSource::new(),
//!     GlyphRenderer::new(GlyphStyle::default()),
//! );
//!
//! let image = engine
//!     .render(&EmblemConfiguration::default(), Orientation::Phone)
//!     .unwrap();
//! assert_eq!(image.dimensions(), (759, 1334));
//! ```
//!
//! # Editing
//!
//! [`EditorHistoryStore`] holds the configuration being edited, with
//! linear undo/redo and a saved copy that survives restarts:
//!
//! ```
//! use emblem_renderer::{EditorHistoryStore, EmblemChange, LayerChange, LayerSlot};
//!
//! let mut store = EditorHistoryStore::in_memory();
//! store.update(&EmblemChange::new().layer(LayerSlot::Back, LayerChange::new().scale(1.5)));
//! store.undo();
//! assert_eq!(store.current().back.scale, 1.0);
//! ```

mod asset;
mod color;
mod config;
mod engine;
mod error;
mod geometry;
mod history;
mod layer;
mod orientation;
mod part;
mod persist;
mod request;
mod surface;

pub use asset::{AssetSource, FsAssetSource, MemoryAssetSource, TimedAssetSource, decode_image};
pub use color::{HexColor, remap_duotone};
pub use config::{EmblemChange, EmblemConfiguration, LayerChange, LayerConfig, LayerSlot};
pub use engine::{
    CompositionEngine, EngineSettings, PreviewRenderer, RenderGeneration, RenderTicket,
};
pub use error::{EmblemError, EmblemResult};
pub use geometry::{PointPx, Position, SizePx};
pub use history::{EditorHistoryStore, Listener};
pub use layer::{
    GlyphRenderer, GlyphStyle, LayerCache, PartRasterizer, SlotCache, place, placement,
};
pub use orientation::{HorizontalShift, Orientation, OrientationProfile};
pub use part::{Asset, IMAGES_ROOT, Part, PartCatalog, PartGroup, PartKind};
pub use persist::{ConfigPersistence, JsonFilePersistence, MemoryPersistence, STATE_KEY};
pub use request::{
    CACHE_CONTROL, DRAW_ROUTE, DrawRequest, DrawResponse, decode_draw_object, encode_png,
    handle_draw,
};
pub use surface::{MAX_SURFACE_PIXELS, PixmapSurface, Surface};
