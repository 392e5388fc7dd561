//! Positioning layer canvases on the final canvas.

use image::RgbaImage;

use crate::geometry::{PointPx, Position, SizePx};
use crate::orientation::OrientationProfile;
use crate::surface::Surface;

/// Computes where a layer's top-left corner lands on the final canvas.
///
/// The layer is centered, then displaced by `position` percent of the
/// layer's own shorter side, then shifted by the orientation's horizontal
/// offset. The result is floored and saturates at the `i32` range, so an
/// extreme offset lands far off canvas instead of wrapping around.
pub fn placement(
    layer: SizePx,
    canvas: SizePx,
    position: Position,
    profile: &OrientationProfile,
) -> PointPx {
    let side = layer.min_side() as f64;
    let x = (canvas.width as f64 - layer.width as f64) / 2.0 + position.x / 100.0 * side;
    let y = (canvas.height as f64 - layer.height as f64) / 2.0 + position.y / 100.0 * side;

    PointPx::new(
        to_px(x.floor() + profile.horizontal_shift_px() as f64),
        to_px(y.floor()),
    )
}

fn to_px(v: f64) -> i32 {
    v.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// True if a `size` rectangle at `at` covers any pixel of `canvas`.
fn overlaps(at: PointPx, size: SizePx, canvas: SizePx) -> bool {
    let (x, y) = (at.x as i64, at.y as i64);
    x < canvas.width as i64
        && y < canvas.height as i64
        && x + size.width as i64 > 0
        && y + size.height as i64 > 0
}

/// Draws a rasterized layer onto `target` at its native size.
pub fn place<S: Surface>(
    layer: &RgbaImage,
    target: &mut S,
    position: Position,
    profile: &OrientationProfile,
) -> PointPx {
    let size = SizePx::new(layer.width(), layer.height());
    let at = placement(size, target.size(), position, profile);
    if !overlaps(at, size, target.size()) {
        tracing::debug!(x = at.x, y = at.y, "layer is entirely off canvas");
        return at;
    }
    tracing::debug!(x = at.x, y = at.y, width = size.width, height = size.height, "placing layer");
    target.draw_image(layer, at.x, at.y, size);
    at
}
