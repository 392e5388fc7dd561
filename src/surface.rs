//! The 2D drawing surface the pipeline draws through.
//!
//! Everything platform specific about rendering sits behind [`Surface`]:
//! allocating a canvas, rotating its coordinate frame, drawing an image into
//! it, and reading or writing raw pixels. [`PixmapSurface`] implements it on
//! top of tiny-skia (as bundled with resvg); other targets provide their own
//! implementation and reuse the rest of the crate unchanged.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{
    Color, FilterQuality, IntSize, Pixmap, PixmapPaint, Transform,
};

use crate::color::HexColor;
use crate::error::{EmblemError, EmblemResult};
use crate::geometry::SizePx;

/// A raster canvas with a current transform.
pub trait Surface: Sized {
    /// Allocates a fully transparent surface.
    fn allocate(size: SizePx) -> EmblemResult<Self>;

    fn size(&self) -> SizePx;

    /// Paints the whole surface with an opaque color, ignoring the transform.
    fn fill(&mut self, color: HexColor);

    /// Rotates the coordinate frame clockwise by `degrees` around the
    /// surface's own center. Affects later draws only. Angles wrap at 360.
    fn rotate(&mut self, degrees: f64);

    /// Draws `image` stretched to `size` with its top-left corner at `(x, y)`
    /// in the current frame, compositing source-over.
    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32, size: SizePx);

    /// Reads back straight-alpha RGBA pixels.
    fn get_pixels(&self) -> RgbaImage;

    /// Overwrites every pixel, ignoring the transform. Fails without
    /// writing anything if `pixels` does not match the surface size.
    fn put_pixels(&mut self, pixels: &RgbaImage) -> EmblemResult<()>;
}

/// Largest area, in pixels, any surface may cover (8192x8192, 256 MiB of
/// RGBA). Scaled layers beyond it fail instead of exhausting memory.
pub const MAX_SURFACE_PIXELS: u64 = 8192 * 8192;

/// Fails with [`EmblemError::CanvasUnavailable`] for empty or oversized areas.
pub(crate) fn check_surface_size(size: SizePx) -> EmblemResult<()> {
    let area = size.width as u64 * size.height as u64;
    if area == 0 || area > MAX_SURFACE_PIXELS {
        return Err(EmblemError::CanvasUnavailable {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

/// Allocates a transparent pixmap within [`MAX_SURFACE_PIXELS`].
pub(crate) fn new_pixmap(size: SizePx) -> EmblemResult<Pixmap> {
    check_surface_size(size)?;
    Pixmap::new(size.width, size.height).ok_or(EmblemError::CanvasUnavailable {
        width: size.width,
        height: size.height,
    })
}

// ============================================================================
// PixmapSurface
// ============================================================================

/// A CPU surface backed by a tiny-skia [`Pixmap`].
pub struct PixmapSurface {
    pixmap: Pixmap,
    transform: Transform,
}

impl PixmapSurface {
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Wraps an existing pixmap, e.g. one produced by resvg.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap,
            transform: Transform::identity(),
        }
    }
}

impl Surface for PixmapSurface {
    fn allocate(size: SizePx) -> EmblemResult<Self> {
        Ok(Self::from_pixmap(new_pixmap(size)?))
    }

    fn size(&self) -> SizePx {
        SizePx::new(self.pixmap.width(), self.pixmap.height())
    }

    fn fill(&mut self, color: HexColor) {
        let [r, g, b] = color.channels();
        self.pixmap.fill(Color::from_rgba8(r, g, b, 255));
    }

    fn rotate(&mut self, degrees: f64) {
        let cx = (self.pixmap.width() / 2) as f32;
        let cy = (self.pixmap.height() / 2) as f32;
        let degrees = degrees.rem_euclid(360.0) as f32;
        self.transform = self
            .transform
            .pre_concat(Transform::from_rotate_at(degrees, cx, cy));
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32, size: SizePx) {
        if size.width == 0 || size.height == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        // tiny-skia cannot represent a destination whose far edge overflows i32.
        let fits = |origin: i32, extent: u32| {
            i32::try_from(extent).is_ok_and(|extent| origin.checked_add(extent).is_some())
        };
        if !fits(x, size.width) || !fits(y, size.height) {
            return;
        }

        let resized;
        let source = if image.dimensions() == (size.width, size.height) {
            image
        } else {
            resized = imageops::resize(image, size.width, size.height, FilterType::Triangle);
            &resized
        };

        let Some(source) = rgba_image_to_pixmap(source) else {
            return;
        };

        let paint = PixmapPaint {
            quality: if self.transform.is_identity() {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            },
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(x, y, source.as_ref(), &paint, self.transform, None);
    }

    fn get_pixels(&self) -> RgbaImage {
        pixmap_to_rgba_image(&self.pixmap)
    }

    fn put_pixels(&mut self, pixels: &RgbaImage) -> EmblemResult<()> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        if pixels.dimensions() != (width, height) {
            return Err(EmblemError::PixelSizeMismatch {
                width,
                height,
                actual_width: pixels.width(),
                actual_height: pixels.height(),
            });
        }
        for (dst, src) in self
            .pixmap
            .data_mut()
            .chunks_exact_mut(4)
            .zip(pixels.pixels())
        {
            dst.copy_from_slice(&premultiply(*src));
        }
        Ok(())
    }
}

// ============================================================================
// Pixel conversion
// ============================================================================

/// Converts a tiny-skia pixmap (premultiplied) to a straight-alpha image.
pub(crate) fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        *dst = unpremultiply(src[0], src[1], src[2], src[3]);
    }
    img
}

fn rgba_image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image.pixels().flat_map(|p| premultiply(*p)).collect();
    Pixmap::from_vec(data, size)
}

fn premultiply(pixel: Rgba<u8>) -> [u8; 4] {
    let [r, g, b, a] = pixel.0;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let a16 = a as u16;
    let mul = |c: u8| ((c as u16 * a16 + 127) / 255) as u8;
    [mul(r), mul(g), mul(b), a]
}

fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    if a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let a_f = a as f32 / 255.0;
    let div = |c: u8| (c as f32 / a_f).round().min(255.0) as u8;
    Rgba([div(r), div(g), div(b), a])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surface_is_unavailable() {
        assert!(matches!(
            PixmapSurface::allocate(SizePx::new(0, 10)),
            Err(EmblemError::CanvasUnavailable { width: 0, height: 10 })
        ));
    }

    #[test]
    fn surface_area_is_capped() {
        assert!(check_surface_size(SizePx::new(8192, 8192)).is_ok());
        assert!(check_surface_size(SizePx::new(1, MAX_SURFACE_PIXELS as u32)).is_ok());
        assert!(matches!(
            check_surface_size(SizePx::new(8192, 8193)),
            Err(EmblemError::CanvasUnavailable { width: 8192, height: 8193 })
        ));
        assert!(check_surface_size(SizePx::new(u32::MAX, u32::MAX)).is_err());

        // A phone part at 40x scale.
        assert!(matches!(
            PixmapSurface::allocate(SizePx::new(30360, 53360)),
            Err(EmblemError::CanvasUnavailable { .. })
        ));
    }

    #[test]
    fn new_surface_is_transparent_and_fill_is_opaque() {
        let mut surface = PixmapSurface::allocate(SizePx::new(4, 3)).unwrap();
        assert_eq!(surface.size(), SizePx::new(4, 3));
        assert!(surface.get_pixels().pixels().all(|p| p.0 == [0, 0, 0, 0]));

        surface.fill(HexColor::rgb(10, 20, 30));
        assert!(surface.get_pixels().pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn draw_at_native_size_copies_opaque_pixels() {
        let mut surface = PixmapSurface::allocate(SizePx::new(10, 10)).unwrap();
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        surface.draw_image(&src, 3, 3, SizePx::new(4, 4));

        let out = surface.get_pixels();
        assert_eq!(out.get_pixel(5, 5).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(out.get_pixel(7, 7).0, [0, 0, 0, 0]);
    }

    #[test]
    fn draw_clips_negative_offsets() {
        let mut surface = PixmapSurface::allocate(SizePx::new(4, 4)).unwrap();
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        surface.draw_image(&src, -2, -2, SizePx::new(4, 4));

        let out = surface.get_pixels();
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn transparent_source_keeps_underlying_pixels() {
        let mut surface = PixmapSurface::allocate(SizePx::new(4, 4)).unwrap();
        surface.fill(HexColor::rgb(0, 255, 0));
        let src = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        surface.draw_image(&src, 0, 0, SizePx::new(4, 4));
        assert_eq!(surface.get_pixels().get_pixel(2, 2).0, [0, 255, 0, 255]);
    }

    #[test]
    fn half_turn_moves_content_to_opposite_corner() {
        let mut surface = PixmapSurface::allocate(SizePx::new(8, 8)).unwrap();
        surface.rotate(180.0);
        let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        surface.draw_image(&src, 0, 0, SizePx::new(2, 2));

        let out = surface.get_pixels();
        assert_eq!(out.get_pixel(0, 0).0[3], 0);
        assert!(out.get_pixel(7, 7).0[3] > 0);
    }

    #[test]
    fn quarter_turn_is_clockwise() {
        let mut surface = PixmapSurface::allocate(SizePx::new(8, 8)).unwrap();
        surface.rotate(90.0);
        let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        surface.draw_image(&src, 0, 0, SizePx::new(2, 2));

        // Top-left marker turns into the top-right corner.
        let out = surface.get_pixels();
        assert!(out.get_pixel(7, 1).0[3] > 0);
        assert_eq!(out.get_pixel(1, 1).0[3], 0);
        assert_eq!(out.get_pixel(1, 6).0[3], 0);
        assert_eq!(out.get_pixel(6, 6).0[3], 0);
    }

    #[test]
    fn rotation_wraps_at_full_turns() {
        let draw = |degrees: f64| {
            let mut surface = PixmapSurface::allocate(SizePx::new(8, 8)).unwrap();
            surface.rotate(degrees);
            let src = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
            surface.draw_image(&src, 0, 0, SizePx::new(2, 2));
            surface.get_pixels()
        };
        assert_eq!(draw(450.0), draw(90.0));
        assert_eq!(draw(-270.0), draw(90.0));

        // Too large for f32, but still a valid angle.
        let huge = draw(1e300);
        assert!(huge.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn draw_far_outside_the_surface_is_ignored() {
        let mut surface = PixmapSurface::allocate(SizePx::new(4, 4)).unwrap();
        let src = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        surface.draw_image(&src, i32::MAX, 0, SizePx::new(4, 4));
        surface.draw_image(&src, 0, i32::MAX - 2, SizePx::new(4, 4));
        assert!(surface.get_pixels().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn put_then_get_preserves_opaque_pixels() {
        let mut surface = PixmapSurface::allocate(SizePx::new(2, 1)).unwrap();
        let pixels = RgbaImage::from_vec(2, 1, vec![1, 2, 3, 255, 200, 100, 50, 255]).unwrap();
        surface.put_pixels(&pixels).unwrap();
        assert_eq!(surface.get_pixels(), pixels);
    }

    #[test]
    fn put_pixels_rejects_wrong_size() {
        let mut surface = PixmapSurface::allocate(SizePx::new(2, 2)).unwrap();
        surface.fill(HexColor::rgb(0, 0, 255));
        let err = surface
            .put_pixels(&RgbaImage::from_pixel(1, 2, Rgba([255, 0, 0, 255])))
            .unwrap_err();
        assert!(matches!(
            err,
            EmblemError::PixelSizeMismatch { width: 2, height: 2, actual_width: 1, actual_height: 2 }
        ));
        assert!(surface.get_pixels().pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }
}
