//! Raster helpers for the preview decorations
//!
//! Everything here produces [`Bitmap`]s at device resolution, tagged with the
//! ratio they were built for. Anti-aliasing is coverage based: a pixel's alpha
//! is how much of it lies inside the shape, measured from the pixel centre.

use image::RgbaImage;
use rgb::FromSlice;

use super::drawing::{pack_argb, premultiply, scale_alpha, unpack_argb, Bitmap, Painter};
use super::geometry::{Margins, Point, Rect, Size};
use crate::error::{PreviewError, Result};

pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_LEFT: usize = 2;
pub const BOTTOM_RIGHT: usize = 3;

/// Quarter-circle pixmaps indexed by TOP_LEFT..BOTTOM_RIGHT; a `None`
/// corner is painted square.
pub type CornerPixmaps = [Option<Bitmap>; 4];

/// Alpha masks for the four corners of a rounded rectangle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CornerMasks {
    /// Side of each square mask in device pixels
    pub size: usize,
    pub masks: [Vec<u8>; 4],
}

/// Drop shadow pieces: 1px strips tiled along the sides plus four corners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowParts {
    /// Left, top, right, bottom
    pub sides: [Bitmap; 4],
    /// Top-left, bottom-left, top-right, bottom-right
    pub corners: [Bitmap; 4],
    pub extend: Margins,
}

#[inline]
fn coverage_byte(coverage: f32) -> u8 {
    (coverage.clamp(0., 1.) * 255.).round() as u8
}

/// Coverage of pixel (x, y) by a disc of `radius` centred at (cx, cy)
#[inline]
fn disc_coverage(x: usize, y: usize, cx: f32, cy: f32, radius: f32) -> f32 {
    let dx = x as f32 + 0.5 - cx;
    let dy = y as f32 + 0.5 - cy;
    radius - (dx * dx + dy * dy).sqrt() + 0.5
}

/// Quarter disc mask for one corner, `side` device pixels square
fn quarter_mask(side: usize, corner: usize) -> Vec<u8> {
    let radius = side as f32;
    // Mirrored centre so each corner curves toward its own outside edge
    let cx = if corner == TOP_LEFT || corner == BOTTOM_LEFT { radius } else { 0. };
    let cy = if corner == TOP_LEFT || corner == TOP_RIGHT { radius } else { 0. };
    let mut mask = vec![0u8; side * side];
    for y in 0..side {
        for x in 0..side {
            mask[y * side + x] = coverage_byte(disc_coverage(x, y, cx, cy, radius));
        }
    }
    mask
}

/// Corner masks for a logical `radius` at `ratio`
pub fn corners_mask(radius: i32, ratio: i32) -> CornerMasks {
    let size = (radius.max(0) * ratio.max(1)) as usize;
    CornerMasks {
        size,
        masks: [
            quarter_mask(size, TOP_LEFT),
            quarter_mask(size, TOP_RIGHT),
            quarter_mask(size, BOTTOM_LEFT),
            quarter_mask(size, BOTTOM_RIGHT),
        ],
    }
}

/// Round the corners of `image` in place by multiplying in the masks
pub fn round(mut image: Bitmap, masks: &CornerMasks) -> Bitmap {
    let side = masks.size;
    let (width, height) = (image.width(), image.height());
    if side == 0 || width < side || height < side {
        return image;
    }
    let origins = [
        (0, 0),
        (width - side, 0),
        (0, height - side),
        (width - side, height - side),
    ];
    let pixels = image.pixels_mut();
    for (mask, (ox, oy)) in masks.masks.iter().zip(origins) {
        for y in 0..side {
            let row = (oy + y) * width + ox;
            for x in 0..side {
                let alpha = mask[y * side + x];
                if alpha != 255 {
                    pixels[row + x] = scale_alpha(pixels[row + x], alpha);
                }
            }
        }
    }
    image
}

/// Crop to the inscribed circle with an anti-aliased edge
pub fn circle(mut image: Bitmap) -> Bitmap {
    let (width, height) = (image.width(), image.height());
    let cx = width as f32 / 2.;
    let cy = height as f32 / 2.;
    let radius = cx.min(cy);
    let pixels = image.pixels_mut();
    for y in 0..height {
        for x in 0..width {
            let alpha = coverage_byte(disc_coverage(x, y, cx, cy, radius));
            if alpha != 255 {
                let idx = y * width + x;
                pixels[idx] = scale_alpha(pixels[idx], alpha);
            }
        }
    }
    image
}

/// Four filled quarter circles of `colour` for a logical `radius`
pub fn corner_pixmaps(radius: i32, colour: u32, ratio: i32) -> CornerPixmaps {
    let masks = corners_mask(radius, ratio);
    let fill = premultiply(colour);
    let make = |corner: usize| {
        let pixels = masks.masks[corner]
            .iter()
            .map(|&alpha| scale_alpha(fill, alpha))
            .collect();
        Some(Bitmap::from_pixels(masks.size, masks.size, ratio, pixels))
    };
    [make(TOP_LEFT), make(TOP_RIGHT), make(BOTTOM_LEFT), make(BOTTOM_RIGHT)]
}

/// Fill `rect` as a rounded rectangle using prepared corner pixmaps
pub fn fill_round_rect(p: &mut Painter<'_>, rect: Rect, colour: u32, corners: &CornerPixmaps) {
    let radius = corners
        .iter()
        .flatten()
        .map(|corner| corner.logical_size().width)
        .next()
        .unwrap_or(0)
        .min(rect.width / 2)
        .min(rect.height / 2);
    if radius <= 0 {
        p.fill_rect(rect, colour);
        return;
    }
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
    p.fill_rect(Rect::new(x + radius, y, w - 2 * radius, h), colour);
    p.fill_rect(Rect::new(x, y + radius, radius, h - 2 * radius), colour);
    p.fill_rect(Rect::new(x + w - radius, y + radius, radius, h - 2 * radius), colour);

    let positions = [
        Point::new(x, y),
        Point::new(x + w - radius, y),
        Point::new(x, y + h - radius),
        Point::new(x + w - radius, y + h - radius),
    ];
    for (corner, position) in corners.iter().zip(positions) {
        match corner {
            Some(pixmap) => p.draw_bitmap(position, pixmap),
            None => p.fill_rect(Rect::from_parts(position, Size::new(radius, radius)), colour),
        }
    }
}

/// Bubble tail for an incoming (left-side) bubble
///
/// The shape hugs the bubble's bottom-left corner: its right edge is flush
/// with the bubble, its bottom row is full width, and the left edge curves
/// up toward the bubble.
pub fn bubble_tail(size: Size, colour: u32, ratio: i32) -> Bitmap {
    const SAMPLES: usize = 4;
    let device = size.device(ratio);
    let (width, height) = (device.width.max(0) as usize, device.height.max(0) as usize);
    let fill = premultiply(colour);
    let mut pixels = vec![0u32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut inside = 0;
            for sy in 0..SAMPLES {
                for sx in 0..SAMPLES {
                    let u = (x as f32 + (sx as f32 + 0.5) / SAMPLES as f32) / width as f32;
                    let v = (y as f32 + (sy as f32 + 0.5) / SAMPLES as f32) / height as f32;
                    if u >= 1. - v * v {
                        inside += 1;
                    }
                }
            }
            let alpha = (inside * 255 / (SAMPLES * SAMPLES)) as u8;
            pixels[y * width + x] = scale_alpha(fill, alpha);
        }
    }
    Bitmap::from_pixels(width, height, ratio, pixels)
}

/// Alpha falloff for a shadow sample `t` in [0, 1] away from the frame
#[inline]
fn shadow_falloff(t: f32, peak: u8) -> u8 {
    let f = (1. - t).clamp(0., 1.);
    (f * f * peak as f32).round() as u8
}

/// Build the drop shadow for `extend` (logical) in `colour`
pub fn shadow_parts(extend: Margins, colour: u32, peak: u8, ratio: i32) -> ShadowParts {
    let (r, g, b, _) = super::drawing::unpack_argb(colour);
    let shade = |alpha: u8| premultiply(pack_argb(r, g, b, alpha));
    let left = (extend.left * ratio).max(0) as usize;
    let top = (extend.top * ratio).max(0) as usize;
    let right = (extend.right * ratio).max(0) as usize;
    let bottom = (extend.bottom * ratio).max(0) as usize;

    // Distance of a pixel centre from the frame edge, normalised by the extent
    let t = |distance: usize, extent: usize| (distance as f32 + 0.5) / extent.max(1) as f32;

    let horizontal = |extent: usize, towards_frame_at_end: bool| {
        let pixels = (0..extent)
            .map(|x| {
                let distance = if towards_frame_at_end { extent - 1 - x } else { x };
                shade(shadow_falloff(t(distance, extent), peak))
            })
            .collect();
        Bitmap::from_pixels(extent, 1, ratio, pixels)
    };
    let vertical = |extent: usize, towards_frame_at_end: bool| {
        let pixels = (0..extent)
            .map(|y| {
                let distance = if towards_frame_at_end { extent - 1 - y } else { y };
                shade(shadow_falloff(t(distance, extent), peak))
            })
            .collect();
        Bitmap::from_pixels(1, extent, ratio, pixels)
    };
    let corner = |w: usize, h: usize, frame_right: bool, frame_bottom: bool| {
        let mut pixels = vec![0u32; w * h];
        for y in 0..h {
            for x in 0..w {
                let dx = if frame_right { w - 1 - x } else { x };
                let dy = if frame_bottom { h - 1 - y } else { y };
                let tx = t(dx, w);
                let ty = t(dy, h);
                pixels[y * w + x] = shade(shadow_falloff((tx * tx + ty * ty).sqrt(), peak));
            }
        }
        Bitmap::from_pixels(w, h, ratio, pixels)
    };

    ShadowParts {
        sides: [
            horizontal(left, true),
            vertical(top, true),
            horizontal(right, false),
            vertical(bottom, false),
        ],
        corners: [
            corner(left, top, true, true),
            corner(left, bottom, true, false),
            corner(right, top, false, true),
            corner(right, bottom, false, false),
        ],
        extend,
    }
}

/// Paint the shadow around `frame` (the box the shadow surrounds)
pub fn paint_shadow(p: &mut Painter<'_>, frame: Rect, parts: &ShadowParts) {
    let e = parts.extend;
    let (left, top, right, bottom) = (frame.left(), frame.top(), frame.right(), frame.bottom());
    p.draw_bitmap(Point::new(left - e.left, top - e.top), &parts.corners[0]);
    p.draw_bitmap(Point::new(left - e.left, bottom), &parts.corners[1]);
    p.draw_bitmap(Point::new(right, top - e.top), &parts.corners[2]);
    p.draw_bitmap(Point::new(right, bottom), &parts.corners[3]);

    p.draw_bitmap_tiled(Rect::new(left - e.left, top, e.left, frame.height), &parts.sides[0]);
    p.draw_bitmap_tiled(Rect::new(left, top - e.top, frame.width, e.top), &parts.sides[1]);
    p.draw_bitmap_tiled(Rect::new(right, top, e.right, frame.height), &parts.sides[2]);
    p.draw_bitmap_tiled(Rect::new(left, bottom, frame.width, e.bottom), &parts.sides[3]);
}

/// Smoothly scale `source` to `size` device pixels, ignoring aspect ratio
pub fn scale_smooth(source: &RgbaImage, size: Size, ratio: i32) -> Result<Bitmap> {
    use resize::Pixel::RGBA8P;
    use resize::Type::Mitchell;

    let (src_w, src_h) = (source.width() as usize, source.height() as usize);
    if src_w == 0 || src_h == 0 {
        return Err(PreviewError::InvalidImage {
            width: source.width(),
            height: source.height(),
        });
    }
    if size.is_empty() {
        return Ok(Bitmap::from_device(0, 0, ratio));
    }
    let (dst_w, dst_h) = (size.width as usize, size.height as usize);
    let mut resizer = resize::new(src_w, src_h, dst_w, dst_h, RGBA8P, Mitchell)
        .map_err(|e| PreviewError::Resize(format!("{:?}", e)))?;
    let mut dst = vec![0u8; dst_w * dst_h * 4];
    resizer
        .resize(source.as_raw().as_rgba(), dst.as_rgba_mut())
        .map_err(|e| PreviewError::Resize(format!("{:?}", e)))?;

    let pixels = dst
        .chunks_exact(4)
        .map(|px| premultiply(pack_argb(px[0], px[1], px[2], px[3])))
        .collect();
    Ok(Bitmap::from_pixels(dst_w, dst_h, ratio, pixels))
}

/// Scale a prepared bitmap to cover `size` (logical) keeping its aspect
/// ratio, then crop the overflow evenly from both sides
pub fn scale_cover(source: &Bitmap, size: Size, ratio: i32) -> Result<Bitmap> {
    use resize::Pixel::RGBA8;
    use resize::Type::Triangle;

    let (src_w, src_h) = (source.width(), source.height());
    if src_w == 0 || src_h == 0 {
        return Err(PreviewError::InvalidImage {
            width: src_w as u32,
            height: src_h as u32,
        });
    }
    let target = size.device(ratio);
    if target.is_empty() {
        return Ok(Bitmap::from_device(0, 0, ratio));
    }
    let (dst_w, dst_h) = (target.width as usize, target.height as usize);
    let factor = f64::max(dst_w as f64 / src_w as f64, dst_h as f64 / src_h as f64);
    let scaled_w = ((src_w as f64 * factor).ceil() as usize).max(dst_w);
    let scaled_h = ((src_h as f64 * factor).ceil() as usize).max(dst_h);

    // Pixels are premultiplied already, so channels are filtered independently
    let src: Vec<u8> = source
        .pixels()
        .iter()
        .flat_map(|&px| {
            let (r, g, b, a) = unpack_argb(px);
            [r, g, b, a]
        })
        .collect();
    let mut scaled = vec![0u8; scaled_w * scaled_h * 4];
    let mut resizer = resize::new(src_w, src_h, scaled_w, scaled_h, RGBA8, Triangle)
        .map_err(|e| PreviewError::Resize(format!("{:?}", e)))?;
    resizer
        .resize(src.as_rgba(), scaled.as_rgba_mut())
        .map_err(|e| PreviewError::Resize(format!("{:?}", e)))?;

    let (skip_x, skip_y) = ((scaled_w - dst_w) / 2, (scaled_h - dst_h) / 2);
    let mut pixels = Vec::with_capacity(dst_w * dst_h);
    for row in scaled.chunks_exact(scaled_w * 4).skip(skip_y).take(dst_h) {
        pixels.extend(
            row.chunks_exact(4)
                .skip(skip_x)
                .take(dst_w)
                .map(|px| pack_argb(px[0], px[1], px[2], px[3])),
        );
    }
    Ok(Bitmap::from_pixels(dst_w, dst_h, ratio, pixels))
}
