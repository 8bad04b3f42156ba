//! Shared drawing primitives
//!
//! All rasters are `u32` pixel buffers in premultiplied ARGB (0xAARRGGBB).
//! A [`Bitmap`] remembers the device pixel ratio it was produced for so
//! callers can position it in logical pixels and have it land 1:1 on
//! device pixels without re-scaling.

use super::geometry::{Point, Rect, Size};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    ratio: i32,
    pixels: Vec<u32>,
}

impl Bitmap {
    /// Transparent bitmap of `size` logical pixels at `ratio`
    pub fn new(size: Size, ratio: i32) -> Self {
        let device = size.device(ratio);
        Self::from_device(device.width.max(0) as usize, device.height.max(0) as usize, ratio)
    }

    /// Transparent bitmap with explicit device dimensions
    pub fn from_device(width: usize, height: usize, ratio: i32) -> Self {
        Self {
            width,
            height,
            ratio: ratio.max(1),
            pixels: vec![0; width * height],
        }
    }

    pub fn from_pixels(width: usize, height: usize, ratio: i32, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            ratio: ratio.max(1),
            pixels,
        }
    }

    pub fn is_null(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn ratio(&self) -> i32 {
        self.ratio
    }

    /// Size in logical pixels (device size divided by the ratio)
    pub fn logical_size(&self) -> Size {
        let ratio = self.ratio.max(1);
        Size::new(self.width as i32 / ratio, self.height as i32 / ratio)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn fill(&mut self, colour: u32) {
        self.pixels.fill(colour);
    }

    /// Multiply every pixel's alpha (and premultiplied channels) by `mask`
    pub fn apply_alpha_mask(&mut self, mask: &[u8]) {
        debug_assert_eq!(mask.len(), self.pixels.len());
        for (pixel, &alpha) in self.pixels.iter_mut().zip(mask) {
            if alpha != 255 {
                *pixel = scale_alpha(*pixel, alpha);
            }
        }
    }
}

// Helper functions for u32 packed pixel manipulation (0xAARRGGBB)

#[inline]
pub fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

#[inline]
pub fn unpack_argb(pixel: u32) -> (u8, u8, u8, u8) {
    let a = (pixel >> 24) as u8;
    let r = (pixel >> 16) as u8;
    let g = (pixel >> 8) as u8;
    let b = pixel as u8;
    (r, g, b, a)
}

/// Straight ARGB to premultiplied ARGB
#[inline]
pub fn premultiply(colour: u32) -> u32 {
    let (r, g, b, a) = unpack_argb(colour);
    if a == 255 {
        return colour;
    }
    let mul = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
    pack_argb(mul(r), mul(g), mul(b), a)
}

/// Scale a packed ARGB colour by alpha, all four channels.
/// Formula: colour * (alpha + 1) >> 8, exact for alpha 0 and 255.
#[inline]
pub fn scale_alpha(colour: u32, alpha: u8) -> u32 {
    let mut c = colour as u64;
    c = (c | (c << 16)) & 0x0000FFFF0000FFFF;
    c = (c | (c << 8)) & 0x00FF00FF00FF00FF;

    let mut scaled = c * (alpha as u64 + 1);
    scaled = (scaled >> 8) & 0x00FF00FF00FF00FF;
    scaled = (scaled | (scaled >> 8)) & 0x0000FFFF0000FFFF;
    scaled = scaled | (scaled >> 16);

    scaled as u32
}

/// Porter-Duff source-over for premultiplied pixels
#[inline]
pub fn blend_over(dst: u32, src: u32) -> u32 {
    let src_alpha = (src >> 24) as u8;
    match src_alpha {
        255 => src,
        0 if src == 0 => dst,
        _ => {
            // PROOF: every premultiplied src channel <= src_alpha and the scaled
            // dst channel <= 255 - src_alpha, so the per-byte sum cannot carry
            src.wrapping_add(scale_alpha(dst, 255 - src_alpha))
        }
    }
}

#[inline]
fn opacity_byte(opacity: f32) -> u8 {
    (opacity.clamp(0., 1.) * 255.).round() as u8
}

/// Clipped, translated drawing into a [`Bitmap`]
///
/// Coordinates passed to the drawing calls are logical and relative to the
/// current origin; the clip is kept in absolute logical coordinates.
pub struct Painter<'a> {
    target: &'a mut Bitmap,
    origin: Point,
    clip: Rect,
    opacity: f32,
}

impl<'a> Painter<'a> {
    pub fn new(target: &'a mut Bitmap) -> Self {
        let clip = Rect::from_size(target.logical_size());
        Self {
            target,
            origin: Point::default(),
            clip,
            opacity: 1.,
        }
    }

    pub fn ratio(&self) -> i32 {
        self.target.ratio
    }

    pub fn translate(&mut self, offset: Point) {
        self.origin = self.origin + offset;
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Replace the clip; `rect` is in current (translated) coordinates
    pub fn set_clip(&mut self, rect: Rect) {
        let bounds = Rect::from_size(self.target.logical_size());
        self.clip = rect.translated(self.origin).intersected(&bounds);
    }

    /// Current clip in current (translated) coordinates
    pub fn clip(&self) -> Rect {
        self.clip.translated(-self.origin)
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0., 1.);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Device rect of a logical rect in current coordinates, clipped
    fn device_rect(&self, rect: Rect) -> Rect {
        rect.translated(self.origin)
            .intersected(&self.clip)
            .device(self.target.ratio)
    }

    /// Set the covered pixels to fully transparent, ignoring opacity
    pub fn clear_rect(&mut self, rect: Rect) {
        let area = self.device_rect(rect);
        if area.is_empty() {
            return;
        }
        let width = self.target.width;
        for y in area.top()..area.bottom() {
            let row = y as usize * width;
            self.target.pixels[row + area.left() as usize..row + area.right() as usize].fill(0);
        }
    }

    /// Fill with a straight-alpha ARGB colour
    pub fn fill_rect(&mut self, rect: Rect, colour: u32) {
        let area = self.device_rect(rect);
        if area.is_empty() {
            return;
        }
        let mut src = premultiply(colour);
        let alpha = opacity_byte(self.opacity);
        if alpha != 255 {
            src = scale_alpha(src, alpha);
        }
        let width = self.target.width;
        for y in area.top()..area.bottom() {
            let row = y as usize * width;
            let span = row + area.left() as usize..row + area.right() as usize;
            for pixel in &mut self.target.pixels[span] {
                *pixel = blend_over(*pixel, src);
            }
        }
    }

    /// Source-over blit of a bitmap whose top-left lands at `position`
    pub fn draw_bitmap(&mut self, position: Point, bitmap: &Bitmap) {
        if bitmap.is_null() {
            return;
        }
        debug_assert_eq!(bitmap.ratio, self.target.ratio);
        let ratio = self.target.ratio;
        let at = (self.origin + position).device_point(ratio);
        let placed = Rect::new(at.x, at.y, bitmap.width as i32, bitmap.height as i32);
        let area = placed.intersected(&self.clip.device(ratio));
        if area.is_empty() {
            return;
        }
        let alpha = opacity_byte(self.opacity);
        let width = self.target.width;
        for y in area.top()..area.bottom() {
            let dst_row = y as usize * width;
            let src_row = (y - at.y) as usize * bitmap.width;
            for x in area.left()..area.right() {
                let mut src = bitmap.pixels[src_row + (x - at.x) as usize];
                if alpha != 255 {
                    src = scale_alpha(src, alpha);
                }
                let dst = &mut self.target.pixels[dst_row + x as usize];
                *dst = blend_over(*dst, src);
            }
        }
    }

    /// Repeat `bitmap` over `rect`, anchored at the rect's top-left
    pub fn draw_bitmap_tiled(&mut self, rect: Rect, bitmap: &Bitmap) {
        if bitmap.is_null() {
            return;
        }
        let ratio = self.target.ratio;
        let anchor = (self.origin + rect.top_left()).device_point(ratio);
        let area = self.device_rect(rect);
        if area.is_empty() {
            return;
        }
        let alpha = opacity_byte(self.opacity);
        let width = self.target.width;
        for y in area.top()..area.bottom() {
            let dst_row = y as usize * width;
            let src_row = (y - anchor.y).rem_euclid(bitmap.height as i32) as usize * bitmap.width;
            for x in area.left()..area.right() {
                let src_x = (x - anchor.x).rem_euclid(bitmap.width as i32) as usize;
                let mut src = bitmap.pixels[src_row + src_x];
                if alpha != 255 {
                    src = scale_alpha(src, alpha);
                }
                let dst = &mut self.target.pixels[dst_row + x as usize];
                *dst = blend_over(*dst, src);
            }
        }
    }

    /// Blend a glyph coverage value at a device offset from `position`
    ///
    /// Used as the sink for text rasterisers, which work in device pixels.
    pub fn blend_coverage(&mut self, position: Point, dx: i32, dy: i32, colour: u32, coverage: u8) {
        if coverage == 0 {
            return;
        }
        let ratio = self.target.ratio;
        let at = (self.origin + position).device_point(ratio);
        let x = at.x + dx;
        let y = at.y + dy;
        let clip = self.clip.device(ratio);
        if x < clip.left() || x >= clip.right() || y < clip.top() || y >= clip.bottom() {
            return;
        }
        let alpha = ((coverage as u32 * opacity_byte(self.opacity) as u32 + 127) / 255) as u8;
        let src = scale_alpha(premultiply(colour), alpha);
        let dst = &mut self.target.pixels[y as usize * self.target.width + x as usize];
        *dst = blend_over(*dst, src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_alpha_extremes() {
        assert_eq!(scale_alpha(0xFF_12_34_56, 255), 0xFF_12_34_56);
        assert_eq!(scale_alpha(0xFF_12_34_56, 0), 0);
    }

    #[test]
    fn test_blend_over_opaque_and_transparent() {
        assert_eq!(blend_over(0xFF_00_00_00, 0xFF_FF_FF_FF), 0xFF_FF_FF_FF);
        assert_eq!(blend_over(0xFF_10_20_30, 0), 0xFF_10_20_30);
        let half = scale_alpha(0xFF_FF_FF_FF, 128);
        let (r, _, _, a) = unpack_argb(blend_over(0xFF_00_00_00, half));
        assert_eq!(a, 255);
        assert!((127..=129).contains(&r), "r = {}", r);
    }

    #[test]
    fn test_fill_respects_clip_and_translation() {
        let mut bitmap = Bitmap::new(Size::new(4, 4), 2);
        {
            let mut p = Painter::new(&mut bitmap);
            p.translate(Point::new(1, 1));
            p.set_clip(Rect::new(0, 0, 1, 1));
            p.fill_rect(Rect::new(-5, -5, 20, 20), 0xFF_FF_00_00);
        }
        // Only logical (1,1) -> device 2..4 x 2..4 is painted
        assert_eq!(bitmap.pixel(2, 2), 0xFF_FF_00_00);
        assert_eq!(bitmap.pixel(3, 3), 0xFF_FF_00_00);
        assert_eq!(bitmap.pixel(1, 2), 0);
        assert_eq!(bitmap.pixel(4, 4), 0);
    }

    #[test]
    fn test_draw_bitmap_tiled_repeats() {
        let tile = Bitmap::from_pixels(1, 1, 1, vec![0xFF_00_FF_00]);
        let mut bitmap = Bitmap::new(Size::new(3, 2), 1);
        Painter::new(&mut bitmap).draw_bitmap_tiled(Rect::new(0, 0, 3, 1), &tile);
        assert!(bitmap.pixels()[..3].iter().all(|&p| p == 0xFF_00_FF_00));
        assert!(bitmap.pixels()[3..].iter().all(|&p| p == 0));
    }
}
