//! Paint pipeline: caches and offscreen layers composed onto the surface
//!
//! Every nesting level (outer, inner, bubble, content, message) intersects the
//! damage with its own box first and returns early when nothing is left, so a
//! repaint of an untouched region does no rasterisation at all.

use image::RgbaImage;
use rayon::prelude::*;

use super::cache::{BubbleCache, ShadowCache, UserpicCache};
use super::drawing::{blend_over, scale_alpha, Bitmap, Painter};
use super::geometry::{Point, Rect, Size};
use super::images::{self, CornerMasks};
use super::layout::{LayoutBoxes, ScaleLayout};
use super::text_rasterizing::FontBackend;
use super::theme::{ChatBackground, Palette};
use crate::config::PreviewConfig;
use crate::debug_println;

/// Smallest pop scale, reached at progress 0
pub const POP_MIN_SCALE: f32 = 0.3;

/// Opacity and pop-in scale for a show progress value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopTransform {
    pub opacity: f32,
    pub scale: f32,
    /// Bottom-centre of the outer box, in surface coordinates
    pub pivot: (f32, f32),
}

impl PopTransform {
    pub fn for_progress(progress: f32, outer: Rect) -> Self {
        let progress = progress.clamp(0., 1.);
        let middle = outer.x + outer.width / 2;
        let bottom = outer.y + outer.height;
        Self {
            opacity: progress,
            scale: POP_MIN_SCALE + progress * (1. - POP_MIN_SCALE),
            pivot: (middle as f32, bottom as f32),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale >= 1.
    }

    /// Where a logical point lands after the transform
    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let (px, py) = self.pivot;
        (px + (x - px) * self.scale, py + (y - py) * self.scale)
    }

    /// Bounding rect of `rect` after the transform, rounded outward
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let (left, top) = self.map(rect.left() as f32, rect.top() as f32);
        let (right, bottom) = self.map(rect.right() as f32, rect.bottom() as f32);
        let (left, top) = (left.floor() as i32, top.floor() as i32);
        Rect::new(left, top, right.ceil() as i32 - left, bottom.ceil() as i32 - top)
    }
}

/// Weighted mix of two premultiplied pixels, `weight` (0..=256) towards `b`
#[inline]
fn lerp_packed(a: u32, b: u32, weight: u32) -> u32 {
    let spread = |colour: u32| {
        let mut c = colour as u64;
        c = (c | (c << 16)) & 0x0000FFFF0000FFFF;
        (c | (c << 8)) & 0x00FF00FF00FF00FF
    };
    let mut mixed = spread(a) * (256 - weight) as u64 + spread(b) * weight as u64;
    mixed = (mixed >> 8) & 0x00FF00FF00FF00FF;
    mixed = (mixed | (mixed >> 8)) & 0x0000FFFF0000FFFF;
    (mixed | (mixed >> 16)) as u32
}

/// Bilinear sample at device coordinates (pixel centres at +0.5)
#[inline]
fn sample_bilinear(image: &Bitmap, x: f32, y: f32) -> u32 {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor() as i32;
    let y0 = fy.floor() as i32;
    let wx = ((fx - x0 as f32) * 256.) as u32;
    let wy = ((fy - y0 as f32) * 256.) as u32;
    let texel = |x: i32, y: i32| {
        if x < 0 || y < 0 || x >= w || y >= h {
            0
        } else {
            image.pixel(x as usize, y as usize)
        }
    };
    let top = lerp_packed(texel(x0, y0), texel(x0 + 1, y0), wx);
    let bottom = lerp_packed(texel(x0, y0 + 1), texel(x0 + 1, y0 + 1), wx);
    lerp_packed(top, bottom, wy)
}

/// Draw `layer` at `origin` through the pop transform, clipped to `clip`
pub fn composite(
    target: &mut Bitmap,
    layer: &Bitmap,
    origin: Point,
    clip: Rect,
    transform: &PopTransform,
) {
    if transform.opacity <= 0. || layer.is_null() {
        return;
    }
    if transform.is_identity() {
        let mut p = Painter::new(target);
        p.set_clip(clip);
        p.set_opacity(transform.opacity);
        p.draw_bitmap(origin, layer);
        return;
    }

    let ratio = target.ratio();
    let placed = Rect::from_parts(origin, layer.logical_size());
    let area = transform
        .map_rect(placed)
        .intersected(&clip)
        .intersected(&Rect::from_size(target.logical_size()))
        .device(ratio);
    if area.is_empty() {
        return;
    }
    let alpha = (transform.opacity * 255.).round() as u8;
    let scale = transform.scale;
    let (px, py) = transform.pivot;
    let ratio_f = ratio as f32;
    let width = target.width();
    let (left, right) = (area.left() as usize, area.right() as usize);

    target
        .pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .skip(area.top() as usize)
        .take(area.height as usize)
        .for_each(|(y, row)| {
            // Inverse map each device pixel centre back into the layer
            let ly = (y as f32 + 0.5) / ratio_f;
            let sy = (py + (ly - py) / scale - origin.y as f32) * ratio_f;
            for (x, dst) in row.iter_mut().enumerate().take(right).skip(left) {
                let lx = (x as f32 + 0.5) / ratio_f;
                let sx = (px + (lx - px) / scale - origin.x as f32) * ratio_f;
                let src = sample_bilinear(layer, sx, sy);
                if src == 0 {
                    continue;
                }
                *dst = blend_over(*dst, scale_alpha(src, alpha));
            }
        });
}

/// Owns everything the paint needs besides the layout and text backend
pub struct Compositor {
    palette: Palette,
    background: ChatBackground,
    background_cover: Option<Bitmap>,
    userpic: Option<RgbaImage>,
    reply_bar_opacity: f32,
    max_text_lines: usize,

    userpic_cache: UserpicCache,
    bubble_cache: BubbleCache,
    shadow_cache: ShadowCache,

    layer: Bitmap,
    canvas: Bitmap,
    canvas_masks: CornerMasks,
}

impl Compositor {
    pub fn new(config: &PreviewConfig, palette: Palette, background: ChatBackground) -> Self {
        Self {
            palette,
            background,
            background_cover: None,
            userpic: None,
            reply_bar_opacity: config.reply_bar_opacity,
            max_text_lines: config.max_text_lines,
            userpic_cache: UserpicCache::default(),
            bubble_cache: BubbleCache::default(),
            shadow_cache: ShadowCache::default(),
            layer: Bitmap::default(),
            canvas: Bitmap::default(),
            canvas_masks: CornerMasks::default(),
        }
    }

    /// Reallocate the offscreen layers for a new layout and drop every cache
    pub fn relayout(&mut self, layout: &ScaleLayout) {
        let boxes = layout.boxes();
        let ratio = layout.state().ratio;
        self.layer = Bitmap::new(boxes.outer.size(), ratio);
        self.canvas = Bitmap::new(boxes.inner.size(), ratio);
        self.canvas_masks = images::corners_mask(boxes.canvas_radius, ratio);
        self.userpic_cache.invalidate();
        self.bubble_cache.invalidate();
        self.shadow_cache.invalidate();
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.bubble_cache.invalidate();
        self.shadow_cache.invalidate();
    }

    pub fn set_background(&mut self, background: ChatBackground) {
        self.background = background;
        self.background_cover = None;
    }

    pub fn userpic(&self) -> Option<&RgbaImage> {
        self.userpic.as_ref()
    }

    /// Replace the userpic source; only the userpic cache is dropped
    pub fn set_userpic(&mut self, userpic: Option<RgbaImage>) {
        self.userpic = userpic;
        self.userpic_cache.invalidate();
    }

    pub fn userpic_cache(&self) -> &UserpicCache {
        &self.userpic_cache
    }

    pub fn bubble_cache(&self) -> &BubbleCache {
        &self.bubble_cache
    }

    pub fn shadow_cache(&self) -> &ShadowCache {
        &self.shadow_cache
    }

    pub fn layer(&self) -> &Bitmap {
        &self.layer
    }

    pub fn canvas(&self) -> &Bitmap {
        &self.canvas
    }

    /// Wallpaper scaled for the current inner width, once painted
    pub fn background_cover(&self) -> Option<&Bitmap> {
        self.background_cover.as_ref()
    }

    /// Repaint `clip` (surface coordinates) of the preview into `target`
    pub fn paint(
        &mut self,
        target: &mut Bitmap,
        clip: Rect,
        layout: &ScaleLayout,
        backend: &mut dyn FontBackend,
        progress: f32,
    ) {
        if !layout.state().is_initialized() {
            return;
        }
        let boxes = *layout.boxes();
        let outer = clip.intersected(&boxes.outer);
        if outer.is_empty() {
            return;
        }
        debug_println!("scale preview paint: clip={:?} progress={:.2}", clip, progress);
        let local = outer.translated(-boxes.outer.top_left());

        let mut layer = std::mem::take(&mut self.layer);
        {
            let mut q = Painter::new(&mut layer);
            q.set_clip(local);
            self.paint_layer(&mut q, local, layout, backend);
        }
        self.layer = layer;

        let transform = PopTransform::for_progress(progress, boxes.outer);
        composite(target, &self.layer, boxes.outer.top_left(), clip, &transform);
    }

    fn paint_layer(
        &mut self,
        p: &mut Painter<'_>,
        clip: Rect,
        layout: &ScaleLayout,
        backend: &mut dyn FontBackend,
    ) {
        let boxes = layout.boxes();
        p.clear_rect(clip);
        let shadow = self.shadow_cache.ensure(boxes, &self.palette, p.ratio());
        images::paint_shadow(p, boxes.inner, shadow);

        let inner = clip.intersected(&boxes.inner);
        if inner.is_empty() {
            return;
        }
        let local = inner.translated(-boxes.inner.top_left());
        let mut canvas = std::mem::take(&mut self.canvas);
        {
            let mut q = Painter::new(&mut canvas);
            q.set_clip(local);
            self.paint_inner(&mut q, local, layout, backend);
        }
        // Second rounding pass over the whole canvas crops background bleed
        let canvas = images::round(canvas, &self.canvas_masks);
        p.draw_bitmap(boxes.inner.top_left(), &canvas);
        self.canvas = canvas;
    }

    fn paint_inner(
        &mut self,
        p: &mut Painter<'_>,
        clip: Rect,
        layout: &ScaleLayout,
        backend: &mut dyn FontBackend,
    ) {
        let boxes = layout.boxes();
        let width = boxes.inner.width;
        let area = Size::new(width, width * 3);
        let stale = self.background_cover.as_ref().map_or(true, |cover| {
            cover.logical_size() != area || cover.ratio() != p.ratio()
        });
        if stale {
            self.background_cover = self.background.cover(area, p.ratio());
        }
        self.background.paint(p, area, clip, self.background_cover.as_ref());

        self.paint_userpic(p, clip, boxes);

        p.translate(boxes.bubble.top_left());
        self.paint_bubble(p, clip.translated(-boxes.bubble.top_left()), layout, backend);
    }

    fn paint_userpic(&mut self, p: &mut Painter<'_>, clip: Rect, boxes: &LayoutBoxes) {
        let Some(rect) = boxes.userpic else {
            return;
        };
        if clip.intersected(&rect).is_empty() {
            return;
        }
        let Some(source) = self.userpic.as_ref() else {
            return;
        };
        if let Some(image) = self.userpic_cache.ensure(source, rect.size(), p.ratio()) {
            p.draw_bitmap(rect.top_left(), image);
        }
    }

    fn paint_bubble(
        &mut self,
        p: &mut Painter<'_>,
        clip: Rect,
        layout: &ScaleLayout,
        backend: &mut dyn FontBackend,
    ) {
        let boxes = layout.boxes();
        let parts = self.bubble_cache.ensure(layout.state(), boxes, &self.palette);
        let bubble = Rect::from_size(boxes.bubble.size());
        let corner_shadow = parts.shadow_corner.logical_size();
        p.draw_bitmap(
            Point::new(
                bubble.width - corner_shadow.width,
                bubble.height + boxes.bubble_shadow - corner_shadow.height,
            ),
            &parts.shadow_corner,
        );
        images::fill_round_rect(p, bubble, self.palette.bubble_bg, &parts.corners);
        let tail = parts.tail.logical_size();
        p.draw_bitmap(Point::new(-tail.width, bubble.height - tail.height), &parts.tail);
        p.fill_rect(
            Rect::new(
                -tail.width,
                bubble.height,
                tail.width + bubble.width - corner_shadow.width,
                boxes.bubble_shadow,
            ),
            self.palette.bubble_shadow,
        );

        let content = clip.intersected(&boxes.content);
        if content.is_empty() {
            return;
        }
        p.translate(boxes.content.top_left());
        let local = content.translated(-boxes.content.top_left());
        p.set_clip(local);
        self.paint_content(p, local, layout, backend);
    }

    fn paint_content(
        &mut self,
        p: &mut Painter<'_>,
        clip: Rect,
        layout: &ScaleLayout,
        backend: &mut dyn FontBackend,
    ) {
        let boxes = layout.boxes();
        let Some(texts) = layout.texts() else {
            return;
        };

        let opacity = p.opacity();
        p.set_opacity(opacity * self.reply_bar_opacity);
        p.fill_rect(boxes.reply_bar, self.palette.reply_bar);
        p.set_opacity(opacity);

        texts.name.draw_left_elided(
            p,
            backend,
            boxes.name.top_left(),
            boxes.name.width,
            1,
            self.palette.name_fg,
        );
        texts.reply.draw_left_elided(
            p,
            backend,
            boxes.reply.top_left(),
            boxes.reply.width,
            1,
            self.palette.text_fg,
        );

        let message = clip.intersected(&boxes.message);
        if message.is_empty() {
            return;
        }
        p.translate(boxes.message.top_left());
        p.set_clip(message.translated(-boxes.message.top_left()));
        texts.message.draw_left_elided(
            p,
            backend,
            Point::default(),
            boxes.message.width,
            self.max_text_lines,
            self.palette.text_fg,
        );
    }
}
