// Theme colours and chat background
// All colours are u32 in straight (non-premultiplied) ARGB: 0xAARRGGBB

use rayon::prelude::*;

use super::drawing::{premultiply, Bitmap, Painter};
use super::geometry::{Point, Rect, Size};
use super::images;

// Incoming message bubble
pub const MSG_IN_BG: u32 = 0xFF_FF_FF_FF;
pub const MSG_IN_SHADOW: u32 = 0x29_74_8E_A2; // Thin drop shadow under the bubble
pub const MSG_IN_SERVICE_FG: u32 = 0xFF_3A_8C_CF; // Sender name in the reply header
pub const MSG_IN_REPLY_BAR: u32 = 0xFF_40_A7_E3;
pub const HISTORY_TEXT_IN_FG: u32 = 0xFF_00_00_00;

// Preview frame
pub const WINDOW_SHADOW_FG: u32 = 0xFF_00_00_00;
pub const WINDOW_SHADOW_ALPHA: u8 = 0x30; // Peak alpha where the shadow meets the frame

// Default chat background (gradient stops top to bottom)
pub const CHAT_BG_TOP: u32 = 0xFF_DB_DD_BB;
pub const CHAT_BG_BOTTOM: u32 = 0xFF_6B_A5_87;

/// Current colours used by the mockup
///
/// Replacing the palette is what the palette-changed notification does; the
/// bubble and shadow caches are rebuilt from it on next paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bubble_bg: u32,
    pub bubble_shadow: u32,
    pub name_fg: u32,
    pub text_fg: u32,
    pub reply_bar: u32,
    pub window_shadow: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bubble_bg: MSG_IN_BG,
            bubble_shadow: MSG_IN_SHADOW,
            name_fg: MSG_IN_SERVICE_FG,
            text_fg: HISTORY_TEXT_IN_FG,
            reply_bar: MSG_IN_REPLY_BAR,
            window_shadow: WINDOW_SHADOW_FG,
        }
    }
}

/// Prepared chat background as handed over by the theme
#[derive(Debug, Clone, PartialEq)]
pub struct ChatBackground {
    /// Solid fill used when there are no gradient colours
    pub fill: u32,
    /// Vertical gradient stops, top to bottom (empty = solid fill)
    pub colours: Vec<u32>,
    /// Pattern or wallpaper image, already at device resolution
    pub prepared: Option<Bitmap>,
    pub pattern_opacity: f32,
    pub tile: bool,
}

impl Default for ChatBackground {
    fn default() -> Self {
        Self {
            fill: CHAT_BG_BOTTOM,
            colours: vec![CHAT_BG_TOP, CHAT_BG_BOTTOM],
            prepared: None,
            pattern_opacity: 1.,
            tile: false,
        }
    }
}

impl ChatBackground {
    pub fn solid(fill: u32) -> Self {
        Self {
            fill,
            colours: Vec::new(),
            ..Self::default()
        }
    }

    /// The prepared image scaled to cover `area`, for the non-tiled layout
    ///
    /// `None` when there is nothing to cover with or the image cannot be
    /// scaled; the gradient alone is painted then.
    pub fn cover(&self, area: Size, ratio: i32) -> Option<Bitmap> {
        if self.tile {
            return None;
        }
        let image = self.prepared.as_ref().filter(|image| !image.is_null())?;
        match images::scale_cover(image, area, ratio) {
            Ok(cover) => Some(cover),
            Err(e) => {
                log::warn!("scale preview: background not scaled: {}", e);
                None
            }
        }
    }

    /// Paint the background as if it covered `area` (logical, anchored at the
    /// painter origin), touching only pixels inside `clip`.
    ///
    /// `cover` is a previously built [`ChatBackground::cover`]; when missing
    /// or built for another area it is rebuilt on the spot.
    pub fn paint(&self, p: &mut Painter<'_>, area: Size, clip: Rect, cover: Option<&Bitmap>) {
        let clip = clip.intersected(&Rect::from_size(area));
        if clip.is_empty() {
            return;
        }
        if self.colours.len() < 2 {
            let fill = self.colours.first().copied().unwrap_or(self.fill);
            p.fill_rect(clip, fill);
        } else {
            let gradient = self.gradient_rows(area.height, clip, p.ratio());
            p.draw_bitmap(clip.top_left(), &gradient);
        }

        if let Some(image) = self.prepared.as_ref().filter(|image| !image.is_null()) {
            let opacity = p.opacity();
            p.set_opacity(opacity * self.pattern_opacity);
            let saved = p.clip();
            p.set_clip(clip);
            if self.tile {
                p.draw_bitmap_tiled(clip, image);
            } else {
                let ratio = p.ratio();
                match cover.filter(|cover| cover.logical_size() == area && cover.ratio() == ratio) {
                    Some(cover) => p.draw_bitmap(Point::default(), cover),
                    None => {
                        if let Some(cover) = self.cover(area, ratio) {
                            p.draw_bitmap(Point::default(), &cover);
                        }
                    }
                }
            }
            p.set_clip(saved);
            p.set_opacity(opacity);
        }
    }

    /// Gradient strip covering `clip`, sampled for an area `height` tall
    fn gradient_rows(&self, height: i32, clip: Rect, ratio: i32) -> Bitmap {
        let mut strip = Bitmap::new(clip.size(), ratio);
        let width = strip.width();
        if width == 0 {
            return strip;
        }
        let device_height = (height * ratio).max(1) as f32;
        let top = clip.top() * ratio;
        let stops = &self.colours;
        strip
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, pixels)| {
                let t = ((top + row as i32) as f32 + 0.5) / device_height;
                pixels.fill(premultiply(sample_gradient(stops, t)));
            });
        strip
    }
}

/// Linear interpolation across evenly spaced stops, t in [0, 1]
fn sample_gradient(stops: &[u32], t: f32) -> u32 {
    let segments = (stops.len() - 1) as f32;
    let position = t.clamp(0., 1.) * segments;
    let index = (position.floor() as usize).min(stops.len() - 2);
    let local = position - index as f32;
    let from = stops[index];
    let to = stops[index + 1];
    let channel = |shift: u32| {
        let a = ((from >> shift) & 0xFF) as f32;
        let b = ((to >> shift) & 0xFF) as f32;
        ((a + (b - a) * local).round() as u32) << shift
    };
    channel(24) | channel(16) | channel(8) | channel(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_gradient_endpoints() {
        let stops = [0xFF_00_00_00, 0xFF_FF_FF_FF];
        assert_eq!(sample_gradient(&stops, 0.), 0xFF_00_00_00);
        assert_eq!(sample_gradient(&stops, 1.), 0xFF_FF_FF_FF);
        assert_eq!(sample_gradient(&stops, 0.5), 0xFF_80_80_80);
    }

    #[test]
    fn test_solid_background_fills_clip_only() {
        let mut canvas = Bitmap::new(Size::new(4, 4), 1);
        {
            let mut p = Painter::new(&mut canvas);
            ChatBackground::solid(0xFF_11_22_33).paint(
                &mut p,
                Size::new(4, 12),
                Rect::new(0, 0, 2, 4),
                None,
            );
        }
        assert_eq!(canvas.pixel(1, 3), 0xFF_11_22_33);
        assert_eq!(canvas.pixel(2, 0), 0);
    }

    #[test]
    fn test_gradient_background_is_opaque() {
        let mut canvas = Bitmap::new(Size::new(3, 3), 2);
        {
            let mut p = Painter::new(&mut canvas);
            ChatBackground::default().paint(&mut p, Size::new(3, 9), Rect::new(0, 0, 3, 3), None);
        }
        assert!(canvas.pixels().iter().all(|&px| px >> 24 == 0xFF));
    }

    fn small_red_wallpaper() -> ChatBackground {
        ChatBackground {
            prepared: Some(Bitmap::from_pixels(2, 2, 1, vec![0xFF_FF_00_00; 4])),
            ..ChatBackground::default()
        }
    }

    #[test]
    fn test_small_wallpaper_covers_whole_area() {
        let area = Size::new(6, 18);
        let mut canvas = Bitmap::new(area, 1);
        {
            let mut p = Painter::new(&mut canvas);
            small_red_wallpaper().paint(&mut p, area, Rect::from_size(area), None);
        }
        // No gradient band may show around a centred image
        for &px in canvas.pixels() {
            let (r, g, b, a) = crate::ui::drawing::unpack_argb(px);
            assert_eq!(a, 255);
            assert!(r >= 250 && g <= 5 && b <= 5, "{:08x}", px);
        }
    }

    #[test]
    fn test_cover_is_reused_only_for_its_area() {
        let background = small_red_wallpaper();
        let area = Size::new(4, 12);
        let cover = background.cover(area, 2).expect("wallpaper scales");
        assert_eq!(cover.logical_size(), area);
        assert_eq!(cover.width(), 8);

        let tiled = ChatBackground {
            tile: true,
            ..small_red_wallpaper()
        };
        assert!(tiled.cover(area, 1).is_none());

        // A cover built for another area is ignored, not stretched
        let mut canvas = Bitmap::new(Size::new(6, 18), 2);
        {
            let mut p = Painter::new(&mut canvas);
            let area = Size::new(6, 18);
            background.paint(&mut p, area, Rect::from_size(area), Some(&cover));
        }
        let (r, g, _, a) = crate::ui::drawing::unpack_argb(canvas.pixel(11, 35));
        assert_eq!(a, 255);
        assert!(r >= 250 && g <= 5);
    }
}
