//! Lazily built decoration pixmaps
//!
//! Each family is an `Option` that is filled on first paint after an
//! invalidation. `builds` counts how many times a family has been rebuilt so
//! callers (and tests) can tell a cache hit from a rebuild.

use image::RgbaImage;

use super::drawing::Bitmap;
use super::geometry::Size;
use super::images::{self, CornerPixmaps, ShadowParts, BOTTOM_LEFT, BOTTOM_RIGHT};
use super::layout::LayoutBoxes;
use super::style::{self, ScaleState};
use super::theme::{self, Palette};

/// Circular userpic at the current scale
#[derive(Debug, Default)]
pub struct UserpicCache {
    image: Option<Bitmap>,
    builds: usize,
}

impl UserpicCache {
    pub fn invalidate(&mut self) {
        self.image = None;
    }

    pub fn is_valid(&self) -> bool {
        self.image.is_some()
    }

    pub fn builds(&self) -> usize {
        self.builds
    }

    /// Prepared userpic, building it from `source` if needed
    ///
    /// A source that cannot be scaled leaves the slot empty (nothing is drawn)
    /// rather than failing the paint.
    pub fn ensure(&mut self, source: &RgbaImage, size: Size, ratio: i32) -> Option<&Bitmap> {
        if self.image.is_none() {
            self.builds += 1;
            match images::scale_smooth(source, size.device(ratio), ratio) {
                Ok(scaled) => self.image = Some(images::circle(scaled)),
                Err(e) => {
                    log::warn!("scale preview: userpic not prepared: {}", e);
                    self.image = Some(Bitmap::default());
                }
            }
        }
        self.image.as_ref().filter(|image| !image.is_null())
    }
}

/// Bubble corners, tail and the corner of the thin bubble shadow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleParts {
    /// Bottom-left is `None`: that corner is square and carries the tail
    pub corners: CornerPixmaps,
    pub tail: Bitmap,
    pub shadow_corner: Bitmap,
}

#[derive(Debug, Default)]
pub struct BubbleCache {
    parts: Option<BubbleParts>,
    builds: usize,
}

impl BubbleCache {
    pub fn invalidate(&mut self) {
        self.parts = None;
    }

    pub fn is_valid(&self) -> bool {
        self.parts.is_some()
    }

    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn ensure(
        &mut self,
        state: &ScaleState,
        boxes: &LayoutBoxes,
        palette: &Palette,
    ) -> &BubbleParts {
        let builds = &mut self.builds;
        self.parts.get_or_insert_with(|| {
            *builds += 1;
            let ratio = state.ratio;
            let mut corners = images::corner_pixmaps(boxes.bubble_radius, palette.bubble_bg, ratio);
            corners[BOTTOM_LEFT] = None;
            let mut shadow =
                images::corner_pixmaps(boxes.bubble_radius, palette.bubble_shadow, ratio);
            BubbleParts {
                corners,
                tail: images::bubble_tail(
                    state.scaled_size(style::BUBBLE_TAIL),
                    palette.bubble_bg,
                    ratio,
                ),
                shadow_corner: shadow[BOTTOM_RIGHT].take().unwrap_or_default(),
            }
        })
    }

    pub fn parts(&self) -> Option<&BubbleParts> {
        self.parts.as_ref()
    }
}

/// Window-style drop shadow around the inner canvas
#[derive(Debug, Default)]
pub struct ShadowCache {
    parts: Option<ShadowParts>,
    builds: usize,
}

impl ShadowCache {
    pub fn invalidate(&mut self) {
        self.parts = None;
    }

    pub fn is_valid(&self) -> bool {
        self.parts.is_some()
    }

    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn ensure(&mut self, boxes: &LayoutBoxes, palette: &Palette, ratio: i32) -> &ShadowParts {
        let builds = &mut self.builds;
        self.parts.get_or_insert_with(|| {
            *builds += 1;
            images::shadow_parts(
                boxes.shadow_extend,
                palette.window_shadow,
                theme::WINDOW_SHADOW_ALPHA,
                ratio,
            )
        })
    }
}
