// Scale constants and logical layout metrics
// Every value below is in logical pixels at 100% scale and goes through
// convert_scale() before use.

use super::geometry::{Margins, Point, Rect, Size};

pub const SCALE_MIN: i32 = 50;
pub const SCALE_DEFAULT: i32 = 100;
pub const SCALE_MAX: i32 = 300;

// Text
pub const FONT_SIZE: i32 = 13;
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

// Reply block (bar on the left, name above the quoted text)
pub const REPLY_BAR: Rect = Rect::new(1, 6, 2, 36);
pub const REPLY_TEXT_SKIP: i32 = 10; // Bar to text distance
pub const REPLY_PADDING_TOP: i32 = 6;
pub const REPLY_PADDING_BOTTOM: i32 = 6;

// Bubble
pub const BUBBLE_PADDING: Margins = Margins::new(13, 7, 13, 8);
pub const BUBBLE_MARGIN: Margins = Margins::new(20, 16, 20, 16);
pub const BUBBLE_RADIUS: i32 = 16;
pub const BUBBLE_SHADOW: i32 = 2;
pub const BUBBLE_TAIL: Size = Size::new(11, 15);

// Userpic
pub const USERPIC_SKIP: i32 = 40;
pub const USERPIC_SIZE: i32 = 33;

// Preview frame
pub const CANVAS_RADIUS: i32 = 6;
pub const SHADOW_EXTEND: Margins = Margins::new(9, 8, 9, 10);

/// Convert a logical value to the given scale percentage.
///
/// Rounds half away from zero after nudging down by 0.01 so values that land
/// exactly on .5 round towards the smaller size, and stays symmetric for
/// negative input.
pub fn convert_scale(value: i32, scale: i32) -> i32 {
    if value < 0 {
        return -convert_scale(-value, scale);
    }
    (value as f64 * scale as f64 / 100. - 0.01).round() as i32
}

/// Current scale factor and device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleState {
    /// Interface scale in percent; 0 means nothing has been laid out yet
    pub scale: i32,
    /// Physical pixels per logical pixel
    pub ratio: i32,
}

impl ScaleState {
    pub fn new(ratio: i32) -> Self {
        Self {
            scale: 0,
            ratio: ratio.max(1),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.scale > 0
    }

    pub fn scaled(&self, value: i32) -> i32 {
        convert_scale(value, self.scale)
    }

    pub fn scaled_point(&self, value: Point) -> Point {
        Point::new(self.scaled(value.x), self.scaled(value.y))
    }

    pub fn scaled_size(&self, value: Size) -> Size {
        Size::new(self.scaled(value.width), self.scaled(value.height))
    }

    pub fn scaled_rect(&self, value: Rect) -> Rect {
        Rect::from_parts(
            self.scaled_point(value.top_left()),
            self.scaled_size(value.size()),
        )
    }

    pub fn scaled_margins(&self, value: Margins) -> Margins {
        Margins::new(
            self.scaled(value.left),
            self.scaled(value.top),
            self.scaled(value.right),
            self.scaled(value.bottom),
        )
    }

    pub fn text_style(&self, font_size: i32) -> TextStyle {
        TextStyle::new(self.scaled(font_size))
    }

    /// Largest scale that still fits the top of the slider range at this ratio
    pub fn max_for_ratio(&self) -> i32 {
        SCALE_MAX / self.ratio
    }
}

/// Font size and line height in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub font_size: i32,
    pub line_height: i32,
}

impl TextStyle {
    pub fn new(font_size: i32) -> Self {
        Self {
            font_size,
            line_height: (font_size as f32 * LINE_HEIGHT_FACTOR).ceil() as i32,
        }
    }
}
