//! Scale-dependent layout of the chat bubble mockup
//!
//! Boxes nest as message ⊂ content ⊂ bubble ⊂ inner ⊂ outer and every box is
//! stored relative to its parent's origin:
//!
//! | box                                | coordinate space |
//! |------------------------------------|------------------|
//! | `reply_bar`, `name`, `reply`, `message` | content     |
//! | `content`                          | bubble           |
//! | `bubble`, `userpic`                | inner            |
//! | `inner`                            | outer            |
//! | `outer`                            | preview surface  |
//!
//! Layout runs in two passes: sizes grow outward from the text, then each
//! child is placed at its parent's leading margin. Offsets are therefore
//! never negative.

use super::geometry::{Margins, Point, Rect, Size};
use super::style::{self, ScaleState, TextStyle};
use super::text_rasterizing::{FontBackend, TextBlock};
use crate::config::PreviewConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutBoxes {
    pub reply_bar: Rect,
    pub name: Rect,
    pub reply: Rect,
    pub message: Rect,
    pub content: Rect,
    pub bubble: Rect,
    pub userpic: Option<Rect>,
    pub inner: Rect,
    pub outer: Rect,

    pub bubble_padding: Margins,
    pub bubble_margin: Margins,
    pub shadow_extend: Margins,
    pub bubble_shadow: i32,
    pub bubble_radius: i32,
    pub canvas_radius: i32,
}

impl LayoutBoxes {
    /// Rect covering the reply bar, name and quoted text (content space)
    pub fn reply_block(&self) -> Rect {
        self.reply_bar.united(&self.name).united(&self.reply)
    }
}

/// The three shaped strings of the mockup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRuns {
    pub name: TextBlock,
    pub reply: TextBlock,
    pub message: TextBlock,
}

impl TextRuns {
    pub fn name_style(&self) -> &TextStyle {
        self.name.style()
    }

    pub fn text_style(&self) -> &TextStyle {
        self.message.style()
    }
}

#[inline]
fn grown(size: Size, margins: Margins) -> Size {
    Size::new(
        size.width + margins.horizontal(),
        size.height + margins.vertical(),
    )
}

/// Lay out every box and shape the texts for `state.scale`
pub fn compute(
    state: &ScaleState,
    config: &PreviewConfig,
    has_userpic: bool,
    backend: &mut dyn FontBackend,
) -> (LayoutBoxes, TextRuns) {
    let name_style = state.text_style(style::FONT_SIZE);
    let text_style = state.text_style(style::FONT_SIZE);
    let texts = TextRuns {
        name: TextBlock::new(&config.name_text, name_style, backend),
        reply: TextBlock::new(&config.reply_text, text_style, backend),
        message: TextBlock::new(&config.message_text, text_style, backend),
    };

    // Pass 1: sizes, innermost first
    let reply_bar = state.scaled_rect(style::REPLY_BAR);
    let text_skip = state.scaled(style::REPLY_TEXT_SKIP);
    let name_position = Point::new(text_skip, state.scaled(style::REPLY_PADDING_TOP));
    let reply_position = Point::new(
        text_skip,
        state.scaled(style::REPLY_PADDING_TOP) + name_style.line_height,
    );

    let wanted_width = (name_position.x + texts.name.natural_width())
        .max(reply_position.x + texts.reply.natural_width())
        .max(texts.message.natural_width());
    let min_text_width = state.scaled(config.min_text_width);
    let max_text_width = state.scaled(config.max_text_width).max(min_text_width);
    let message_width = wanted_width.clamp(min_text_width, max_text_width);
    let message_height = texts
        .message
        .count_height(message_width, backend)
        .min(config.max_text_lines as i32 * text_style.line_height);

    let reply_skip = reply_bar.bottom() + state.scaled(style::REPLY_PADDING_BOTTOM);
    let content_size = Size::new(message_width, reply_skip + message_height);

    let bubble_padding = state.scaled_margins(style::BUBBLE_PADDING);
    let bubble_size = grown(content_size, bubble_padding);

    let bubble_margin = state.scaled_margins(style::BUBBLE_MARGIN);
    // No userpic means no reserved column at all
    let userpic_skip = if has_userpic {
        state.scaled(style::USERPIC_SKIP)
    } else {
        0
    };
    let inner_margins = bubble_margin + Margins::new(userpic_skip, 0, 0, 0);
    let inner_size = grown(bubble_size, inner_margins);

    let shadow_extend = state.scaled_margins(style::SHADOW_EXTEND);
    let outer_size = grown(inner_size, shadow_extend);

    // Pass 2: offsets, each child at its parent's leading margin
    let name = Rect::from_parts(
        name_position,
        Size::new(message_width - name_position.x, name_style.line_height),
    );
    let reply = Rect::from_parts(
        reply_position,
        Size::new(message_width - reply_position.x, text_style.line_height),
    );
    let message = Rect::new(0, reply_skip, message_width, message_height);
    let content = Rect::from_parts(bubble_padding.top_left(), content_size);
    let bubble = Rect::from_parts(inner_margins.top_left(), bubble_size);
    let userpic = has_userpic.then(|| {
        let size = state.scaled(style::USERPIC_SIZE);
        Rect::new(bubble_margin.left, bubble.bottom() - size, size, size)
    });
    let inner = Rect::from_parts(shadow_extend.top_left(), inner_size);
    let outer = Rect::from_size(outer_size);

    let boxes = LayoutBoxes {
        reply_bar,
        name,
        reply,
        message,
        content,
        bubble,
        userpic,
        inner,
        outer,
        bubble_padding,
        bubble_margin,
        shadow_extend,
        bubble_shadow: state.scaled(style::BUBBLE_SHADOW),
        bubble_radius: state.scaled(style::BUBBLE_RADIUS),
        canvas_radius: state.scaled(style::CANVAS_RADIUS),
    };
    (boxes, texts)
}

/// Geometry engine state: the boxes and texts for the current scale
pub struct ScaleLayout {
    state: ScaleState,
    boxes: LayoutBoxes,
    texts: Option<TextRuns>,
    has_userpic: bool,
}

impl ScaleLayout {
    pub fn new(ratio: i32) -> Self {
        Self {
            state: ScaleState::new(ratio),
            boxes: LayoutBoxes::default(),
            texts: None,
            has_userpic: false,
        }
    }

    pub fn state(&self) -> &ScaleState {
        &self.state
    }

    pub fn boxes(&self) -> &LayoutBoxes {
        &self.boxes
    }

    pub fn boxes_mut(&mut self) -> &mut LayoutBoxes {
        &mut self.boxes
    }

    pub fn texts(&self) -> Option<&TextRuns> {
        self.texts.as_ref()
    }

    pub fn has_userpic(&self) -> bool {
        self.has_userpic
    }

    /// Recompute for `scale`; returns false (and touches nothing) when the
    /// layout already matches. A change in userpic presence also counts as a
    /// mismatch since it moves the bubble.
    pub fn update_to_scale(
        &mut self,
        scale: i32,
        config: &PreviewConfig,
        has_userpic: bool,
        backend: &mut dyn FontBackend,
    ) -> bool {
        if self.state.scale == scale && self.has_userpic == has_userpic {
            return false;
        }
        self.state.scale = scale;
        self.has_userpic = has_userpic;
        // The surface position of `outer` belongs to the placement, keep it
        let origin = self.boxes.outer.top_left();
        let (mut boxes, texts) = compute(&self.state, config, has_userpic, backend);
        boxes.outer = boxes.outer.moved_to(origin);
        self.boxes = boxes;
        self.texts = Some(texts);
        log::debug!(
            "scale preview layout: scale={} outer={}x{}",
            scale,
            self.boxes.outer.width,
            self.boxes.outer.height
        );
        true
    }
}
