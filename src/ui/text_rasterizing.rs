use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};

use super::drawing::Painter;
use super::geometry::Point;
use super::style::TextStyle;

pub const ELLIPSIS: &str = "\u{2026}";

/// Text shaping backend
///
/// Measures single-line advances in logical pixels and rasterises a line
/// as glyph coverage in device pixels, relative to the line's top-left.
pub trait FontBackend {
    fn advance(&mut self, text: &str, style: &TextStyle) -> i32;

    fn rasterize(
        &mut self,
        text: &str,
        style: &TextStyle,
        ratio: i32,
        coverage: &mut dyn FnMut(i32, i32, u8),
    );
}

/// cosmic-text shaper over the system font database
pub struct TextRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
    weight: u16,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
            family: None,
            weight: 400,
        }
    }

    /// Prefer a named family (falls back to the default sans-serif)
    pub fn with_family(mut self, family: &str, weight: u16) -> Self {
        self.family = Some(family.to_string());
        self.weight = weight;
        self
    }

    /// Register extra font data, e.g. an embedded UI font
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.font_system.db_mut().load_font_data(data);
    }

    fn shape(&mut self, text: &str, size: f32, line_height: f32) -> Buffer {
        let family = match &self.family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        };
        let attrs = Attrs::new().family(family).weight(Weight(self.weight));

        let metrics = Metrics::new(size, line_height);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);

        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBackend for TextRenderer {
    fn advance(&mut self, text: &str, style: &TextStyle) -> i32 {
        if text.is_empty() {
            return 0;
        }
        let buffer = self.shape(text, style.font_size as f32, style.line_height as f32);
        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0f32, f32::max);
        width.ceil() as i32
    }

    fn rasterize(
        &mut self,
        text: &str,
        style: &TextStyle,
        ratio: i32,
        coverage: &mut dyn FnMut(i32, i32, u8),
    ) {
        if text.is_empty() {
            return;
        }
        let ratio = ratio as f32;
        let mut buffer = self.shape(
            text,
            style.font_size as f32 * ratio,
            style.line_height as f32 * ratio,
        );
        // Colour is applied by the painter, only the alpha channel matters here
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            Color::rgba(0xFF, 0xFF, 0xFF, 0xFF),
            |x, y, w, h, colour| {
                let alpha = colour.a();
                if alpha == 0 {
                    return;
                }
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        coverage(x + dx, y + dy, alpha);
                    }
                }
            },
        );
    }
}

/// Deterministic monospace backend: every character advances by half the
/// font size (rounded up) and is drawn as a solid cell.
///
/// Needs no fonts, so it is what headless rendering and tests use.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAdvanceBackend;

impl FixedAdvanceBackend {
    pub fn char_width(style: &TextStyle) -> i32 {
        (style.font_size + 1) / 2
    }
}

impl FontBackend for FixedAdvanceBackend {
    fn advance(&mut self, text: &str, style: &TextStyle) -> i32 {
        text.chars().count() as i32 * Self::char_width(style)
    }

    fn rasterize(
        &mut self,
        text: &str,
        style: &TextStyle,
        ratio: i32,
        coverage: &mut dyn FnMut(i32, i32, u8),
    ) {
        let cell = Self::char_width(style) * ratio;
        let top = (style.line_height - style.font_size) / 2 * ratio;
        let height = style.font_size * ratio;
        for (index, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = index as i32 * cell;
            for y in top..top + height {
                for x in left..left + cell - ratio {
                    coverage(x, y, 0xFF);
                }
            }
        }
    }
}

/// A shaped paragraph bound to a style
///
/// Keeps the single-line (natural) width from when the text was set; line
/// breaking and elision are computed against the backend on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    text: String,
    style: TextStyle,
    natural_width: i32,
}

impl TextBlock {
    pub fn new(text: &str, style: TextStyle, backend: &mut dyn FontBackend) -> Self {
        let natural_width = text
            .split('\n')
            .map(|paragraph| backend.advance(paragraph, &style))
            .max()
            .unwrap_or(0);
        Self {
            text: text.to_string(),
            style,
            natural_width,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Width of the widest paragraph without wrapping
    pub fn natural_width(&self) -> i32 {
        self.natural_width
    }

    pub fn count_height(&self, width: i32, backend: &mut dyn FontBackend) -> i32 {
        wrap(&self.text, width, &self.style, backend).len() as i32 * self.style.line_height
    }

    /// Lines as they would be drawn at `width`, at most `max_lines` of them
    ///
    /// When the text does not fit, the last kept line absorbs the rest of
    /// the text and is cut with a trailing ellipsis.
    pub fn lines(
        &self,
        width: i32,
        max_lines: usize,
        backend: &mut dyn FontBackend,
    ) -> Vec<String> {
        if self.text.trim().is_empty() || max_lines == 0 {
            return Vec::new();
        }
        let style = &self.style;
        if max_lines == 1 {
            let single = self.text.split_whitespace().collect::<Vec<_>>().join(" ");
            if backend.advance(&single, style) <= width {
                return vec![single];
            }
            return vec![elide(&single, width, style, backend)];
        }
        let wrapped = wrap(&self.text, width, style, backend);
        if wrapped.len() <= max_lines {
            return wrapped;
        }
        let mut lines = wrapped[..max_lines - 1].to_vec();
        let rest = wrapped[max_lines - 1..].join(" ");
        lines.push(elide(&rest, width, style, backend));
        lines
    }

    pub fn draw_left_elided(
        &self,
        p: &mut Painter<'_>,
        backend: &mut dyn FontBackend,
        position: Point,
        width: i32,
        max_lines: usize,
        colour: u32,
    ) {
        let ratio = p.ratio();
        for (index, line) in self.lines(width, max_lines, backend).iter().enumerate() {
            let at = position + Point::new(0, index as i32 * self.style.line_height);
            backend.rasterize(line, &self.style, ratio, &mut |dx, dy, coverage| {
                p.blend_coverage(at, dx, dy, colour, coverage);
            });
        }
    }
}

/// Greedy word wrap; words wider than `width` are broken between characters
fn wrap(text: &str, width: i32, style: &TextStyle, backend: &mut dyn FontBackend) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if backend.advance(&candidate, style) <= width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if backend.advance(word, style) <= width {
                current = word.to_string();
                continue;
            }
            // Every line keeps at least one character so narrow widths still progress
            for ch in word.chars() {
                current.push(ch);
                if current.chars().count() > 1 && backend.advance(&current, style) > width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Longest prefix of `text` that fits `width` together with an ellipsis
fn elide(text: &str, width: i32, style: &TextStyle, backend: &mut dyn FontBackend) -> String {
    let chars: Vec<char> = text.chars().collect();
    let candidate = |count: usize| {
        let prefix: String = chars[..count].iter().collect();
        format!("{}{}", prefix.trim_end(), ELLIPSIS)
    };
    // Binary search for the largest prefix length that still fits
    let (mut low, mut high) = (0usize, chars.len());
    while low < high {
        let middle = (low + high + 1) / 2;
        if backend.advance(&candidate(middle), style) <= width {
            low = middle;
        } else {
            high = middle - 1;
        }
    }
    candidate(low)
}
