//! Preview configuration

use std::time::Duration;

/// Which positioning strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Child of the anchor's top-level container
    Embedded,
    /// Separate translucent top-level surface
    Window,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub name_text: String,
    pub reply_text: String,
    pub message_text: String,
    /// Logical width bounds for the message column (scaled before use)
    pub min_text_width: i32,
    pub max_text_width: i32,
    pub max_text_lines: usize,
    pub show_duration: Duration,
    pub reply_bar_opacity: f32,
    /// Overrides the platform capability probe when set
    pub strategy: Option<StrategyKind>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            name_text: "Bob Harris".to_string(),
            reply_text: "Good morning!".to_string(),
            message_text: "Do you know what time it is?".to_string(),
            min_text_width: 120,
            max_text_width: 320,
            max_text_lines: 3,
            show_duration: Duration::from_millis(150),
            reply_bar_opacity: 1.,
            strategy: None,
        }
    }
}
