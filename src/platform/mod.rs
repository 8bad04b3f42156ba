//! Windowing collaborators
//!
//! The preview never talks to a toolkit directly. Hosts implement these
//! traits over whatever windowing layer they run on (the demo binary does it
//! over winit), and tests implement them with recording fakes.

use crate::ui::geometry::{Point, Rect, Size};

/// The widget the preview is attached to (the scale slider)
pub trait AnchorWidget {
    /// Top-left corner in global (screen) coordinates
    fn global_position(&self) -> Point;

    fn size(&self) -> Size;

    /// Top-left corner relative to the top-level container
    fn local_position(&self) -> Point;

    /// Available geometry of the monitor showing the anchor, if known
    fn screen_geometry(&self) -> Option<Rect>;

    fn global_rect(&self) -> Rect {
        Rect::from_parts(self.global_position(), self.size())
    }
}

/// Overlay the preview paints into
///
/// Geometry is in the coordinate space of the active placement: anchor-local
/// for the embedded strategy, global for the separate-window strategy.
pub trait PreviewSurface {
    fn set_geometry(&mut self, rect: Rect);

    fn geometry(&self) -> Rect;

    fn show(&mut self);

    fn hide(&mut self);

    fn is_hidden(&self) -> bool;

    /// Schedule a repaint of `rect` (surface-local)
    fn update(&mut self, rect: Rect);

    /// Put the surface back on top of its siblings
    fn raise_overlay(&mut self) {}
}

/// Which ancestors of the anchor to observe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    /// Stop below the top-level window
    UpToTopLevel,
    /// Every ancestor including the top-level window
    AllAncestors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorEvent {
    Move,
    Resize,
    Show,
    ZOrderChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationState {
    Active,
    Inactive,
}

/// Live event subscription; dropping it unsubscribes
pub trait Subscription {}

/// Installs anchor/ancestor event observation
///
/// Events are delivered by the host to [`crate::ui::preview::ScalePreview`]
/// through `handle_anchor_event` and `handle_application_state`; the
/// subscription only controls whether the host should bother.
pub trait EventSubscriber {
    fn subscribe(&mut self, scope: WatchScope) -> Box<dyn Subscription>;
}

/// Platform features relevant to choosing the placement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub translucent_windows: bool,
    pub wayland: bool,
}

impl Capabilities {
    /// Probe the running session
    pub fn detect() -> Self {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some()
            || std::env::var("XDG_SESSION_TYPE")
                .map(|session| session.eq_ignore_ascii_case("wayland"))
                .unwrap_or(false);
        Self {
            translucent_windows: cfg!(any(
                target_os = "windows",
                target_os = "macos",
                target_os = "linux"
            )),
            wayland,
        }
    }

    /// Wayland compositors do not let clients position borderless overlays
    pub fn use_separate_window(&self) -> bool {
        self.translucent_windows && !self.wayland
    }
}
