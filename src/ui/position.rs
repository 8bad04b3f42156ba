//! Where the preview surface goes and where the outer box sits inside it
//!
//! Two strategies exist. The embedded one makes the surface exactly the outer
//! box and parks it above the anchor inside the anchor's top-level
//! container. The window one sizes a separate top-level surface once, for the
//! largest preview, and slides the current outer box inside it.

use super::geometry::{Point, Rect, Size};
use crate::config::StrategyKind;
use crate::platform::{AnchorWidget, WatchScope};

/// Result of a placement: surface geometry plus the outer box origin in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub surface: Rect,
    pub outer_origin: Point,
}

pub trait Placement {
    fn kind(&self) -> StrategyKind;

    fn watch_scope(&self) -> WatchScope;

    /// Place for an explicit request tracking `global_x`
    fn place(&mut self, anchor: &dyn AnchorWidget, outer: Size, global_x: i32) -> Placed;

    /// Place again after the anchor or one of its ancestors changed
    fn reposition(&mut self, anchor: &dyn AnchorWidget, outer: Size) -> Placed;

    /// New smallest and largest outer sizes; only a fixed-size surface cares
    fn set_outer_range(&mut self, _min_outer: Size, _max_outer: Size) {}
}

/// Surface lives inside the anchor's top-level container
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedPlacement;

impl EmbeddedPlacement {
    fn compute(anchor: &dyn AnchorWidget, outer: Size) -> Placed {
        let width = anchor.size().width;
        let desired = width / 2 - outer.width / 2;
        let left = desired.min(width - outer.width).max(0);
        let position = anchor.local_position() + Point::new(left, -outer.height);
        Placed {
            surface: Rect::from_parts(position, outer),
            outer_origin: Point::default(),
        }
    }
}

impl Placement for EmbeddedPlacement {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embedded
    }

    fn watch_scope(&self) -> WatchScope {
        WatchScope::UpToTopLevel
    }

    fn place(&mut self, anchor: &dyn AnchorWidget, outer: Size, _global_x: i32) -> Placed {
        Self::compute(anchor, outer)
    }

    fn reposition(&mut self, anchor: &dyn AnchorWidget, outer: Size) -> Placed {
        Self::compute(anchor, outer)
    }
}

/// Separate top-level surface sized for the whole scale range
#[derive(Debug, Clone, Copy)]
pub struct WindowPlacement {
    min_outer: Size,
    max_outer: Size,
    local_shift_left: i32,
}

impl WindowPlacement {
    pub fn new(min_outer: Size, max_outer: Size) -> Self {
        Self {
            min_outer,
            max_outer,
            local_shift_left: 0,
        }
    }

    pub fn min_outer(&self) -> Size {
        self.min_outer
    }

    pub fn max_outer(&self) -> Size {
        self.max_outer
    }

    /// Last requested x relative to the anchor's left edge
    pub fn local_shift_left(&self) -> i32 {
        self.local_shift_left
    }

    fn compute(&self, anchor: &dyn AnchorWidget, outer: Size, global_x: i32) -> Placed {
        let window = window_rect(
            anchor.global_position(),
            anchor.size().width,
            self.min_outer,
            self.max_outer,
        );
        let window = adjust_by_screen_geometry(window, anchor.screen_geometry(), self.max_outer);
        Placed {
            surface: window,
            outer_origin: outer_origin_in_window(window, outer, global_x, self.max_outer),
        }
    }
}

impl Placement for WindowPlacement {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Window
    }

    fn watch_scope(&self) -> WatchScope {
        WatchScope::AllAncestors
    }

    fn place(&mut self, anchor: &dyn AnchorWidget, outer: Size, global_x: i32) -> Placed {
        self.local_shift_left = global_x - anchor.global_position().x;
        self.compute(anchor, outer, global_x)
    }

    fn reposition(&mut self, anchor: &dyn AnchorWidget, outer: Size) -> Placed {
        let global_x = anchor.global_position().x + self.local_shift_left;
        self.compute(anchor, outer, global_x)
    }

    fn set_outer_range(&mut self, min_outer: Size, max_outer: Size) {
        self.min_outer = min_outer;
        self.max_outer = max_outer;
    }
}

/// Unclamped window geometry around an anchor at `global`
///
/// The window reaches half the smallest preview past the anchor's left edge
/// and half the largest past its right edge, and is at least as wide as the
/// largest preview.
pub fn window_rect(global: Point, anchor_width: i32, min_outer: Size, max_outer: Size) -> Rect {
    let desired_left = global.x - min_outer.width / 2;
    let desired_right = global.x + anchor_width + max_outer.width / 2;
    let required_left = desired_right - max_outer.width;
    let left = desired_left.min(required_left);
    let required_right = left + max_outer.width;
    let right = desired_right.max(required_right);
    let top = global.y - max_outer.height;
    Rect::new(left, top, right - left, max_outer.height)
}

/// Pull `geometry` horizontally inside the monitor's available area
///
/// Left untouched when there is no monitor, the monitor does not intersect
/// the geometry, or it is too small to hold the largest preview.
pub fn adjust_by_screen_geometry(geometry: Rect, screen: Option<Rect>, max_outer: Size) -> Rect {
    let Some(screen) = screen else {
        log::debug!("scale preview: no screen for anchor, placement not clamped");
        return geometry;
    };
    if !screen.intersects(&geometry)
        || screen.width < max_outer.width
        || screen.height < max_outer.height
    {
        return geometry;
    }
    let edge_left = screen.left();
    let edge_right = screen.right();
    let edged_right = edge_right.min(geometry.right());
    let left = geometry.x.min(edged_right - max_outer.width).max(edge_left);
    let right = edged_right.max(left + max_outer.width);
    Rect::new(left, geometry.y, right - left, geometry.height)
}

/// Outer box origin inside `window`, centred on `global_x` and bottom-pinned
pub fn outer_origin_in_window(window: Rect, outer: Size, global_x: i32, max_outer: Size) -> Point {
    let desired_left = global_x - outer.width / 2 - window.x;
    let left = desired_left.min(window.width - outer.width).max(0);
    Point::new(left, max_outer.height - outer.height)
}
