//! Layout invariants and placement clamping across the scale range

mod common;

use common::{default_anchor, harness, harness_with, userpic};
use scale_preview::config::{PreviewConfig, StrategyKind};
use scale_preview::ui::geometry::{Point, Rect, Size};
use scale_preview::ui::layout::ScaleLayout;
use scale_preview::ui::style::{SCALE_MAX, SCALE_MIN};
use scale_preview::ui::text_rasterizing::FixedAdvanceBackend;
use scale_preview::ScalePreviewShow::{Show, Update};

#[test]
fn test_containment_sweep_at_every_ratio() {
    let config = PreviewConfig::default();
    for ratio in [1, 2, 3] {
        for has_userpic in [false, true] {
            let mut layout = ScaleLayout::new(ratio);
            for scale in (SCALE_MIN..=SCALE_MAX).step_by(5) {
                layout.update_to_scale(scale, &config, has_userpic, &mut FixedAdvanceBackend);
                let b = layout.boxes();
                let outer = Rect::from_size(b.outer.size());
                let inner = Rect::from_size(b.inner.size());
                let bubble = Rect::from_size(b.bubble.size());
                let content = Rect::from_size(b.content.size());
                let nested = [
                    (outer, b.inner.margins_added(b.shadow_extend)),
                    (inner, b.bubble.margins_added(b.bubble_margin)),
                    (bubble, b.content.margins_added(b.bubble_padding)),
                    (content, b.message),
                    (content, b.reply_block()),
                ];
                for (parent, child) in nested {
                    assert!(
                        parent.contains_rect(&child),
                        "scale {} {:?} in {:?}",
                        scale,
                        child,
                        parent
                    );
                }
                if let Some(userpic) = b.userpic {
                    assert!(inner.contains_rect(&userpic), "scale {}", scale);
                }
            }
        }
    }
}

#[test]
fn test_same_scale_twice_changes_nothing() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.userpic_changed(Some(userpic()));
    h.preview.toggle(Show, 125, 500);
    h.paint();
    let boxes = *h.preview.layout().boxes();
    let layer = h.preview.compositor().layer().clone();
    let builds = (
        h.preview.compositor().bubble_cache().builds(),
        h.preview.compositor().shadow_cache().builds(),
        h.preview.compositor().userpic_cache().builds(),
    );

    h.preview.toggle(Update, 125, 500);
    assert_eq!(*h.preview.layout().boxes(), boxes);
    assert_eq!(*h.preview.compositor().layer(), layer);
    h.paint();
    assert_eq!(
        (
            h.preview.compositor().bubble_cache().builds(),
            h.preview.compositor().shadow_cache().builds(),
            h.preview.compositor().userpic_cache().builds(),
        ),
        builds
    );
}

#[test]
fn test_scale_change_invalidates_all_caches() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.userpic_changed(Some(userpic()));
    h.preview.toggle(Show, 100, 500);
    h.paint();
    h.preview.toggle(Update, 175, 500);
    let caches = h.preview.compositor();
    assert!(!caches.bubble_cache().is_valid());
    assert!(!caches.shadow_cache().is_valid());
    assert!(!caches.userpic_cache().is_valid());
    let outer = h.preview.layout().boxes().outer.size();
    assert_eq!(caches.layer().logical_size(), outer);
}

#[test]
fn test_offscreen_layers_are_device_sized() {
    let mut h = harness_with(StrategyKind::Embedded, default_anchor(), 2);
    h.preview.toggle(Show, 150, 500);
    let boxes = *h.preview.layout().boxes();
    let layer = h.preview.compositor().layer();
    let canvas = h.preview.compositor().canvas();
    assert_eq!(layer.width() as i32, boxes.outer.width * 2);
    assert_eq!(layer.height() as i32, boxes.outer.height * 2);
    assert_eq!(canvas.width() as i32, boxes.inner.width * 2);
    assert_eq!(canvas.ratio(), 2);
}

#[test]
fn test_window_probe_spans_scale_range() {
    let h = harness(StrategyKind::Window);
    let config = PreviewConfig::default();
    let mut layout = ScaleLayout::new(1);
    layout.update_to_scale(SCALE_MIN, &config, false, &mut FixedAdvanceBackend);
    let min = layout.boxes().outer.size();
    layout.update_to_scale(SCALE_MAX, &config, false, &mut FixedAdvanceBackend);
    let max = layout.boxes().outer.size();
    assert!(max.width > min.width && max.height > min.height);
    // Construction leaves the layout at the largest probe
    assert_eq!(h.preview.layout().boxes().outer.size(), max);
}

#[test]
fn test_window_clamped_near_right_monitor_edge() {
    let mut anchor = default_anchor();
    anchor.global = Point::new(1700, 900);
    anchor.size = Size::new(200, 20);
    let screen = Rect::new(0, 0, 1920, 1080);
    anchor.screen = Some(screen);
    let mut h = harness_with(StrategyKind::Window, anchor, 1);
    h.preview.toggle(Show, 300, 1890);
    let surface = h.surface.borrow().geometry;
    assert!(surface.left() >= screen.left(), "{:?}", surface);
    assert!(surface.right() <= screen.right(), "{:?}", surface);
}

#[test]
fn test_window_clamped_on_monitor_exactly_max_wide() {
    let config = PreviewConfig::default();
    let mut layout = ScaleLayout::new(1);
    layout.update_to_scale(SCALE_MAX, &config, false, &mut FixedAdvanceBackend);
    let max = layout.boxes().outer.size();

    let mut anchor = default_anchor();
    let screen = Rect::new(2560, 0, max.width, 1080);
    anchor.global = Point::new(2600, 900);
    anchor.size = Size::new(max.width - 80, 20);
    anchor.screen = Some(screen);
    let mut h = harness_with(StrategyKind::Window, anchor, 1);
    h.preview.toggle(Show, 200, 2700);
    let surface = h.surface.borrow().geometry;
    assert!(screen.contains_rect(&Rect::new(surface.x, 0, surface.width, 1)), "{:?}", surface);
}

#[test]
fn test_zero_sized_anchor_degrades_quietly() {
    let mut anchor = default_anchor();
    anchor.size = Size::new(0, 0);
    anchor.screen = None;
    let mut h = harness_with(StrategyKind::Embedded, anchor, 1);
    h.preview.toggle(Show, 100, 0);
    let surface = h.surface.borrow().geometry;
    assert_eq!(surface.x, 40);
    assert_eq!(surface.size(), h.preview.layout().boxes().outer.size());
}
