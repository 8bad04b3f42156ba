//! Show/update/hide behaviour of the scale preview driven through fakes

mod common;

use std::time::Duration;

use common::{default_anchor, harness, harness_seeded, harness_with, userpic, Harness};
use scale_preview::config::StrategyKind;
use scale_preview::platform::{AnchorEvent, ApplicationState, WatchScope};
use scale_preview::ui::geometry::{Point, Rect};
use scale_preview::ScalePreviewShow::{Hide, Show, Update};

const HALF: Duration = Duration::from_millis(75);
const FULL: Duration = Duration::from_millis(150);

fn assert_surface_holds_outer(h: &Harness) {
    let surface = h.surface.borrow().geometry;
    let outer = h.preview.layout().boxes().outer;
    assert!(
        Rect::from_size(surface.size()).contains_rect(&outer),
        "scale {} outer {:?} surface {:?}",
        h.preview.layout().state().scale,
        outer,
        surface
    );
    assert_eq!(outer.bottom(), surface.height);
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_show_update_hide_scenario() {
    let mut h = harness(StrategyKind::Embedded);

    h.preview.toggle(Show, 100, 500);
    assert_eq!(h.preview.layout().state().scale, 100);
    assert!(h.preview.is_shown());
    assert!(!h.surface.borrow().hidden);
    assert_eq!(h.surface.borrow().shows, 1);
    assert!(h.preview.is_animating());
    assert_eq!(h.preview.progress(), 0.);

    h.clock.advance(HALF);
    let midway = h.preview.progress();
    assert!(close(midway, 0.5), "progress {}", midway);

    h.preview.toggle(Update, 150, 500);
    assert_eq!(h.preview.layout().state().scale, 150);
    // Still the same animation, not restarted from zero
    assert!(close(h.preview.progress(), midway));
    assert_eq!(h.surface.borrow().shows, 1);

    h.clock.advance(FULL);
    assert_eq!(h.preview.progress(), 1.);
    assert!(!h.preview.animation_frame());

    h.preview.toggle(Hide, 150, 500);
    assert!(!h.preview.is_shown());
    assert!(h.preview.is_animating());
    assert!(h.preview.animation_frame());
    assert!(!h.surface.borrow().hidden);

    h.clock.advance(FULL);
    assert_eq!(h.preview.progress(), 0.);
    assert!(!h.preview.animation_frame());
    assert!(h.surface.borrow().hidden);
    assert_eq!(h.surface.borrow().hides, 1);
}

#[test]
fn test_update_while_hidden_is_ignored() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Update, 150, 500);
    assert!(!h.preview.layout().state().is_initialized());
    assert!(h.surface.borrow().hidden);
    assert_eq!(h.surface.borrow().shows, 0);
    assert_eq!(h.active.get(), 0);
}

#[test]
fn test_hide_while_hidden_is_ignored() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Hide, 100, 500);
    assert!(!h.preview.is_animating());
    assert_eq!(h.surface.borrow().hides, 0);
    assert!(h.surface.borrow().updates.is_empty());
}

#[test]
fn test_reversing_mid_flight_continues_from_progress() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    h.clock.advance(HALF);
    h.preview.toggle(Hide, 100, 500);
    assert!(close(h.preview.progress(), 0.5));
    // Heading back over the full duration, from where it was
    h.clock.advance(HALF);
    assert!(close(h.preview.progress(), 0.25));
    assert!(h.preview.animation_frame());
    assert!(!h.surface.borrow().hidden);
    h.clock.advance(HALF);
    assert_eq!(h.preview.progress(), 0.);
    assert!(!h.preview.animation_frame());
    assert!(h.surface.borrow().hidden);
}

#[test]
fn test_subscription_lives_only_while_shown() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    assert_eq!(h.active.get(), 1);
    h.preview.toggle(Update, 120, 520);
    assert_eq!(h.active.get(), 1);
    assert_eq!(h.scopes.borrow().len(), 1);

    h.preview.toggle(Hide, 120, 520);
    assert_eq!(h.active.get(), 0);
    assert!(!h.preview.is_subscribed());
}

#[test]
fn test_watch_scope_follows_strategy() {
    let mut embedded = harness(StrategyKind::Embedded);
    embedded.preview.toggle(Show, 100, 500);
    assert_eq!(*embedded.scopes.borrow(), vec![WatchScope::UpToTopLevel]);

    let mut window = harness(StrategyKind::Window);
    window.preview.toggle(Show, 100, 500);
    assert_eq!(*window.scopes.borrow(), vec![WatchScope::AllAncestors]);
}

#[test]
fn test_deactivation_forces_hide() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    h.clock.advance(FULL);

    h.preview.handle_application_state(ApplicationState::Active);
    assert!(h.preview.is_shown());

    h.preview.handle_application_state(ApplicationState::Inactive);
    assert!(!h.preview.is_shown());
    assert!(h.preview.is_animating());
    assert_eq!(h.active.get(), 0);
}

#[test]
fn test_overlay_raised_only_when_shown_from_hidden() {
    let mut h = harness(StrategyKind::Window);
    h.preview.toggle(Show, 100, 500);
    h.preview.toggle(Update, 110, 510);
    h.preview.toggle(Show, 120, 520);
    assert_eq!(h.surface.borrow().raises, 1);
}

#[test]
fn test_anchor_move_repositions_window_while_shown() {
    let mut anchor = default_anchor();
    anchor.screen = None;
    let mut h = harness_with(StrategyKind::Window, anchor, 1);
    h.preview.toggle(Show, 100, 550);
    let before = h.surface.borrow().geometry;
    let outer_before = h.preview.layout().boxes().outer;

    h.anchor.borrow_mut().global = Point::new(500, 650);
    h.preview.handle_anchor_event(AnchorEvent::Move);
    let after = h.surface.borrow().geometry;
    assert_eq!(after.top_left(), before.top_left() + Point::new(100, -50));
    assert_eq!(h.preview.layout().boxes().outer, outer_before);

    h.preview.toggle(Hide, 100, 550);
    h.anchor.borrow_mut().global = Point::new(900, 650);
    h.preview.handle_anchor_event(AnchorEvent::Move);
    assert_eq!(h.surface.borrow().geometry, after);
}

#[test]
fn test_embedded_surface_sits_on_anchor() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    let outer = h.preview.layout().boxes().outer;
    let surface = h.surface.borrow().geometry;
    assert_eq!(surface.size(), outer.size());
    assert_eq!(outer.top_left(), Point::default());
    // Flush above the anchor, inside its horizontal extent when it fits
    assert_eq!(surface.bottom(), 500);
    assert!(surface.left() >= 40);
}

#[test]
fn test_palette_change_rebuilds_only_bubble_and_shadow() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.userpic_changed(Some(userpic()));
    h.preview.toggle(Show, 100, 500);
    h.clock.advance(FULL);
    h.paint();
    let caches = h.preview.compositor();
    assert_eq!(caches.userpic_cache().builds(), 1);
    assert_eq!(caches.bubble_cache().builds(), 1);
    assert_eq!(caches.shadow_cache().builds(), 1);

    let palette = scale_preview::ui::theme::Palette {
        bubble_bg: 0xFF_EE_FF_DE,
        ..Default::default()
    };
    h.preview.palette_changed(palette);
    let caches = h.preview.compositor();
    assert!(!caches.bubble_cache().is_valid());
    assert!(!caches.shadow_cache().is_valid());
    assert!(caches.userpic_cache().is_valid());

    h.paint();
    let caches = h.preview.compositor();
    assert_eq!(caches.bubble_cache().builds(), 2);
    assert_eq!(caches.shadow_cache().builds(), 2);
    assert_eq!(caches.userpic_cache().builds(), 1);
}

#[test]
fn test_new_userpic_rebuilds_only_userpic() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.userpic_changed(Some(userpic()));
    h.preview.toggle(Show, 100, 500);
    h.paint();
    let boxes = *h.preview.layout().boxes();

    h.preview.userpic_changed(Some(userpic()));
    let caches = h.preview.compositor();
    assert!(!caches.userpic_cache().is_valid());
    assert!(caches.bubble_cache().is_valid());
    assert!(caches.shadow_cache().is_valid());
    assert_eq!(*h.preview.layout().boxes(), boxes);
}

#[test]
fn test_userpic_arrival_adds_padding() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    let without = h.preview.layout().boxes().inner;
    assert!(h.preview.layout().boxes().userpic.is_none());

    h.preview.userpic_changed(Some(userpic()));
    let with = h.preview.layout().boxes().inner;
    assert_eq!(with.width - without.width, 40);
    assert!(h.preview.layout().boxes().userpic.is_some());
    // Surface follows the wider preview
    assert_eq!(h.surface.borrow().geometry.width, h.preview.layout().boxes().outer.width);
}

#[test]
fn test_shown_preview_paints_pixels() {
    let mut h = harness(StrategyKind::Embedded);
    h.preview.toggle(Show, 100, 500);
    let blank = h.paint();
    assert!(blank.pixels().iter().all(|&pixel| pixel == 0));

    h.clock.advance(FULL);
    let painted = h.paint();
    let inner = h.preview.layout().boxes().inner;
    let centre = painted.pixel(
        (inner.x + inner.width / 2) as usize,
        (inner.y + inner.height / 2) as usize,
    );
    assert_eq!(centre >> 24, 0xFF);
}

#[test]
fn test_window_surface_holds_outer_box() {
    let mut h = harness(StrategyKind::Window);
    for (scale, x) in [(50, 420), (100, 500), (200, 650), (300, 700)] {
        h.preview.toggle(Show, scale, x);
        assert_surface_holds_outer(&h);
    }
}

#[test]
fn test_window_sized_for_userpic_known_at_construction() {
    let mut h = harness_seeded(StrategyKind::Window, default_anchor(), 1, Some(userpic()));
    for (scale, x) in [(50, 420), (150, 500), (300, 700)] {
        h.preview.toggle(Show, scale, x);
        assert!(h.preview.layout().boxes().userpic.is_some());
        assert_surface_holds_outer(&h);
    }
}

#[test]
fn test_window_grows_when_userpic_arrives_later() {
    let mut h = harness(StrategyKind::Window);
    h.preview.toggle(Show, 300, 500);
    let before = h.surface.borrow().geometry;

    // Arriving while shown repositions straight away
    h.preview.userpic_changed(Some(userpic()));
    assert_surface_holds_outer(&h);
    assert_eq!(h.surface.borrow().geometry.width - before.width, 40 * 3);

    h.preview.toggle(Hide, 300, 500);
    h.preview.userpic_changed(None);
    h.preview.toggle(Show, 300, 500);
    assert_surface_holds_outer(&h);
    assert_eq!(h.surface.borrow().geometry.width, before.width);
}

#[test]
fn test_scale_capped_to_range_of_device_ratio() {
    let mut h = harness_with(StrategyKind::Window, default_anchor(), 2);
    h.preview.toggle(Show, 300, 500);
    assert_eq!(h.preview.layout().state().scale, 150);
    assert_surface_holds_outer(&h);

    h.preview.toggle(Update, 40, 500);
    assert_eq!(h.preview.layout().state().scale, 50);
    assert_surface_holds_outer(&h);
}
