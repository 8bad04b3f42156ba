//! Fake windowing collaborators shared by the integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use scale_preview::config::{PreviewConfig, StrategyKind};
use scale_preview::platform::{
    AnchorWidget, Capabilities, EventSubscriber, PreviewSurface, Subscription, WatchScope,
};
use scale_preview::ui::animation::ManualClock;
use scale_preview::ui::drawing::Bitmap;
use scale_preview::ui::geometry::{Point, Rect, Size};
use scale_preview::ui::text_rasterizing::FixedAdvanceBackend;
use scale_preview::{PreviewHost, ScalePreview};

#[derive(Debug, Clone)]
pub struct AnchorState {
    pub global: Point,
    pub local: Point,
    pub size: Size,
    pub screen: Option<Rect>,
}

pub struct FakeAnchor(pub Rc<RefCell<AnchorState>>);

impl AnchorWidget for FakeAnchor {
    fn global_position(&self) -> Point {
        self.0.borrow().global
    }
    fn size(&self) -> Size {
        self.0.borrow().size
    }
    fn local_position(&self) -> Point {
        self.0.borrow().local
    }
    fn screen_geometry(&self) -> Option<Rect> {
        self.0.borrow().screen
    }
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub geometry: Rect,
    pub hidden: bool,
    pub shows: usize,
    pub hides: usize,
    pub raises: usize,
    pub updates: Vec<Rect>,
}

pub struct RecordingSurface(pub Rc<RefCell<SurfaceLog>>);

impl PreviewSurface for RecordingSurface {
    fn set_geometry(&mut self, rect: Rect) {
        self.0.borrow_mut().geometry = rect;
    }
    fn geometry(&self) -> Rect {
        self.0.borrow().geometry
    }
    fn show(&mut self) {
        let mut log = self.0.borrow_mut();
        log.hidden = false;
        log.shows += 1;
    }
    fn hide(&mut self) {
        let mut log = self.0.borrow_mut();
        log.hidden = true;
        log.hides += 1;
    }
    fn is_hidden(&self) -> bool {
        self.0.borrow().hidden
    }
    fn update(&mut self, rect: Rect) {
        self.0.borrow_mut().updates.push(rect);
    }
    fn raise_overlay(&mut self) {
        self.0.borrow_mut().raises += 1;
    }
}

struct CountedSubscription(Rc<Cell<usize>>);

impl Subscription for CountedSubscription {}

impl Drop for CountedSubscription {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

pub struct RecordingSubscriber {
    pub active: Rc<Cell<usize>>,
    pub scopes: Rc<RefCell<Vec<WatchScope>>>,
}

impl EventSubscriber for RecordingSubscriber {
    fn subscribe(&mut self, scope: WatchScope) -> Box<dyn Subscription> {
        self.scopes.borrow_mut().push(scope);
        self.active.set(self.active.get() + 1);
        Box::new(CountedSubscription(self.active.clone()))
    }
}

pub struct Harness {
    pub preview: ScalePreview,
    pub anchor: Rc<RefCell<AnchorState>>,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub active: Rc<Cell<usize>>,
    pub scopes: Rc<RefCell<Vec<WatchScope>>>,
    pub clock: ManualClock,
}

pub fn default_anchor() -> AnchorState {
    AnchorState {
        global: Point::new(400, 700),
        local: Point::new(40, 500),
        size: Size::new(300, 20),
        screen: Some(Rect::new(0, 0, 1920, 1080)),
    }
}

pub fn harness(strategy: StrategyKind) -> Harness {
    harness_with(strategy, default_anchor(), 1)
}

pub fn harness_with(strategy: StrategyKind, anchor: AnchorState, ratio: i32) -> Harness {
    harness_seeded(strategy, anchor, ratio, None)
}

/// Harness whose host already knows a userpic at construction
pub fn harness_seeded(
    strategy: StrategyKind,
    anchor: AnchorState,
    ratio: i32,
    userpic: Option<RgbaImage>,
) -> Harness {
    let anchor = Rc::new(RefCell::new(anchor));
    let surface = Rc::new(RefCell::new(SurfaceLog {
        hidden: true,
        ..SurfaceLog::default()
    }));
    let active = Rc::new(Cell::new(0));
    let scopes = Rc::new(RefCell::new(Vec::new()));
    let clock = ManualClock::new();

    let host = PreviewHost {
        anchor: Box::new(FakeAnchor(anchor.clone())),
        surface: Box::new(RecordingSurface(surface.clone())),
        subscriber: Box::new(RecordingSubscriber {
            active: active.clone(),
            scopes: scopes.clone(),
        }),
        clock: Box::new(clock.clone()),
        backend: Box::new(FixedAdvanceBackend),
        ratio,
        userpic,
    };
    let config = PreviewConfig {
        strategy: Some(strategy),
        ..PreviewConfig::default()
    };
    let capabilities = Capabilities {
        translucent_windows: true,
        wayland: false,
    };
    Harness {
        preview: ScalePreview::new(host, config, capabilities),
        anchor,
        surface,
        active,
        scopes,
        clock,
    }
}

impl Harness {
    /// Paint the whole surface into a fresh target
    pub fn paint(&mut self) -> Bitmap {
        let size = self.preview.surface_size();
        let mut target = Bitmap::new(size, self.preview.ratio());
        self.preview.paint(&mut target, Rect::from_size(size));
        target
    }
}

pub fn userpic() -> RgbaImage {
    RgbaImage::from_pixel(48, 48, Rgba([90, 160, 220, 255]))
}
