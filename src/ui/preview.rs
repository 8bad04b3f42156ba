//! Visibility controller for the interface scale preview
//!
//! The slider drives everything through [`ScalePreview::toggle`]: scale first,
//! then position, then visibility, so one call always leaves a consistent
//! layout behind before any repaint is scheduled.

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;

use super::animation::{Clock, SimpleAnimation};
use super::compositing::Compositor;
use super::drawing::Bitmap;
use super::geometry::{Rect, Size};
use super::layout::ScaleLayout;
use super::position::{EmbeddedPlacement, Placed, Placement, WindowPlacement};
use super::style::{SCALE_MAX, SCALE_MIN};
use super::text_rasterizing::FontBackend;
use super::theme::{ChatBackground, Palette};
use crate::config::{PreviewConfig, StrategyKind};
use crate::platform::{
    AnchorEvent, AnchorWidget, ApplicationState, Capabilities, EventSubscriber, PreviewSurface,
    Subscription,
};

/// Request coming from the scale slider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePreviewShow {
    Show,
    Update,
    Hide,
}

/// Everything the preview talks to, supplied by the host
pub struct PreviewHost {
    pub anchor: Box<dyn AnchorWidget>,
    pub surface: Box<dyn PreviewSurface>,
    pub subscriber: Box<dyn EventSubscriber>,
    pub clock: Box<dyn Clock>,
    pub backend: Box<dyn FontBackend>,
    /// Physical pixels per logical pixel of the anchor's screen
    pub ratio: i32,
    /// Userpic already known when the preview is built
    pub userpic: Option<RgbaImage>,
}

pub struct ScalePreview {
    config: PreviewConfig,
    anchor: Box<dyn AnchorWidget>,
    surface: Box<dyn PreviewSurface>,
    subscriber: Box<dyn EventSubscriber>,
    clock: Box<dyn Clock>,
    backend: Box<dyn FontBackend>,
    placement: Box<dyn Placement>,

    layout: ScaleLayout,
    compositor: Compositor,

    shown: bool,
    shown_animation: SimpleAnimation,
    subscription: Option<Box<dyn Subscription>>,
}

impl ScalePreview {
    pub fn new(host: PreviewHost, config: PreviewConfig, capabilities: Capabilities) -> Self {
        Self::with_theme(
            host,
            config,
            capabilities,
            Palette::default(),
            ChatBackground::default(),
        )
    }

    pub fn with_theme(
        host: PreviewHost,
        config: PreviewConfig,
        capabilities: Capabilities,
        palette: Palette,
        background: ChatBackground,
    ) -> Self {
        let PreviewHost {
            anchor,
            surface,
            subscriber,
            clock,
            mut backend,
            ratio,
            userpic,
        } = host;
        let kind = config.strategy.unwrap_or(if capabilities.use_separate_window() {
            StrategyKind::Window
        } else {
            StrategyKind::Embedded
        });

        let has_userpic = userpic.is_some();
        let mut layout = ScaleLayout::new(ratio);
        let placement: Box<dyn Placement> = match kind {
            StrategyKind::Embedded => Box::new(EmbeddedPlacement),
            StrategyKind::Window => {
                let (min_outer, max_outer) =
                    probe_outer_range(&mut layout, &config, has_userpic, backend.as_mut());
                Box::new(WindowPlacement::new(min_outer, max_outer))
            }
        };
        crate::log(&format!("Scale preview: {:?} placement at ratio {}", kind, ratio));

        let mut compositor = Compositor::new(&config, palette, background);
        compositor.set_userpic(userpic);
        if layout.state().is_initialized() {
            compositor.relayout(&layout);
        }

        Self {
            config,
            anchor,
            surface,
            subscriber,
            clock,
            backend,
            placement,
            layout,
            compositor,
            shown: false,
            shown_animation: SimpleAnimation::default(),
            subscription: None,
        }
    }

    pub fn toggle(&mut self, show: ScalePreviewShow, scale: i32, global_x: i32) {
        match show {
            ScalePreviewShow::Hide => {
                self.toggle_shown(false);
                return;
            }
            ScalePreviewShow::Update if !self.shown => return,
            _ => {}
        }
        self.update_to_scale(scale.clamp(SCALE_MIN, self.max_scale()));
        self.update_global_position(global_x);
        if self.surface.is_hidden() {
            self.surface.raise_overlay();
        }
        self.toggle_shown(true);
    }

    fn toggle_shown(&mut self, shown: bool) {
        if self.shown == shown {
            return;
        }
        let now = self.clock.now();
        let from = self.progress();
        self.shown = shown;
        self.toggle_subscription();
        if shown {
            self.surface.show();
        } else if self.surface.is_hidden() {
            self.shown_animation.stop();
            return;
        }
        let to = if shown { 1. } else { 0. };
        // Reversing mid-flight continues from the current progress
        self.shown_animation.start(from, to, self.config.show_duration, now);
        self.update();
    }

    fn toggle_subscription(&mut self) {
        if !self.shown {
            self.subscription = None;
            return;
        }
        if self.subscription.is_some() {
            return;
        }
        self.subscription = Some(self.subscriber.subscribe(self.placement.watch_scope()));
    }

    /// Top of the slider range at this ratio; the window surface is sized for it
    fn max_scale(&self) -> i32 {
        self.layout.state().max_for_ratio().clamp(SCALE_MIN, SCALE_MAX)
    }

    fn update_to_scale(&mut self, scale: i32) {
        let has_userpic = self.compositor.userpic().is_some();
        if self
            .layout
            .update_to_scale(scale, &self.config, has_userpic, self.backend.as_mut())
        {
            self.compositor.relayout(&self.layout);
            self.update();
        }
    }

    fn update_global_position(&mut self, global_x: i32) {
        let outer = self.layout.boxes().outer.size();
        let placed = self.placement.place(self.anchor.as_ref(), outer, global_x);
        self.apply_placement(placed);
    }

    fn apply_placement(&mut self, placed: Placed) {
        self.update();
        if self.surface.geometry() != placed.surface {
            self.surface.set_geometry(placed.surface);
        }
        let boxes = self.layout.boxes_mut();
        boxes.outer = boxes.outer.moved_to(placed.outer_origin);
        self.update();
    }

    /// Schedule a repaint of the outer box
    fn update(&mut self) {
        let outer = self.layout.boxes().outer;
        if !outer.is_empty() {
            self.surface.update(outer);
        }
    }

    /// Anchor or one of its watched ancestors changed
    pub fn handle_anchor_event(&mut self, event: AnchorEvent) {
        if self.subscription.is_none() {
            return;
        }
        log::debug!("scale preview: anchor {:?}, repositioning", event);
        let outer = self.layout.boxes().outer.size();
        let placed = self.placement.reposition(self.anchor.as_ref(), outer);
        self.apply_placement(placed);
    }

    pub fn handle_application_state(&mut self, state: ApplicationState) {
        if self.subscription.is_none() {
            return;
        }
        if state != ApplicationState::Active {
            self.toggle(ScalePreviewShow::Hide, 0, 0);
        }
    }

    /// Per-frame tick; returns whether more frames are wanted
    pub fn animation_frame(&mut self) -> bool {
        self.update();
        let animating = self.shown_animation.animating(self.clock.now());
        if !self.shown && !animating && !self.surface.is_hidden() {
            self.surface.hide();
        }
        animating
    }

    /// Current show progress in [0, 1]
    pub fn progress(&self) -> f32 {
        let default = if self.shown { 1. } else { 0. };
        self.shown_animation.value(self.clock.now(), default)
    }

    pub fn is_animating(&self) -> bool {
        self.shown_animation.animating(self.clock.now())
    }

    /// Paint `damage` (surface coordinates) into a surface-sized `target`
    pub fn paint(&mut self, target: &mut Bitmap, damage: Rect) {
        let progress = self.progress();
        self.compositor
            .paint(target, damage, &self.layout, self.backend.as_mut(), progress);
    }

    pub fn palette_changed(&mut self, palette: Palette) {
        self.compositor.set_palette(palette);
        self.update();
    }

    pub fn background_changed(&mut self, background: ChatBackground) {
        self.compositor.set_background(background);
        self.update();
    }

    /// New userpic image (or none); relayouts only if presence changed
    pub fn userpic_changed(&mut self, userpic: Option<RgbaImage>) {
        let had = self.compositor.userpic().is_some();
        let has = userpic.is_some();
        self.compositor.set_userpic(userpic);
        if had != has && self.layout.state().is_initialized() {
            let scale = self.layout.state().scale;
            if self.placement.kind() == StrategyKind::Window {
                // The userpic column widens every scale, so the window range changes too
                let (min_outer, max_outer) =
                    probe_outer_range(&mut self.layout, &self.config, has, self.backend.as_mut());
                self.placement.set_outer_range(min_outer, max_outer);
                self.layout.update_to_scale(scale, &self.config, has, self.backend.as_mut());
                self.compositor.relayout(&self.layout);
            } else {
                self.update_to_scale(scale);
            }
            if self.shown {
                let outer = self.layout.boxes().outer.size();
                let placed = self.placement.reposition(self.anchor.as_ref(), outer);
                self.apply_placement(placed);
            }
        }
        self.update();
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn strategy(&self) -> StrategyKind {
        self.placement.kind()
    }

    pub fn layout(&self) -> &ScaleLayout {
        &self.layout
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn surface(&self) -> &dyn PreviewSurface {
        self.surface.as_ref()
    }

    /// Logical size of the surface, for hosts allocating the paint target
    pub fn surface_size(&self) -> Size {
        self.surface.geometry().size()
    }

    pub fn ratio(&self) -> i32 {
        self.layout.state().ratio
    }
}

/// Outer sizes at both ends of the slider range, leaving `layout` at the top
fn probe_outer_range(
    layout: &mut ScaleLayout,
    config: &PreviewConfig,
    has_userpic: bool,
    backend: &mut dyn FontBackend,
) -> (Size, Size) {
    layout.update_to_scale(SCALE_MIN, config, has_userpic, backend);
    let min_outer = layout.boxes().outer.size();
    let max_scale = layout.state().max_for_ratio().clamp(SCALE_MIN, SCALE_MAX);
    layout.update_to_scale(max_scale, config, has_userpic, backend);
    (min_outer, layout.boxes().outer.size())
}

pub type ScalePreviewCallback = Box<dyn FnMut(ScalePreviewShow, i32, i32)>;

/// Build a preview and the callback the scale slider invokes
///
/// The shared handle stays with the host for painting and event delivery.
pub fn setup_scale_preview(
    host: PreviewHost,
    config: PreviewConfig,
    capabilities: Capabilities,
) -> (Rc<RefCell<ScalePreview>>, ScalePreviewCallback) {
    let preview = Rc::new(RefCell::new(ScalePreview::new(host, config, capabilities)));
    let weak = Rc::downgrade(&preview);
    let callback = Box::new(move |show, scale, global_x| {
        if let Some(preview) = weak.upgrade() {
            preview.borrow_mut().toggle(show, scale, global_x);
        }
    });
    (preview, callback)
}
