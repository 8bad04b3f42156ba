use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use scale_preview::config::{PreviewConfig, StrategyKind};
use scale_preview::platform::{
    AnchorEvent, AnchorWidget, ApplicationState, Capabilities, EventSubscriber, PreviewSurface,
    Subscription, WatchScope,
};
use scale_preview::ui::animation::SystemClock;
use scale_preview::ui::drawing::{Bitmap, Painter};
use scale_preview::ui::geometry::{Margins, Point, Rect, Size};
use scale_preview::ui::renderer::Renderer;
use scale_preview::ui::style::{SCALE_DEFAULT, SCALE_MAX, SCALE_MIN};
use scale_preview::ui::text_rasterizing::TextRenderer;
use scale_preview::{
    debug_println, setup_scale_preview, PreviewHost, ScalePreview, ScalePreviewCallback,
    ScalePreviewShow, DEBUG_ENABLED,
};

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, ModifiersState},
    window::{Window, WindowId},
};

const WINDOW_BG: u32 = 0xFF_F1_F1_F1;
const TRACK_FG: u32 = 0xFF_C8_C8_C8;
const TRACK_ACTIVE_FG: u32 = 0xFF_40_A7_E3;
const KNOB_SIZE: i32 = 14;
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Slider geometry shared between the window and the preview's anchor
struct Slider {
    track: Cell<Rect>,
    scale: Cell<i32>,
}

impl Slider {
    fn knob_x(&self) -> i32 {
        let track = self.track.get();
        track.x + (self.scale.get() - SCALE_MIN) * track.width / (SCALE_MAX - SCALE_MIN)
    }

    fn scale_at(&self, x: i32) -> i32 {
        let track = self.track.get();
        if track.width <= 0 {
            return SCALE_DEFAULT;
        }
        let offset = (x - track.x).clamp(0, track.width);
        let scale = SCALE_MIN + offset * (SCALE_MAX - SCALE_MIN) / track.width;
        // Snap to 5% steps like the settings slider
        (scale + 2) / 5 * 5
    }
}

fn logical(value: i32, ratio: i32) -> i32 {
    value / ratio.max(1)
}

fn window_origin(window: &Window, ratio: i32) -> Point {
    window
        .inner_position()
        .map(|position| Point::new(logical(position.x, ratio), logical(position.y, ratio)))
        .unwrap_or_default()
}

struct DemoAnchor {
    window: Rc<Window>,
    slider: Rc<Slider>,
    ratio: i32,
}

impl AnchorWidget for DemoAnchor {
    fn global_position(&self) -> Point {
        window_origin(&self.window, self.ratio) + self.local_position()
    }

    fn size(&self) -> Size {
        self.slider.track.get().size()
    }

    fn local_position(&self) -> Point {
        self.slider.track.get().top_left()
    }

    fn screen_geometry(&self) -> Option<Rect> {
        let monitor = self.window.current_monitor()?;
        let position = monitor.position();
        let size = monitor.size();
        Some(Rect::new(
            logical(position.x, self.ratio),
            logical(position.y, self.ratio),
            logical(size.width as i32, self.ratio),
            logical(size.height as i32, self.ratio),
        ))
    }
}

/// Overlay drawn into the main window on top of the settings content
struct DemoSurface {
    window: Rc<Window>,
    geometry: Rect,
    hidden: bool,
}

impl PreviewSurface for DemoSurface {
    fn set_geometry(&mut self, rect: Rect) {
        self.geometry = rect;
        self.window.request_redraw();
    }

    fn geometry(&self) -> Rect {
        self.geometry
    }

    fn show(&mut self) {
        self.hidden = false;
        self.window.request_redraw();
    }

    fn hide(&mut self) {
        self.hidden = true;
        self.window.request_redraw();
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn update(&mut self, _rect: Rect) {
        self.window.request_redraw();
    }
}

struct DemoSubscription {
    active: Rc<Cell<bool>>,
}

impl Subscription for DemoSubscription {}

impl Drop for DemoSubscription {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

struct DemoSubscriber {
    active: Rc<Cell<bool>>,
}

impl EventSubscriber for DemoSubscriber {
    fn subscribe(&mut self, scope: WatchScope) -> Box<dyn Subscription> {
        debug_println!("Scale preview: watching {:?}", scope);
        self.active.set(true);
        Box::new(DemoSubscription {
            active: self.active.clone(),
        })
    }
}

struct App {
    window: Option<Rc<Window>>,
    renderer: Option<Renderer>,
    preview: Option<Rc<RefCell<ScalePreview>>>,
    toggle: Option<ScalePreviewCallback>,
    slider: Rc<Slider>,
    watching: Rc<Cell<bool>>,
    ratio: i32,
    cursor: Point,
    dragging: bool,
    modifiers: ModifiersState,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            preview: None,
            toggle: None,
            slider: Rc::new(Slider {
                track: Cell::new(Rect::default()),
                scale: Cell::new(SCALE_DEFAULT),
            }),
            watching: Rc::new(Cell::new(false)),
            ratio: 1,
            cursor: Point::default(),
            dragging: false,
            modifiers: ModifiersState::empty(),
        }
    }

    fn layout_slider(&self, physical_width: u32, physical_height: u32) {
        let width = logical(physical_width as i32, self.ratio);
        let height = logical(physical_height as i32, self.ratio);
        self.slider
            .track
            .set(Rect::new(40, height - 60, (width - 80).max(1), 4));
    }

    fn slide(&mut self, show: ScalePreviewShow) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let scale = self.slider.scale_at(self.cursor.x);
        self.slider.scale.set(scale);
        let global_x = window_origin(window, self.ratio).x + self.slider.knob_x();
        if let Some(toggle) = self.toggle.as_mut() {
            toggle(show, scale, global_x);
        }
        window.request_redraw();
    }

    fn anchor_event(&self, event: AnchorEvent) {
        if !self.watching.get() {
            return;
        }
        if let Some(preview) = &self.preview {
            preview.borrow_mut().handle_anchor_event(event);
        }
    }

    fn render(&mut self) {
        let (Some(renderer), Some(preview)) = (self.renderer.as_mut(), self.preview.as_ref()) else {
            return;
        };
        let (width, height) = renderer.size();
        let mut frame = Bitmap::from_device(width as usize, height as usize, self.ratio);
        {
            let mut p = Painter::new(&mut frame);
            let bounds = Rect::from_size(logical_size(width, height, self.ratio));
            p.fill_rect(bounds, WINDOW_BG);
            let track = self.slider.track.get();
            p.fill_rect(track, TRACK_FG);
            let knob_x = self.slider.knob_x();
            p.fill_rect(
                Rect::new(track.x, track.y, knob_x - track.x, track.height),
                TRACK_ACTIVE_FG,
            );
            p.fill_rect(
                Rect::new(
                    knob_x - KNOB_SIZE / 2,
                    track.y + track.height / 2 - KNOB_SIZE / 2,
                    KNOB_SIZE,
                    KNOB_SIZE,
                ),
                TRACK_ACTIVE_FG,
            );
        }

        let mut preview = preview.borrow_mut();
        if preview.is_animating() || (!preview.is_shown() && !preview.surface().is_hidden()) {
            preview.animation_frame();
        }
        if !preview.surface().is_hidden() {
            let geometry = preview.surface().geometry();
            let mut overlay = Bitmap::new(geometry.size(), self.ratio);
            preview.paint(&mut overlay, Rect::from_size(geometry.size()));
            let mut p = Painter::new(&mut frame);
            p.draw_bitmap(geometry.top_left(), &overlay);
        }

        if let Err(e) = renderer.present(&frame) {
            log::warn!("Present failed: {}", e);
        }
    }
}

fn logical_size(width: u32, height: u32, ratio: i32) -> Size {
    Size::new(logical(width as i32, ratio), logical(height as i32, ratio))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("Interface scale")
            .with_inner_size(winit::dpi::LogicalSize::new(720., 480.));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.ratio = (window.scale_factor().round() as i32).max(1);
        let size = window.inner_size();
        self.layout_slider(size.width, size.height);

        match Renderer::new(window.clone()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("Failed to create renderer: {}", e);
                event_loop.exit();
                return;
            }
        }

        let host = PreviewHost {
            anchor: Box::new(DemoAnchor {
                window: window.clone(),
                slider: self.slider.clone(),
                ratio: self.ratio,
            }),
            surface: Box::new(DemoSurface {
                window: window.clone(),
                geometry: Rect::default(),
                hidden: true,
            }),
            subscriber: Box::new(DemoSubscriber {
                active: self.watching.clone(),
            }),
            clock: Box::new(SystemClock),
            backend: Box::new(TextRenderer::new()),
            ratio: self.ratio,
            userpic: None,
        };
        // The overlay is drawn inside this window, so always embed
        let config = PreviewConfig {
            strategy: Some(StrategyKind::Embedded),
            ..PreviewConfig::default()
        };
        let (preview, toggle) = setup_scale_preview(host, config, Capabilities::detect());
        self.preview = Some(preview);
        self.toggle = Some(toggle);

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.layout_slider(size.width, size.height);
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.resize(size.width, size.height) {
                        log::warn!("Resize failed: {}", e);
                    }
                }
                self.anchor_event(AnchorEvent::Resize);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::Moved(_) => {
                self.anchor_event(AnchorEvent::Move);
            }
            WindowEvent::Focused(false) => {
                if let Some(preview) = &self.preview {
                    preview
                        .borrow_mut()
                        .handle_application_state(ApplicationState::Inactive);
                }
                self.dragging = false;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let is_d = match &event.logical_key {
                    Key::Character(c) => c.eq_ignore_ascii_case("d"),
                    _ => false,
                };
                if event.state.is_pressed() && self.modifiers.control_key() && is_d {
                    let enabled = !DEBUG_ENABLED.load(Ordering::Relaxed);
                    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
                    let state = if enabled { "on" } else { "off" };
                    scale_preview::log(&format!("Debug output {}", state));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(
                    logical(position.x as i32, self.ratio),
                    logical(position.y as i32, self.ratio),
                );
                if self.dragging {
                    self.slide(ScalePreviewShow::Update);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let track = self.slider.track.get().margins_added(
                        Margins::new(0, KNOB_SIZE, 0, KNOB_SIZE),
                    );
                    if track.contains_rect(&Rect::from_parts(self.cursor, Size::new(1, 1))) {
                        self.dragging = true;
                        self.slide(ScalePreviewShow::Show);
                    }
                }
                ElementState::Released => {
                    if self.dragging {
                        self.dragging = false;
                        self.slide(ScalePreviewShow::Hide);
                    }
                }
            },
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let animating = self
            .preview
            .as_ref()
            .map(|preview| {
                let preview = preview.borrow();
                preview.is_animating() || (!preview.is_shown() && !preview.surface().is_hidden())
            })
            .unwrap_or(false);
        if animating {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + FRAME_DURATION));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    scale_preview::log("Interface scale preview demo");

    let event_loop = EventLoop::new()?;
    let mut app = App::new();
    event_loop.run_app(&mut app)?;
    Ok(())
}
