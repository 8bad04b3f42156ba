use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source for animations
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Linear interpolation between two values over a fixed duration
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAnimation {
    running: Option<Run>,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    from: f32,
    to: f32,
    started: Instant,
    duration: Duration,
}

impl SimpleAnimation {
    /// Start (or restart) from `from` towards `to`
    pub fn start(&mut self, from: f32, to: f32, duration: Duration, now: Instant) {
        self.running = Some(Run {
            from,
            to,
            started: now,
            duration,
        });
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    pub fn animating(&self, now: Instant) -> bool {
        self.running
            .map(|run| now.duration_since(run.started) < run.duration)
            .unwrap_or(false)
    }

    /// Current value, or `default` when the animation never ran or was stopped
    pub fn value(&self, now: Instant, default: f32) -> f32 {
        let Some(run) = self.running else {
            return default;
        };
        if run.duration.is_zero() {
            return run.to;
        }
        let elapsed = now.duration_since(run.started).as_secs_f32();
        let t = (elapsed / run.duration.as_secs_f32()).min(1.);
        run.from + (run.to - run.from) * t
    }

    /// Value the animation is heading to, if any
    pub fn target(&self) -> Option<f32> {
        self.running.map(|run| run.to)
    }
}
