// Global debug flag - can be toggled at runtime with Ctrl+D in the demo
use std::sync::atomic::AtomicBool;
pub static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Debug print macro - only prints if DEBUG_ENABLED is true
// Compiled out entirely in release builds
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::DEBUG_ENABLED.load(std::sync::atomic::Ordering::Relaxed) {
            println!($($arg)*);
        }
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {};
}

// Logging - feature-gated, compiles to nothing without --features logging

// Disabled: compiles to nothing
#[cfg(not(feature = "logging"))]
#[inline(always)]
pub fn log(_msg: &str) {}

// Enabled: forwarded to the log facade
#[cfg(feature = "logging")]
pub fn log(msg: &str) {
    log::info!("{}", msg);
}

pub mod config;
pub mod error;
pub mod platform;
pub mod ui;

// Re-export commonly used items from submodules
pub use config::{PreviewConfig, StrategyKind};
pub use error::{PreviewError, Result};
pub use ui::{
    setup_scale_preview, PreviewHost, ScalePreview, ScalePreviewCallback, ScalePreviewShow,
};
